//! Budget extraction service: binary entrypoint.
//! Boots the Axum HTTP server with the extraction pipeline and `/metrics`.

use budget_extractor::api::{self, AppState};
use budget_extractor::metrics::Metrics;
use budget_extractor::Pipeline;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("budget_extractor=info,warn"));

    // The runtime may already have installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let pipeline = Pipeline::from_env()?;
    tracing::info!(ai = pipeline.ai_enabled(), "extraction pipeline ready");

    let metrics = Metrics::init()?;
    let router = api::router(AppState::new(pipeline)).merge(metrics.router());

    Ok(router.into())
}

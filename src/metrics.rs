use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and describe the extraction series.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;

        describe_counter!(
            "extract_requests_total",
            "Budget-info extractions, labelled by model outcome."
        );
        describe_counter!(
            "extract_ai_provider_errors_total",
            "Failed provider calls by provider and failure kind."
        );
        describe_counter!(
            "extract_ai_rotations_total",
            "Primary credential rotations after auth/quota failures."
        );
        describe_counter!(
            "extract_ai_degraded_total",
            "Model replies kept raw because they were not valid JSON."
        );
        describe_histogram!("extract_duration_ms", "Budget-info extraction time in milliseconds.");

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

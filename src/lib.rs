// src/lib.rs
// Public library surface for integration tests and the web layer.

pub mod ai;
pub mod api;
pub mod config;
pub mod extract;
pub mod graph;
pub mod merge;
pub mod metrics;
pub mod pipeline;
pub mod record;
pub mod survey;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::extract::{
    extract_agriculture, extract_climate_programmes, extract_numbers, extract_text,
    extract_total_budget, normalize_text,
};
pub use crate::graph::{project_graph_data, GraphData};
pub use crate::merge::reconcile;
pub use crate::pipeline::{ExtractionReport, Pipeline};
pub use crate::record::{clean_numeric, BudgetRecord, ProgrammeLineItem, Sector};

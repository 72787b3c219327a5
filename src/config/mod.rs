// src/config/mod.rs
pub mod ai;
pub mod extraction;

pub use ai::AiConfig;
pub use extraction::ExtractionConfig;

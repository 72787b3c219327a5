// src/pipeline.rs
//! End-to-end extraction: text -> normalizer -> {keyword extractor, AI chain}
//! -> reconciliation, plus the table extractors and chart projection.

use metrics::{counter, histogram};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::info;

use crate::ai::{AiExtractor, ModelReply};
use crate::config::{AiConfig, ExtractionConfig};
use crate::extract::{
    extract_coded_programmes, extract_line_items, extract_numbers, extract_text,
    extract_total_budget, normalize_text, LineItemPattern, LineItemTable, PdfError,
};
use crate::graph::{project_graph_data_for, GraphData};
use crate::merge::reconcile;
use crate::record::{BudgetRecord, ProgrammeLineItem};
use crate::survey::SurveyDefaults;

/// Short anonymized id for log lines; raw document text is never logged.
pub(crate) fn doc_id(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Everything extracted from one document.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub budget_info: BudgetRecord,
    pub agriculture: Option<Vec<ProgrammeLineItem>>,
    pub agriculture_totals: Option<BTreeMap<u16, f64>>,
    pub climate_programmes: Option<Vec<ProgrammeLineItem>>,
    pub total_budget: Option<f64>,
    pub graph: GraphData,
    pub survey: SurveyDefaults,
}

pub struct Pipeline {
    config: ExtractionConfig,
    line_items: LineItemPattern,
    ai: Option<AiExtractor>,
}

impl Pipeline {
    pub fn new(config: ExtractionConfig, ai: Option<AiExtractor>) -> Self {
        let line_items = LineItemPattern::new(&config.fiscal_years);
        Self {
            config,
            line_items,
            ai,
        }
    }

    /// Load `config/extraction.toml` and `config/ai.json` (or their env
    /// overrides) and build real providers.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = ExtractionConfig::load_default()?;
        let ai_cfg = AiConfig::load_default()?;
        let ai = AiExtractor::from_config(&ai_cfg, &config.fiscal_years)?;
        Ok(Self::new(config, ai))
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn ai_enabled(&self) -> bool {
        self.ai.as_ref().is_some_and(AiExtractor::has_providers)
    }

    /// PDF bytes -> concatenated page text, honouring the configured page cap.
    pub fn read_pdf(&self, pdf_bytes: &[u8]) -> Result<String, PdfError> {
        extract_text(pdf_bytes, self.config.max_pages).map(|doc| doc.joined())
    }

    /// Keyword extraction and the AI chain over the normalized text, merged
    /// into one record. Never fails: with no usable model output the record
    /// holds keyword-derived fields only.
    pub async fn extract_budget_info(&self, text: &str) -> BudgetRecord {
        let t0 = Instant::now();
        let clean = normalize_text(text);
        let hits = extract_numbers(&clean, &self.config.keywords);

        let reply = match &self.ai {
            Some(ai) => ai.extract(&clean).await,
            None => ModelReply::Empty,
        };

        let record = reconcile(&reply, &hits);

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        counter!("extract_requests_total", "ai" => reply.kind()).increment(1);
        histogram!("extract_duration_ms").record(ms);
        info!(
            doc = %doc_id(&clean),
            chars = clean.len(),
            keyword_hits = hits.len(),
            ai = reply.kind(),
            empty = record.is_empty(),
            "budget info extracted"
        );
        record
    }

    pub fn extract_agriculture(&self, text: &str) -> Option<LineItemTable> {
        extract_line_items(text, &self.config.agriculture_keyword, &self.line_items)
    }

    pub fn extract_climate_programmes(&self, text: &str) -> Option<Vec<ProgrammeLineItem>> {
        extract_coded_programmes(text, &self.config.programme_codes, &self.config.fiscal_years)
    }

    pub fn extract_total_budget(&self, text: &str) -> Option<f64> {
        extract_total_budget(text)
    }

    pub fn graph(&self, record: &BudgetRecord) -> GraphData {
        project_graph_data_for(record, &self.config.fiscal_years)
    }

    /// Normalize `text` once and run every extractor over the result.
    pub async fn report(&self, text: &str) -> ExtractionReport {
        let clean = normalize_text(text);
        let budget_info = self.extract_budget_info(&clean).await;
        let (agriculture, agriculture_totals) = match self.extract_agriculture(&clean) {
            Some(table) => (Some(table.rows), Some(table.totals)),
            None => (None, None),
        };
        let graph = self.graph(&budget_info);
        let survey = SurveyDefaults::from_record(&budget_info);
        ExtractionReport {
            agriculture,
            agriculture_totals,
            climate_programmes: self.extract_climate_programmes(&clean),
            total_budget: self.extract_total_budget(&clean),
            graph,
            survey,
            budget_info,
        }
    }
}

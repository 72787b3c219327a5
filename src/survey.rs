// src/survey.rs
//! Survey pre-fill values and budget-share percentages.

use serde::Serialize;

use crate::record::BudgetRecord;

/// CMAT finance indicators reported as shares of the total budget, in
/// survey order.
pub const SHARE_INDICATORS: [&str; 3] = ["Public", "Adaptation", "Mitigation"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SurveyDefaults {
    pub total_budget: Option<f64>,
    pub public: Option<f64>,
    pub adaptation: Option<f64>,
    pub mitigation: Option<f64>,
}

impl SurveyDefaults {
    pub fn from_record(record: &BudgetRecord) -> Self {
        let [public, adaptation, mitigation] = SHARE_INDICATORS.map(|k| record.indicator(k));
        Self {
            total_budget: record.total_budget,
            public,
            adaptation,
            mitigation,
        }
    }

    /// `[public, adaptation, mitigation]` as percent of the total.
    pub fn percentages(&self) -> [f64; 3] {
        calc_percentages(self.total_budget, self.public, self.adaptation, self.mitigation)
    }
}

/// Each value as a percentage of `total`; missing values count as zero and a
/// non-positive total yields all zeros.
pub fn calc_percentages(
    total: Option<f64>,
    public: Option<f64>,
    adaptation: Option<f64>,
    mitigation: Option<f64>,
) -> [f64; 3] {
    let total = total.unwrap_or(0.0);
    if total <= 0.0 {
        return [0.0; 3];
    }
    [public, adaptation, mitigation].map(|v| v.unwrap_or(0.0) / total * 100.0)
}

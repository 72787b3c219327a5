// src/graph.rs
//! Derived chart data. Computed fresh from a [`BudgetRecord`], never stored.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::extraction::ExtractionConfig;
use crate::record::BudgetRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectAllocation {
    #[serde(rename = "Programme")]
    pub programme: String,
    #[serde(rename = "Allocated")]
    pub allocated: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryTotals {
    #[serde(rename = "Sectors")]
    pub sectors: f64,
    #[serde(rename = "Climate Projects")]
    pub projects: f64,
    /// `max(total - (sectors + projects), 0)`.
    #[serde(rename = "Unallocated")]
    pub unallocated: f64,
}

/// Latest-year figure of one project as a percentage of the total budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectShare {
    #[serde(rename = "Programme")]
    pub programme: String,
    #[serde(rename = "Year")]
    pub year: u16,
    #[serde(rename = "Percent")]
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphData {
    pub projects: Vec<ProjectAllocation>,
    pub categories: CategoryTotals,
    pub yearly: BTreeMap<u16, f64>,
    pub shares: Vec<ProjectShare>,
    pub yearly_average: f64,
}

/// Project a record with the default fiscal-year window.
pub fn project_graph_data(record: &BudgetRecord) -> GraphData {
    project_graph_data_for(record, &ExtractionConfig::default().fiscal_years)
}

pub fn project_graph_data_for(record: &BudgetRecord, fiscal_years: &[u16]) -> GraphData {
    let projects: Vec<ProjectAllocation> = record
        .climate_projects
        .iter()
        .map(|p| ProjectAllocation {
            programme: p.programme.clone(),
            allocated: p.total(),
        })
        .collect();

    let sectors_sum = record.sectors.sum();
    let projects_sum: f64 = projects.iter().map(|p| p.allocated).sum();
    let total = record.total_budget.unwrap_or(0.0);
    let categories = CategoryTotals {
        sectors: sectors_sum,
        projects: projects_sum,
        unallocated: (total - (sectors_sum + projects_sum)).max(0.0),
    };

    let yearly: BTreeMap<u16, f64> = fiscal_years
        .iter()
        .map(|y| {
            let sum: f64 = record
                .climate_projects
                .iter()
                .filter_map(|p| p.year(*y))
                .sum();
            (*y, sum)
        })
        .collect();

    let yearly_average = if yearly.is_empty() {
        0.0
    } else {
        yearly.values().sum::<f64>() / yearly.len() as f64
    };

    let shares = match (fiscal_years.iter().max(), record.total_budget) {
        (Some(latest), Some(total)) if total > 0.0 => record
            .climate_projects
            .iter()
            .map(|p| ProjectShare {
                programme: p.programme.clone(),
                year: *latest,
                percent: p.year(*latest).unwrap_or(0.0) / total * 100.0,
            })
            .collect(),
        _ => Vec::new(),
    };

    GraphData {
        projects,
        categories,
        yearly,
        shares,
        yearly_average,
    }
}

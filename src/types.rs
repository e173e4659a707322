use crate::filter::FilterSelection;
use crate::uplift::{RevenueModel, UpliftSpec};
use serde::Serialize;
use tabled::Tabled;

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MonthlyTotalRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "OriginalRevenue")]
    #[tabled(rename = "OriginalRevenue")]
    pub original: String,
    #[serde(rename = "UpliftedRevenue")]
    #[tabled(rename = "UpliftedRevenue")]
    pub uplifted: String,
    #[serde(rename = "Delta")]
    #[tabled(rename = "Delta")]
    pub delta: String,
    #[serde(rename = "DeltaPct")]
    #[tabled(rename = "DeltaPct")]
    pub delta_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MarginRow {
    #[serde(rename = "Branch")]
    #[tabled(rename = "Branch")]
    pub branch: String,
    #[serde(rename = "Capability")]
    #[tabled(rename = "Capability")]
    pub capability: String,
    #[serde(rename = "Department / Team")]
    #[tabled(rename = "Department / Team")]
    pub department: String,
    #[serde(rename = "Job Title")]
    #[tabled(rename = "Job Title")]
    pub job_title: String,
    #[serde(rename = "ChargeRate")]
    #[tabled(rename = "ChargeRate")]
    pub charge_rate: String,
    #[serde(rename = "NewRate")]
    #[tabled(rename = "NewRate")]
    pub new_rate: String,
    #[serde(rename = "CostRate")]
    #[tabled(rename = "CostRate")]
    pub cost_rate: String,
    #[serde(rename = "OriginalMarginPct")]
    #[tabled(rename = "OriginalMarginPct")]
    pub original_margin: String,
    #[serde(rename = "NewMarginPct")]
    #[tabled(rename = "NewMarginPct")]
    pub new_margin: String,
}

#[derive(Debug, Serialize)]
pub struct UpliftSummary {
    pub uplift: UpliftSpec,
    pub model: RevenueModel,
    pub effective_month: String,
    pub selection: FilterSelection,
    pub total_rows: usize,
    pub affected_rows: usize,
    pub unaffected_rows: usize,
    pub original_total: f64,
    pub uplifted_total: f64,
    pub delta: f64,
    pub aggregate_margin_pct: Option<f64>,
    pub original_aggregate_margin_pct: Option<f64>,
    pub zero_rate_rows: usize,
    pub undefined_margin_rows: usize,
}

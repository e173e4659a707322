// Runtime configuration.
//
// Every field has a default matching the rate card export, so an absent or
// partial JSON file still yields a usable configuration.
use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub columns: ColumnNames,
    /// Zero-based data-row indices removed at load (summary rows).
    pub drop_rows: Vec<usize>,
    pub output: OutputConfig,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Header names and structural markers the schema resolver looks for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub branch: String,
    pub capability: String,
    pub department: String,
    pub job_title: String,
    pub charge_rate: String,
    pub cost_rate: String,
    pub revenue_suffix: String,
    pub billable_days_suffix: String,
    pub chargeability_suffix: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            branch: "Branch".to_string(),
            capability: "Capability".to_string(),
            department: "Department / Team".to_string(),
            job_title: "Job Title".to_string(),
            charge_rate: "Charge Rate Daily".to_string(),
            cost_rate: "Cost Rate Daily".to_string(),
            revenue_suffix: " Revenue".to_string(),
            billable_days_suffix: " Billable Days".to_string(),
            chargeability_suffix: " Chargeability".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub detail_csv: String,
    pub totals_csv: String,
    pub margin_csv: String,
    pub summary_json: String,
    pub preview_rows: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            detail_csv: "uplift_detail.csv".to_string(),
            totals_csv: "uplift_monthly_totals.csv".to_string(),
            margin_csv: "uplift_margins.csv".to_string(),
            summary_json: "uplift_summary.json".to_string(),
            preview_rows: 13,
        }
    }
}

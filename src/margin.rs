use crate::error::{ConfigError, Result};
use crate::schema::Schema;
use crate::uplift::UpliftedPartition;
use crate::util::mean_defined;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct RowMargin {
    pub id: usize,
    pub charge_rate: Option<f64>,
    pub new_rate: Option<f64>,
    pub cost_rate: Option<f64>,
    /// NaN when the rate before uplift is zero or missing.
    pub original_margin_pct: f64,
    /// NaN when the new rate is zero or missing.
    pub new_margin_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarginReport {
    pub rows: Vec<RowMargin>,
    /// Mean of the defined per-row margins; `None` when none are defined.
    pub aggregate_pct: Option<f64>,
    pub original_aggregate_pct: Option<f64>,
    pub undefined_rows: usize,
}

/// `(rate - cost) / rate * 100`, NaN when either side is missing or the
/// rate is zero.
pub fn margin_pct(rate: Option<f64>, cost: Option<f64>) -> f64 {
    match (rate, cost) {
        (Some(rate), Some(cost)) if rate != 0.0 => (rate - cost) / rate * 100.0,
        _ => f64::NAN,
    }
}

pub fn evaluate_margin(uplifted: &UpliftedPartition, schema: &Schema) -> Result<MarginReport> {
    if schema.charge_rate.is_none() {
        return Err(ConfigError::RateColumnRequired {
            column: "charge rate".to_string(),
            purpose: "margin evaluation",
        });
    }
    if schema.cost_rate.is_none() {
        return Err(ConfigError::RateColumnRequired {
            column: "cost rate".to_string(),
            purpose: "margin evaluation",
        });
    }

    let rows: Vec<RowMargin> = uplifted
        .rows
        .iter()
        .map(|r| RowMargin {
            id: r.source.id,
            charge_rate: r.source.charge_rate,
            new_rate: r.new_rate,
            cost_rate: r.source.cost_rate,
            original_margin_pct: margin_pct(r.source.charge_rate, r.source.cost_rate),
            new_margin_pct: margin_pct(r.new_rate, r.source.cost_rate),
        })
        .collect();

    let new: Vec<f64> = rows.iter().map(|r| r.new_margin_pct).collect();
    let original: Vec<f64> = rows.iter().map(|r| r.original_margin_pct).collect();
    let undefined_rows = new.iter().filter(|m| m.is_nan()).count();
    if undefined_rows > 0 {
        debug!(rows = undefined_rows, "rows without a defined margin left out of the average");
    }
    Ok(MarginReport {
        aggregate_pct: mean_defined(&new),
        original_aggregate_pct: mean_defined(&original),
        undefined_rows,
        rows,
    })
}

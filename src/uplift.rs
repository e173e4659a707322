// Uplift calculation.
//
// Revenue figures already carry headcount, billable days and chargeability,
// so by default an uplift scales the historical revenue instead of deriving
// it again. Percentage uplifts share one factor across rows; a fixed amount
// per day becomes a per-row ratio against that row's own charge rate.
use crate::dataset::{Dataset, Month, Row};
use crate::error::{ConfigError, Result};
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum UpliftSpec {
    /// Percentage increase, 0..=100.
    Percentage(f64),
    /// Fixed amount added to the daily charge rate, >= 0.
    FixedPerDay(f64),
}

impl UpliftSpec {
    pub fn mode(&self) -> &'static str {
        match self {
            UpliftSpec::Percentage(_) => "percentage",
            UpliftSpec::FixedPerDay(_) => "fixed-per-day",
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            UpliftSpec::Percentage(v) | UpliftSpec::FixedPerDay(v) => *v,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let v = self.value();
        let ok = match self {
            UpliftSpec::Percentage(_) => v.is_finite() && (0.0..=100.0).contains(&v),
            UpliftSpec::FixedPerDay(_) => v.is_finite() && v >= 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(ConfigError::InvalidUplift {
                mode: self.mode(),
                value: v,
            })
        }
    }

    fn row_uplift(&self, row: &Row) -> RowUplift {
        match *self {
            UpliftSpec::Percentage(pct) => percentage_uplift(row, pct),
            UpliftSpec::FixedPerDay(amount) => fixed_per_day_uplift(row, amount),
        }
    }
}

impl fmt::Display for UpliftSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpliftSpec::Percentage(v) => write!(f, "{}%", v),
            UpliftSpec::FixedPerDay(v) => write!(f, "+{} per day", v),
        }
    }
}

/// How in-scope revenue is produced for affected rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevenueModel {
    /// Scale the recorded revenue.
    #[default]
    Baseline,
    /// Rebuild revenue as new rate x billable days x chargeability.
    Recompute,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RowUplift {
    factor: f64,
    new_rate: Option<f64>,
    zero_rate: bool,
}

fn percentage_uplift(row: &Row, pct: f64) -> RowUplift {
    let factor = 1.0 + pct / 100.0;
    RowUplift {
        factor,
        new_rate: row.charge_rate.map(|r| r * factor),
        zero_rate: false,
    }
}

fn fixed_per_day_uplift(row: &Row, amount: f64) -> RowUplift {
    let rate = row.charge_rate.unwrap_or(0.0);
    let ratio = if rate > 0.0 { amount / rate } else { 0.0 };
    RowUplift {
        factor: 1.0 + ratio,
        new_rate: row.charge_rate.map(|r| r + amount),
        zero_rate: rate <= 0.0 && amount > 0.0,
    }
}

/// An affected row after uplift. `source` is an untouched copy of the input
/// row; `revenue` holds the uplifted figures.
#[derive(Debug, Clone, PartialEq)]
pub struct UpliftedRow {
    pub source: Row,
    pub revenue: Vec<f64>,
    pub new_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpliftedPartition {
    pub months: Vec<Month>,
    pub rows: Vec<UpliftedRow>,
    pub spec: UpliftSpec,
    pub effective_month: usize,
    pub model: RevenueModel,
    /// Rows whose zero or missing rate left fixed-per-day revenue unchanged.
    pub zero_rate_rows: usize,
}

/// Check that an uplift can run against `schema` before any row is touched.
pub fn validate(spec: &UpliftSpec, effective_month: usize, schema: &Schema, model: RevenueModel) -> Result<()> {
    spec.validate()?;
    if effective_month >= schema.months.len() {
        return Err(ConfigError::EffectiveMonthOutOfRange {
            index: effective_month,
            months: schema.months.len(),
        });
    }
    let charge_rate_needed = match (spec, model) {
        (_, RevenueModel::Recompute) => Some("revenue recomputation"),
        (UpliftSpec::FixedPerDay(_), _) => Some("fixed-per-day uplift"),
        _ => None,
    };
    if let (Some(purpose), None) = (charge_rate_needed, &schema.charge_rate) {
        return Err(ConfigError::RateColumnRequired {
            column: "charge rate".to_string(),
            purpose,
        });
    }
    if model == RevenueModel::Recompute {
        for m in &schema.months[effective_month..] {
            if m.billable_days.is_none() {
                return Err(ConfigError::MonthDataRequired {
                    month: m.label.clone(),
                    kind: "billable days",
                });
            }
            if m.chargeability.is_none() {
                return Err(ConfigError::MonthDataRequired {
                    month: m.label.clone(),
                    kind: "chargeability",
                });
            }
        }
    }
    Ok(())
}

pub fn apply_uplift(
    affected: &Dataset,
    spec: &UpliftSpec,
    effective_month: usize,
    schema: &Schema,
) -> Result<UpliftedPartition> {
    apply_uplift_with(affected, spec, effective_month, schema, RevenueModel::Baseline)
}

pub fn apply_uplift_with(
    affected: &Dataset,
    spec: &UpliftSpec,
    effective_month: usize,
    schema: &Schema,
    model: RevenueModel,
) -> Result<UpliftedPartition> {
    validate(spec, effective_month, schema, model)?;
    if affected.months.len() != schema.months.len() {
        return Err(ConfigError::MonthMismatch);
    }

    let mut zero_rate_rows = 0usize;
    let rows: Vec<UpliftedRow> = affected
        .rows
        .iter()
        .map(|row| {
            let up = spec.row_uplift(row);
            // Recompute rebuilds revenue from the new rate; only a missing rate is left behind.
            if up.zero_rate && (model == RevenueModel::Baseline || up.new_rate.is_none()) {
                zero_rate_rows += 1;
            }
            let mut revenue = row.revenue.clone();
            for (m, value) in revenue.iter_mut().enumerate().skip(effective_month) {
                *value = match model {
                    RevenueModel::Baseline => *value * up.factor,
                    RevenueModel::Recompute => recomputed(row, m, up.new_rate).unwrap_or(*value),
                };
            }
            UpliftedRow {
                source: row.clone(),
                revenue,
                new_rate: up.new_rate,
            }
        })
        .collect();

    if zero_rate_rows > 0 {
        warn!(rows = zero_rate_rows, "rows without a charge rate received no fixed-per-day uplift");
    }
    debug!(rows = rows.len(), spec = %spec, effective_month, ?model, "uplift applied");
    Ok(UpliftedPartition {
        months: affected.months.clone(),
        rows,
        spec: *spec,
        effective_month,
        model,
        zero_rate_rows,
    })
}

fn recomputed(row: &Row, month: usize, new_rate: Option<f64>) -> Option<f64> {
    let days = row.billable_days.get(month).copied().flatten()?;
    let chargeability = row.chargeability.get(month).copied().flatten()?;
    Some(new_rate? * days * chargeability)
}

use crate::dataset::{Dataset, Month, Row};
use crate::error::{ConfigError, Result};
use crate::uplift::UpliftedPartition;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledRow {
    pub source: Row,
    pub revenue: Vec<f64>,
    /// New rate for affected rows, the unchanged charge rate otherwise.
    pub uplifted_rate: Option<f64>,
    pub affected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    pub label: String,
    pub index: usize,
    pub original: f64,
    pub uplifted: f64,
    pub delta: f64,
}

/// Totals for months at or after the effective month, plus their sum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotals {
    pub effective_month: usize,
    pub months: Vec<MonthTotal>,
    pub original: f64,
    pub uplifted: f64,
    pub delta: f64,
}

impl MonthlyTotals {
    pub fn month(&self, label: &str) -> Option<&MonthTotal> {
        self.months.iter().find(|m| m.label == label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub months: Vec<Month>,
    /// Every input row once, in original table order.
    pub rows: Vec<ReconciledRow>,
    pub totals: MonthlyTotals,
}

pub fn reconcile(uplifted: &UpliftedPartition, unaffected: &Dataset) -> Result<Reconciliation> {
    if uplifted.months != unaffected.months {
        return Err(ConfigError::MonthMismatch);
    }

    let mut rows: Vec<ReconciledRow> = uplifted
        .rows
        .iter()
        .map(|r| ReconciledRow {
            source: r.source.clone(),
            revenue: r.revenue.clone(),
            uplifted_rate: r.new_rate,
            affected: true,
        })
        .chain(unaffected.rows.iter().map(|r| ReconciledRow {
            source: r.clone(),
            revenue: r.revenue.clone(),
            uplifted_rate: r.charge_rate,
            affected: false,
        }))
        .collect();

    let width = uplifted.months.len();
    let mut seen = HashSet::with_capacity(rows.len());
    for row in &rows {
        if row.revenue.len() != width || row.source.revenue.len() != width {
            return Err(ConfigError::MonthMismatch);
        }
        if !seen.insert(row.source.id) {
            return Err(ConfigError::DuplicateRow(row.source.id));
        }
    }
    rows.sort_by_key(|r| r.source.id);

    let totals = monthly_totals(&uplifted.months, &rows, uplifted.effective_month);
    debug!(rows = rows.len(), delta = totals.delta, "partitions reconciled");
    Ok(Reconciliation {
        months: uplifted.months.clone(),
        rows,
        totals,
    })
}

fn monthly_totals(months: &[Month], rows: &[ReconciledRow], effective_month: usize) -> MonthlyTotals {
    let per_month: Vec<MonthTotal> = months
        .iter()
        .enumerate()
        .skip(effective_month)
        .map(|(index, month)| {
            let original: f64 = rows.iter().map(|r| r.source.revenue[index]).sum();
            let uplifted: f64 = rows.iter().map(|r| r.revenue[index]).sum();
            MonthTotal {
                label: month.label.clone(),
                index,
                original,
                uplifted,
                delta: uplifted - original,
            }
        })
        .collect();
    let original: f64 = per_month.iter().map(|m| m.original).sum();
    let uplifted: f64 = per_month.iter().map(|m| m.uplifted).sum();
    MonthlyTotals {
        effective_month,
        months: per_month,
        original,
        uplifted,
        delta: uplifted - original,
    }
}

use crate::dataset::Row;
use crate::engine::{UpliftOutcome, UpliftScenario};
use crate::margin::MarginReport;
use crate::reconcile::MonthlyTotals;
use crate::schema::Dimension;
use crate::types::{MarginRow, MonthlyTotalRow, UpliftSummary};
use crate::util::{format_number, format_optional};
use std::collections::HashMap;

fn delta_pct(original: f64, delta: f64) -> String {
    if original.abs() < f64::EPSILON {
        return "n/a".to_string();
    }
    format_number(delta / original * 100.0, 2)
}

/// One row per in-scope month followed by an overall row.
pub fn monthly_totals_report(totals: &MonthlyTotals) -> Vec<MonthlyTotalRow> {
    let mut rows: Vec<MonthlyTotalRow> = totals
        .months
        .iter()
        .map(|m| MonthlyTotalRow {
            month: m.label.clone(),
            original: format_number(m.original, 2),
            uplifted: format_number(m.uplifted, 2),
            delta: format_number(m.delta, 2),
            delta_pct: delta_pct(m.original, m.delta),
        })
        .collect();
    rows.push(MonthlyTotalRow {
        month: "Total".to_string(),
        original: format_number(totals.original, 2),
        uplifted: format_number(totals.uplifted, 2),
        delta: format_number(totals.delta, 2),
        delta_pct: delta_pct(totals.original, totals.delta),
    });
    rows
}

pub fn margin_report(margin: &MarginReport, outcome: &UpliftOutcome) -> Vec<MarginRow> {
    let by_id: HashMap<usize, &Row> = outcome
        .reconciliation
        .rows
        .iter()
        .map(|r| (r.source.id, &r.source))
        .collect();
    let dim = |id: usize, d: Dimension| {
        by_id
            .get(&id)
            .and_then(|r| r.dimension(d))
            .unwrap_or("")
            .to_string()
    };
    margin
        .rows
        .iter()
        .map(|m| MarginRow {
            branch: dim(m.id, Dimension::Branch),
            capability: dim(m.id, Dimension::Capability),
            department: dim(m.id, Dimension::Department),
            job_title: dim(m.id, Dimension::JobTitle),
            charge_rate: format_optional(m.charge_rate, 2),
            new_rate: format_optional(m.new_rate, 2),
            cost_rate: format_optional(m.cost_rate, 2),
            original_margin: format_number(m.original_margin_pct, 2),
            new_margin: format_number(m.new_margin_pct, 2),
        })
        .collect()
}

/// Header and records for the detail export: every row with its uplifted
/// revenue per month.
pub fn detail_table(outcome: &UpliftOutcome) -> (Vec<String>, Vec<Vec<String>>) {
    let rec = &outcome.reconciliation;
    let mut header: Vec<String> = Dimension::ALL.iter().map(|d| d.label().to_string()).collect();
    header.extend(["Charge Rate Daily", "Uplifted Rate Daily", "Affected"].map(String::from));
    header.extend(rec.months.iter().map(|m| m.label.clone()));

    let records = rec
        .rows
        .iter()
        .map(|r| {
            let mut cells: Vec<String> = Dimension::ALL
                .iter()
                .map(|d| r.source.dimension(*d).unwrap_or("").to_string())
                .collect();
            cells.push(r.source.charge_rate.map(|v| v.to_string()).unwrap_or_default());
            cells.push(r.uplifted_rate.map(|v| format!("{:.2}", v)).unwrap_or_default());
            cells.push(if r.affected { "Y" } else { "N" }.to_string());
            cells.extend(r.revenue.iter().map(|v| format!("{:.2}", v)));
            cells
        })
        .collect();
    (header, records)
}

pub fn generate_summary(outcome: &UpliftOutcome, scenario: &UpliftScenario) -> UpliftSummary {
    let rec = &outcome.reconciliation;
    UpliftSummary {
        uplift: scenario.spec,
        model: scenario.model,
        effective_month: rec
            .months
            .get(scenario.effective_month)
            .map(|m| m.label.clone())
            .unwrap_or_default(),
        selection: scenario.selection.clone(),
        total_rows: rec.rows.len(),
        affected_rows: outcome.affected_rows,
        unaffected_rows: outcome.unaffected_rows,
        original_total: rec.totals.original,
        uplifted_total: rec.totals.uplifted,
        delta: rec.totals.delta,
        aggregate_margin_pct: outcome.margin.as_ref().and_then(|m| m.aggregate_pct),
        original_aggregate_margin_pct: outcome.margin.as_ref().and_then(|m| m.original_aggregate_pct),
        zero_rate_rows: outcome.zero_rate_rows,
        undefined_margin_rows: outcome.margin.as_ref().map(|m| m.undefined_rows).unwrap_or(0),
    }
}

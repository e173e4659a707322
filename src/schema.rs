// Schema resolution.
//
// Column positions are discovered once from the header row and carried in an
// immutable `Schema` passed to every later stage, so nothing downstream looks
// columns up by name or by fixed offset.
use crate::config::ColumnNames;
use crate::error::{ConfigError, Result};
use crate::util::parse_month_label;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Categorical columns used only for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    Branch,
    Capability,
    Department,
    JobTitle,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Branch,
        Dimension::Capability,
        Dimension::Department,
        Dimension::JobTitle,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Branch => "Branch",
            Dimension::Capability => "Capability",
            Dimension::Department => "Department / Team",
            Dimension::JobTitle => "Job Title",
        }
    }

    fn column_name(self, names: &ColumnNames) -> &str {
        match self {
            Dimension::Branch => &names.branch,
            Dimension::Capability => &names.capability,
            Dimension::Department => &names.department,
            Dimension::JobTitle => &names.job_title,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub name: String,
    pub index: usize,
}

/// One calendar month and the header positions that carry its figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthColumn {
    pub label: String,
    /// First day of the month; `None` when the label could not be parsed.
    pub date: Option<NaiveDate>,
    pub revenue: usize,
    pub billable_days: Option<usize>,
    pub chargeability: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub dimensions: [Option<ColumnRef>; 4],
    pub charge_rate: Option<ColumnRef>,
    pub cost_rate: Option<ColumnRef>,
    /// Chronological; unparsed labels last in header order.
    pub months: Vec<MonthColumn>,
    pub unparsed_months: Vec<String>,
}

impl Schema {
    pub fn dimension(&self, dim: Dimension) -> Option<&ColumnRef> {
        self.dimensions[dim.index()].as_ref()
    }

    pub fn month_labels(&self) -> Vec<String> {
        self.months.iter().map(|m| m.label.clone()).collect()
    }

    /// Position of a month given either its exact label or any supported
    /// month format (`Feb-25` finds a `2025-02` column).
    pub fn month_index(&self, label: &str) -> Result<usize> {
        let wanted = label.trim();
        if let Some(i) = self
            .months
            .iter()
            .position(|m| m.label.eq_ignore_ascii_case(wanted))
        {
            return Ok(i);
        }
        parse_month_label(wanted)
            .and_then(|d| self.months.iter().position(|m| m.date == Some(d)))
            .ok_or_else(|| ConfigError::UnknownMonth(wanted.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MonthKey {
    Date(NaiveDate),
    Label(String),
}

impl MonthKey {
    fn of(label: &str) -> Self {
        match parse_month_label(label) {
            Some(d) => MonthKey::Date(d),
            None => MonthKey::Label(label.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MonthKind {
    Revenue,
    BillableDays,
    Chargeability,
}

fn strip_suffix_ci<'a>(header: &'a str, suffix: &str) -> Option<&'a str> {
    if suffix.is_empty() || header.len() <= suffix.len() {
        return None;
    }
    let cut = header.len() - suffix.len();
    if !header.is_char_boundary(cut) || !header[cut..].eq_ignore_ascii_case(suffix) {
        return None;
    }
    Some(header[..cut].trim())
}

fn find_exact(headers: &[String], name: &str) -> Option<ColumnRef> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .map(|index| ColumnRef { name: name.to_string(), index })
}

/// Resolve the named and month-indexed columns of a header row.
pub fn resolve(headers: &[String], names: &ColumnNames) -> Result<Schema> {
    let dimensions = Dimension::ALL.map(|d| find_exact(headers, d.column_name(names)));
    let charge_rate = find_exact(headers, &names.charge_rate);
    let cost_rate = find_exact(headers, &names.cost_rate);

    let named: Vec<usize> = dimensions
        .iter()
        .chain([&charge_rate, &cost_rate])
        .flatten()
        .map(|c| c.index)
        .collect();

    let mut revenue: Vec<(String, Option<NaiveDate>, usize)> = Vec::new();
    let mut extras: HashMap<(MonthKey, u8), usize> = HashMap::new();

    for (idx, header) in headers.iter().enumerate() {
        if named.contains(&idx) {
            continue;
        }
        let header = header.trim();
        let classified = [
            (MonthKind::Revenue, &names.revenue_suffix),
            (MonthKind::BillableDays, &names.billable_days_suffix),
            (MonthKind::Chargeability, &names.chargeability_suffix),
        ]
        .into_iter()
        .find_map(|(kind, suffix)| strip_suffix_ci(header, suffix).map(|l| (kind, l)))
        .or_else(|| parse_month_label(header).map(|_| (MonthKind::Revenue, header)));

        match classified {
            Some((MonthKind::Revenue, label)) => {
                revenue.push((label.to_string(), parse_month_label(label), idx));
            }
            Some((kind, label)) => {
                let slot = if kind == MonthKind::BillableDays { 0 } else { 1 };
                extras.entry((MonthKey::of(label), slot)).or_insert(idx);
            }
            None => {}
        }
    }

    if revenue.is_empty() {
        return Err(ConfigError::NoMonthColumns);
    }

    let mut seen: Vec<MonthKey> = Vec::with_capacity(revenue.len());
    for (label, _, _) in &revenue {
        let key = MonthKey::of(label);
        if seen.contains(&key) {
            return Err(ConfigError::DuplicateMonth(label.clone()));
        }
        seen.push(key);
    }

    // Stable sort keeps undated labels in header order after every dated one.
    revenue.sort_by_key(|(_, date, _)| (date.is_none(), *date));

    let mut unparsed_months = Vec::new();
    let months: Vec<MonthColumn> = revenue
        .into_iter()
        .map(|(label, date, idx)| {
            let key = MonthKey::of(&label);
            if date.is_none() {
                warn!(month = %label, "month label could not be parsed; ordered last");
                unparsed_months.push(label.clone());
            }
            MonthColumn {
                billable_days: extras.remove(&(key.clone(), 0)),
                chargeability: extras.remove(&(key, 1)),
                label,
                date,
                revenue: idx,
            }
        })
        .collect();

    for ((key, _), idx) in &extras {
        debug!(column = %headers[*idx], ?key, "month data column has no matching revenue column");
    }
    debug!(months = months.len(), "schema resolved");

    Ok(Schema {
        dimensions,
        charge_rate,
        cost_rate,
        months,
        unparsed_months,
    })
}

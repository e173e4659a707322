// Utility helpers for parsing and basic statistics.
//
// This module centralizes the "dirty" spreadsheet number/date handling so the
// engine can assume clean, typed values.
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in spreadsheet exports.
///
/// - Trims whitespace.
/// - Strips currency symbols and thousands separators like `","`.
/// - Treats `(1,200)` as `-1200`, the accounting notation for negatives.
/// - Rejects values that contain alphabetic characters.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let (negative, body) = match s.strip_prefix('(').and_then(|b| b.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, s),
    };
    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | ' '))
        .collect();
    let v = cleaned.parse::<f64>().ok()?;
    if !v.is_finite() {
        return None;
    }
    Some(if negative { -v } else { v })
}

/// Parse a chargeability cell. `85%` becomes `0.85`; a plain number is
/// taken as already being a fraction.
pub fn parse_fraction_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    match s.strip_suffix('%') {
        Some(pct) => parse_f64_safe(Some(pct)).map(|v| v / 100.0),
        None => parse_f64_safe(Some(s)),
    }
}

// Labels without a day component are prefixed with "01 " before parsing.
const MONTH_FORMATS: &[&str] = &["%d %b-%y", "%d %b %y", "%d %b %Y", "%d %B %Y", "%d %Y-%m", "%d %m/%Y"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a month-like column label (`Jan-25`, `January 2025`, `2025-01`,
/// `2025-01-01 00:00:00`, ...) into the first day of that month.
pub fn parse_month_label(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let padded = format!("01 {}", s);
    let date = MONTH_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(&padded, f).ok())
        .or_else(|| DATE_FORMATS.iter().find_map(|f| NaiveDate::parse_from_str(s, f).ok()))
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })?;
    date.with_day(1)
}

/// Arithmetic mean of the finite values in `v`; `None` when there are none.
pub fn mean_defined(v: &[f64]) -> Option<f64> {
    let defined: Vec<f64> = v.iter().copied().filter(|x| x.is_finite()).collect();
    if defined.is_empty() {
        return None;
    }
    Some(defined.iter().sum::<f64>() / defined.len() as f64)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    if !n.is_finite() {
        return "n/a".to_string();
    }
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    // Rounding can turn a tiny negative into "0.00"; keep the sign off then.
    let is_zero = res.chars().all(|c| matches!(c, '0' | '.' | ','));
    if n.is_sign_negative() && !is_zero {
        format!("-{}", res)
    } else {
        res
    }
}

/// `format_number` for optional values, rendering `None` as `n/a`.
pub fn format_optional(n: Option<f64>, decimals: usize) -> String {
    n.map(|v| format_number(v, decimals))
        .unwrap_or_else(|| "n/a".to_string())
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

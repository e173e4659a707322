use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a header plus pre-rendered records, for exports whose columns are
/// only known at runtime (one column per month).
pub fn write_records(
    path: impl AsRef<Path>,
    header: &[String],
    records: &[Vec<String>],
) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(header)?;
    for r in records {
        wtr.write_record(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn render_table<T>(rows: &[T], max_rows: usize) -> Option<String>
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        return None;
    }
    Some(Table::new(slice).with(Style::markdown()).to_string())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    match render_table(rows, max_rows) {
        Some(table) => println!("{}\n", table),
        None => println!("(no rows)\n"),
    }
    if rows.len() > max_rows {
        println!("... {} more rows\n", rows.len() - max_rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MonthlyTotalRow;

    fn row(month: &str) -> MonthlyTotalRow {
        MonthlyTotalRow {
            month: month.to_string(),
            original: "1,000.00".to_string(),
            uplifted: "1,100.00".to_string(),
            delta: "100.00".to_string(),
            delta_pct: "10.00".to_string(),
        }
    }

    #[test]
    fn writes_serialized_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("totals.csv");
        write_csv(&path, &[row("Feb-25")]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Month,OriginalRevenue,UpliftedRevenue,Delta,DeltaPct"));
        assert_eq!(lines.next(), Some("Feb-25,\"1,000.00\",\"1,100.00\",100.00,10.00"));
    }

    #[test]
    fn writes_dynamic_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detail.csv");
        let header = vec!["Branch".to_string(), "Jan-25".to_string()];
        write_records(&path, &header, &[vec!["Sydney".to_string(), "1210.00".to_string()]]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Branch,Jan-25\nSydney,1210.00\n");
    }

    #[test]
    fn writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_json(&path, &serde_json::json!({"delta": 110.0})).unwrap();
        let back: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back["delta"], 110.0);
    }

    #[test]
    fn renders_markdown_preview() {
        let table = render_table(&[row("Feb-25"), row("Mar-25")], 1).unwrap();
        assert!(table.contains("| Month"));
        assert!(table.contains("Feb-25"));
        assert!(!table.contains("Mar-25"));
        assert!(render_table::<MonthlyTotalRow>(&[], 5).is_none());
    }
}

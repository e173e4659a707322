use crate::error::LoadError;
use csv::{ReaderBuilder, Trim};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Header row plus raw string cells, exactly as exported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl RawTable {
    /// Cell text for a row/column pair; short (flexible) records yield `None`.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.records.get(row)?.get(col).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub dropped_rows: usize,
    pub blank_rows: usize,
}

pub fn load_table(path: impl AsRef<Path>, drop_rows: &[usize]) -> Result<(RawTable, LoadReport), LoadError> {
    let file = std::fs::File::open(path)?;
    read_table(file, drop_rows)
}

/// Read CSV text into a `RawTable`, removing the listed data rows and any
/// fully blank rows.
pub fn read_table<R: Read>(reader: R, drop_rows: &[usize]) -> Result<(RawTable, LoadReport), LoadError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::EmptyFile);
    }

    let drop: HashSet<usize> = drop_rows.iter().copied().collect();
    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        report.total_rows += 1;
        if drop.contains(&idx) {
            report.dropped_rows += 1;
            continue;
        }
        if record.iter().all(|c| c.trim().is_empty()) {
            report.blank_rows += 1;
            continue;
        }
        records.push(record.iter().map(str::to_string).collect());
    }
    report.kept_rows = records.len();
    debug!(
        total = report.total_rows,
        kept = report.kept_rows,
        dropped = report.dropped_rows,
        "rate card loaded"
    );
    Ok((RawTable { headers, records }, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "Branch , Job Title,Jan-25 Revenue\n\
                       Sydney,Analyst,1000\n\
                       ,,\n\
                       Perth,Engineer,2000\n\
                       Total,,3000\n";

    #[test]
    fn drops_listed_and_blank_rows() {
        let (table, report) = read_table(CSV.as_bytes(), &[3]).unwrap();
        assert_eq!(table.headers, vec!["Branch", "Job Title", "Jan-25 Revenue"]);
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.cell(1, 0), Some("Perth"));
        assert_eq!(
            report,
            LoadReport { total_rows: 4, kept_rows: 2, dropped_rows: 1, blank_rows: 1 }
        );
    }

    #[test]
    fn short_records_have_no_trailing_cells() {
        let (table, _) = read_table("A,B,C\n1,2\n".as_bytes(), &[]).unwrap();
        assert_eq!(table.cell(0, 1), Some("2"));
        assert_eq!(table.cell(0, 2), None);
        assert_eq!(table.cell(5, 0), None);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(read_table("".as_bytes(), &[]), Err(LoadError::EmptyFile)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        let (table, report) = load_table(file.path(), &[]).unwrap();
        assert_eq!(table.records.len(), 3);
        assert_eq!(report.blank_rows, 1);
    }
}

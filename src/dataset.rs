use crate::error::{ConfigError, Result};
use crate::loader::RawTable;
use crate::schema::{ColumnRef, Dimension, Schema};
use crate::util::{parse_f64_safe, parse_fraction_safe};
use chrono::NaiveDate;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct Month {
    pub label: String,
    pub date: Option<NaiveDate>,
}

/// One billable role. `id` is the row's position in the loaded table and is
/// the identity used when partitions are merged back together.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: usize,
    pub dimensions: [Option<String>; 4],
    pub charge_rate: Option<f64>,
    pub cost_rate: Option<f64>,
    pub revenue: Vec<f64>,
    pub billable_days: Vec<Option<f64>>,
    pub chargeability: Vec<Option<f64>>,
}

impl Row {
    pub fn dimension(&self, dim: Dimension) -> Option<&str> {
        self.dimensions[dim.index()].as_deref()
    }
}

/// Rows sharing one month sequence. Transformations produce new values and
/// never write into a dataset they were handed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub months: Vec<Month>,
    pub rows: Vec<Row>,
    pub missing_revenue_cells: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Same month sequence, no rows.
    pub fn empty_like(&self) -> Dataset {
        Dataset {
            months: self.months.clone(),
            rows: Vec::new(),
            missing_revenue_cells: 0,
        }
    }

    pub fn from_table(table: &RawTable, schema: &Schema) -> Result<Dataset> {
        let months: Vec<Month> = schema
            .months
            .iter()
            .map(|m| Month {
                label: m.label.clone(),
                date: m.date,
            })
            .collect();

        let mut missing_revenue_cells = 0usize;
        let mut rows = Vec::with_capacity(table.records.len());
        for id in 0..table.records.len() {
            let dimensions = Dimension::ALL.map(|d| {
                schema
                    .dimension(d)
                    .and_then(|c| table.cell(id, c.index))
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            });
            let charge_rate = read_rate(table, id, schema.charge_rate.as_ref())?;
            let cost_rate = read_rate(table, id, schema.cost_rate.as_ref())?;

            let mut revenue = Vec::with_capacity(months.len());
            let mut billable_days = Vec::with_capacity(months.len());
            let mut chargeability = Vec::with_capacity(months.len());
            for m in &schema.months {
                let value = parse_f64_safe(table.cell(id, m.revenue));
                if value.is_none() {
                    missing_revenue_cells += 1;
                }
                revenue.push(value.unwrap_or(0.0));
                billable_days.push(m.billable_days.and_then(|c| parse_f64_safe(table.cell(id, c))));
                chargeability.push(m.chargeability.and_then(|c| parse_fraction_safe(table.cell(id, c))));
            }

            rows.push(Row {
                id,
                dimensions,
                charge_rate,
                cost_rate,
                revenue,
                billable_days,
                chargeability,
            });
        }
        debug!(rows = rows.len(), missing_revenue_cells, "dataset built");
        Ok(Dataset {
            months,
            rows,
            missing_revenue_cells,
        })
    }
}

// Blank is `None`; anything present must be a non-negative number.
fn read_rate(table: &RawTable, row: usize, column: Option<&ColumnRef>) -> Result<Option<f64>> {
    let Some(column) = column else {
        return Ok(None);
    };
    let raw = table.cell(row, column.index).unwrap_or("").trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match parse_f64_safe(Some(raw)) {
        Some(v) if v >= 0.0 => Ok(Some(v)),
        _ => Err(ConfigError::InvalidCell {
            row,
            column: column.name.clone(),
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnNames;
    use crate::loader::read_table;
    use crate::schema::resolve;

    fn build(csv: &str) -> Result<Dataset> {
        let (table, _) = read_table(csv.as_bytes(), &[]).unwrap();
        let schema = resolve(&table.headers, &ColumnNames::default())?;
        Dataset::from_table(&table, &schema)
    }

    #[test]
    fn builds_typed_rows() {
        let ds = build(
            "Branch,Job Title,Charge Rate Daily,Cost Rate Daily,Feb-25 Revenue,Jan-25 Revenue,Jan-25 Billable Days,Jan-25 Chargeability\n\
             Sydney, Analyst ,\"1,000\",600,\"$2,200\",2000,20,85%\n\
             ,Engineer,,,,n/a,,\n",
        )
        .unwrap();
        assert_eq!(ds.months.iter().map(|m| m.label.as_str()).collect::<Vec<_>>(), vec!["Jan-25", "Feb-25"]);
        let a = &ds.rows[0];
        assert_eq!(a.id, 0);
        assert_eq!(a.dimension(Dimension::JobTitle), Some("Analyst"));
        assert_eq!(a.dimension(Dimension::Capability), None);
        assert_eq!(a.charge_rate, Some(1000.0));
        assert_eq!(a.cost_rate, Some(600.0));
        assert_eq!(a.revenue, vec![2000.0, 2200.0]);
        assert_eq!(a.billable_days, vec![Some(20.0), None]);
        assert_eq!(a.chargeability, vec![Some(0.85), None]);

        let b = &ds.rows[1];
        assert_eq!(b.dimension(Dimension::Branch), None);
        assert_eq!(b.charge_rate, None);
        assert_eq!(b.revenue, vec![0.0, 0.0]);
        assert_eq!(ds.missing_revenue_cells, 2);
    }

    #[test]
    fn negative_rate_is_rejected() {
        let err = build("Charge Rate Daily,Jan-25 Revenue\n-50,100\n").unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidCell {
                row: 0,
                column: "Charge Rate Daily".to_string(),
                value: "-50".to_string()
            }
        );
    }

    #[test]
    fn text_rate_is_rejected() {
        assert!(matches!(
            build("Cost Rate Daily,Jan-25 Revenue\nTBC,100\n"),
            Err(ConfigError::InvalidCell { .. })
        ));
    }
}

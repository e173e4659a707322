use crate::dataset::{Dataset, Row};
use crate::error::{ConfigError, Result};
use crate::schema::{Dimension, Schema};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Allowed values per dimension. A dimension with no entry, or an empty
/// set, places no constraint on rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "SelectionSets")]
pub struct FilterSelection {
    sets: BTreeMap<Dimension, BTreeSet<String>>,
}

// Deserialized form; routed through `set` so empty sets are dropped.
#[derive(Deserialize)]
struct SelectionSets {
    #[serde(default)]
    sets: BTreeMap<Dimension, BTreeSet<String>>,
}

impl From<SelectionSets> for FilterSelection {
    fn from(raw: SelectionSets) -> Self {
        let mut selection = FilterSelection::new();
        for (dim, values) in raw.sets {
            selection.set(dim, values);
        }
        selection
    }
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<I, S>(mut self, dim: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(dim, values);
        self
    }

    pub fn set<I, S>(&mut self, dim: Dimension, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if set.is_empty() {
            self.sets.remove(&dim);
        } else {
            self.sets.insert(dim, set);
        }
    }

    pub fn values(&self, dim: Dimension) -> Option<&BTreeSet<String>> {
        self.sets.get(&dim)
    }

    pub fn is_match_all(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Disjoint, exhaustive split of a dataset. Rows keep their ids and original
/// order within each side.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub affected: Dataset,
    pub unaffected: Dataset,
}

/// Sorted distinct non-blank values of a dimension.
pub fn distinct_values(dataset: &Dataset, dim: Dimension) -> Vec<String> {
    let set: BTreeSet<&str> = dataset.rows.iter().filter_map(|r| r.dimension(dim)).collect();
    set.into_iter().map(str::to_string).collect()
}

pub fn partition(dataset: &Dataset, schema: &Schema, selection: &FilterSelection) -> Result<Partition> {
    let mut active: Vec<(Dimension, &BTreeSet<String>)> = Vec::new();
    for (&dim, allowed) in &selection.sets {
        if schema.dimension(dim).is_none() {
            return Err(ConfigError::MissingColumn(dim.label().to_string()));
        }
        let observed: BTreeSet<String> = distinct_values(dataset, dim).into_iter().collect();
        for value in allowed.difference(&observed) {
            warn!(dimension = dim.label(), value = %value, "selected value not present in data");
        }
        // Selecting every observed value is the same as selecting "All".
        if !observed.is_empty() && observed.is_subset(allowed) {
            debug!(dimension = dim.label(), "full selection treated as no filter");
            continue;
        }
        active.push((dim, allowed));
    }

    let matches = |row: &Row| {
        active
            .iter()
            .all(|(dim, allowed)| row.dimension(*dim).is_some_and(|v| allowed.contains(v)))
    };

    let mut affected = dataset.empty_like();
    let mut unaffected = dataset.empty_like();
    for row in &dataset.rows {
        if matches(row) {
            affected.rows.push(row.clone());
        } else {
            unaffected.rows.push(row.clone());
        }
    }
    debug!(
        affected = affected.len(),
        unaffected = unaffected.len(),
        "rows partitioned"
    );
    Ok(Partition { affected, unaffected })
}

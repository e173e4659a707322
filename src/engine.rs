// One uplift request, end to end: Filter -> Uplift -> Reconcile -> Evaluate.
//
// The dataset is borrowed for the whole pass and never written; every stage
// returns a new value, so repeated runs with different scenarios are
// independent of each other.
use crate::dataset::Dataset;
use crate::error::{ConfigError, Result};
use crate::filter::{partition, FilterSelection};
use crate::margin::{evaluate_margin, MarginReport};
use crate::reconcile::{reconcile, Reconciliation};
use crate::schema::Schema;
use crate::uplift::{apply_uplift_with, validate, RevenueModel, UpliftSpec};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpliftScenario {
    pub selection: FilterSelection,
    pub spec: UpliftSpec,
    pub effective_month: usize,
    #[serde(default)]
    pub model: RevenueModel,
}

impl UpliftScenario {
    pub fn new(selection: FilterSelection, spec: UpliftSpec, effective_month: usize) -> Self {
        Self {
            selection,
            spec,
            effective_month,
            model: RevenueModel::Baseline,
        }
    }

    pub fn with_model(mut self, model: RevenueModel) -> Self {
        self.model = model;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpliftOutcome {
    pub affected_rows: usize,
    pub unaffected_rows: usize,
    pub reconciliation: Reconciliation,
    /// `None` when the charge or cost rate column is not in the schema.
    pub margin: Option<MarginReport>,
    pub zero_rate_rows: usize,
}

pub fn run(dataset: &Dataset, schema: &Schema, scenario: &UpliftScenario) -> Result<UpliftOutcome> {
    validate(&scenario.spec, scenario.effective_month, schema, scenario.model)?;

    let parts = partition(dataset, schema, &scenario.selection)?;
    let uplifted = apply_uplift_with(
        &parts.affected,
        &scenario.spec,
        scenario.effective_month,
        schema,
        scenario.model,
    )?;
    let reconciliation = reconcile(&uplifted, &parts.unaffected)?;
    if reconciliation.rows.len() != dataset.len() {
        return Err(ConfigError::CardinalityMismatch {
            expected: dataset.len(),
            actual: reconciliation.rows.len(),
        });
    }

    let margin = if schema.charge_rate.is_some() && schema.cost_rate.is_some() {
        Some(evaluate_margin(&uplifted, schema)?)
    } else {
        None
    };

    info!(
        affected = parts.affected.len(),
        unaffected = parts.unaffected.len(),
        delta = reconciliation.totals.delta,
        "uplift scenario evaluated"
    );
    Ok(UpliftOutcome {
        affected_rows: parts.affected.len(),
        unaffected_rows: parts.unaffected.len(),
        reconciliation,
        margin,
        zero_rate_rows: uplifted.zero_rate_rows,
    })
}

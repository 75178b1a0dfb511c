//! Completed work package analytics

use chrono::{DateTime, Utc};
use hubstore::{IndexValue, Record};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// A work package that has been closed out on the hangar floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedWorkPackage {
    pub id: String,
    pub work_package_id: String,
    #[serde(default)]
    pub sprint_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Passed inspection without rework
    pub first_pass_success: bool,
    #[serde(default)]
    pub rework_count: u32,
    #[serde(default)]
    pub planned_minutes: Option<u32>,
    #[serde(default)]
    pub actual_minutes: Option<u32>,
    #[serde(default)]
    pub assigned_personnel_count: Option<u32>,
    /// low, medium, high or aog
    #[serde(default = "default_criticality")]
    pub criticality: String,
    #[serde(default)]
    pub updated_at: i64,
}

fn default_criticality() -> String {
    "medium".to_string()
}

impl CompletedWorkPackage {
    /// Actual minutes, falling back to the elapsed time between start and completion
    pub fn effective_actual_minutes(&self) -> Option<u32> {
        self.actual_minutes.or_else(|| {
            let elapsed = (self.completed_at - self.started_at).num_minutes();
            u32::try_from(elapsed).ok()
        })
    }
}

impl Record for CompletedWorkPackage {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn collection_name() -> &'static str {
        "completed_work_packages"
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        let mut fields = HashMap::new();
        fields.insert("work_package_id".to_string(), IndexValue::String(self.work_package_id.clone()));
        fields.insert("criticality".to_string(), IndexValue::String(self.criticality.clone()));
        fields.insert("first_pass_success".to_string(), IndexValue::Bool(self.first_pass_success));
        if let Some(ref sprint) = self.sprint_id {
            fields.insert("sprint_id".to_string(), IndexValue::String(sprint.clone()));
        }
        fields
    }
}

/// Aggregate efficiency figures over completed work packages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyMetrics {
    pub total_completed: usize,
    /// Percent of packages passing first time
    pub first_pass_success_rate: f64,
    pub avg_rework_count: f64,
    pub avg_planned_minutes: Option<f64>,
    pub avg_actual_minutes: Option<f64>,
    /// Percent by which actual time exceeded plan, over packages with both
    pub schedule_variance_pct: Option<f64>,
    pub by_criticality: BTreeMap<String, usize>,
}

impl EfficiencyMetrics {
    /// Compute metrics; an empty input yields zeroed metrics
    pub fn compute(completed: &[CompletedWorkPackage]) -> Self {
        debug!(count = completed.len(), "EfficiencyMetrics::compute: called");
        if completed.is_empty() {
            return Self::default();
        }

        let total = completed.len() as f64;
        let first_pass = completed.iter().filter(|c| c.first_pass_success).count() as f64;
        let rework: u64 = completed.iter().map(|c| u64::from(c.rework_count)).sum();

        let planned: Vec<f64> = completed.iter().filter_map(|c| c.planned_minutes).map(f64::from).collect();
        let actual: Vec<f64> = completed
            .iter()
            .filter_map(|c| c.effective_actual_minutes())
            .map(f64::from)
            .collect();

        let (planned_sum, actual_sum) = completed
            .iter()
            .filter_map(|c| Some((f64::from(c.planned_minutes?), f64::from(c.effective_actual_minutes()?))))
            .fold((0.0, 0.0), |(p, a), (cp, ca)| (p + cp, a + ca));
        let schedule_variance_pct = (planned_sum > 0.0).then(|| round1((actual_sum - planned_sum) / planned_sum * 100.0));

        let mut by_criticality = BTreeMap::new();
        for c in completed {
            *by_criticality.entry(c.criticality.clone()).or_insert(0) += 1;
        }

        Self {
            total_completed: completed.len(),
            first_pass_success_rate: round1(first_pass / total * 100.0),
            avg_rework_count: round1(rework as f64 / total),
            avg_planned_minutes: mean(&planned),
            avg_actual_minutes: mean(&actual),
            schedule_variance_pct,
            by_criticality,
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(round1(values.iter().sum::<f64>() / values.len() as f64))
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

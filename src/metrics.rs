//! Per-month KPI metric computation
//!
//! The metric schema is fixed and closed: every [`MetricKey`] has a value in
//! every computed [`MetricSnapshot`], zero-filled rather than omitted, so
//! cross-month trend arrays never contain holes. Rates are percentages over
//! the current month's records only; smoothing across months belongs to the
//! aggregation index, never here.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::findings::{category, Finding, Severity};
use crate::month::MonthKey;
use crate::policy::Policy;
use crate::store::RecordStore;

/// Stable identifier for one metric in the fixed schema
///
/// The snake_case serialized names are the contract shared by section
/// configuration, trend queries, and the output bundle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    TotalEmployees,
    AbsenceRate,
    UnauthorizedAbsenceRate,
    ResignationRate,
    Hires,
    Resignations,
    ShortTenureEmployees,
    PostAssignmentResignations,
    PerfectAttendance,
    LongTermEmployees,
    DataErrors,
}

impl MetricKey {
    /// Every key in the schema, in presentation order
    pub const ALL: [MetricKey; 11] = [
        MetricKey::TotalEmployees,
        MetricKey::AbsenceRate,
        MetricKey::UnauthorizedAbsenceRate,
        MetricKey::ResignationRate,
        MetricKey::Hires,
        MetricKey::Resignations,
        MetricKey::ShortTenureEmployees,
        MetricKey::PostAssignmentResignations,
        MetricKey::PerfectAttendance,
        MetricKey::LongTermEmployees,
        MetricKey::DataErrors,
    ];

    /// The serialized snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::TotalEmployees => "total_employees",
            MetricKey::AbsenceRate => "absence_rate",
            MetricKey::UnauthorizedAbsenceRate => "unauthorized_absence_rate",
            MetricKey::ResignationRate => "resignation_rate",
            MetricKey::Hires => "hires",
            MetricKey::Resignations => "resignations",
            MetricKey::ShortTenureEmployees => "short_tenure_employees",
            MetricKey::PostAssignmentResignations => "post_assignment_resignations",
            MetricKey::PerfectAttendance => "perfect_attendance",
            MetricKey::LongTermEmployees => "long_term_employees",
            MetricKey::DataErrors => "data_errors",
        }
    }

    /// Whether the metric is a percentage rate (rendered with one decimal)
    pub fn is_rate(&self) -> bool {
        matches!(
            self,
            MetricKey::AbsenceRate
                | MetricKey::UnauthorizedAbsenceRate
                | MetricKey::ResignationRate
        )
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKey {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKey::ALL
            .iter()
            .find(|k| k.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

/// Error for a metric name outside the fixed schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown metric `{0}`")]
pub struct UnknownMetric(pub String);

/// Errors raised while computing one month's snapshot
///
/// These are recovered by the pipeline: the month degrades to a zeroed
/// snapshot plus a finding, and other months are unaffected.
#[derive(Error, Debug)]
pub enum MetricError {
    #[error("metric {metric} evaluated to a non-finite value")]
    NonFinite { metric: MetricKey },
}

/// Fixed-schema metric values for one month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub month: MonthKey,
    values: BTreeMap<MetricKey, f64>,
}

impl MetricSnapshot {
    /// A snapshot with every metric present and zero
    pub fn zeroed(month: MonthKey) -> Self {
        let values = MetricKey::ALL.iter().map(|k| (*k, 0.0)).collect();
        Self { month, values }
    }

    /// Value for a metric; the schema guarantees presence
    pub fn get(&self, key: MetricKey) -> f64 {
        self.values.get(&key).copied().unwrap_or(0.0)
    }

    fn set(&mut self, key: MetricKey, value: f64) {
        self.values.insert(key, value);
    }
}

/// Computes the fixed metric schema from one month's record store
#[derive(Debug, Clone)]
pub struct MetricEngine {
    policy: Policy,
}

impl MetricEngine {
    pub fn new(policy: Policy) -> Self {
        Self { policy }
    }

    /// Compute one month's snapshot
    ///
    /// Zero denominators evaluate to 0, never NaN; a non-finite result is an
    /// error for the caller to degrade, not a value to emit.
    pub fn compute(&self, store: &RecordStore) -> Result<MetricSnapshot, MetricError> {
        let month = store.month();
        let month_end = month.last_day();
        let tenure = &self.policy.tenure;
        let mut snapshot = MetricSnapshot::zeroed(month);

        let mut active = 0u64;
        let mut hires = 0u64;
        let mut resignations = 0u64;
        let mut short_tenure = 0u64;
        let mut post_assignment = 0u64;
        let mut long_term = 0u64;
        let mut perfect = 0u64;

        let mut recorded_days = 0u64;
        let mut absences = 0u64;
        let mut unauthorized = 0u64;

        for (id, employee) in store.employees() {
            let is_active = employee.is_active(month_end);
            if is_active {
                active += 1;
                let days = employee.tenure_days(month_end);
                if days >= 0 && days < tenure.short_tenure_days {
                    short_tenure += 1;
                }
                if days >= tenure.long_term_days {
                    long_term += 1;
                }
            }
            if month.contains(employee.join_date) {
                hires += 1;
            }
            if let Some(resigned) = employee.resignation_date {
                if month.contains(resigned) {
                    resignations += 1;
                    let basis = employee.assignment_date.unwrap_or(employee.join_date);
                    if (resigned - basis).num_days() <= tenure.post_assignment_days {
                        post_assignment += 1;
                    }
                }
            }

            let summary = store.attendance_summary(id);
            recorded_days += u64::from(summary.recorded_days());
            absences += u64::from(summary.absences());
            unauthorized += u64::from(summary.unauthorized_absences);
            if is_active && summary.present > 0 && summary.absences() == 0 {
                perfect += 1;
            }
        }

        snapshot.set(MetricKey::TotalEmployees, active as f64);
        snapshot.set(MetricKey::Hires, hires as f64);
        snapshot.set(MetricKey::Resignations, resignations as f64);
        snapshot.set(MetricKey::ShortTenureEmployees, short_tenure as f64);
        snapshot.set(MetricKey::PostAssignmentResignations, post_assignment as f64);
        snapshot.set(MetricKey::LongTermEmployees, long_term as f64);
        snapshot.set(MetricKey::PerfectAttendance, perfect as f64);
        snapshot.set(MetricKey::DataErrors, store.finding_count() as f64);

        snapshot.set(
            MetricKey::AbsenceRate,
            round_rate(percentage(absences, recorded_days)),
        );
        snapshot.set(
            MetricKey::UnauthorizedAbsenceRate,
            round_rate(percentage(unauthorized, recorded_days)),
        );
        snapshot.set(
            MetricKey::ResignationRate,
            round_rate(percentage(resignations, store.employees().len() as u64)),
        );

        for key in MetricKey::ALL {
            if !snapshot.get(key).is_finite() {
                return Err(MetricError::NonFinite { metric: key });
            }
        }
        Ok(snapshot)
    }

    /// Compute snapshots for a window of stores, in the caller's order
    ///
    /// A failing month degrades to a zeroed snapshot and a finding; the
    /// remaining months are computed normally.
    pub fn compute_all(&self, stores: &[RecordStore]) -> (Vec<MetricSnapshot>, Vec<Finding>) {
        let mut snapshots = Vec::with_capacity(stores.len());
        let mut findings = Vec::new();
        for store in stores {
            match self.compute(store) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(err) => {
                    tracing::warn!("metric computation failed for {}: {err}", store.month());
                    findings.push(Finding::new(
                        store.month(),
                        Severity::Warning,
                        category::METRIC_CALCULATION,
                        vec![],
                        format!(
                            "metric computation for {} degraded to defaults: {err}",
                            store.month()
                        ),
                    ));
                    snapshots.push(MetricSnapshot::zeroed(store.month()));
                }
            }
        }
        (snapshots, findings)
    }
}

fn percentage(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64 * 100.0
}

/// Round a rate to one decimal place
fn round_rate(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

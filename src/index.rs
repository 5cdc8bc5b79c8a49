//! Read-only aggregation queries over computed snapshots and timelines
//!
//! The [`AggregationIndex`] is built once per run, after every month has been
//! loaded and computed, and never mutates its inputs. Trend extraction,
//! month-over-month deltas, team roll-ups, award tiers, risk scoring, and
//! employee filtering all live here; per-month computation does not.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::metrics::{MetricKey, MetricSnapshot, UnknownMetric};
use crate::month::MonthKey;
use crate::policy::{AwardTier, Policy};
use crate::records::{EmployeeRecord, MentorFeedback};
use crate::store::RecordStore;
use crate::timeline::{EmployeeTimeline, MonthAttributes};

/// Employee-level metric used by team roll-ups, tables, and heatmaps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeMetric {
    AttendanceRate,
    WorkedHours,
    TenureDays,
    UnauthorizedAbsences,
    RiskScore,
}

impl EmployeeMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeMetric::AttendanceRate => "attendance_rate",
            EmployeeMetric::WorkedHours => "worked_hours",
            EmployeeMetric::TenureDays => "tenure_days",
            EmployeeMetric::UnauthorizedAbsences => "unauthorized_absences",
            EmployeeMetric::RiskScore => "risk_score",
        }
    }
}

impl fmt::Display for EmployeeMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeMetric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "attendance_rate" => Ok(Self::AttendanceRate),
            "worked_hours" => Ok(Self::WorkedHours),
            "tenure_days" => Ok(Self::TenureDays),
            "unauthorized_absences" => Ok(Self::UnauthorizedAbsences),
            "risk_score" => Ok(Self::RiskScore),
            other => Err(UnknownMetric(other.to_string())),
        }
    }
}

/// Month-over-month change for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    /// Current minus previous
    pub absolute: f64,
    /// Percent change relative to the previous value, one decimal;
    /// `None` when the previous value is zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

/// Per-team roll-up of one employee metric for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamAggregate {
    pub team: String,
    pub average: f64,
    pub count: usize,
}

/// Composable employee filter
///
/// Compiles a handful of common criteria into a predicate; arbitrary
/// predicates go through [`AggregationIndex::filter`] directly.
#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter {
    search: Option<String>,
    team: Option<String>,
    tier: Option<AwardTier>,
    risk_band: Option<(u8, u8)>,
}

impl EmployeeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive match against employee id or name
    pub fn search(mut self, text: &str) -> Self {
        self.search = Some(text.to_lowercase());
        self
    }

    /// Exact canonical team name
    pub fn team(mut self, team: &str) -> Self {
        self.team = Some(team.to_string());
        self
    }

    pub fn tier(mut self, tier: AwardTier) -> Self {
        self.tier = Some(tier);
        self
    }

    /// Inclusive risk-score band
    pub fn risk_band(mut self, min: u8, max: u8) -> Self {
        self.risk_band = Some((min, max));
        self
    }
}

/// Read-only query facade over one run's outputs
#[derive(Debug, Clone)]
pub struct AggregationIndex {
    months: Vec<MonthKey>,
    snapshots: BTreeMap<MonthKey, MetricSnapshot>,
    timelines: BTreeMap<String, EmployeeTimeline>,
    /// Most recent employee record observed per id, for filtering
    records: BTreeMap<String, EmployeeRecord>,
    policy: Policy,
}

impl AggregationIndex {
    /// Build the index from the run's outputs
    ///
    /// `snapshots` must be in resolved window order; their months define the
    /// window every query answers against.
    pub fn new(
        stores: &[RecordStore],
        snapshots: Vec<MetricSnapshot>,
        timelines: BTreeMap<String, EmployeeTimeline>,
        policy: Policy,
    ) -> Self {
        let months: Vec<MonthKey> = snapshots.iter().map(|s| s.month).collect();
        let mut records: BTreeMap<String, EmployeeRecord> = BTreeMap::new();
        for store in stores {
            for (id, record) in store.employees() {
                records.insert(id.clone(), record.clone());
            }
        }
        let snapshots = snapshots.into_iter().map(|s| (s.month, s)).collect();
        Self {
            months,
            snapshots,
            timelines,
            records,
            policy,
        }
    }

    /// The resolved window, ascending
    pub fn months(&self) -> &[MonthKey] {
        &self.months
    }

    pub fn snapshot(&self, month: MonthKey) -> Option<&MetricSnapshot> {
        self.snapshots.get(&month)
    }

    pub fn timelines(&self) -> &BTreeMap<String, EmployeeTimeline> {
        &self.timelines
    }

    pub fn timeline(&self, id: &str) -> Option<&EmployeeTimeline> {
        self.timelines.get(id)
    }

    pub fn record(&self, id: &str) -> Option<&EmployeeRecord> {
        self.records.get(id)
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// One value per resolved month, in window order; never truncated or padded
    pub fn trend(&self, key: MetricKey) -> Vec<f64> {
        self.months
            .iter()
            .map(|month| {
                self.snapshots
                    .get(month)
                    .map_or(0.0, |snapshot| snapshot.get(key))
            })
            .collect()
    }

    /// Change from the previous window month to `target`
    ///
    /// `None` exactly when `target` is the first month of the window (or not
    /// in the window at all). The percentage is additionally `None` when the
    /// previous value is zero; the absolute delta is still present.
    pub fn month_over_month_delta(
        &self,
        key: MetricKey,
        target: MonthKey,
    ) -> Option<MetricDelta> {
        let position = self.months.iter().position(|m| *m == target)?;
        if position == 0 {
            return None;
        }
        let previous = self.snapshots.get(&self.months[position - 1])?.get(key);
        let current = self.snapshots.get(&target)?.get(key);
        let absolute = current - previous;
        let percentage = if previous == 0.0 {
            None
        } else {
            Some((absolute / previous * 1000.0).round() / 10.0)
        };
        Some(MetricDelta {
            absolute,
            percentage,
        })
    }

    /// Value of an employee-level metric for one employee in one month
    pub fn employee_metric(
        &self,
        metric: EmployeeMetric,
        id: &str,
        month: MonthKey,
    ) -> Option<f64> {
        let timeline = self.timelines.get(id)?;
        let attributes = timeline.active(month)?;
        let value = match metric {
            EmployeeMetric::AttendanceRate => attributes.attendance_rate,
            EmployeeMetric::WorkedHours => attributes.worked_hours,
            EmployeeMetric::TenureDays => attributes.tenure_days as f64,
            EmployeeMetric::UnauthorizedAbsences => f64::from(attributes.unauthorized_absences),
            EmployeeMetric::RiskScore => f64::from(self.risk_score(id, month)?),
        };
        Some(value)
    }

    /// Per-team averages of an employee metric for one month
    ///
    /// Grouped by each employee's team as of `month`; teams with zero members
    /// that month are omitted rather than emitted as zero. Sorted by team
    /// name for deterministic output.
    pub fn team_aggregate(
        &self,
        metric: EmployeeMetric,
        month: MonthKey,
    ) -> Vec<TeamAggregate> {
        let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        for (id, timeline) in &self.timelines {
            let Some(attributes) = timeline.active(month) else {
                continue;
            };
            if attributes.team.is_empty() {
                continue;
            }
            let Some(value) = self.employee_metric(metric, id, month) else {
                continue;
            };
            let slot = sums.entry(attributes.team.clone()).or_insert((0.0, 0));
            slot.0 += value;
            slot.1 += 1;
        }
        sums.into_iter()
            .map(|(team, (sum, count))| TeamAggregate {
                team,
                average: sum / count as f64,
                count,
            })
            .collect()
    }

    /// Award tier from tenure as of `month`; `None` when the employee is
    /// absent from that month's dataset
    pub fn tenure_award_tier(&self, id: &str, month: MonthKey) -> Option<AwardTier> {
        let timeline = self.timelines.get(id)?;
        let attributes = timeline.active(month)?;
        Some(self.policy.award_tiers.classify(attributes.tenure_days))
    }

    /// Heuristic early-attrition risk score in \[0, 100\]
    ///
    /// A weighted sum, not ground truth: attendance shortfall below the
    /// policy floor scales up to its maximum points, training shortfall
    /// likewise, mentor feedback contributes fixed points, and every
    /// unauthorized absence adds its weight. The total is clamped to 100.
    /// Missing training or feedback data contributes nothing.
    pub fn risk_score(&self, id: &str, month: MonthKey) -> Option<u8> {
        let timeline = self.timelines.get(id)?;
        let attributes = timeline.active(month)?;
        Some(score_risk(attributes, &self.policy))
    }

    /// Employee ids matching an arbitrary predicate, in id order
    ///
    /// Pure and side-effect free; the predicate sees the most recent employee
    /// record alongside the full timeline.
    pub fn filter<F>(&self, predicate: F) -> Vec<String>
    where
        F: Fn(&EmployeeRecord, &EmployeeTimeline) -> bool,
    {
        self.timelines
            .iter()
            .filter(|(id, timeline)| {
                self.records
                    .get(*id)
                    .is_some_and(|record| predicate(record, timeline))
            })
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Apply a composed [`EmployeeFilter`] as of `month`
    pub fn apply_filter(&self, filter: &EmployeeFilter, month: MonthKey) -> Vec<String> {
        self.filter(|record, timeline| {
            if let Some(search) = &filter.search {
                let id_match = record.id.to_lowercase().contains(search);
                let name_match = record.name.to_lowercase().contains(search);
                if !id_match && !name_match {
                    return false;
                }
            }
            if let Some(team) = &filter.team {
                match timeline.active(month) {
                    Some(attributes) if attributes.team == *team => {}
                    _ => return false,
                }
            }
            if let Some(tier) = filter.tier {
                if self.tenure_award_tier(&record.id, month) != Some(tier) {
                    return false;
                }
            }
            if let Some((min, max)) = filter.risk_band {
                match self.risk_score(&record.id, month) {
                    Some(score) if score >= min && score <= max => {}
                    _ => return false,
                }
            }
            true
        })
    }
}

fn score_risk(attributes: &MonthAttributes, policy: &Policy) -> u8 {
    let weights = &policy.risk;
    let mut score = 0.0;

    if attributes.attendance_rate < weights.attendance_floor {
        let shortfall =
            (weights.attendance_floor - attributes.attendance_rate) / weights.attendance_floor;
        score += shortfall.clamp(0.0, 1.0) * weights.attendance_max_points;
    }
    if let Some(training) = attributes.training_rate {
        if training < weights.training_floor {
            let shortfall = (weights.training_floor - training) / weights.training_floor;
            score += shortfall.clamp(0.0, 1.0) * weights.training_max_points;
        }
    }
    match attributes.mentor_feedback {
        Some(MentorFeedback::Negative) => score += weights.negative_feedback_points,
        Some(MentorFeedback::Neutral) => score += weights.neutral_feedback_points,
        Some(MentorFeedback::Positive) | None => {}
    }
    score += f64::from(attributes.unauthorized_absences) * weights.unauthorized_absence_points;

    score.clamp(0.0, 100.0).round() as u8
}

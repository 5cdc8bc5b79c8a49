//! Per-employee multi-month timelines
//!
//! Built once after all per-month stores are loaded, since the join is across
//! months. Every employee observed in any month gets an entry for every month
//! of the resolved window; a month without a record for that employee is the
//! explicit [`MonthEntry::NotEmployed`] sentinel, which consumers must not
//! confuse with an active month of zero absences.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::month::MonthKey;
use crate::records::MentorFeedback;
use crate::store::RecordStore;

/// Derived attributes for one employee in one active month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthAttributes {
    pub team: String,
    pub position: String,
    /// Attendance rate (percent) for the month
    pub attendance_rate: f64,
    pub worked_hours: f64,
    /// Tenure in days as of the month's last day, so historical re-runs
    /// reproduce identical values
    pub tenure_days: i64,
    pub unauthorized_absences: u32,
    pub perfect_attendance: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentor_feedback: Option<MentorFeedback>,
}

/// One month in an employee's timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MonthEntry {
    /// Absent from that month's dataset, which is distinct from zero activity
    NotEmployed,
    Active(MonthAttributes),
}

impl MonthEntry {
    pub fn as_active(&self) -> Option<&MonthAttributes> {
        match self {
            MonthEntry::Active(attributes) => Some(attributes),
            MonthEntry::NotEmployed => None,
        }
    }
}

/// Month-by-month derived attributes for one employee
///
/// Read-only once built; covers the entire resolved window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeTimeline {
    pub employee_id: String,
    /// Display name from the most recent month the employee appears in
    pub name: String,
    pub months: BTreeMap<MonthKey, MonthEntry>,
}

impl EmployeeTimeline {
    pub fn entry(&self, month: MonthKey) -> Option<&MonthEntry> {
        self.months.get(&month)
    }

    /// Active attributes for a month, `None` when absent from the dataset
    pub fn active(&self, month: MonthKey) -> Option<&MonthAttributes> {
        self.months.get(&month).and_then(MonthEntry::as_active)
    }

    /// Months the employee was present in, ascending
    pub fn active_months(&self) -> impl Iterator<Item = MonthKey> + '_ {
        self.months
            .iter()
            .filter(|(_, entry)| entry.as_active().is_some())
            .map(|(month, _)| *month)
    }
}

/// Assembles timelines from the window's record stores
pub struct EmployeeTimelineBuilder;

impl EmployeeTimelineBuilder {
    /// Build one timeline per employee observed in any month
    ///
    /// `stores` must already be in resolved window order; the output maps are
    /// deterministic for a given input.
    pub fn build(stores: &[RecordStore]) -> BTreeMap<String, EmployeeTimeline> {
        let mut ids: BTreeSet<String> = BTreeSet::new();
        for store in stores {
            ids.extend(store.employees().keys().cloned());
        }

        let mut timelines = BTreeMap::new();
        for id in ids {
            let mut months = BTreeMap::new();
            let mut name = String::new();
            for store in stores {
                let month = store.month();
                let entry = match store.employee(&id) {
                    Some(employee) => {
                        name = employee.name.clone();
                        let summary = store.attendance_summary(&id);
                        MonthEntry::Active(MonthAttributes {
                            team: employee.team.clone(),
                            position: employee.position.clone(),
                            attendance_rate: store
                                .effective_attendance_rate(&id)
                                .unwrap_or(0.0),
                            worked_hours: store.effective_worked_hours(&id),
                            tenure_days: employee.tenure_days(month.last_day()),
                            unauthorized_absences: summary.unauthorized_absences,
                            perfect_attendance: summary.present > 0
                                && summary.absences() == 0,
                            training_rate: employee.training_rate,
                            mentor_feedback: employee.mentor_feedback,
                        })
                    }
                    None => MonthEntry::NotEmployed,
                };
                months.insert(month, entry);
            }
            timelines.insert(
                id.clone(),
                EmployeeTimeline {
                    employee_id: id,
                    name,
                    months,
                },
            );
        }
        timelines
    }
}

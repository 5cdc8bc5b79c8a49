//! Per-month record store with load-time validation
//!
//! `RecordStore::load` normalizes raw loader rows into typed records and
//! performs every data-quality check in one pass. Problems become findings,
//! never panics: an inconsistent record stays in the store and is reported,
//! while a row that cannot be joined at all (orphaned attendance, unusable
//! dates) is dropped and reported.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::findings::{category, Finding, Severity};
use crate::month::MonthKey;
use crate::policy::Policy;
use crate::records::{
    AttendanceRecord, AttendanceStatus, EmployeeRecord, MentorFeedback, RawAttendanceRow,
    RawEmployeeRow,
};

/// Per-employee attendance roll-up for one month
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttendanceSummary {
    pub present: u32,
    pub authorized_absences: u32,
    pub unauthorized_absences: u32,
    pub holidays: u32,
    pub worked_hours: f64,
}

impl AttendanceSummary {
    /// Days with any attendance record, holidays excluded
    pub fn recorded_days(&self) -> u32 {
        self.present + self.authorized_absences + self.unauthorized_absences
    }

    pub fn absences(&self) -> u32 {
        self.authorized_absences + self.unauthorized_absences
    }

    /// Attendance rate as a percentage of recorded days; 0 when nothing recorded
    pub fn attendance_rate(&self) -> f64 {
        let recorded = self.recorded_days();
        if recorded == 0 {
            return 0.0;
        }
        f64::from(self.present) / f64::from(recorded) * 100.0
    }
}

/// Normalized, internally consistent view of one month's raw rows
///
/// Every attendance record's employee id resolves to an employee record;
/// anything else was dropped and reported during load. Immutable once built.
#[derive(Debug, Clone)]
pub struct RecordStore {
    month: MonthKey,
    employees: BTreeMap<String, EmployeeRecord>,
    attendance: BTreeMap<String, Vec<AttendanceRecord>>,
    finding_count: usize,
}

impl RecordStore {
    /// Normalize and validate one month of raw rows
    ///
    /// Never fails: structural problems surface in the returned findings and
    /// the store keeps whatever could be joined consistently.
    pub fn load(
        month: MonthKey,
        employee_rows: Vec<RawEmployeeRow>,
        attendance_rows: Vec<RawAttendanceRow>,
        policy: &Policy,
    ) -> (Self, Vec<Finding>) {
        let mut findings = Vec::new();
        let mut employees: BTreeMap<String, EmployeeRecord> = BTreeMap::new();

        for row in employee_rows {
            match normalize_employee(month, &row, policy, &mut findings) {
                Some(record) => {
                    if employees.contains_key(&record.id) {
                        findings.push(
                            Finding::new(
                                month,
                                Severity::Critical,
                                category::DUPLICATE_EMPLOYEE,
                                vec![record.id.clone()],
                                format!(
                                    "employee id {} appears more than once in the {} snapshot",
                                    record.id, month
                                ),
                            )
                            .with_detail("kept", "first occurrence"),
                        );
                    } else {
                        employees.insert(record.id.clone(), record);
                    }
                }
                None => continue,
            }
        }

        let mut attendance: BTreeMap<String, Vec<AttendanceRecord>> = BTreeMap::new();
        for row in attendance_rows {
            let Some(record) = normalize_attendance(month, &row, &mut findings) else {
                continue;
            };
            let Some(employee) = employees.get(&record.employee_id) else {
                findings.push(
                    Finding::new(
                        month,
                        Severity::Warning,
                        category::ORPHANED_ATTENDANCE,
                        vec![record.employee_id.clone()],
                        format!(
                            "attendance on {} references unknown employee {}; record dropped",
                            record.work_date, record.employee_id
                        ),
                    )
                    .with_detail("work_date", record.work_date.to_string()),
                );
                continue;
            };
            if let Some(resigned) = employee.resignation_date {
                if record.work_date > resigned {
                    findings.push(Finding::new(
                        month,
                        Severity::Warning,
                        category::ATTENDANCE_AFTER_RESIGNATION,
                        vec![record.employee_id.clone()],
                        format!(
                            "attendance on {} for {} recorded after resignation on {}",
                            record.work_date, record.employee_id, resigned
                        ),
                    ));
                }
            }
            attendance
                .entry(record.employee_id.clone())
                .or_default()
                .push(record);
        }

        // Working-day ceiling check needs the per-employee totals.
        let ceiling = month.business_days();
        for (id, records) in &attendance {
            let recorded = records
                .iter()
                .filter(|r| r.status != AttendanceStatus::Holiday)
                .count() as u32;
            if recorded > ceiling {
                findings.push(
                    Finding::new(
                        month,
                        Severity::Warning,
                        category::OUT_OF_RANGE,
                        vec![id.clone()],
                        format!(
                            "{id} has {recorded} working days recorded, above the {month} ceiling of {ceiling}"
                        ),
                    )
                    .with_detail("field", "working_days"),
                );
            }
        }

        let store = Self {
            month,
            employees,
            attendance,
            finding_count: findings.len(),
        };
        (store, findings)
    }

    pub fn month(&self) -> MonthKey {
        self.month
    }

    /// Employees keyed by id, iteration in id order
    pub fn employees(&self) -> &BTreeMap<String, EmployeeRecord> {
        &self.employees
    }

    pub fn employee(&self, id: &str) -> Option<&EmployeeRecord> {
        self.employees.get(id)
    }

    /// Attendance records for one employee (empty slice when none recorded)
    pub fn attendance_for(&self, id: &str) -> &[AttendanceRecord] {
        self.attendance.get(id).map_or(&[], Vec::as_slice)
    }

    /// Number of findings produced while loading this store
    pub fn finding_count(&self) -> usize {
        self.finding_count
    }

    /// Roll up one employee's attendance records
    pub fn attendance_summary(&self, id: &str) -> AttendanceSummary {
        let mut summary = AttendanceSummary::default();
        for record in self.attendance_for(id) {
            match record.status {
                AttendanceStatus::Present => summary.present += 1,
                AttendanceStatus::AuthorizedAbsence => summary.authorized_absences += 1,
                AttendanceStatus::UnauthorizedAbsence => summary.unauthorized_absences += 1,
                AttendanceStatus::Holiday => summary.holidays += 1,
            }
            summary.worked_hours += record.worked_hours;
        }
        summary
    }

    /// Effective attendance rate: computed from records when any exist,
    /// otherwise the reported monthly figure from the employee row
    pub fn effective_attendance_rate(&self, id: &str) -> Option<f64> {
        let summary = self.attendance_summary(id);
        if summary.recorded_days() > 0 {
            return Some(summary.attendance_rate());
        }
        self.employees.get(id).and_then(|e| e.attendance_rate)
    }

    /// Effective worked hours, preferring attendance records over the
    /// reported monthly figure
    pub fn effective_worked_hours(&self, id: &str) -> f64 {
        let summary = self.attendance_summary(id);
        if summary.recorded_days() > 0 {
            return summary.worked_hours;
        }
        self.employees
            .get(id)
            .and_then(|e| e.worked_hours)
            .unwrap_or(0.0)
    }
}

fn parse_date(raw: &str) -> Result<Option<NaiveDate>, ()> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ())
}

fn parse_rate(raw: &str) -> Result<Option<f64>, ()> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<f64>().map(Some).map_err(|_| ())
}

/// Normalize one raw employee row, appending findings as they are discovered
///
/// Returns `None` only when the row is unusable (no id, or a join date that
/// cannot be parsed), and that drop is itself reported.
fn normalize_employee(
    month: MonthKey,
    row: &RawEmployeeRow,
    policy: &Policy,
    findings: &mut Vec<Finding>,
) -> Option<EmployeeRecord> {
    let id = row.id.trim().to_string();
    if id.is_empty() {
        findings.push(Finding::new(
            month,
            Severity::Critical,
            category::UNPARSEABLE_ROW,
            vec![],
            "employee row without an id; row dropped".to_string(),
        ));
        return None;
    }

    let join_date = match parse_date(&row.join_date) {
        Ok(Some(date)) => date,
        _ => {
            findings.push(
                Finding::new(
                    month,
                    Severity::Critical,
                    category::UNPARSEABLE_ROW,
                    vec![id.clone()],
                    format!("employee {id} has no usable join date; row dropped"),
                )
                .with_detail("join_date", row.join_date.trim()),
            );
            return None;
        }
    };

    let mut optional_date = |raw: &str, field: &str| match parse_date(raw) {
        Ok(value) => value,
        Err(()) => {
            findings.push(
                Finding::new(
                    month,
                    Severity::Warning,
                    category::UNPARSEABLE_ROW,
                    vec![id.clone()],
                    format!("employee {id} has an unparseable {field}; field ignored"),
                )
                .with_detail(field, raw.trim()),
            );
            None
        }
    };
    let resignation_date = optional_date(&row.resignation_date, "resignation_date");
    let assignment_date = optional_date(&row.assignment_date, "assignment_date");

    // Temporal consistency: report, keep the record.
    if let Some(resigned) = resignation_date {
        if resigned < join_date {
            findings.push(
                Finding::new(
                    month,
                    Severity::Critical,
                    category::TEMPORAL_INCONSISTENCY,
                    vec![id.clone()],
                    format!(
                        "employee {id} resignation date {resigned} precedes join date {join_date}"
                    ),
                )
                .with_detail("join_date", join_date.to_string())
                .with_detail("resignation_date", resigned.to_string()),
            );
        }
    }
    if let Some(assigned) = assignment_date {
        if assigned < join_date {
            findings.push(
                Finding::new(
                    month,
                    Severity::Critical,
                    category::TEMPORAL_INCONSISTENCY,
                    vec![id.clone()],
                    format!(
                        "employee {id} assignment date {assigned} precedes join date {join_date}"
                    ),
                )
                .with_detail("assignment_date", assigned.to_string()),
            );
        }
    }
    if join_date > month.last_day() {
        findings.push(Finding::new(
            month,
            Severity::Critical,
            category::TEMPORAL_INCONSISTENCY,
            vec![id.clone()],
            format!(
                "employee {id} join date {join_date} lies after the {month} snapshot"
            ),
        ));
    }

    let position = row.position.trim().to_string();
    if !position.is_empty() && !policy.positions.contains(&position) {
        findings.push(
            Finding::new(
                month,
                Severity::Warning,
                category::UNKNOWN_POSITION,
                vec![id.clone()],
                format!("employee {id} has position `{position}` outside the known vocabulary"),
            )
            .with_detail("position", position.clone()),
        );
    }

    let raw_team = row.team.trim();
    let team = if raw_team.is_empty() {
        findings.push(Finding::new(
            month,
            Severity::Warning,
            category::TEAM_NORMALIZATION,
            vec![id.clone()],
            format!("employee {id} has no team assigned"),
        ));
        String::new()
    } else {
        let (canonical, was_synonym) = policy.teams.normalize(raw_team);
        if was_synonym {
            findings.push(
                Finding::new(
                    month,
                    Severity::Warning,
                    category::TEAM_NORMALIZATION,
                    vec![id.clone()],
                    format!(
                        "employee {id} team `{raw_team}` normalized to `{canonical}`"
                    ),
                )
                .with_detail("raw", raw_team)
                .with_detail("canonical", canonical.clone()),
            );
        }
        canonical
    };

    let mut parse_reported = |raw: &str, field: &str| match parse_rate(raw) {
        Ok(value) => value,
        Err(()) => {
            findings.push(
                Finding::new(
                    month,
                    Severity::Warning,
                    category::UNPARSEABLE_ROW,
                    vec![id.clone()],
                    format!("employee {id} has an unparseable {field}; field ignored"),
                )
                .with_detail(field, raw.trim()),
            );
            None
        }
    };
    let attendance_rate = parse_reported(&row.attendance_rate, "attendance_rate");
    let worked_hours = parse_reported(&row.worked_hours, "worked_hours");
    let training_rate = parse_reported(&row.training_rate, "training_rate");

    if let Some(rate) = attendance_rate {
        if !(0.0..=100.0).contains(&rate) {
            findings.push(
                Finding::new(
                    month,
                    Severity::Warning,
                    category::OUT_OF_RANGE,
                    vec![id.clone()],
                    format!("employee {id} reported attendance rate {rate} outside [0, 100]"),
                )
                .with_detail("field", "attendance_rate")
                .with_detail("value", rate.to_string()),
            );
        }
    }
    if let Some(hours) = worked_hours {
        if hours < 0.0 {
            findings.push(
                Finding::new(
                    month,
                    Severity::Warning,
                    category::OUT_OF_RANGE,
                    vec![id.clone()],
                    format!("employee {id} reported negative worked time {hours}"),
                )
                .with_detail("field", "worked_hours"),
            );
        }
    }

    let mentor_feedback = {
        let raw = row.mentor_feedback.trim();
        if raw.is_empty() {
            None
        } else {
            MentorFeedback::parse(raw)
        }
    };

    Some(EmployeeRecord {
        id,
        name: row.name.trim().to_string(),
        position,
        team,
        join_date,
        resignation_date,
        assignment_date,
        manager_id: {
            let trimmed = row.manager_id.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        },
        attendance_rate,
        worked_hours,
        training_rate,
        mentor_feedback,
    })
}

fn normalize_attendance(
    month: MonthKey,
    row: &RawAttendanceRow,
    findings: &mut Vec<Finding>,
) -> Option<AttendanceRecord> {
    let employee_id = row.employee_id.trim().to_string();
    let work_date = match parse_date(&row.work_date) {
        Ok(Some(date)) => date,
        _ => {
            findings.push(
                Finding::new(
                    month,
                    Severity::Warning,
                    category::UNPARSEABLE_ROW,
                    vec![employee_id.clone()],
                    format!(
                        "attendance row for {employee_id} has no usable work date; row dropped"
                    ),
                )
                .with_detail("work_date", row.work_date.trim()),
            );
            return None;
        }
    };
    let Some(status) = AttendanceStatus::parse(&row.status) else {
        findings.push(
            Finding::new(
                month,
                Severity::Warning,
                category::UNPARSEABLE_ROW,
                vec![employee_id.clone()],
                format!(
                    "attendance row for {employee_id} on {work_date} has unknown status `{}`; row dropped",
                    row.status.trim()
                ),
            )
            .with_detail("status", row.status.trim()),
        );
        return None;
    };

    let worked_hours = row.worked_hours.trim().parse::<f64>().unwrap_or(0.0);
    if worked_hours < 0.0 {
        findings.push(
            Finding::new(
                month,
                Severity::Warning,
                category::OUT_OF_RANGE,
                vec![employee_id.clone()],
                format!(
                    "attendance row for {employee_id} on {work_date} has negative worked time"
                ),
            )
            .with_detail("field", "worked_hours")
            .with_detail("value", worked_hours.to_string()),
        );
    }

    Some(AttendanceRecord {
        employee_id,
        work_date,
        status,
        worked_hours,
        note: row.note.trim().to_string(),
    })
}

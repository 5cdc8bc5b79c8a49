//! Normalized employee and attendance records
//!
//! Raw tabular rows arrive from the loader seam; [`crate::store::RecordStore`]
//! turns them into the types here. Records are immutable once a month is
//! loaded.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Attendance status for one employee-day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    AuthorizedAbsence,
    UnauthorizedAbsence,
    Holiday,
}

impl AttendanceStatus {
    /// Parse the loader's status column
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "present" | "p" => Some(Self::Present),
            "authorized" | "authorized_absence" | "absence-authorized" => {
                Some(Self::AuthorizedAbsence)
            }
            "unauthorized" | "unauthorized_absence" | "absence-unauthorized" => {
                Some(Self::UnauthorizedAbsence)
            }
            "holiday" => Some(Self::Holiday),
            _ => None,
        }
    }

    /// Whether this status counts as an absence
    pub fn is_absence(&self) -> bool {
        matches!(self, Self::AuthorizedAbsence | Self::UnauthorizedAbsence)
    }
}

/// Mentor feedback classification carried on the monthly employee row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentorFeedback {
    Positive,
    Neutral,
    Negative,
}

impl MentorFeedback {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "positive" | "+" => Some(Self::Positive),
            "neutral" | "0" => Some(Self::Neutral),
            "negative" | "-" => Some(Self::Negative),
            _ => None,
        }
    }
}

/// One employee as of a month snapshot
///
/// Identity is the stable `id`, unique within a month. Attribute fields past
/// the required five are optional and may be absent in any given source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: String,
    pub name: String,
    pub position: String,
    pub team: String,
    pub join_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resignation_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<String>,
    /// Reported monthly attendance rate (percent), when the source carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance_rate: Option<f64>,
    /// Reported monthly worked hours, when the source carries them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worked_hours: Option<f64>,
    /// Training/education participation rate (percent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentor_feedback: Option<MentorFeedback>,
}

impl EmployeeRecord {
    /// Tenure in days relative to a reference date
    ///
    /// Negative when the join date lies after the reference date; callers
    /// decide how to treat that (validation reports it separately).
    pub fn tenure_days(&self, as_of: NaiveDate) -> i64 {
        (as_of - self.join_date).num_days()
    }

    /// Whether the employee is active (not yet resigned) as of a date
    pub fn is_active(&self, as_of: NaiveDate) -> bool {
        match self.resignation_date {
            Some(resigned) => resigned > as_of,
            None => true,
        }
    }
}

/// One attendance row: employee-day with status and worked time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub employee_id: String,
    pub work_date: NaiveDate,
    pub status: AttendanceStatus,
    pub worked_hours: f64,
    /// Free-text reason, usually empty for regular days
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub note: String,
}

/// Raw employee row as supplied by the external loader
///
/// Strings are untyped on purpose: validation and parsing happen in the
/// store, which converts problems into findings instead of refusing rows.
#[derive(Debug, Clone, Default)]
pub struct RawEmployeeRow {
    pub id: String,
    pub name: String,
    pub position: String,
    pub team: String,
    pub join_date: String,
    pub resignation_date: String,
    pub assignment_date: String,
    pub manager_id: String,
    pub attendance_rate: String,
    pub worked_hours: String,
    pub training_rate: String,
    pub mentor_feedback: String,
}

/// Raw attendance row as supplied by the external loader
#[derive(Debug, Clone, Default)]
pub struct RawAttendanceRow {
    pub employee_id: String,
    pub work_date: String,
    pub status: String,
    pub worked_hours: String,
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attendance_status_parse_variants() {
        assert_eq!(AttendanceStatus::parse("Present"), Some(AttendanceStatus::Present));
        assert_eq!(
            AttendanceStatus::parse("absence-authorized"),
            Some(AttendanceStatus::AuthorizedAbsence)
        );
        assert_eq!(
            AttendanceStatus::parse("UNAUTHORIZED"),
            Some(AttendanceStatus::UnauthorizedAbsence)
        );
        assert_eq!(AttendanceStatus::parse("on the moon"), None);
    }

    #[test]
    fn test_absence_classification() {
        assert!(AttendanceStatus::AuthorizedAbsence.is_absence());
        assert!(AttendanceStatus::UnauthorizedAbsence.is_absence());
        assert!(!AttendanceStatus::Present.is_absence());
        assert!(!AttendanceStatus::Holiday.is_absence());
    }

    #[test]
    fn test_tenure_days() {
        let record = EmployeeRecord {
            id: "E001".to_string(),
            name: "A".to_string(),
            position: "staff".to_string(),
            team: "Engineering".to_string(),
            join_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            resignation_date: None,
            assignment_date: None,
            manager_id: None,
            attendance_rate: None,
            worked_hours: None,
            training_rate: None,
            mentor_feedback: None,
        };
        let month_end = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(record.tenure_days(month_end), 30);
        // Join date in the future yields a negative tenure, reported by validation.
        let earlier = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert_eq!(record.tenure_days(earlier), -2);
    }

    #[test]
    fn test_is_active_respects_resignation() {
        let mut record = EmployeeRecord {
            id: "E001".to_string(),
            name: "A".to_string(),
            position: "staff".to_string(),
            team: "Engineering".to_string(),
            join_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            resignation_date: Some(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()),
            assignment_date: None,
            manager_id: None,
            attendance_rate: None,
            worked_hours: None,
            training_rate: None,
            mentor_feedback: None,
        };
        assert!(record.is_active(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()));
        assert!(!record.is_active(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()));
        record.resignation_date = None;
        assert!(record.is_active(NaiveDate::from_ymd_opt(2099, 1, 1).unwrap()));
    }

    #[test]
    fn test_mentor_feedback_parse() {
        assert_eq!(MentorFeedback::parse("positive"), Some(MentorFeedback::Positive));
        assert_eq!(MentorFeedback::parse("-"), Some(MentorFeedback::Negative));
        assert_eq!(MentorFeedback::parse(""), None);
    }
}

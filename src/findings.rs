//! Data-quality findings collected during loading and computation
//!
//! Findings are first-class output: they ride along in the bundle and feed
//! the data-errors KPI, so a problem detected while loading a month is shown
//! to end users instead of being swallowed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::month::MonthKey;

/// Severity classification for a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// A single data-quality finding
///
/// Produced as a by-product of record validation and metric computation.
/// Collected, never silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Month the finding was discovered in
    pub month: MonthKey,
    /// Severity classification
    pub severity: Severity,
    /// Stable category slug (e.g., "temporal-inconsistency")
    pub category: String,
    /// Employee ids the finding concerns (may be empty for month-level findings)
    pub employee_ids: Vec<String>,
    /// Human-readable description
    pub description: String,
    /// Structured detail fields for machine consumption
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub details: BTreeMap<String, String>,
}

impl Finding {
    /// Create a finding with no structured details
    pub fn new(
        month: MonthKey,
        severity: Severity,
        category: &str,
        employee_ids: Vec<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            month,
            severity,
            category: category.to_string(),
            employee_ids,
            description: description.into(),
            details: BTreeMap::new(),
        }
    }

    /// Attach a structured detail field
    pub fn with_detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// Well-known finding categories
///
/// Kept as constants so call sites and tests agree on spelling.
pub mod category {
    pub const TEMPORAL_INCONSISTENCY: &str = "temporal-inconsistency";
    pub const DUPLICATE_EMPLOYEE: &str = "duplicate-employee";
    pub const UNKNOWN_POSITION: &str = "unknown-position";
    pub const TEAM_NORMALIZATION: &str = "team-normalization";
    pub const OUT_OF_RANGE: &str = "out-of-range";
    pub const ATTENDANCE_AFTER_RESIGNATION: &str = "attendance-after-resignation";
    pub const ORPHANED_ATTENDANCE: &str = "orphaned-attendance";
    pub const UNPARSEABLE_ROW: &str = "unparseable-row";
    pub const UNRECOGNIZED_MONTH_TOKEN: &str = "unrecognized-month-token";
    pub const METRIC_CALCULATION: &str = "metric-calculation";
}

/// Print a severity-grouped findings report to stderr
pub fn print_summary(findings: &[Finding]) {
    if findings.is_empty() {
        eprintln!("No data-quality findings.");
        return;
    }

    eprintln!("\n=== Data Quality Report ===");
    eprintln!("Total findings: {}", findings.len());
    eprintln!();

    let mut critical = 0;
    let mut warning = 0;
    let mut info = 0;
    for finding in findings {
        match finding.severity {
            Severity::Critical => critical += 1,
            Severity::Warning => warning += 1,
            Severity::Info => info += 1,
        }
    }

    eprintln!("Severity Distribution:");
    if critical > 0 {
        eprintln!("  🔴 Critical: {critical}");
    }
    if warning > 0 {
        eprintln!("  🟡 Warning:  {warning}");
    }
    if info > 0 {
        eprintln!("  🟢 Info:     {info}");
    }
    eprintln!();

    for finding in findings {
        let icon = match finding.severity {
            Severity::Critical => "🔴",
            Severity::Warning => "🟡",
            Severity::Info => "🟢",
        };
        eprintln!(
            "  {} [{}] {} - {}",
            icon, finding.month, finding.category, finding.description
        );
    }
}

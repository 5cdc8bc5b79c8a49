//! Discovery of which calendar months have backing data
//!
//! Source files encode a month name (and usually a year) somewhere in their
//! file name. The resolver extracts those tokens against the policy's
//! month-name table, deduplicates, clips to the requested window, and returns
//! the months in ascending order. A file it cannot place is skipped and
//! reported, never a reason to abort the other files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;

use crate::month::MonthKey;
use crate::policy::MonthNames;

/// Errors that abort resolution entirely (per-file problems never do)
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("failed to read source directory {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// A source file the resolver could not place, with the reason
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// The discovered source files for one month
#[derive(Debug, Clone, Default)]
pub struct MonthSources {
    pub employees: Option<PathBuf>,
    pub attendance: Option<PathBuf>,
}

/// Result of one directory scan
///
/// `months()` is the contract the rest of the pipeline consumes: ordered,
/// deduplicated, clipped to the window. The per-month file paths ride along
/// so the loader does not need a second scan.
#[derive(Debug, Clone)]
pub struct ResolvedWindow {
    months: Vec<MonthKey>,
    sources: BTreeMap<MonthKey, MonthSources>,
    skipped: Vec<SkippedFile>,
}

impl ResolvedWindow {
    /// Resolved months, ascending, no duplicates
    pub fn months(&self) -> &[MonthKey] {
        &self.months
    }

    pub fn sources(&self, month: MonthKey) -> Option<&MonthSources> {
        self.sources.get(&month)
    }

    /// Files that were skipped, with reasons, in scan order
    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}

/// Scans a source directory for month-stamped employee and attendance files
#[derive(Debug, Clone)]
pub struct TimeWindowResolver {
    month_names: MonthNames,
    token_pattern: Regex,
    year_pattern: Regex,
}

impl TimeWindowResolver {
    pub fn new(month_names: MonthNames) -> Self {
        // Alternation is ordered longest-first so "september" wins over "sep".
        let alternation = month_names.tokens().join("|");
        let token_pattern = Regex::new(&format!("(?i)({alternation})"))
            .unwrap_or_else(|e| panic!("month token pattern failed to compile: {e}"));
        let year_pattern = Regex::new(r"(\d{4})")
            .unwrap_or_else(|e| panic!("year pattern failed to compile: {e}"));
        Self {
            month_names,
            token_pattern,
            year_pattern,
        }
    }

    /// Resolve the window of months backed by files in `dir`
    ///
    /// Only months within `[window_start, window_end]` survive; a file whose
    /// name yields no month token, or that cannot be classified as employee
    /// or attendance data, is recorded as skipped. Re-running against an
    /// unchanged directory yields an identical result: entries are processed
    /// in sorted file-name order, not directory order.
    pub fn resolve(
        &self,
        dir: &Path,
        window_start: MonthKey,
        window_end: MonthKey,
    ) -> Result<ResolvedWindow, ResolveError> {
        let entries = std::fs::read_dir(dir).map_err(|source| ResolveError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        let mut sources: BTreeMap<MonthKey, MonthSources> = BTreeMap::new();
        let mut skipped = Vec::new();

        for path in files {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                skipped.push(SkippedFile {
                    path,
                    reason: "file name is not valid UTF-8".to_string(),
                });
                continue;
            };

            let month = match self.extract_month(file_name, window_end) {
                Ok(month) => month,
                Err(reason) => {
                    tracing::warn!("skipping {file_name}: {reason}");
                    skipped.push(SkippedFile { path, reason });
                    continue;
                }
            };

            if month < window_start || month > window_end {
                skipped.push(SkippedFile {
                    path,
                    reason: format!(
                        "month {month} lies outside the window {window_start}..{window_end}"
                    ),
                });
                continue;
            }

            // Classify before touching the month map, so an unclassifiable
            // file never manufactures an empty month entry.
            let lowered = file_name.to_lowercase();
            let is_employees = lowered.contains("employee");
            let is_attendance = lowered.contains("attendance");
            if !is_employees && !is_attendance {
                skipped.push(SkippedFile {
                    path,
                    reason: "cannot classify as employee or attendance data".to_string(),
                });
                continue;
            }
            let slot = sources.entry(month).or_default();
            let target = if is_employees {
                &mut slot.employees
            } else {
                &mut slot.attendance
            };
            if target.is_some() {
                skipped.push(SkippedFile {
                    path,
                    reason: format!("duplicate source for {month}; keeping the first"),
                });
            } else {
                *target = Some(path);
            }
        }

        let months: Vec<MonthKey> = sources.keys().copied().collect();
        Ok(ResolvedWindow {
            months,
            sources,
            skipped,
        })
    }

    /// Extract `(year, month)` from a file name
    ///
    /// The month comes from the name table; the year from the first 4-digit
    /// token, defaulting to the window end's year when the name carries none.
    fn extract_month(&self, file_name: &str, window_end: MonthKey) -> Result<MonthKey, String> {
        let token = self
            .token_pattern
            .find(file_name)
            .ok_or_else(|| format!("no recognizable month token in `{file_name}`"))?
            .as_str();
        let month_number = self
            .month_names
            .lookup(token)
            .ok_or_else(|| format!("month token `{token}` missing from the name table"))?;
        let year = self
            .year_pattern
            .find(file_name)
            .and_then(|m| m.as_str().parse::<i32>().ok())
            .unwrap_or_else(|| window_end.year());
        MonthKey::new(year, month_number).map_err(|e| e.to_string())
    }
}

impl Default for TimeWindowResolver {
    fn default() -> Self {
        Self::new(MonthNames::default())
    }
}

//! Single-pass generation run
//!
//! Resolve the window, load and validate each month in ascending order,
//! compute snapshots, assemble timelines, build the aggregation index, and
//! materialize views. Catalog problems fail at assembly, before any data is
//! touched; per-month data problems become findings and never abort the
//! other months. Fatal load errors abort with no partial output.

use std::path::PathBuf;

use thiserror::Error;

use crate::bundle::OutputBundle;
use crate::findings::{category, Finding, Severity};
use crate::index::AggregationIndex;
use crate::loader;
use crate::loader::DataLoadError;
use crate::metrics::MetricEngine;
use crate::month::MonthKey;
use crate::policy::Policy;
use crate::resolver::{ResolveError, TimeWindowResolver};
use crate::store::RecordStore;
use crate::timeline::EmployeeTimelineBuilder;
use crate::view::{ConfigurationError, KpiCatalog, ViewModelFactory};

/// Fatal errors for a generation run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Load(#[from] DataLoadError),

    #[error("month {month} was discovered from {path} but has no employee file")]
    MissingEmployeeFile { month: MonthKey, path: String },
}

/// Inputs for one run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub data_dir: PathBuf,
    /// Earliest supported month
    pub window_start: MonthKey,
    /// Requested end month; later source files are ignored
    pub window_end: MonthKey,
    /// Materialize the full KPI catalog into the bundle
    pub include_views: bool,
}

/// A validated, ready-to-run pipeline
///
/// Construction validates the KPI catalog, so misconfiguration surfaces
/// here, before any rendering and before any file is read.
pub struct Pipeline {
    policy: Policy,
    catalog: KpiCatalog,
}

impl Pipeline {
    pub fn new(policy: Policy, catalog: KpiCatalog) -> Result<Self, ConfigurationError> {
        catalog.validate()?;
        Ok(Self { policy, catalog })
    }

    /// Execute one generation run and produce the output bundle
    pub fn run(&self, options: &RunOptions) -> Result<OutputBundle, PipelineError> {
        let resolver = TimeWindowResolver::new(self.policy.month_names.clone());
        let resolved = resolver.resolve(
            &options.data_dir,
            options.window_start,
            options.window_end,
        )?;
        tracing::debug!(
            "resolved {} month(s), {} file(s) skipped",
            resolved.months().len(),
            resolved.skipped().len()
        );

        let mut findings: Vec<Finding> = resolved
            .skipped()
            .iter()
            .map(|skip| {
                Finding::new(
                    options.window_end,
                    Severity::Warning,
                    category::UNRECOGNIZED_MONTH_TOKEN,
                    vec![],
                    format!("skipped source file {}: {}", skip.path.display(), skip.reason),
                )
            })
            .collect();

        let mut stores: Vec<RecordStore> = Vec::with_capacity(resolved.months().len());
        for &month in resolved.months() {
            let sources = resolved
                .sources(month)
                .unwrap_or_else(|| panic!("resolved month {month} has no sources"));
            let employees_path = sources.employees.as_ref().ok_or_else(|| {
                PipelineError::MissingEmployeeFile {
                    month,
                    path: sources
                        .attendance
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                }
            })?;

            let employee_rows = loader::load_employee_rows(employees_path)?;
            let attendance_rows = match &sources.attendance {
                Some(path) => loader::load_attendance_rows(path)?,
                None => Vec::new(),
            };
            let (store, month_findings) =
                RecordStore::load(month, employee_rows, attendance_rows, &self.policy);
            findings.extend(month_findings);
            stores.push(store);
        }

        let engine = MetricEngine::new(self.policy.clone());
        let (snapshots, metric_findings) = engine.compute_all(&stores);
        findings.extend(metric_findings);

        let timelines = EmployeeTimelineBuilder::build(&stores);
        let months: Vec<MonthKey> = resolved.months().to_vec();

        let mut bundle = OutputBundle::new(months, snapshots, timelines.clone(), findings);
        if options.include_views {
            let index =
                AggregationIndex::new(&stores, bundle.metrics.clone(), timelines, self.policy.clone());
            let views =
                ViewModelFactory::materialize_catalog(&self.catalog, &index, options.window_end);
            bundle = bundle.with_views(views);
        }
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    fn seed_two_months(dir: &Path) {
        write_file(
            dir,
            "employees_2025_july.csv",
            "id,name,position,team,join_date\n\
             E001,Alice,staff,Engineering,2024-01-15\n\
             E002,Bob,manager,Sales,2020-03-01\n",
        );
        write_file(
            dir,
            "attendance_2025_july.csv",
            "employee_id,work_date,status,worked_hours\n\
             E001,2025-07-01,present,8\n\
             E001,2025-07-02,unauthorized,0\n",
        );
        write_file(
            dir,
            "employees_2025_august.csv",
            "id,name,position,team,join_date\n\
             E001,Alice,staff,Engineering,2024-01-15\n\
             E002,Bob,manager,Sales,2020-03-01\n\
             E003,Cara,staff,Sales,2025-08-04\n",
        );
    }

    fn options(dir: &Path) -> RunOptions {
        RunOptions {
            data_dir: dir.to_path_buf(),
            window_start: MonthKey::new(2025, 1).unwrap(),
            window_end: MonthKey::new(2025, 8).unwrap(),
            include_views: false,
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(Policy::default(), KpiCatalog::standard()).unwrap()
    }

    #[test]
    fn test_run_produces_aligned_bundle() {
        let dir = tempfile::tempdir().unwrap();
        seed_two_months(dir.path());
        let bundle = pipeline().run(&options(dir.path())).unwrap();

        assert_eq!(bundle.months.len(), 2);
        assert_eq!(bundle.metrics.len(), 2);
        assert_eq!(bundle.metrics[0].month, bundle.months[0]);
        assert_eq!(bundle.timelines.len(), 3);
        // Every timeline spans the whole window.
        for timeline in bundle.timelines.values() {
            assert_eq!(timeline.months.len(), 2);
        }
    }

    #[test]
    fn test_run_with_views_materializes_catalog() {
        let dir = tempfile::tempdir().unwrap();
        seed_two_months(dir.path());
        let mut opts = options(dir.path());
        opts.include_views = true;
        let bundle = pipeline().run(&opts).unwrap();
        assert_eq!(bundle.views.as_ref().unwrap().len(), 11);
    }

    #[test]
    fn test_skipped_files_surface_as_findings() {
        let dir = tempfile::tempdir().unwrap();
        seed_two_months(dir.path());
        write_file(dir.path(), "employees_notes_backup.csv", "id\n");
        let bundle = pipeline().run(&options(dir.path())).unwrap();
        assert!(bundle
            .findings
            .iter()
            .any(|f| f.category == category::UNRECOGNIZED_MONTH_TOKEN));
    }

    #[test]
    fn test_empty_directory_yields_empty_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = pipeline().run(&options(dir.path())).unwrap();
        assert!(bundle.months.is_empty());
        assert!(bundle.metrics.is_empty());
        assert!(bundle.timelines.is_empty());
    }

    #[test]
    fn test_month_without_employee_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "attendance_2025_july.csv",
            "employee_id,work_date,status\nE001,2025-07-01,present\n",
        );
        let err = pipeline().run(&options(dir.path())).unwrap_err();
        assert!(matches!(err, PipelineError::MissingEmployeeFile { .. }));
    }

    #[test]
    fn test_unreadable_employee_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "employees_2025_july.csv",
            "id,name\nE001,Alice\n", // missing required columns
        );
        let err = pipeline().run(&options(dir.path())).unwrap_err();
        assert!(matches!(err, PipelineError::Load(_)));
    }

    #[test]
    fn test_validation_findings_reach_the_bundle() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "employees_2025_july.csv",
            "id,name,position,team,join_date,resignation_date\n\
             E001,Alice,staff,Engineering,2025-06-01,2025-01-01\n",
        );
        let bundle = pipeline().run(&options(dir.path())).unwrap();
        assert!(bundle
            .findings
            .iter()
            .any(|f| f.category == category::TEMPORAL_INCONSISTENCY
                && f.severity == Severity::Critical));
        // The employee is still present in the output.
        assert!(bundle.timelines.contains_key("E001"));
    }
}

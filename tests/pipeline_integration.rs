//! End-to-end pipeline tests over real fixture directories

mod utils;

use kintai::findings::Severity;
use kintai::index::{AggregationIndex, EmployeeMetric};
use kintai::metrics::{MetricEngine, MetricKey};
use kintai::month::MonthKey;
use kintai::pipeline::{Pipeline, RunOptions};
use kintai::policy::Policy;
use kintai::store::RecordStore;
use kintai::timeline::EmployeeTimelineBuilder;
use kintai::view::KpiCatalog;

fn run_options(dir: &std::path::Path, end: MonthKey) -> RunOptions {
    RunOptions {
        data_dir: dir.to_path_buf(),
        window_start: MonthKey::new(2025, 1).unwrap(),
        window_end: end,
        include_views: false,
    }
}

fn pipeline() -> Pipeline {
    Pipeline::new(Policy::default(), KpiCatalog::standard()).unwrap()
}

#[test]
fn test_headcount_trend_and_delta_across_three_months() {
    let dir = tempfile::tempdir().unwrap();
    utils::seed_employees(dir.path(), 2025, "july", 378);
    utils::seed_employees(dir.path(), 2025, "august", 381);
    utils::seed_employees(dir.path(), 2025, "september", 393);

    let sep = MonthKey::new(2025, 9).unwrap();
    let bundle = pipeline().run(&run_options(dir.path(), sep)).unwrap();

    assert_eq!(bundle.months.len(), 3);
    let trend: Vec<f64> = bundle
        .metrics
        .iter()
        .map(|s| s.get(MetricKey::TotalEmployees))
        .collect();
    assert_eq!(trend, vec![378.0, 381.0, 393.0]);

    // Rebuild the index from bundle pieces to check the delta contract.
    let index = AggregationIndex::new(
        &[],
        bundle.metrics.clone(),
        bundle.timelines.clone(),
        Policy::default(),
    );
    let delta = index
        .month_over_month_delta(MetricKey::TotalEmployees, sep)
        .unwrap();
    assert_eq!(delta.absolute, 12.0);
    assert_eq!(delta.percentage, Some(3.1));
}

#[test]
fn test_trend_length_equals_window_length_for_zero_months() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = pipeline()
        .run(&run_options(dir.path(), MonthKey::new(2025, 9).unwrap()))
        .unwrap();
    assert!(bundle.months.is_empty());
    let index = AggregationIndex::new(
        &[],
        bundle.metrics,
        bundle.timelines,
        Policy::default(),
    );
    assert!(index.trend(MetricKey::TotalEmployees).is_empty());
}

#[test]
fn test_temporal_inconsistency_reported_but_employee_retained() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("employees_2025_july.csv"),
        "id,name,position,team,join_date,resignation_date\n\
         E001,Alice,staff,Engineering,2025-06-01,2025-01-01\n",
    )
    .unwrap();

    let bundle = pipeline()
        .run(&run_options(dir.path(), MonthKey::new(2025, 7).unwrap()))
        .unwrap();

    let finding = bundle
        .findings
        .iter()
        .find(|f| f.category == "temporal-inconsistency")
        .unwrap();
    assert_eq!(finding.severity, Severity::Critical);
    assert_eq!(finding.employee_ids, vec!["E001"]);
    assert!(bundle.timelines.contains_key("E001"));
}

#[test]
fn test_team_with_zero_members_omitted_from_aggregate() {
    let policy = Policy::default();
    let jul = MonthKey::new(2025, 7).unwrap();
    let aug = MonthKey::new(2025, 8).unwrap();

    let row = |id: &str, team: &str| kintai::records::RawEmployeeRow {
        id: id.to_string(),
        name: id.to_string(),
        position: "staff".to_string(),
        team: team.to_string(),
        join_date: "2024-01-01".to_string(),
        ..kintai::records::RawEmployeeRow::default()
    };

    // Sales exists in July but has nobody in August.
    let stores = vec![
        RecordStore::load(
            jul,
            vec![row("E001", "Engineering"), row("E002", "Sales")],
            vec![],
            &policy,
        )
        .0,
        RecordStore::load(aug, vec![row("E001", "Engineering")], vec![], &policy).0,
    ];
    let (snapshots, _) = MetricEngine::new(policy.clone()).compute_all(&stores);
    let timelines = EmployeeTimelineBuilder::build(&stores);
    let index = AggregationIndex::new(&stores, snapshots, timelines, policy);

    let teams: Vec<String> = index
        .team_aggregate(EmployeeMetric::AttendanceRate, aug)
        .into_iter()
        .map(|a| a.team)
        .collect();
    assert_eq!(teams, vec!["Engineering"]);
}

#[test]
fn test_findings_merged_in_month_order() {
    let dir = tempfile::tempdir().unwrap();
    // July: unknown position. August: missing team.
    std::fs::write(
        dir.path().join("employees_2025_july.csv"),
        "id,name,position,team,join_date\nE001,Alice,wizard,Engineering,2024-01-01\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("employees_2025_august.csv"),
        "id,name,position,team,join_date\nE001,Alice,staff,,2024-01-01\n",
    )
    .unwrap();

    let bundle = pipeline()
        .run(&run_options(dir.path(), MonthKey::new(2025, 8).unwrap()))
        .unwrap();
    let months: Vec<String> = bundle.findings.iter().map(|f| f.month.to_string()).collect();
    let mut sorted = months.clone();
    sorted.sort();
    assert_eq!(months, sorted);
}

#[test]
fn test_perfect_attendance_and_unauthorized_metrics_flow_through() {
    let dir = tempfile::tempdir().unwrap();
    utils::seed_employees(dir.path(), 2025, "july", 3);
    utils::seed_attendance(
        dir.path(),
        2025,
        "july",
        &[
            ("E0000", "2025-07-01", "present"),
            ("E0000", "2025-07-02", "present"),
            ("E0001", "2025-07-01", "present"),
            ("E0001", "2025-07-02", "unauthorized"),
        ],
    );

    let bundle = pipeline()
        .run(&run_options(dir.path(), MonthKey::new(2025, 7).unwrap()))
        .unwrap();
    let snapshot = &bundle.metrics[0];
    assert_eq!(snapshot.get(MetricKey::PerfectAttendance), 1.0);
    assert_eq!(snapshot.get(MetricKey::UnauthorizedAbsenceRate), 25.0);

    let timeline = &bundle.timelines["E0001"];
    let attrs = timeline
        .active(MonthKey::new(2025, 7).unwrap())
        .unwrap();
    assert_eq!(attrs.unauthorized_absences, 1);
}

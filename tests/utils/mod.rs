//! Shared fixture helpers for integration tests

use std::fmt::Write as _;
use std::path::Path;

/// Write a monthly employee CSV with `count` synthetic active employees
pub fn seed_employees(dir: &Path, year: i32, month_name: &str, count: usize) {
    let mut content = String::from("id,name,position,team,join_date\n");
    for i in 0..count {
        let team = if i % 2 == 0 { "Engineering" } else { "Sales" };
        writeln!(
            content,
            "E{i:04},Employee {i},staff,{team},2020-01-01"
        )
        .unwrap();
    }
    std::fs::write(
        dir.join(format!("employees_{year}_{month_name}.csv")),
        content,
    )
    .unwrap();
}

/// Write a monthly attendance CSV from explicit rows
pub fn seed_attendance(dir: &Path, year: i32, month_name: &str, rows: &[(&str, &str, &str)]) {
    let mut content = String::from("employee_id,work_date,status,worked_hours\n");
    for (id, date, status) in rows {
        writeln!(content, "{id},{date},{status},8").unwrap();
    }
    std::fs::write(
        dir.join(format!("attendance_{year}_{month_name}.csv")),
        content,
    )
    .unwrap();
}

//! CSV loading of raw employee and attendance rows
//!
//! This is the thin seam to whatever produced the monthly files; it does no
//! validation beyond structure. A file that cannot be read or is missing a
//! required column is fatal; the pipeline never fabricates data in place of
//! missing input. Content-level problems are the store's job.

use std::path::Path;

use thiserror::Error;

use crate::records::{RawAttendanceRow, RawEmployeeRow};

/// Fatal errors for unreadable or structurally unusable input
#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("{path} is missing required column `{column}`")]
    MissingColumn { path: String, column: String },
}

/// Case-insensitive header lookup; `required` turns absence into an error
struct ColumnMap {
    indices: Vec<(String, usize)>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let indices = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim().to_lowercase(), idx))
            .collect();
        Self { indices }
    }

    fn get(&self, name: &str) -> Option<usize> {
        self.indices
            .iter()
            .find(|(header, _)| header == name)
            .map(|(_, idx)| *idx)
    }

    fn required(&self, name: &str, path: &Path) -> Result<usize, DataLoadError> {
        self.get(name).ok_or_else(|| DataLoadError::MissingColumn {
            path: path.display().to_string(),
            column: name.to_string(),
        })
    }
}

fn field(record: &csv::StringRecord, index: Option<usize>) -> String {
    index
        .and_then(|idx| record.get(idx))
        .unwrap_or_default()
        .to_string()
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>, DataLoadError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|source| match source.kind() {
            csv::ErrorKind::Io(_) => DataLoadError::Io {
                path: path.display().to_string(),
                source: std::io::Error::other(source.to_string()),
            },
            _ => DataLoadError::Csv {
                path: path.display().to_string(),
                source,
            },
        })
}

/// Read one month's employee rows
///
/// Requires `id`, `name`, `position`, `team`, `join_date` columns; all other
/// columns are optional and default to empty.
pub fn load_employee_rows(path: &Path) -> Result<Vec<RawEmployeeRow>, DataLoadError> {
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .map_err(|source| DataLoadError::Csv {
            path: path.display().to_string(),
            source,
        })?
        .clone();
    let columns = ColumnMap::from_headers(&headers);

    let id = columns.required("id", path)?;
    let name = columns.required("name", path)?;
    let position = columns.required("position", path)?;
    let team = columns.required("team", path)?;
    let join_date = columns.required("join_date", path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| DataLoadError::Csv {
            path: path.display().to_string(),
            source,
        })?;
        rows.push(RawEmployeeRow {
            id: field(&record, Some(id)),
            name: field(&record, Some(name)),
            position: field(&record, Some(position)),
            team: field(&record, Some(team)),
            join_date: field(&record, Some(join_date)),
            resignation_date: field(&record, columns.get("resignation_date")),
            assignment_date: field(&record, columns.get("assignment_date")),
            manager_id: field(&record, columns.get("manager_id")),
            attendance_rate: field(&record, columns.get("attendance_rate")),
            worked_hours: field(&record, columns.get("worked_hours")),
            training_rate: field(&record, columns.get("training_rate")),
            mentor_feedback: field(&record, columns.get("mentor_feedback")),
        });
    }
    Ok(rows)
}

/// Read one month's attendance rows
///
/// Requires `employee_id`, `work_date`, `status`, `worked_hours`; `note` is
/// optional.
pub fn load_attendance_rows(path: &Path) -> Result<Vec<RawAttendanceRow>, DataLoadError> {
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .map_err(|source| DataLoadError::Csv {
            path: path.display().to_string(),
            source,
        })?
        .clone();
    let columns = ColumnMap::from_headers(&headers);

    let employee_id = columns.required("employee_id", path)?;
    let work_date = columns.required("work_date", path)?;
    let status = columns.required("status", path)?;
    let worked_hours = columns.required("worked_hours", path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| DataLoadError::Csv {
            path: path.display().to_string(),
            source,
        })?;
        rows.push(RawAttendanceRow {
            employee_id: field(&record, Some(employee_id)),
            work_date: field(&record, Some(work_date)),
            status: field(&record, Some(status)),
            worked_hours: field(&record, Some(worked_hours)),
            note: field(&record, columns.get("note")),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_employee_rows_with_optional_columns_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "employees_2025_july.csv",
            "id,name,position,team,join_date\n\
             E001,Alice,staff,Engineering,2024-01-15\n\
             E002,Bob,manager,Sales,2020-03-01\n",
        );
        let rows = load_employee_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "E001");
        assert_eq!(rows[0].resignation_date, "");
        assert_eq!(rows[1].team, "Sales");
    }

    #[test]
    fn test_load_employee_rows_reads_extended_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "employees.csv",
            "id,name,position,team,join_date,resignation_date,training_rate,mentor_feedback\n\
             E001,Alice,staff,Engineering,2024-01-15,2025-07-20,85.0,negative\n",
        );
        let rows = load_employee_rows(&path).unwrap();
        assert_eq!(rows[0].resignation_date, "2025-07-20");
        assert_eq!(rows[0].training_rate, "85.0");
        assert_eq!(rows[0].mentor_feedback, "negative");
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "employees.csv",
            "id,name,team,join_date\nE001,Alice,Engineering,2024-01-15\n",
        );
        let err = load_employee_rows(&path).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::MissingColumn { ref column, .. } if column == "position"
        ));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = load_employee_rows(Path::new("/nonexistent/employees.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::Io { .. }));
    }

    #[test]
    fn test_load_attendance_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "attendance.csv",
            "employee_id,work_date,status,worked_hours,note\n\
             E001,2025-07-01,present,8,\n\
             E001,2025-07-02,unauthorized,0,no call no show\n",
        );
        let rows = load_attendance_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].status, "unauthorized");
        assert_eq!(rows[1].note, "no call no show");
    }

    #[test]
    fn test_headers_matched_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "employees.csv",
            "ID,Name,Position,Team,Join_Date\nE001,Alice,staff,Engineering,2024-01-15\n",
        );
        let rows = load_employee_rows(&path).unwrap();
        assert_eq!(rows[0].join_date, "2024-01-15");
    }
}

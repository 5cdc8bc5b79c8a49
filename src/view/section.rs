//! Section configuration: the declarative half of the rendering contract
//!
//! A [`SectionConfig`] is pure data (type, metric keys, display options),
//! and the catalog of KPI views is the only place a new KPI or section is
//! added. Misconfiguration fails at assembly time with the offending KPI and
//! section index, never mid-render.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::index::EmployeeMetric;
use crate::metrics::MetricKey;

/// The closed set of renderable section types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    StatSummary,
    TrendChart,
    ComparisonChart,
    EmployeeTable,
    Timeline,
    Heatmap,
}

impl SectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::StatSummary => "stat_summary",
            SectionType::TrendChart => "trend_chart",
            SectionType::ComparisonChart => "comparison_chart",
            SectionType::EmployeeTable => "employee_table",
            SectionType::Timeline => "timeline",
            SectionType::Heatmap => "heatmap",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "stat_summary" => Some(Self::StatSummary),
            "trend_chart" => Some(Self::TrendChart),
            "comparison_chart" => Some(Self::ComparisonChart),
            "employee_table" => Some(Self::EmployeeTable),
            "timeline" => Some(Self::Timeline),
            "heatmap" => Some(Self::Heatmap),
            _ => None,
        }
    }
}

/// Sort direction for table-like sections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Presentation options shared by all section types
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    /// Cap on rows/entries; `None` means everything
    pub limit: Option<usize>,
    pub sort: SortOrder,
}

/// One renderable unit of a KPI view: pure data, never executable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub section_type: SectionType,
    pub title: String,
    /// Month-level metrics consumed by stat summaries and trend charts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<MetricKey>,
    /// Employee-level metric consumed by comparison charts, tables, heatmaps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_metric: Option<EmployeeMetric>,
    #[serde(default)]
    pub options: DisplayOptions,
}

impl SectionConfig {
    /// Shorthand for a section with default options
    pub fn new(section_type: SectionType, title: &str) -> Self {
        Self {
            section_type,
            title: title.to_string(),
            metrics: Vec::new(),
            employee_metric: None,
            options: DisplayOptions::default(),
        }
    }

    pub fn with_metrics(mut self, metrics: &[MetricKey]) -> Self {
        self.metrics = metrics.to_vec();
        self
    }

    pub fn with_employee_metric(mut self, metric: EmployeeMetric) -> Self {
        self.employee_metric = Some(metric);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.options.limit = Some(limit);
        self
    }
}

/// One KPI view: a stable key, a display title, and its ordered sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiConfig {
    pub key: String,
    pub title: String,
    pub sections: Vec<SectionConfig>,
}

/// Errors raised while assembling the catalog
///
/// Raised before any rendering begins; every variant names the KPI and
/// section it concerns.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("KPI `{kpi}` section {section}: unknown section type `{value}`")]
    UnknownSectionType {
        kpi: String,
        section: usize,
        value: String,
    },

    #[error("KPI `{kpi}` section {section}: unknown metric `{value}`")]
    UnknownMetric {
        kpi: String,
        section: usize,
        value: String,
    },

    #[error("KPI `{kpi}` section {section} ({section_type}): {reason}")]
    InvalidSection {
        kpi: String,
        section: usize,
        section_type: &'static str,
        reason: &'static str,
    },

    #[error("duplicate KPI key `{0}`")]
    DuplicateKpi(String),
}

/// The configuration table: one entry per KPI view
#[derive(Debug, Clone, PartialEq)]
pub struct KpiCatalog {
    kpis: Vec<KpiConfig>,
}

impl KpiCatalog {
    /// Build a catalog from entries, validating at assembly time
    pub fn new(kpis: Vec<KpiConfig>) -> Result<Self, ConfigurationError> {
        let catalog = Self { kpis };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn kpis(&self) -> &[KpiConfig] {
        &self.kpis
    }

    pub fn get(&self, key: &str) -> Option<&KpiConfig> {
        self.kpis.iter().find(|k| k.key == key)
    }

    /// Validate every section against its type's requirements
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let mut seen = std::collections::BTreeSet::new();
        for kpi in &self.kpis {
            if !seen.insert(kpi.key.clone()) {
                return Err(ConfigurationError::DuplicateKpi(kpi.key.clone()));
            }
            for (idx, section) in kpi.sections.iter().enumerate() {
                let invalid = |reason: &'static str| ConfigurationError::InvalidSection {
                    kpi: kpi.key.clone(),
                    section: idx,
                    section_type: section.section_type.as_str(),
                    reason,
                };
                match section.section_type {
                    SectionType::StatSummary | SectionType::TrendChart => {
                        if section.metrics.is_empty() {
                            return Err(invalid("requires at least one metric key"));
                        }
                    }
                    SectionType::ComparisonChart | SectionType::Heatmap => {
                        if section.employee_metric.is_none() {
                            return Err(invalid("requires an employee-level metric"));
                        }
                    }
                    SectionType::EmployeeTable | SectionType::Timeline => {}
                }
            }
        }
        Ok(())
    }

    /// Load a catalog from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigurationError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse a catalog from TOML text
    ///
    /// Section types and metric names are validated here, so a typo is
    /// reported with its KPI key and section index instead of surfacing as a
    /// render-time surprise.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigurationError> {
        let raw: RawCatalog = toml::from_str(text)?;
        let mut kpis = Vec::with_capacity(raw.kpi.len());
        for raw_kpi in raw.kpi {
            let mut sections = Vec::with_capacity(raw_kpi.section.len());
            for (idx, raw_section) in raw_kpi.section.into_iter().enumerate() {
                let section_type = SectionType::parse(&raw_section.section_type).ok_or_else(
                    || ConfigurationError::UnknownSectionType {
                        kpi: raw_kpi.key.clone(),
                        section: idx,
                        value: raw_section.section_type.clone(),
                    },
                )?;
                let mut metrics = Vec::with_capacity(raw_section.metrics.len());
                for name in &raw_section.metrics {
                    let key = MetricKey::from_str(name).map_err(|_| {
                        ConfigurationError::UnknownMetric {
                            kpi: raw_kpi.key.clone(),
                            section: idx,
                            value: name.clone(),
                        }
                    })?;
                    metrics.push(key);
                }
                let employee_metric = raw_section
                    .employee_metric
                    .as_deref()
                    .map(|name| {
                        EmployeeMetric::from_str(name).map_err(|_| {
                            ConfigurationError::UnknownMetric {
                                kpi: raw_kpi.key.clone(),
                                section: idx,
                                value: name.to_string(),
                            }
                        })
                    })
                    .transpose()?;
                sections.push(SectionConfig {
                    section_type,
                    title: raw_section.title,
                    metrics,
                    employee_metric,
                    options: DisplayOptions {
                        limit: raw_section.limit,
                        sort: raw_section.sort.unwrap_or_default(),
                    },
                });
            }
            kpis.push(KpiConfig {
                key: raw_kpi.key,
                title: raw_kpi.title,
                sections,
            });
        }
        Self::new(kpis)
    }

    /// The standard eleven KPI views
    pub fn standard() -> Self {
        use EmployeeMetric as Em;
        use MetricKey as M;
        use SectionType as S;

        let kpis = vec![
            KpiConfig {
                key: "headcount".to_string(),
                title: "Headcount Overview".to_string(),
                sections: vec![
                    SectionConfig::new(S::StatSummary, "Headcount")
                        .with_metrics(&[M::TotalEmployees, M::Hires, M::Resignations]),
                    SectionConfig::new(S::TrendChart, "Headcount Trend")
                        .with_metrics(&[M::TotalEmployees]),
                    SectionConfig::new(S::ComparisonChart, "Tenure by Team")
                        .with_employee_metric(Em::TenureDays),
                ],
            },
            KpiConfig {
                key: "absence".to_string(),
                title: "Absence".to_string(),
                sections: vec![
                    SectionConfig::new(S::StatSummary, "Absence")
                        .with_metrics(&[M::AbsenceRate, M::PerfectAttendance]),
                    SectionConfig::new(S::TrendChart, "Absence Rate Trend")
                        .with_metrics(&[M::AbsenceRate]),
                    SectionConfig::new(S::Heatmap, "Attendance by Team")
                        .with_employee_metric(Em::AttendanceRate),
                ],
            },
            KpiConfig {
                key: "unauthorized_absence".to_string(),
                title: "Unauthorized Absence".to_string(),
                sections: vec![
                    SectionConfig::new(S::StatSummary, "Unauthorized Absence")
                        .with_metrics(&[M::UnauthorizedAbsenceRate]),
                    SectionConfig::new(S::TrendChart, "Unauthorized Absence Trend")
                        .with_metrics(&[M::UnauthorizedAbsenceRate]),
                    SectionConfig::new(S::EmployeeTable, "Repeat Offenders")
                        .with_employee_metric(Em::UnauthorizedAbsences)
                        .with_limit(20),
                ],
            },
            KpiConfig {
                key: "resignations".to_string(),
                title: "Resignations".to_string(),
                sections: vec![
                    SectionConfig::new(S::StatSummary, "Resignations")
                        .with_metrics(&[M::Resignations, M::ResignationRate]),
                    SectionConfig::new(S::TrendChart, "Resignation Trend")
                        .with_metrics(&[M::Resignations, M::ResignationRate]),
                ],
            },
            KpiConfig {
                key: "hiring".to_string(),
                title: "Hiring".to_string(),
                sections: vec![
                    SectionConfig::new(S::StatSummary, "Hiring").with_metrics(&[M::Hires]),
                    SectionConfig::new(S::TrendChart, "Hires per Month")
                        .with_metrics(&[M::Hires]),
                ],
            },
            KpiConfig {
                key: "early_tenure".to_string(),
                title: "Early Tenure".to_string(),
                sections: vec![
                    SectionConfig::new(S::StatSummary, "Early Tenure")
                        .with_metrics(&[M::ShortTenureEmployees]),
                    SectionConfig::new(S::TrendChart, "Short-Tenure Employees")
                        .with_metrics(&[M::ShortTenureEmployees]),
                    SectionConfig::new(S::EmployeeTable, "Newest Employees")
                        .with_employee_metric(Em::TenureDays)
                        .with_limit(20),
                ],
            },
            KpiConfig {
                key: "post_assignment_attrition".to_string(),
                title: "Post-Assignment Attrition".to_string(),
                sections: vec![
                    SectionConfig::new(S::StatSummary, "Post-Assignment Attrition")
                        .with_metrics(&[M::PostAssignmentResignations]),
                    SectionConfig::new(S::TrendChart, "Post-Assignment Resignations")
                        .with_metrics(&[M::PostAssignmentResignations]),
                ],
            },
            KpiConfig {
                key: "perfect_attendance".to_string(),
                title: "Perfect Attendance".to_string(),
                sections: vec![
                    SectionConfig::new(S::StatSummary, "Perfect Attendance")
                        .with_metrics(&[M::PerfectAttendance]),
                    SectionConfig::new(S::Timeline, "Attendance Timeline").with_limit(50),
                ],
            },
            KpiConfig {
                key: "service_awards".to_string(),
                title: "Service Awards".to_string(),
                sections: vec![
                    SectionConfig::new(S::StatSummary, "Long Service")
                        .with_metrics(&[M::LongTermEmployees]),
                    SectionConfig::new(S::EmployeeTable, "Longest-Serving Employees")
                        .with_employee_metric(Em::TenureDays)
                        .with_limit(20),
                ],
            },
            KpiConfig {
                key: "attrition_risk".to_string(),
                title: "Attrition Risk".to_string(),
                sections: vec![
                    SectionConfig::new(S::EmployeeTable, "Highest Risk")
                        .with_employee_metric(Em::RiskScore)
                        .with_limit(20),
                    SectionConfig::new(S::ComparisonChart, "Risk by Team")
                        .with_employee_metric(Em::RiskScore),
                ],
            },
            KpiConfig {
                key: "data_errors".to_string(),
                title: "Data Errors".to_string(),
                sections: vec![
                    SectionConfig::new(S::StatSummary, "Data Errors")
                        .with_metrics(&[M::DataErrors]),
                    SectionConfig::new(S::TrendChart, "Findings per Month")
                        .with_metrics(&[M::DataErrors]),
                ],
            },
        ];

        // The standard table is validated by construction; a failure here is
        // a programming error caught by the test suite.
        Self { kpis }
    }
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    kpi: Vec<RawKpi>,
}

#[derive(Debug, Deserialize)]
struct RawKpi {
    key: String,
    title: String,
    #[serde(default)]
    section: Vec<RawSection>,
}

#[derive(Debug, Deserialize)]
struct RawSection {
    #[serde(rename = "type")]
    section_type: String,
    title: String,
    #[serde(default)]
    metrics: Vec<String>,
    employee_metric: Option<String>,
    limit: Option<usize>,
    sort: Option<SortOrder>,
}

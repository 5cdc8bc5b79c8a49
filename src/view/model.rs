//! Renderer-agnostic view models and the factory that materializes them
//!
//! Dispatch is on [`SectionType`] alone: one pure function per type, shared
//! by every KPI view. Nothing here knows which KPI asked, and nothing here
//! produces markup: labels, series, rows, and counts only.

use serde::{Deserialize, Serialize};

use crate::index::{AggregationIndex, MetricDelta};
use crate::metrics::MetricKey;
use crate::month::MonthKey;
use crate::view::section::{KpiCatalog, KpiConfig, SectionConfig, SectionType, SortOrder};

/// One summary card: a metric's current value and its month-over-month move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatCard {
    pub label: String,
    pub metric: MetricKey,
    pub value: f64,
    /// Display form: rates get one decimal and a percent sign, counts are integral
    pub formatted: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<MetricDelta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatSummaryView {
    pub title: String,
    pub cards: Vec<StatCard>,
}

/// A named series of numeric values aligned with the chart's labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

/// Labels plus series, the shape trend and comparison charts share
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartView {
    pub title: String,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub employee_id: String,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableView {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRow {
    pub employee_id: String,
    pub name: String,
    /// Attendance rate per window month; `None` marks absence from the dataset
    pub cells: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineView {
    pub title: String,
    pub months: Vec<String>,
    pub rows: Vec<TimelineRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapView {
    pub title: String,
    /// Team names, sorted
    pub row_labels: Vec<String>,
    /// Window months, ascending
    pub col_labels: Vec<String>,
    /// `cells[row][col]`; `None` when the team has no members that month
    pub cells: Vec<Vec<Option<f64>>>,
}

/// The renderer-agnostic output of materializing one section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewModel {
    StatSummary(StatSummaryView),
    TrendChart(ChartView),
    ComparisonChart(ChartView),
    EmployeeTable(TableView),
    Timeline(TimelineView),
    Heatmap(HeatmapView),
}

/// All sections of one KPI view, materialized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiViews {
    pub key: String,
    pub title: String,
    pub sections: Vec<ViewModel>,
}

/// Stateless factory turning section configuration into view models
///
/// Safe to call concurrently per section: it only reads the index.
pub struct ViewModelFactory;

impl ViewModelFactory {
    /// Materialize one section for the target month
    pub fn materialize(
        section: &SectionConfig,
        index: &AggregationIndex,
        target: MonthKey,
    ) -> ViewModel {
        match section.section_type {
            SectionType::StatSummary => ViewModel::StatSummary(stat_summary(section, index, target)),
            SectionType::TrendChart => ViewModel::TrendChart(trend_chart(section, index)),
            SectionType::ComparisonChart => {
                ViewModel::ComparisonChart(comparison_chart(section, index, target))
            }
            SectionType::EmployeeTable => {
                ViewModel::EmployeeTable(employee_table(section, index, target))
            }
            SectionType::Timeline => ViewModel::Timeline(timeline(section, index)),
            SectionType::Heatmap => ViewModel::Heatmap(heatmap(section, index)),
        }
    }

    /// Materialize every section of one KPI view, in configured order
    pub fn materialize_kpi(
        kpi: &KpiConfig,
        index: &AggregationIndex,
        target: MonthKey,
    ) -> KpiViews {
        KpiViews {
            key: kpi.key.clone(),
            title: kpi.title.clone(),
            sections: kpi
                .sections
                .iter()
                .map(|section| Self::materialize(section, index, target))
                .collect(),
        }
    }

    /// Materialize the whole catalog
    pub fn materialize_catalog(
        catalog: &KpiCatalog,
        index: &AggregationIndex,
        target: MonthKey,
    ) -> Vec<KpiViews> {
        catalog
            .kpis()
            .iter()
            .map(|kpi| Self::materialize_kpi(kpi, index, target))
            .collect()
    }
}

/// Display form for a metric value
fn format_metric(key: MetricKey, value: f64) -> String {
    if key.is_rate() {
        format!("{value:.1}%")
    } else {
        format!("{}", value as i64)
    }
}

fn metric_label(name: &str) -> String {
    let mut label = String::new();
    for (i, part) in name.split('_').enumerate() {
        if i > 0 {
            label.push(' ');
        }
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            label.extend(first.to_uppercase());
            label.push_str(chars.as_str());
        }
    }
    label
}

fn stat_summary(
    section: &SectionConfig,
    index: &AggregationIndex,
    target: MonthKey,
) -> StatSummaryView {
    let cards = section
        .metrics
        .iter()
        .map(|&metric| {
            let value = index.snapshot(target).map_or(0.0, |s| s.get(metric));
            StatCard {
                label: metric_label(metric.as_str()),
                metric,
                value,
                formatted: format_metric(metric, value),
                delta: index.month_over_month_delta(metric, target),
            }
        })
        .collect();
    StatSummaryView {
        title: section.title.clone(),
        cards,
    }
}

fn trend_chart(section: &SectionConfig, index: &AggregationIndex) -> ChartView {
    let labels = index.months().iter().map(MonthKey::to_string).collect();
    let series = section
        .metrics
        .iter()
        .map(|&metric| Series {
            name: metric_label(metric.as_str()),
            values: index.trend(metric),
        })
        .collect();
    ChartView {
        title: section.title.clone(),
        labels,
        series,
    }
}

fn comparison_chart(
    section: &SectionConfig,
    index: &AggregationIndex,
    target: MonthKey,
) -> ChartView {
    // Validated at catalog assembly; an absent metric yields an empty chart.
    let Some(metric) = section.employee_metric else {
        return ChartView {
            title: section.title.clone(),
            labels: Vec::new(),
            series: Vec::new(),
        };
    };
    let aggregates = index.team_aggregate(metric, target);
    ChartView {
        title: section.title.clone(),
        labels: aggregates.iter().map(|a| a.team.clone()).collect(),
        series: vec![Series {
            name: metric_label(metric.as_str()),
            values: aggregates.iter().map(|a| a.average).collect(),
        }],
    }
}

fn employee_table(
    section: &SectionConfig,
    index: &AggregationIndex,
    target: MonthKey,
) -> TableView {
    let mut columns = vec![
        "Employee".to_string(),
        "Team".to_string(),
        "Position".to_string(),
        "Award Tier".to_string(),
        "Risk".to_string(),
    ];
    if let Some(metric) = section.employee_metric {
        columns.push(metric_label(metric.as_str()));
    }

    let mut entries: Vec<(String, f64)> = index
        .timelines()
        .iter()
        .filter(|(_, timeline)| timeline.active(target).is_some())
        .map(|(id, _)| {
            let sort_value = section
                .employee_metric
                .and_then(|metric| index.employee_metric(metric, id, target))
                .unwrap_or(0.0);
            (id.clone(), sort_value)
        })
        .collect();
    match section.options.sort {
        SortOrder::Descending => {
            entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        }
        SortOrder::Ascending => {
            entries.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        }
    }
    if let Some(limit) = section.options.limit {
        entries.truncate(limit);
    }

    let rows = entries
        .into_iter()
        .map(|(id, sort_value)| {
            let timeline = &index.timelines()[&id];
            let attributes = timeline.active(target);
            let mut cells = vec![
                timeline.name.clone(),
                attributes.map_or(String::new(), |a| a.team.clone()),
                attributes.map_or(String::new(), |a| a.position.clone()),
                index
                    .tenure_award_tier(&id, target)
                    .map_or("none", |tier| tier.as_str())
                    .to_string(),
                index
                    .risk_score(&id, target)
                    .map_or(String::new(), |score| score.to_string()),
            ];
            if section.employee_metric.is_some() {
                cells.push(format!("{sort_value:.1}"));
            }
            TableRow {
                employee_id: id,
                cells,
            }
        })
        .collect();

    TableView {
        title: section.title.clone(),
        columns,
        rows,
    }
}

fn timeline(section: &SectionConfig, index: &AggregationIndex) -> TimelineView {
    let months: Vec<MonthKey> = index.months().to_vec();
    let mut rows: Vec<TimelineRow> = index
        .timelines()
        .values()
        .map(|timeline| TimelineRow {
            employee_id: timeline.employee_id.clone(),
            name: timeline.name.clone(),
            cells: months
                .iter()
                .map(|&month| timeline.active(month).map(|a| a.attendance_rate))
                .collect(),
        })
        .collect();
    if let Some(limit) = section.options.limit {
        rows.truncate(limit);
    }
    TimelineView {
        title: section.title.clone(),
        months: months.iter().map(MonthKey::to_string).collect(),
        rows,
    }
}

fn heatmap(section: &SectionConfig, index: &AggregationIndex) -> HeatmapView {
    let Some(metric) = section.employee_metric else {
        return HeatmapView {
            title: section.title.clone(),
            row_labels: Vec::new(),
            col_labels: Vec::new(),
            cells: Vec::new(),
        };
    };
    let months: Vec<MonthKey> = index.months().to_vec();

    // One aggregate pass per month, then pivot to team rows.
    let per_month: Vec<_> = months
        .iter()
        .map(|&month| index.team_aggregate(metric, month))
        .collect();
    let mut teams: Vec<String> = per_month
        .iter()
        .flat_map(|aggregates| aggregates.iter().map(|a| a.team.clone()))
        .collect();
    teams.sort();
    teams.dedup();

    let cells = teams
        .iter()
        .map(|team| {
            per_month
                .iter()
                .map(|aggregates| {
                    aggregates
                        .iter()
                        .find(|a| &a.team == team)
                        .map(|a| a.average)
                })
                .collect()
        })
        .collect();

    HeatmapView {
        title: section.title.clone(),
        row_labels: teams,
        col_labels: months.iter().map(MonthKey::to_string).collect(),
        cells,
    }
}

//! JSON output bundle for renderers
//!
//! The bundle is self-describing: a renderer reads the month list from the
//! bundle itself and never hardcodes which months exist. One bundle is
//! written per generation run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::findings::Finding;
use crate::metrics::MetricSnapshot;
use crate::month::MonthKey;
use crate::timeline::EmployeeTimeline;
use crate::view::KpiViews;

/// Root output structure for one generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputBundle {
    /// Crate version that produced this bundle
    pub version: String,
    /// Format name and revision
    pub format: String,
    /// Resolved window, ascending; the only authority on which months exist
    pub months: Vec<MonthKey>,
    /// One snapshot per month, same order as `months`
    pub metrics: Vec<MetricSnapshot>,
    /// Timelines keyed by employee id
    pub timelines: BTreeMap<String, EmployeeTimeline>,
    /// Every finding from the run, month order then discovery order
    pub findings: Vec<Finding>,
    /// Materialized KPI views, present when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<Vec<KpiViews>>,
}

impl OutputBundle {
    pub fn new(
        months: Vec<MonthKey>,
        metrics: Vec<MetricSnapshot>,
        timelines: BTreeMap<String, EmployeeTimeline>,
        findings: Vec<Finding>,
    ) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "kintai-bundle-v1".to_string(),
            months,
            metrics,
            timelines,
            findings,
            views: None,
        }
    }

    pub fn with_views(mut self, views: Vec<KpiViews>) -> Self {
        self.views = Some(views);
        self
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// Declarative rendering contract: KPI section configuration and the
// renderer-agnostic view models materialized from it.
//
// A KPI view is nothing but an ordered list of SectionConfig entries; the
// factory dispatches on the section type alone. Adding a KPI is a data
// change, never a code change.

mod model;
mod section;

pub use model::{
    ChartView, HeatmapView, KpiViews, Series, StatCard, StatSummaryView, TableRow, TableView,
    TimelineRow, TimelineView, ViewModel, ViewModelFactory,
};
pub use section::{
    ConfigurationError, DisplayOptions, KpiCatalog, KpiConfig, SectionConfig, SectionType,
    SortOrder,
};

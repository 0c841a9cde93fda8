//! Report model types: field keys, the editable draft and the compiled
//! definition.

pub mod bucket;
pub mod definition;
pub mod draft;
pub mod field;
pub mod kind;
pub mod style;

pub use bucket::{ColumnKey, TimeBucket};
pub use definition::{
    ChargebackFilter, CompiledColumnOptions, CompiledGraph, DbOptions, RecordOptions,
    ReportRecord, ReportSpecification,
};
pub use draft::{
    ChartMode, ChartType, ColumnInfo, ColumnOptions, ColumnType, DraftReportState, GraphOptions,
    GroupMode, PivotOptions, SelectedField, SortOrder,
};
pub use field::{Aggregate, FieldKey};
pub use kind::{
    AllocatedMethod, AveragesBy, ChargebackGroupBy, ChargebackInterval, ChargebackOptions,
    PerfInterval, PerformanceOptions, ReportKind, ShowCostsBy, TrendOptions,
};
pub use style::{StyleOperator, StyleRule, StyleValue};

//! Draft editing operations.
//!
//! Each operation mutates a [`DraftReportState`](crate::model::DraftReportState)
//! in place and keeps the cross-field invariants intact: removing a field
//! prunes everything keyed to it, changing the first sort field resets the
//! second, and style chains never continue past a default rule.
//!
//! Operations validate before they mutate where they can; the edit session
//! additionally applies every edit to a copy and commits only on success.

pub mod chart;
pub mod fields;
pub mod options;
pub mod sort;
pub mod style;

pub use fields::{
    add_field, add_fields, expand_field_order, move_fields, remove_fields, set_pivot_aggregates,
    set_pivot_group, FieldOrderEntry, MoveDirection,
};
pub use sort::{derive_break_label, set_group, set_sort, set_sort_bucket, SortSlot};

use serde::{Deserialize, Serialize};

/// Screen region a client should redraw after an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Refresh {
    ColumnLists,
    PivotOptions,
    SortOptions,
    StyleRules,
    ChartOptions,
    ReportOptions,
    /// Whole editor; the base model changed.
    Editor,
}

impl Refresh {
    pub fn as_str(self) -> &'static str {
        match self {
            Refresh::ColumnLists => "column_lists",
            Refresh::PivotOptions => "pivot_options",
            Refresh::SortOptions => "sort_options",
            Refresh::StyleRules => "style_rules",
            Refresh::ChartOptions => "chart_options",
            Refresh::ReportOptions => "report_options",
            Refresh::Editor => "editor",
        }
    }
}

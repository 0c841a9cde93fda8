//! Draft validation.
//!
//! Two modes share one set of checks: switching tabs checks what the target
//! tab needs, saving checks the whole report. Both collect every violation,
//! kept in tab order, so the first one names the leftmost tab to show.

mod tabs;

pub use tabs::{available_tabs, Tab};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::editor::fields::expand_field_order;
use crate::model::bucket::ColumnKey;
use crate::model::draft::{ChartMode, DraftReportState};
use crate::model::kind::{ReportKind, TrendOptions};

/// One violation and the tab that fixes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub tab: Tab,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// All violations found by one check, ordered by tab and then by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Tab to show instead, decided by the first violation.
    pub fn redirect(&self) -> Option<Tab> {
        self.errors.first().map(|e| e.tab)
    }

    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }

    fn push(&mut self, tab: Tab, message: impl Into<String>) {
        let at = self.errors.partition_point(|e| e.tab <= tab);
        self.errors.insert(
            at,
            ValidationError {
                tab,
                message: message.into(),
            },
        );
    }

    /// `Ok` when nothing was found.
    pub fn into_result(self) -> Result<(), ValidationReport> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

/// Check whether the editor may switch to `tab`.
pub fn check_tab(state: &DraftReportState, tab: Tab) -> ValidationReport {
    let mut report = ValidationReport::default();

    if !available_tabs(&state.kind).contains(&tab) {
        report.push(
            Tab::Columns,
            format!("{} tab is not available for {} reports", tab, state.kind.name()),
        );
        return report;
    }

    match tab {
        Tab::Columns => {}
        Tab::Consolidation | Tab::Formatting | Tab::Summary | Tab::Styling => {
            require_fields(state, tab, &mut report);
        }
        Tab::Filter => match &state.kind {
            ReportKind::Trend(trend) => check_trend_tab(trend, tab, &mut report),
            _ => {
                require_fields(state, tab, &mut report);
            }
        },
        Tab::Charts => {
            if require_fields(state, tab, &mut report) && state.sort_by1.is_none() {
                report.push(
                    Tab::Summary,
                    "Charts tab is not available unless a sort field has been selected",
                );
            }
        }
        Tab::Preview => match &state.kind {
            ReportKind::Trend(trend) => check_trend_tab(trend, tab, &mut report),
            ReportKind::Chargeback(cb) => {
                if require_fields(state, tab, &mut report)
                    && !cb.show_by.as_ref().is_some_and(|s| s.is_complete())
                {
                    report.push(
                        Tab::Filter,
                        "Preview tab is not available until Chargeback Filters has been configured",
                    );
                }
            }
            _ => {
                if require_fields(state, tab, &mut report) {
                    check_chart_column(state, &mut report);
                }
            }
        },
    }
    report
}

/// Check everything the compiled report depends on.
pub fn validate_report(state: &DraftReportState) -> ValidationReport {
    let mut report = ValidationReport::default();

    if state.model.is_none() {
        report.push(Tab::Columns, "A base model must be selected");
    }

    match &state.kind {
        ReportKind::Trend(trend) => {
            if trend.trend_col.is_none() {
                report.push(Tab::Columns, "Trending for is required");
            }
            if !trend.has_target_limit() {
                report.push(Tab::Columns, "Trend Target Limit must be configured");
            }
            if !trend.limit_val_is_numeric() {
                report.push(Tab::Columns, "Trend Target Limit must be numeric");
            }
        }
        _ => {
            if state.selected_fields.is_empty() {
                report.push(Tab::Columns, "At least one Field must be selected");
            }
        }
    }

    if let ReportKind::Chargeback(cb) = &state.kind {
        if let Some(message) = cb.missing() {
            report.push(Tab::Filter, message);
        }
    }

    check_chart_column(state, &mut report);
    if state.graph.is_some() && state.sort_by1.is_none() {
        report.push(Tab::Summary, "A sort field must be selected to show a chart");
    }

    check_styles(state, &mut report);
    report
}

/// Check the whole report before saving: everything [`validate_report`]
/// checks plus the name and title the record is stored under.
pub fn validate_for_save(state: &DraftReportState) -> ValidationReport {
    let mut report = validate_report(state);
    if state.name.trim().is_empty() {
        report.push(Tab::Columns, "Name can't be blank");
    }
    if state.title.trim().is_empty() {
        report.push(Tab::Columns, "Title can't be blank");
    }
    report
}

fn require_fields(state: &DraftReportState, tab: Tab, report: &mut ValidationReport) -> bool {
    if state.selected_fields.is_empty() {
        report.push(
            Tab::Columns,
            format!("{} tab is not available until at least 1 field has been selected", tab),
        );
        return false;
    }
    true
}

fn check_trend_tab(trend: &TrendOptions, tab: Tab, report: &mut ValidationReport) {
    if trend.trend_col.is_none() {
        report.push(
            Tab::Columns,
            format!("{} tab is not available until Trending for field has been selected", tab),
        );
    }
    if !trend.has_target_limit() {
        report.push(
            Tab::Columns,
            format!("{} tab is not available until Trend Target Limit has been configured", tab),
        );
    }
    if !trend.limit_val_is_numeric() {
        report.push(Tab::Columns, "Trend Target Limit must be numeric");
    }
}

fn check_chart_column(state: &DraftReportState, report: &mut ValidationReport) {
    if let Some(graph) = &state.graph {
        if graph.mode == ChartMode::Values && graph.column.is_none() {
            report.push(
                Tab::Charts,
                "Data column must be selected when chart mode is set to \"Values\"",
            );
        }
    }
}

fn check_styles(state: &DraftReportState, report: &mut ValidationReport) {
    for entry in expand_field_order(state) {
        let Some(options) = state.col_options.get(&ColumnKey::plain(entry.key.clone())) else {
            continue;
        };
        let data_type = state.column_info(&entry.key).data_type;
        for (index, rule) in options.style.iter().enumerate() {
            if let Some(problem) = rule.check(data_type) {
                report.push(
                    Tab::Styling,
                    format!(
                        "Styling for '{}', {} value is in error: {}",
                        entry.label,
                        ordinal(index),
                        problem
                    ),
                );
            }
        }
    }
}

fn ordinal(index: usize) -> String {
    match index {
        0 => "first".to_string(),
        1 => "second".to_string(),
        2 => "third".to_string(),
        n => format!("rule {}", n + 1),
    }
}

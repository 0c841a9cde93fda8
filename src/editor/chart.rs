//! Chart options.

use crate::config::EditorSettings;
use crate::editor::fields::{expand_field_order, FieldOrderEntry};
use crate::error::{Error, Result};
use crate::model::draft::{ChartMode, ChartType, DraftReportState, GraphOptions};
use crate::model::field::FieldKey;

/// Choose a chart type; `None` removes the chart.
///
/// The first chart chosen starts in counts mode showing the configured
/// number of slices with the remainder folded into "Other".
pub fn set_chart_type(
    state: &mut DraftReportState,
    chart_type: Option<ChartType>,
    settings: &EditorSettings,
) {
    let Some(chart_type) = chart_type else {
        state.graph = None;
        return;
    };
    match state.graph.as_mut() {
        Some(graph) => graph.chart_type = chart_type,
        None => {
            state.graph = Some(GraphOptions {
                chart_type,
                mode: ChartMode::Counts,
                column: None,
                count: settings.graph_max_count,
                include_other: true,
            });
        }
    }
}

/// Switch between plotting row counts and column values.
///
/// Values need grouping; leaving values mode forgets the data column.
pub fn set_chart_mode(state: &mut DraftReportState, mode: ChartMode) -> Result<()> {
    let grouping = state.group.is_grouping();
    let graph = graph_mut(state)?;
    if mode == ChartMode::Values && !grouping {
        return Err(Error::ChartUnavailable(
            "values charts require grouping".to_string(),
        ));
    }
    graph.mode = mode;
    if mode == ChartMode::Counts {
        graph.column = None;
    }
    Ok(())
}

/// Choose the data column of a values chart.
pub fn set_chart_column(state: &mut DraftReportState, column: Option<FieldKey>) -> Result<()> {
    if let Some(column) = &column {
        if !chart_fields(state).iter().any(|entry| &entry.key == column) {
            return Err(Error::UnknownField(column.encode()));
        }
    }
    let graph = graph_mut(state)?;
    if graph.mode != ChartMode::Values {
        return Err(Error::ChartUnavailable(
            "a data column only applies to values charts".to_string(),
        ));
    }
    graph.column = column;
    Ok(())
}

/// Number of slices shown before the rest is folded into "Other".
pub fn set_chart_count(state: &mut DraftReportState, count: u32) -> Result<()> {
    if count == 0 {
        return Err(Error::invalid("chart count", "must be at least 1"));
    }
    graph_mut(state)?.count = count;
    Ok(())
}

pub fn set_chart_other(state: &mut DraftReportState, include_other: bool) -> Result<()> {
    graph_mut(state)?.include_other = include_other;
    Ok(())
}

/// Display-order entries a values chart can plot: numeric columns and
/// pivot calculations.
pub fn chart_fields(state: &DraftReportState) -> Vec<FieldOrderEntry> {
    expand_field_order(state)
        .into_iter()
        .filter(|entry| {
            entry.key.aggregate().is_some() || state.column_info(&entry.key).data_type.is_numeric()
        })
        .collect()
}

fn graph_mut(state: &mut DraftReportState) -> Result<&mut GraphOptions> {
    state
        .graph
        .as_mut()
        .ok_or_else(|| Error::ChartUnavailable("no chart type is selected".to_string()))
}

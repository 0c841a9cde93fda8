//! Base model, report kind options and scalar report settings.

use tracing::info;

use crate::config::ModelSettings;
use crate::error::{Error, Result};
use crate::model::draft::{DraftReportState, GroupMode, PivotOptions};
use crate::model::field::FieldKey;
use crate::model::kind::{
    AllocatedMethod, AveragesBy, ChargebackGroupBy, ChargebackInterval, ChargebackOptions,
    PerfInterval, PerformanceOptions, ReportKind, ShowCostsBy, TrendOptions,
};

/// Change the base model.
///
/// Everything chosen against the old model is reset and the report kind is
/// re-derived with fresh defaults. Returns `false` when the model is
/// unchanged.
pub fn set_model(
    state: &mut DraftReportState,
    model: &str,
    settings: &ModelSettings,
    tz: Option<&str>,
) -> Result<bool> {
    let model = model.trim();
    if model.is_empty() {
        return Err(Error::invalid("model", "a base model is required"));
    }
    if state.model.as_deref() == Some(model) {
        return Ok(false);
    }

    state.model = Some(model.to_string());
    state.kind = ReportKind::for_model(model, settings, tz);
    reset_columns(state);
    info!(model, kind = state.kind.name(), "base model changed");
    Ok(true)
}

fn reset_columns(state: &mut DraftReportState) {
    state.selected_fields.clear();
    state.headers.clear();
    state.col_formats.clear();
    state.pivot = PivotOptions::default();
    state.pivot_aggregates.clear();
    state.sort_by1 = None;
    state.sort_by2 = None;
    state.group = GroupMode::None;
    state.hide_details = false;
    state.col_options.clear();
    state.graph = None;
    state.record_filter = None;
    state.display_filter = None;
}

fn mismatch(option: &str, kind: &ReportKind) -> Error {
    Error::KindMismatch {
        option: option.to_string(),
        kind: kind.name().to_string(),
    }
}

fn performance_mut<'a>(
    state: &'a mut DraftReportState,
    option: &str,
) -> Result<&'a mut PerformanceOptions> {
    match &mut state.kind {
        ReportKind::Performance(options) => Ok(options),
        other => Err(mismatch(option, other)),
    }
}

fn trend_mut<'a>(state: &'a mut DraftReportState, option: &str) -> Result<&'a mut TrendOptions> {
    match &mut state.kind {
        ReportKind::Trend(options) => Ok(options),
        other => Err(mismatch(option, other)),
    }
}

fn chargeback_mut<'a>(
    state: &'a mut DraftReportState,
    option: &str,
) -> Result<&'a mut ChargebackOptions> {
    match &mut state.kind {
        ReportKind::Chargeback(options) => Ok(options),
        other => Err(mismatch(option, other)),
    }
}

/// Change the interval of a performance or trend report, resetting the
/// offsets to the interval's defaults.
pub fn set_perf_interval(state: &mut DraftReportState, interval: PerfInterval) -> Result<()> {
    let (start, end) = interval.default_offsets();
    match &mut state.kind {
        ReportKind::Performance(options) => {
            options.interval = interval;
            options.start_offset = start;
            options.end_offset = end;
        }
        ReportKind::Trend(options) => {
            options.interval = interval;
            options.start_offset = start;
            options.end_offset = end;
        }
        other => return Err(mismatch("interval", other)),
    }
    Ok(())
}

/// Set the look-back window in seconds.
pub fn set_perf_offsets(state: &mut DraftReportState, start: u64, end: u64) -> Result<()> {
    if start == 0 {
        return Err(Error::invalid("start offset", "the range can not be empty"));
    }
    match &mut state.kind {
        ReportKind::Performance(options) => {
            if start.checked_add(end).is_none() {
                return Err(Error::invalid("start offset", "the range is too large"));
            }
            options.start_offset = start;
            options.end_offset = end;
        }
        ReportKind::Trend(options) => {
            options.start_offset = start;
            options.end_offset = end;
        }
        other => return Err(mismatch("offsets", other)),
    }
    Ok(())
}

pub fn set_calc_avgs_by(state: &mut DraftReportState, by: AveragesBy) -> Result<()> {
    performance_mut(state, "calculate averages by")?.calc_avgs_by = by;
    Ok(())
}

pub fn set_time_profile(state: &mut DraftReportState, profile: Option<u64>) -> Result<()> {
    performance_mut(state, "time profile")?.time_profile = profile;
    Ok(())
}

/// Choose the trended column; the target limit starts over.
pub fn set_trend_column(state: &mut DraftReportState, column: Option<FieldKey>) -> Result<()> {
    let options = trend_mut(state, "trend column")?;
    options.trend_db = column.as_ref().map(|c| c.model().to_string());
    options.trend_col = column.as_ref().map(|c| c.column().to_string());
    options.limit_col = None;
    options.limit_val = None;
    Ok(())
}

/// Set the trend target limit: either a limit column or a fixed value.
pub fn set_trend_limit(
    state: &mut DraftReportState,
    limit_col: Option<String>,
    limit_val: Option<String>,
) -> Result<()> {
    let options = trend_mut(state, "trend limit")?;
    options.limit_col = limit_col.filter(|c| !c.trim().is_empty());
    options.limit_val = if options.limit_col.is_some() {
        None
    } else {
        limit_val.filter(|v| !v.trim().is_empty())
    };
    Ok(())
}

/// Set target percentage `index` (0 to 2).
pub fn set_target_pct(state: &mut DraftReportState, index: usize, pct: Option<u32>) -> Result<()> {
    let options = trend_mut(state, "target percentage")?;
    let slot = options
        .target_pcts
        .get_mut(index)
        .ok_or_else(|| Error::invalid("target percentage", format!("no target {}", index + 1)))?;
    *slot = pct;
    Ok(())
}

pub fn set_chargeback_show_by(state: &mut DraftReportState, show_by: Option<ShowCostsBy>) -> Result<()> {
    chargeback_mut(state, "show costs by")?.show_by = show_by;
    Ok(())
}

pub fn set_chargeback_group_by(
    state: &mut DraftReportState,
    group_by: ChargebackGroupBy,
) -> Result<()> {
    chargeback_mut(state, "group by")?.group_by = group_by;
    Ok(())
}

pub fn set_chargeback_interval(
    state: &mut DraftReportState,
    interval: ChargebackInterval,
    size: u32,
    end_offset: u32,
) -> Result<()> {
    if size == 0 {
        return Err(Error::invalid("interval size", "must be at least 1"));
    }
    let options = chargeback_mut(state, "interval")?;
    options.interval = interval;
    options.interval_size = size;
    options.end_interval_offset = end_offset;
    Ok(())
}

pub fn set_chargeback_metrics(
    state: &mut DraftReportState,
    include_metrics: bool,
    method: AllocatedMethod,
    cumulative: bool,
) -> Result<()> {
    let options = chargeback_mut(state, "metrics")?;
    options.include_metrics = include_metrics;
    options.method_for_allocated_metrics = method;
    options.cumulative_rate_calculation = cumulative;
    Ok(())
}

/// Limit plain listings to `limit` rows; `None` lifts the limit.
pub fn set_row_limit(state: &mut DraftReportState, limit: Option<u32>) -> Result<()> {
    if limit == Some(0) {
        return Err(Error::invalid("row limit", "must be at least 1"));
    }
    state.row_limit = limit;
    Ok(())
}

pub fn set_queue_timeout(state: &mut DraftReportState, minutes: Option<u32>) {
    state.queue_timeout = minutes.filter(|m| *m > 0);
}

pub fn set_pdf_page_size(state: &mut DraftReportState, size: &str) -> Result<()> {
    if size.trim().is_empty() {
        return Err(Error::invalid("PDF page size", "a page size is required"));
    }
    state.pdf_page_size = size.trim().to_string();
    Ok(())
}

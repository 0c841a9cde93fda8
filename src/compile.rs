//! Compilation from an edited draft to a report specification.
//!
//! ```text
//! Draft → Validate → Expand field order → Columns / Joins / Sorts / Pivots
//!       → Column options → Kind options → ReportSpecification
//! ```
//!
//! # Example
//!
//! ```ignore
//! use reportwright::compile::compile;
//!
//! let spec = compile(&draft)?;
//! println!("{}", serde_json::to_string_pretty(&spec)?);
//! ```
//!
//! Compilation is a pure function of the draft: it performs no I/O and
//! returns the same specification for the same draft.

use std::collections::BTreeMap;

use tracing::info;

use crate::catalog::derive_header;
use crate::editor::chart::chart_fields;
use crate::editor::fields::{expand_field_order, FieldOrderEntry};
use crate::error::{Error, Result};
use crate::join::JoinTree;
use crate::model::bucket::ColumnKey;
use crate::model::definition::{
    ChargebackFilter, CompiledColumnOptions, CompiledGraph, DbOptions, ReportSpecification,
};
use crate::model::draft::{ChartMode, DraftReportState, GroupMode, SortOrder};
use crate::model::kind::{ChargebackGroupBy, ChargebackOptions, ReportKind, ShowCostsBy};
use crate::validation::validate_report;

/// Column every trend report is sorted by.
pub const TREND_SORT_COLUMN: &str = "resource_name";

// ============================================================================
// Compilation Functions
// ============================================================================

/// Compile a draft into a report specification.
///
/// The draft is validated first; any violation aborts compilation with
/// [`Error::Validation`] and no specification is produced.
pub fn compile(state: &DraftReportState) -> Result<ReportSpecification> {
    validate_report(state).into_result()?;

    let db = state
        .model
        .clone()
        .ok_or_else(|| Error::invalid("model", "a base model is required"))?;

    let order = expand_field_order(state);
    let mut columns = Columns::default();
    for entry in &order {
        columns.add(state, entry);
    }

    let (sortby, order_dir) = match &state.kind {
        ReportKind::Trend(_) => (vec![TREND_SORT_COLUMN.to_string()], Some(SortOrder::Ascending)),
        _ => {
            let sortby = sort_paths(state, &order);
            let dir = (!sortby.is_empty()).then_some(state.order);
            (sortby, dir)
        }
    };

    let pivot_group_cols = if state.pivot.is_active() {
        state
            .pivot
            .slots()
            .into_iter()
            .flatten()
            .filter(|key| order.iter().any(|entry| &entry.key == *key))
            .map(|key| key.report_column())
            .collect()
    } else {
        Vec::new()
    };

    let (graph, dims) = compile_graph(state, &sortby);
    let spec = ReportSpecification {
        db,
        cols: columns.cols,
        include: columns.include,
        col_order: columns.col_order,
        headers: columns.headers,
        col_formats: columns.col_formats,
        sortby,
        order: order_dir,
        group: group_code(state.group),
        pivot_group_cols,
        graph,
        dims,
        col_options: compile_col_options(state, &order),
        conditions: state.record_filter().cloned(),
        display_filter: state.display_filter().cloned(),
        db_options: db_options(&state.kind)?,
        time_profile: match &state.kind {
            ReportKind::Performance(perf) => perf.time_profile,
            _ => None,
        },
        tz: state.kind.tz().map(str::to_string),
    };

    info!(
        model = %spec.db,
        columns = spec.col_order.len(),
        joins = !spec.include.is_empty(),
        "report compiled"
    );
    Ok(spec)
}

// ============================================================================
// Columns
// ============================================================================

#[derive(Default)]
struct Columns {
    cols: Vec<String>,
    include: JoinTree,
    col_order: Vec<String>,
    headers: Vec<String>,
    col_formats: Vec<Option<String>>,
}

impl Columns {
    fn add(&mut self, state: &DraftReportState, entry: &FieldOrderEntry) {
        let key = &entry.key;
        if key.is_joined() {
            self.include.insert(key.join_path(), key.column());
        } else if !self.cols.iter().any(|c| c == key.column()) {
            self.cols.push(key.column().to_string());
        }
        self.col_order.push(key.report_column());
        self.headers.push(header(state, entry));
        self.col_formats.push(state.col_formats.get(key).cloned());
    }
}

fn header(state: &DraftReportState, entry: &FieldOrderEntry) -> String {
    if let Some(header) = state.headers.get(&entry.key) {
        return header.clone();
    }
    let base = state
        .headers
        .get(&entry.key.base())
        .cloned()
        .unwrap_or_else(|| derive_header(&entry.label));
    match entry.key.aggregate() {
        Some(kind) => format!("{} ({})", base, kind.title()),
        None => base,
    }
}

/// Sort paths with the bucket suffix, first slot first. Each slot whose
/// column is no longer displayed is skipped on its own.
fn sort_paths(state: &DraftReportState, order: &[FieldOrderEntry]) -> Vec<String> {
    let displayed = |slot: &&ColumnKey| order.iter().any(|entry| entry.key == slot.field);
    [state.sort_by1.as_ref(), state.sort_by2.as_ref()]
        .into_iter()
        .flatten()
        .filter(displayed)
        .map(ColumnKey::report_column)
        .collect()
}

fn group_code(group: GroupMode) -> Option<String> {
    match group {
        GroupMode::None => None,
        GroupMode::GroupAndShowDetail => Some("y".to_string()),
        GroupMode::GroupCountsOnly => Some("c".to_string()),
    }
}

// ============================================================================
// Charts and column options
// ============================================================================

fn compile_graph(state: &DraftReportState, sortby: &[String]) -> (Option<CompiledGraph>, Option<u8>) {
    let (Some(graph), false) = (&state.graph, sortby.is_empty()) else {
        return (None, None);
    };
    if state.kind.is_trend() {
        return (None, None);
    }

    let column = match (&graph.column, graph.mode) {
        (Some(column), _) => Some(column.report_column()),
        (None, ChartMode::Values) => chart_fields(state)
            .first()
            .map(|entry| entry.key.report_column()),
        (None, ChartMode::Counts) => None,
    };
    let dims = if graph.chart_type.is_single_dimension() {
        1
    } else if sortby.len() > 1 {
        2
    } else {
        1
    };

    let compiled = CompiledGraph {
        chart_type: graph.chart_type,
        mode: graph.mode,
        column,
        count: graph.count,
        other: graph.include_other,
    };
    (Some(compiled), Some(dims))
}

fn compile_col_options(
    state: &DraftReportState,
    order: &[FieldOrderEntry],
) -> BTreeMap<String, CompiledColumnOptions> {
    let grouping = state.group.is_grouping();
    let mut compiled = BTreeMap::new();

    for (key, options) in &state.col_options {
        if !order.iter().any(|entry| entry.key == key.field) {
            continue;
        }
        let is_break = state.sort_by1.as_ref() == Some(key);
        let entry = CompiledColumnOptions {
            style: if key.bucket.is_none() {
                options.style.clone()
            } else {
                Vec::new()
            },
            break_label: if grouping && is_break {
                options.break_label.clone()
            } else {
                None
            },
            break_format: if is_break {
                options.break_format.clone()
            } else {
                None
            },
            grouping: if grouping {
                options.grouping.clone()
            } else {
                Default::default()
            },
        };
        if entry != CompiledColumnOptions::default() {
            compiled.insert(key.report_column(), entry);
        }
    }
    compiled
}

// ============================================================================
// Kind options
// ============================================================================

fn db_options(kind: &ReportKind) -> Result<Option<DbOptions>> {
    let options = match kind {
        ReportKind::Standard => return Ok(None),
        ReportKind::Performance(perf) => DbOptions::Performance {
            interval: perf.interval,
            calc_avgs_by: perf.calc_avgs_by,
            start_offset: perf.end_offset.saturating_add(perf.start_offset),
            end_offset: perf.end_offset,
        },
        ReportKind::Trend(trend) => DbOptions::Trend {
            interval: trend.interval,
            start_offset: trend.start_offset,
            end_offset: trend.end_offset,
            trend_db: trend.trend_db.clone(),
            trend_col: trend.trend_col.clone(),
            limit_col: trend.limit_col.clone(),
            limit_val: trend.limit_val.clone(),
            target_pcts: trend.target_pcts.iter().flatten().copied().collect(),
        },
        ReportKind::Chargeback(cb) => chargeback_options(cb)?,
    };
    Ok(Some(options))
}

fn chargeback_options(cb: &ChargebackOptions) -> Result<DbOptions> {
    let incomplete = || Error::invalid("show costs by", "the selection is incomplete");
    let show_by = match cb.show_by.as_ref().ok_or_else(incomplete)? {
        ShowCostsBy::Owner { owner_id } => ChargebackFilter::Owner {
            owner: owner_id.clone().ok_or_else(incomplete)?,
        },
        ShowCostsBy::Tenant { tenant_id } => ChargebackFilter::Tenant {
            tenant_id: tenant_id.clone().ok_or_else(incomplete)?,
        },
        ShowCostsBy::Tag { category, value } => {
            let (Some(category), Some(value)) = (category, value) else {
                return Err(incomplete());
            };
            ChargebackFilter::Tag {
                tag: format!("/managed/{}/{}", category, value),
            }
        }
        ShowCostsBy::Entity {
            provider_id,
            entity_id,
        } => ChargebackFilter::Entity {
            provider_id: provider_id.clone(),
            entity_id: entity_id.clone().ok_or_else(incomplete)?,
        },
    };

    let (groupby, groupby_tag, groupby_label) = match &cb.group_by {
        ChargebackGroupBy::Date => ("date", None, None),
        ChargebackGroupBy::Vm => ("vm", None, None),
        ChargebackGroupBy::Project => ("project", None, None),
        ChargebackGroupBy::Tenant => ("tenant", None, None),
        ChargebackGroupBy::Tag(tag) => ("tag", tag.clone(), None),
        ChargebackGroupBy::Label(label) => ("label", None, label.clone()),
    };

    Ok(DbOptions::Chargeback {
        model: cb.cb_model.clone(),
        interval: cb.interval,
        interval_size: cb.interval_size,
        end_interval_offset: cb.end_interval_offset,
        show_by,
        groupby: groupby.to_string(),
        groupby_tag,
        groupby_label,
        include_metrics: cb.include_metrics,
        method_for_allocated_metrics: cb.method_for_allocated_metrics,
        cumulative_rate_calculation: cb.cumulative_rate_calculation,
    })
}

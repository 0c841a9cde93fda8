//! Rebuilding an editable draft from a persisted report.
//!
//! Loading inverts compilation: display columns become selected fields,
//! aggregate suffixes become pivot calculations, and sort paths become sort
//! slots again. Joined columns are located through the report's join tree.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::catalog::{fallback_label, FieldCatalog};
use crate::config::ModelSettings;
use crate::error::{Error, Result};
use crate::join::JoinTree;
use crate::model::bucket::{ColumnKey, TimeBucket};
use crate::model::definition::{ChargebackFilter, CompiledGraph, DbOptions, ReportRecord};
use crate::model::draft::{ColumnOptions, DraftReportState, GraphOptions, GroupMode, SelectedField};
use crate::model::field::{Aggregate, FieldKey, SUFFIX_SEPARATOR};
use crate::model::kind::{
    ChargebackGroupBy, ChargebackOptions, PerformanceOptions, ReportKind, ShowCostsBy,
    TrendOptions,
};

/// Rebuild the draft a record was saved from.
pub fn load(
    record: &ReportRecord,
    catalog: &dyn FieldCatalog,
    settings: &ModelSettings,
) -> Result<DraftReportState> {
    let spec = &record.spec;
    let kind = match &spec.db_options {
        Some(options) => kind_from(options, spec.time_profile, spec.tz.as_deref())?,
        None => ReportKind::for_model(&spec.db, settings, spec.tz.as_deref()),
    };

    let mut state = DraftReportState::for_model(&spec.db, kind);
    state.name = record.name.clone();
    state.title = record.title.clone();
    state.rpt_group = record.rpt_group.clone();
    state.rpt_type = record.rpt_type.clone();
    state.priority = record.priority;
    state.categories = record.categories.clone();
    state.row_limit = record.rpt_options.row_limit;
    state.queue_timeout = record.rpt_options.queue_timeout;
    if let Some(size) = &record.rpt_options.pdf_page_size {
        state.pdf_page_size = size.clone();
    }
    state.record_filter = spec.conditions.clone();
    state.display_filter = spec.display_filter.clone();

    // Final column name -> key, for resolving sorts, pivots and options.
    let mut columns: BTreeMap<String, FieldKey> = BTreeMap::new();
    for (index, column) in spec.col_order.iter().enumerate() {
        let (field, aggregate) = column_key(&spec.db, column, &spec.include)?;
        if !state.is_selected(&field) {
            state.selected_fields.push(selected(catalog, &field));
        }
        let key = match aggregate {
            Some(kind) => {
                state
                    .pivot_aggregates
                    .entry(field.clone())
                    .or_default()
                    .insert(kind);
                field.with_aggregate(kind)
            }
            None => field,
        };
        if let Some(header) = spec.headers.get(index) {
            state.headers.insert(key.clone(), header.clone());
        }
        if let Some(Some(format)) = spec.col_formats.get(index) {
            state.col_formats.insert(key.clone(), format.clone());
        }
        columns.insert(column.clone(), key);
    }

    let groups = spec
        .pivot_group_cols
        .iter()
        .map(|col| lookup(&columns, col))
        .collect::<Result<Vec<_>>>()?;
    state.pivot.assign(groups);
    if !state.pivot.is_active() {
        state.pivot_aggregates.clear();
    }

    if !state.kind.is_trend() {
        let mut slots = spec.sortby.iter().map(|path| sort_key(&columns, path));
        state.sort_by1 = slots.next().transpose()?;
        state.sort_by2 = slots.next().transpose()?;
        if let Some(order) = spec.order {
            state.order = order;
        }
    }

    state.group = match spec.group.as_deref() {
        Some("y") => GroupMode::GroupAndShowDetail,
        Some("c") => GroupMode::GroupCountsOnly,
        _ => GroupMode::None,
    };
    state.hide_details = state.group.is_grouping() && record.rpt_options.hide_detail_rows;

    for (column, options) in &spec.col_options {
        let Ok(key) = sort_key(&columns, column) else {
            warn!(column = %column, "column options for a column that is not displayed");
            continue;
        };
        state.col_options.insert(
            key,
            ColumnOptions {
                style: options.style.clone(),
                break_label: options.break_label.clone(),
                break_format: options.break_format.clone(),
                grouping: options.grouping.clone(),
            },
        );
    }

    state.graph = match &spec.graph {
        Some(graph) => Some(graph_from(graph, &columns)?),
        None => None,
    };

    debug!(
        report = %record.name,
        fields = state.selected_fields.len(),
        "report loaded"
    );
    Ok(state)
}

/// Split a final column name into its field and aggregate.
fn column_key(
    model: &str,
    column: &str,
    include: &JoinTree,
) -> Result<(FieldKey, Option<Aggregate>)> {
    let (name, aggregate) = match column.rsplit_once(SUFFIX_SEPARATOR) {
        Some((name, suffix)) => match suffix.parse::<Aggregate>() {
            Ok(kind) => (name, Some(kind)),
            Err(_) => (column, None),
        },
        None => (column, None),
    };

    let field = match name.rsplit_once('.') {
        None => FieldKey::new(model, name)?,
        Some((tables, field)) => {
            let path = include
                .resolve_join_path(name)
                .unwrap_or_else(|| tables.split('.').map(str::to_string).collect());
            FieldKey::joined(model, &path, field)?
        }
    };
    Ok((field, aggregate))
}

fn selected(catalog: &dyn FieldCatalog, key: &FieldKey) -> SelectedField {
    match catalog.find(key) {
        Some(available) => available.to_selected(),
        None => SelectedField::new(&fallback_label(key), key.clone()),
    }
}

fn lookup(columns: &BTreeMap<String, FieldKey>, column: &str) -> Result<FieldKey> {
    columns
        .get(column)
        .cloned()
        .ok_or_else(|| Error::UnknownField(column.to_string()))
}

/// A final column name, possibly carrying a time bucket suffix.
fn sort_key(columns: &BTreeMap<String, FieldKey>, path: &str) -> Result<ColumnKey> {
    if let Some(key) = columns.get(path) {
        return Ok(ColumnKey::plain(key.clone()));
    }
    let Some((head, suffix)) = path.rsplit_once(SUFFIX_SEPARATOR) else {
        return Err(Error::UnknownField(path.to_string()));
    };
    let bucket = suffix.parse::<TimeBucket>()?;
    Ok(ColumnKey::new(lookup(columns, head)?, Some(bucket)))
}

fn graph_from(graph: &CompiledGraph, columns: &BTreeMap<String, FieldKey>) -> Result<GraphOptions> {
    let column = match &graph.column {
        Some(column) => Some(lookup(columns, column)?),
        None => None,
    };
    Ok(GraphOptions {
        chart_type: graph.chart_type,
        mode: graph.mode,
        column,
        count: graph.count,
        include_other: graph.other,
    })
}

fn kind_from(
    options: &DbOptions,
    time_profile: Option<u64>,
    tz: Option<&str>,
) -> Result<ReportKind> {
    let tz = tz.map(str::to_string);
    let kind = match options {
        DbOptions::Performance {
            interval,
            calc_avgs_by,
            start_offset,
            end_offset,
        } => ReportKind::Performance(PerformanceOptions {
            interval: *interval,
            calc_avgs_by: *calc_avgs_by,
            start_offset: start_offset.saturating_sub(*end_offset),
            end_offset: *end_offset,
            time_profile,
            tz,
        }),
        DbOptions::Trend {
            interval,
            start_offset,
            end_offset,
            trend_db,
            trend_col,
            limit_col,
            limit_val,
            target_pcts,
        } => {
            let mut pcts = [None; 3];
            for (slot, pct) in pcts.iter_mut().zip(target_pcts) {
                *slot = Some(*pct);
            }
            ReportKind::Trend(TrendOptions {
                interval: *interval,
                start_offset: *start_offset,
                end_offset: *end_offset,
                trend_db: trend_db.clone(),
                trend_col: trend_col.clone(),
                limit_col: limit_col.clone(),
                limit_val: limit_val.clone(),
                target_pcts: pcts,
                tz,
            })
        }
        DbOptions::Chargeback {
            model,
            interval,
            interval_size,
            end_interval_offset,
            show_by,
            groupby,
            groupby_tag,
            groupby_label,
            include_metrics,
            method_for_allocated_metrics,
            cumulative_rate_calculation,
        } => ReportKind::Chargeback(ChargebackOptions {
            cb_model: model.clone(),
            interval: *interval,
            interval_size: *interval_size,
            end_interval_offset: *end_interval_offset,
            show_by: Some(show_by_from(show_by)?),
            group_by: group_by_from(groupby, groupby_tag, groupby_label)?,
            include_metrics: *include_metrics,
            method_for_allocated_metrics: *method_for_allocated_metrics,
            cumulative_rate_calculation: *cumulative_rate_calculation,
            tz,
        }),
    };
    Ok(kind)
}

fn show_by_from(filter: &ChargebackFilter) -> Result<ShowCostsBy> {
    Ok(match filter {
        ChargebackFilter::Owner { owner } => ShowCostsBy::Owner {
            owner_id: Some(owner.clone()),
        },
        ChargebackFilter::Tenant { tenant_id } => ShowCostsBy::Tenant {
            tenant_id: Some(tenant_id.clone()),
        },
        ChargebackFilter::Tag { tag } => {
            let mut parts = tag.trim_start_matches('/').splitn(3, '/');
            match (parts.next(), parts.next(), parts.next()) {
                (Some("managed"), Some(category), Some(value)) => ShowCostsBy::Tag {
                    category: Some(category.to_string()),
                    value: Some(value.to_string()),
                },
                _ => {
                    return Err(Error::invalid(
                        "chargeback tag",
                        format!("'{}' is not a managed tag", tag),
                    ))
                }
            }
        }
        ChargebackFilter::Entity {
            provider_id,
            entity_id,
        } => ShowCostsBy::Entity {
            provider_id: provider_id.clone(),
            entity_id: Some(entity_id.clone()),
        },
    })
}

fn group_by_from(
    groupby: &str,
    tag: &Option<String>,
    label: &Option<String>,
) -> Result<ChargebackGroupBy> {
    Ok(match groupby {
        "date" => ChargebackGroupBy::Date,
        "vm" => ChargebackGroupBy::Vm,
        "project" => ChargebackGroupBy::Project,
        "tenant" => ChargebackGroupBy::Tenant,
        "tag" => ChargebackGroupBy::Tag(tag.clone()),
        "label" => ChargebackGroupBy::Label(label.clone()),
        other => {
            return Err(Error::invalid(
                "chargeback group by",
                format!("unknown grouping '{}'", other),
            ))
        }
    })
}

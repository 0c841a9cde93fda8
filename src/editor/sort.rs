//! Sort fields, breaks and group calculations.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::editor::fields::{expand_field_order, in_field_order};
use crate::error::{Error, Result};
use crate::model::bucket::{ColumnKey, TimeBucket};
use crate::model::draft::{ChartMode, DraftReportState, GroupMode, SortOrder};
use crate::model::field::{Aggregate, FieldKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortSlot {
    First,
    Second,
}

impl SortSlot {
    fn number(self) -> u8 {
        match self {
            SortSlot::First => 1,
            SortSlot::Second => 2,
        }
    }
}

/// Set or clear a sort field.
///
/// Changing the first field drops the options of the old break column and
/// clears the second field when the first is cleared or now sorts on the
/// same column. The second field needs a first one and must differ from it.
pub fn set_sort(
    state: &mut DraftReportState,
    slot: SortSlot,
    key: Option<FieldKey>,
    bucket: Option<TimeBucket>,
) -> Result<()> {
    let new = match key {
        Some(key) => Some(sort_column(state, key, bucket)?),
        None => None,
    };

    match slot {
        SortSlot::First => replace_first(state, new),
        SortSlot::Second => {
            if let Some(new) = &new {
                let Some(sort1) = &state.sort_by1 else {
                    return Err(Error::SortConflict(
                        "a first sort field must be chosen before a second".to_string(),
                    ));
                };
                if sort1.field.same_field(&new.field) {
                    return Err(Error::SortConflict(format!(
                        "'{}' is already the first sort field",
                        new.field
                    )));
                }
            }
            state.sort_by2 = new;
        }
    }
    debug!(slot = slot.number(), "sort changed");
    Ok(())
}

/// Change the time bucket of a sort field that is already set.
pub fn set_sort_bucket(
    state: &mut DraftReportState,
    slot: SortSlot,
    bucket: Option<TimeBucket>,
) -> Result<()> {
    let current = match slot {
        SortSlot::First => state.sort_by1.as_ref(),
        SortSlot::Second => state.sort_by2.as_ref(),
    };
    let Some(current) = current else {
        return Err(Error::SortConflict(format!(
            "sort field {} is not set",
            slot.number()
        )));
    };
    let field = current.field.clone();
    set_sort(state, slot, Some(field), bucket)
}

fn sort_column(
    state: &DraftReportState,
    key: FieldKey,
    bucket: Option<TimeBucket>,
) -> Result<ColumnKey> {
    if !in_field_order(state, &key) {
        return Err(Error::UnknownField(key.encode()));
    }
    if let Some(bucket) = bucket {
        if !state.column_info(&key).data_type.is_temporal() {
            return Err(Error::InvalidBucket(bucket.as_str().to_string()));
        }
    }
    Ok(ColumnKey::new(key, bucket))
}

fn replace_first(state: &mut DraftReportState, new: Option<ColumnKey>) {
    let old = state.sort_by1.take();

    if let Some(old) = old.as_ref().filter(|old| Some(*old) != new.as_ref()) {
        if old.bucket.is_some() {
            state.col_options.remove(old);
        } else if let Some(options) = state.col_options.get_mut(old) {
            options.break_label = None;
            options.break_format = None;
            if options.is_empty() {
                state.col_options.remove(old);
            }
        }
    }

    let clear_second = match (&new, &state.sort_by2) {
        (None, _) => true,
        (Some(new), Some(sort2)) => {
            sort2.field.same_field(&new.field)
                || old.as_ref().is_some_and(|old| sort2.field.same_field(&old.field))
        }
        (Some(_), None) => false,
    };
    if clear_second {
        state.sort_by2 = None;
    }

    state.sort_by1 = new;
    derive_break_label(state);
}

/// Keep the break label of the first sort field in step with the grouping.
///
/// Without grouping no label is kept. With grouping and no label yet, the
/// label is built from the display labels of the sort column, with the
/// bucket name in parentheses, followed by `": "`.
pub fn derive_break_label(state: &mut DraftReportState) {
    if !state.group.is_grouping() {
        for options in state.col_options.values_mut() {
            options.break_label = None;
        }
        state.col_options.retain(|_, options| !options.is_empty());
        return;
    }

    let Some(sort1) = state.sort_by1.clone() else {
        return;
    };
    if state
        .col_options
        .get(&sort1)
        .is_some_and(|options| options.break_label.is_some())
    {
        return;
    }

    let label: String = expand_field_order(state)
        .into_iter()
        .filter(|entry| entry.key == sort1.field)
        .map(|entry| entry.label)
        .collect();
    let mut label = label.trim().to_string();
    if let Some(bucket) = sort1.bucket {
        label.push_str(&format!(" ({})", bucket.display_name()));
    }
    label.push_str(": ");

    state.col_options.entry(sort1).or_default().break_label = Some(label);
}

/// Change the grouping mode.
///
/// Turning grouping off drops break labels and falls back to a counts chart.
pub fn set_group(state: &mut DraftReportState, mode: GroupMode) {
    state.group = mode;
    if !mode.is_grouping() {
        state.hide_details = false;
        if let Some(graph) = state.graph.as_mut() {
            if graph.mode == ChartMode::Values {
                graph.mode = ChartMode::Counts;
                graph.column = None;
            }
        }
    }
    derive_break_label(state);
}

/// Set the break label of the first sort field; a blank label derives it again.
pub fn set_break_label(state: &mut DraftReportState, label: &str) -> Result<()> {
    let sort1 = first_sort(state)?;
    if label.trim().is_empty() {
        if let Some(options) = state.col_options.get_mut(&sort1) {
            options.break_label = None;
        }
        derive_break_label(state);
    } else {
        state.col_options.entry(sort1).or_default().break_label = Some(label.to_string());
    }
    Ok(())
}

/// Set the display format of break values.
pub fn set_break_format(state: &mut DraftReportState, format: Option<String>) -> Result<()> {
    let sort1 = first_sort(state)?;
    let format = format.filter(|f| !f.trim().is_empty());
    let options = state.col_options.entry(sort1.clone()).or_default();
    options.break_format = format;
    if options.is_empty() {
        state.col_options.remove(&sort1);
    }
    Ok(())
}

/// Set the calculations shown on break rows for a column.
pub fn set_group_calculations(
    state: &mut DraftReportState,
    key: &FieldKey,
    kinds: BTreeSet<Aggregate>,
) -> Result<()> {
    if !state.group.is_grouping() {
        return Err(Error::SortConflict(
            "group calculations require grouping".to_string(),
        ));
    }
    if !in_field_order(state, key) {
        return Err(Error::UnknownField(key.encode()));
    }
    let column = ColumnKey::plain(key.clone());
    let options = state.col_options.entry(column.clone()).or_default();
    options.grouping = kinds;
    if options.is_empty() {
        state.col_options.remove(&column);
    }
    Ok(())
}

pub fn set_sort_order(state: &mut DraftReportState, order: SortOrder) {
    state.order = order;
}

/// Hide detail rows; only meaningful while grouping.
pub fn set_hide_details(state: &mut DraftReportState, hide: bool) -> Result<()> {
    if hide && !state.group.is_grouping() {
        return Err(Error::SortConflict(
            "detail rows can only be hidden while grouping".to_string(),
        ));
    }
    state.hide_details = hide;
    Ok(())
}

fn first_sort(state: &DraftReportState) -> Result<ColumnKey> {
    state
        .sort_by1
        .clone()
        .ok_or_else(|| Error::SortConflict("no first sort field is set".to_string()))
}

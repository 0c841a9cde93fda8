//! Selected fields, their order and pivot settings.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::FieldCatalog;
use crate::error::{Error, Result};
use crate::model::draft::{DraftReportState, SelectedField};
use crate::model::field::{Aggregate, FieldKey};

/// One column of the expanded display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOrderEntry {
    pub label: String,
    pub key: FieldKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Up,
    Down,
    Top,
    Bottom,
}

/// Append one field with its header.
///
/// Returns `false` when the field was already selected.
pub fn add_field(
    state: &mut DraftReportState,
    field: SelectedField,
    header: String,
    max: usize,
) -> Result<bool> {
    if state.is_selected(&field.key) {
        return Ok(false);
    }
    if state.selected_fields.len() + 1 > max {
        return Err(Error::CapacityExceeded {
            requested: state.selected_fields.len() + 1,
            max,
        });
    }
    state.headers.insert(field.key.clone(), header);
    state.selected_fields.push(field);
    Ok(true)
}

/// Append the catalog fields named by `keys`, in the order given.
///
/// Either every new field is added or, when the ceiling would be exceeded,
/// none is. Keys that are already selected are skipped. Returns the number
/// of fields added.
pub fn add_fields(
    state: &mut DraftReportState,
    catalog: &dyn FieldCatalog,
    keys: &[FieldKey],
    max: usize,
) -> Result<usize> {
    if keys.is_empty() {
        return Err(Error::NoFieldsSelected("add".to_string()));
    }

    let mut fresh: Vec<SelectedField> = Vec::new();
    for key in keys {
        let key = key.base();
        if state.is_selected(&key) || fresh.iter().any(|f| f.key == key) {
            continue;
        }
        if state.model.as_deref() != Some(key.model()) {
            return Err(Error::UnknownField(key.encode()));
        }
        let available = catalog
            .find(&key)
            .ok_or_else(|| Error::UnknownField(key.encode()))?;
        fresh.push(available.to_selected());
    }

    let requested = state.selected_fields.len() + fresh.len();
    if requested > max {
        return Err(Error::CapacityExceeded { requested, max });
    }

    let added = fresh.len();
    for field in fresh {
        let header = crate::catalog::derive_header(&field.label);
        state.headers.insert(field.key.clone(), header);
        state.selected_fields.push(field);
    }
    debug!(added, total = state.selected_fields.len(), "fields added");
    Ok(added)
}

/// Remove fields and everything keyed to them.
///
/// Fields the display filter references are kept; one [`Error::InUseByFilter`]
/// is returned per kept field while the others are still removed.
pub fn remove_fields(state: &mut DraftReportState, keys: &[FieldKey]) -> Result<Vec<Error>> {
    if keys.is_empty() {
        return Err(Error::NoFieldsSelected("remove".to_string()));
    }

    let mut rejected = Vec::new();
    for key in keys {
        let key = key.base();
        let Some(field) = state.field(&key) else {
            rejected.push(Error::UnknownField(key.encode()));
            continue;
        };
        if state.display_filter_references(&key) {
            warn!(key = %key, "field is used by the display filter");
            rejected.push(Error::InUseByFilter {
                key: key.encode(),
                label: field.label.clone(),
            });
            continue;
        }
        prune(state, &key);
        state.selected_fields.retain(|f| f.key != key);
        debug!(key = %key, "field removed");
    }
    Ok(rejected)
}

fn prune(state: &mut DraftReportState, key: &FieldKey) {
    state.headers.retain(|k, _| !k.same_field(key));
    state.col_formats.retain(|k, _| !k.same_field(key));

    state.pivot.drop_from_selection(key);
    state.pivot_aggregates.remove(key);
    if !state.pivot.is_active() {
        state.pivot_aggregates.clear();
    }

    release_sort(state, key);

    if let Some(graph) = state.graph.as_mut() {
        if graph.column.as_ref().is_some_and(|c| c.same_field(key)) {
            graph.column = None;
        }
    }

    state.col_options.retain(|k, options| !k.field.same_field(key) && !options.is_empty());
}

/// Clear the sort slots that sort by `key`. Clearing the first slot clears
/// everything keyed to it, the second slot included.
fn release_sort(state: &mut DraftReportState, key: &FieldKey) {
    if let Some(sort1) = state.sort_by1.clone() {
        if sort1.field.same_field(key) {
            if sort1.bucket.is_some() {
                state.col_options.remove(&sort1);
            } else if let Some(options) = state.col_options.get_mut(&sort1) {
                options.break_label = None;
                options.break_format = None;
            }
            if state.group.is_grouping() {
                for options in state.col_options.values_mut() {
                    options.grouping.clear();
                }
            }
            state.col_options.retain(|_, options| !options.is_empty());
            state.sort_by1 = None;
            state.sort_by2 = None;
        }
    }
    if state
        .sort_by2
        .as_ref()
        .is_some_and(|sort2| sort2.field.same_field(key))
    {
        state.sort_by2 = None;
    }
}

/// Move a consecutive block of selected fields.
///
/// Returns `false` when the block is already at the requested edge.
pub fn move_fields(
    state: &mut DraftReportState,
    keys: &[FieldKey],
    direction: MoveDirection,
) -> Result<bool> {
    if keys.is_empty() {
        return Err(Error::NoFieldsSelected("move".to_string()));
    }

    let mut indices = Vec::with_capacity(keys.len());
    for key in keys {
        let index = state
            .selected_fields
            .iter()
            .position(|f| f.key.same_field(key))
            .ok_or_else(|| Error::UnknownField(key.encode()))?;
        indices.push(index);
    }
    indices.sort_unstable();
    indices.dedup();
    if indices.windows(2).any(|w| w[1] != w[0] + 1) {
        return Err(Error::NotConsecutive);
    }

    let first = indices[0];
    let last = indices[indices.len() - 1];
    let len = state.selected_fields.len();
    let target = match direction {
        MoveDirection::Up if first == 0 => return Ok(false),
        MoveDirection::Down if last + 1 == len => return Ok(false),
        MoveDirection::Top if first == 0 => return Ok(false),
        MoveDirection::Bottom if last + 1 == len => return Ok(false),
        MoveDirection::Up => first - 1,
        MoveDirection::Down => first + 1,
        MoveDirection::Top => 0,
        MoveDirection::Bottom => len - indices.len(),
    };

    let block: Vec<SelectedField> = state.selected_fields.drain(first..=last).collect();
    for (offset, field) in block.into_iter().enumerate() {
        state.selected_fields.insert(target + offset, field);
    }
    Ok(true)
}

/// Set or clear pivot group `slot` (1 to 3).
///
/// Slots fill in order. Clearing a slot clears the ones after it; clearing
/// the first ends pivoting and drops all calculations. A field set into one
/// slot leaves any other slot it held.
pub fn set_pivot_group(
    state: &mut DraftReportState,
    slot: u8,
    key: Option<FieldKey>,
) -> Result<()> {
    if !(1..=3).contains(&slot) {
        return Err(Error::invalid("pivot group", format!("no group {}", slot)));
    }

    let Some(key) = key.map(|k| k.base()) else {
        let mut groups: Vec<FieldKey> = state.pivot.slots().into_iter().flatten().cloned().collect();
        groups.truncate(slot as usize - 1);
        state.pivot.assign(groups);
        if slot == 1 {
            state.pivot_aggregates.clear();
        }
        return Ok(());
    };

    if !state.is_selected(&key) {
        return Err(Error::UnknownField(key.encode()));
    }
    if slot > 1 && state.pivot.slots()[slot as usize - 2].is_none() {
        return Err(Error::PivotSlotUnavailable { slot });
    }

    let mut slots = state.pivot.slots().map(|k| k.cloned());
    for held in slots.iter_mut() {
        if held.as_ref() == Some(&key) {
            *held = None;
        }
    }
    slots[slot as usize - 1] = Some(key.clone());
    state.pivot.assign(slots.into_iter().flatten().collect());
    state.pivot_aggregates.remove(&key);
    Ok(())
}

/// Set the pivot calculations of a non-group field; an empty set removes them.
pub fn set_pivot_aggregates(
    state: &mut DraftReportState,
    key: &FieldKey,
    kinds: BTreeSet<Aggregate>,
) -> Result<()> {
    if !state.pivot.is_active() {
        return Err(Error::PivotInactive);
    }
    let key = key.base();
    let Some(field) = state.field(&key) else {
        return Err(Error::UnknownField(key.encode()));
    };
    if state.pivot.contains(&key) {
        return Err(Error::PivotGroupField(key.encode()));
    }

    if kinds.is_empty() {
        state.pivot_aggregates.remove(&key);
        return Ok(());
    }

    let base_header = state
        .headers
        .get(&key)
        .cloned()
        .unwrap_or_else(|| field.label.clone());
    for kind in &kinds {
        state
            .headers
            .entry(key.with_aggregate(*kind))
            .or_insert_with(|| format!("{} ({})", base_header, kind.title()));
    }
    // The plain column is no longer displayed, so it can not stay a sort column.
    release_sort(state, &key);
    state.pivot_aggregates.insert(key, kinds);
    Ok(())
}

/// Display order with pivot calculations fanned out.
///
/// While pivoting, a field with calculations appears once per calculation
/// in aggregate order, labelled `"<label> (<Aggregate>)"`. Every other field
/// appears once.
pub fn expand_field_order(state: &DraftReportState) -> Vec<FieldOrderEntry> {
    let pivoting = state.pivot.is_active();
    let mut order = Vec::with_capacity(state.selected_fields.len());
    for field in &state.selected_fields {
        match state.pivot_aggregates.get(&field.key) {
            Some(kinds) if pivoting && !kinds.is_empty() => {
                for kind in kinds {
                    order.push(FieldOrderEntry {
                        label: format!("{} ({})", field.label, kind.title()),
                        key: field.key.with_aggregate(*kind),
                    });
                }
            }
            _ => order.push(FieldOrderEntry {
                label: field.label.clone(),
                key: field.key.clone(),
            }),
        }
    }
    order
}

/// Whether `key` is one of the expanded display order's keys.
pub(crate) fn in_field_order(state: &DraftReportState, key: &FieldKey) -> bool {
    expand_field_order(state).iter().any(|entry| &entry.key == key)
}

/// Change the display format of a column; `None` restores the default.
pub fn set_column_format(
    state: &mut DraftReportState,
    key: &FieldKey,
    format: Option<String>,
) -> Result<()> {
    if !in_field_order(state, key) {
        return Err(Error::UnknownField(key.encode()));
    }
    match format.filter(|f| !f.trim().is_empty()) {
        Some(format) => state.col_formats.insert(key.clone(), format),
        None => state.col_formats.remove(key),
    };
    Ok(())
}

/// Change the header of a column; a blank header restores the derived one.
pub fn set_column_header(
    state: &mut DraftReportState,
    key: &FieldKey,
    header: &str,
) -> Result<()> {
    if !in_field_order(state, key) {
        return Err(Error::UnknownField(key.encode()));
    }
    if header.trim().is_empty() {
        let label = state.field(key).map(|f| f.label.clone()).unwrap_or_default();
        let derived = crate::catalog::derive_header(&label);
        let derived = match key.aggregate() {
            Some(kind) => format!("{} ({})", derived, kind.title()),
            None => derived,
        };
        state.headers.insert(key.clone(), derived);
    } else {
        state.headers.insert(key.clone(), header.to_string());
    }
    Ok(())
}

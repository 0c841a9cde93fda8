//! Field selection, removal, ordering and pivot tests.

use std::collections::BTreeSet;

use reportwright::catalog::{AvailableField, StaticCatalog};
use reportwright::editor::{
    add_fields, expand_field_order, move_fields, remove_fields, set_group, set_pivot_aggregates,
    set_pivot_group, set_sort, MoveDirection, SortSlot,
};
use reportwright::editor::sort::set_group_calculations;
use reportwright::model::{
    Aggregate, ColumnKey, ColumnType, DraftReportState, FieldKey, GroupMode, ReportKind,
    TimeBucket,
};
use reportwright::Error;
use serde_json::json;

fn key(s: &str) -> FieldKey {
    FieldKey::decode(s).unwrap()
}

fn catalog() -> StaticCatalog {
    StaticCatalog::new()
        .with(AvailableField::new("Name", key("Vm-name"), ColumnType::String))
        .with(AvailableField::new("Vendor", key("Vm-vendor"), ColumnType::String))
        .with(AvailableField::new("CPU Total", key("Vm-cpu_total"), ColumnType::Integer))
        .with(AvailableField::new("Created On", key("Vm-created_on"), ColumnType::DateTime))
        .with(AvailableField::new(
            "Vm.Hardwares : Memory MB",
            key("Vm.hardware-memory_mb"),
            ColumnType::Integer,
        ))
}

fn draft(keys: &[&str]) -> DraftReportState {
    let mut state = DraftReportState::for_model("Vm", ReportKind::Standard);
    let keys: Vec<FieldKey> = keys.iter().map(|k| key(k)).collect();
    if !keys.is_empty() {
        add_fields(&mut state, &catalog(), &keys, 100).unwrap();
    }
    state
}

fn selected(state: &DraftReportState) -> Vec<String> {
    state.selected_fields.iter().map(|f| f.key.encode()).collect()
}

// ============================================================================
// Adding
// ============================================================================

#[test]
fn test_add_fields_in_request_order() {
    let state = draft(&["Vm-vendor", "Vm.hardware-memory_mb", "Vm-name"]);
    assert_eq!(selected(&state), ["Vm-vendor", "Vm.hardware-memory_mb", "Vm-name"]);
    assert_eq!(state.headers[&key("Vm.hardware-memory_mb")], "Hardware Memory MB");
    assert_eq!(state.headers[&key("Vm-name")], "Name");
    assert_eq!(
        state.field(&key("Vm.hardware-memory_mb")).map(|f| f.info.data_type),
        Some(ColumnType::Integer)
    );
}

#[test]
fn test_add_skips_fields_already_selected() {
    let mut state = draft(&["Vm-name"]);
    let added = add_fields(&mut state, &catalog(), &[key("Vm-name"), key("Vm-vendor")], 100)
        .unwrap();
    assert_eq!(added, 1);
    assert_eq!(selected(&state), ["Vm-name", "Vm-vendor"]);
}

#[test]
fn test_capacity_is_all_or_nothing() {
    let mut state = draft(&["Vm-name", "Vm-vendor"]);
    let before = state.clone();

    let err = add_fields(
        &mut state,
        &catalog(),
        &[key("Vm-cpu_total"), key("Vm-created_on")],
        3,
    )
    .unwrap_err();
    assert_eq!(err, Error::CapacityExceeded { requested: 4, max: 3 });
    assert_eq!(state, before);

    // Already selected keys do not count against the ceiling.
    let added = add_fields(&mut state, &catalog(), &[key("Vm-name"), key("Vm-cpu_total")], 3)
        .unwrap();
    assert_eq!(added, 1);
}

#[test]
fn test_add_unknown_or_foreign_field() {
    let mut state = draft(&[]);
    assert_eq!(
        add_fields(&mut state, &catalog(), &[key("Vm-missing")], 100).unwrap_err(),
        Error::UnknownField("Vm-missing".to_string())
    );
    assert_eq!(
        add_fields(&mut state, &catalog(), &[key("Host-name")], 100).unwrap_err(),
        Error::UnknownField("Host-name".to_string())
    );
    assert_eq!(
        add_fields(&mut state, &catalog(), &[], 100).unwrap_err(),
        Error::NoFieldsSelected("add".to_string())
    );
    assert!(state.selected_fields.is_empty());
}

// ============================================================================
// Removing
// ============================================================================

#[test]
fn test_remove_prunes_sort_break_and_group_calculations() {
    let mut state = draft(&["Vm-name", "Vm-cpu_total", "Vm-created_on"]);
    set_group(&mut state, GroupMode::GroupAndShowDetail);
    set_sort(&mut state, SortSlot::First, Some(key("Vm-created_on")), Some(TimeBucket::Day))
        .unwrap();
    set_sort(&mut state, SortSlot::Second, Some(key("Vm-name")), None).unwrap();
    set_group_calculations(&mut state, &key("Vm-cpu_total"), BTreeSet::from([Aggregate::Sum]))
        .unwrap();
    state.col_formats.insert(key("Vm-created_on"), "date".to_string());
    assert!(state
        .col_options
        .contains_key(&ColumnKey::new(key("Vm-created_on"), Some(TimeBucket::Day))));

    let rejected = remove_fields(&mut state, &[key("Vm-created_on")]).unwrap();
    assert!(rejected.is_empty());
    assert_eq!(selected(&state), ["Vm-name", "Vm-cpu_total"]);
    assert_eq!(state.sort_by1, None);
    assert_eq!(state.sort_by2, None);
    assert!(state.col_options.is_empty());
    assert!(!state.headers.contains_key(&key("Vm-created_on")));
    assert!(state.col_formats.is_empty());
}

#[test]
fn test_remove_second_sort_keeps_first() {
    let mut state = draft(&["Vm-name", "Vm-vendor"]);
    set_sort(&mut state, SortSlot::First, Some(key("Vm-name")), None).unwrap();
    set_sort(&mut state, SortSlot::Second, Some(key("Vm-vendor")), None).unwrap();

    remove_fields(&mut state, &[key("Vm-vendor")]).unwrap();
    assert_eq!(state.sort_by1, Some(ColumnKey::plain(key("Vm-name"))));
    assert_eq!(state.sort_by2, None);
}

#[test]
fn test_remove_keeps_fields_used_by_display_filter() {
    let mut state = draft(&["Vm-name", "Vm-vendor", "Vm-cpu_total"]);
    state.display_filter = Some(json!({"and": [
        {"=": {"field": "Vm-name", "value": "web"}},
        {">": {"field": "Vm-cpu_total__sum", "value": 4}}
    ]}));

    let rejected = remove_fields(
        &mut state,
        &[key("Vm-name"), key("Vm-vendor"), key("Vm-cpu_total")],
    )
    .unwrap();
    assert_eq!(
        rejected,
        vec![
            Error::InUseByFilter {
                key: "Vm-name".to_string(),
                label: "Name".to_string(),
            },
            Error::InUseByFilter {
                key: "Vm-cpu_total".to_string(),
                label: "CPU Total".to_string(),
            },
        ]
    );
    assert_eq!(selected(&state), ["Vm-name", "Vm-cpu_total"]);
}

#[test]
fn test_placeholder_display_filter_does_not_block_removal() {
    let mut state = draft(&["Vm-name"]);
    state.display_filter = Some(json!({"???": "Vm-name"}));
    let rejected = remove_fields(&mut state, &[key("Vm-name")]).unwrap();
    assert!(rejected.is_empty());
    assert!(state.selected_fields.is_empty());
}

#[test]
fn test_remove_unknown_field_is_reported() {
    let mut state = draft(&["Vm-name"]);
    let rejected = remove_fields(&mut state, &[key("Vm-vendor")]).unwrap();
    assert_eq!(rejected, vec![Error::UnknownField("Vm-vendor".to_string())]);
}

// ============================================================================
// Moving
// ============================================================================

#[test]
fn test_move_block() {
    let mut state = draft(&["Vm-name", "Vm-vendor", "Vm-cpu_total", "Vm-created_on"]);

    assert!(move_fields(&mut state, &[key("Vm-cpu_total"), key("Vm-vendor")], MoveDirection::Up)
        .unwrap());
    assert_eq!(selected(&state), ["Vm-vendor", "Vm-cpu_total", "Vm-name", "Vm-created_on"]);

    assert!(move_fields(&mut state, &[key("Vm-vendor")], MoveDirection::Bottom).unwrap());
    assert_eq!(selected(&state), ["Vm-cpu_total", "Vm-name", "Vm-created_on", "Vm-vendor"]);

    assert!(move_fields(&mut state, &[key("Vm-created_on")], MoveDirection::Top).unwrap());
    assert_eq!(selected(&state), ["Vm-created_on", "Vm-cpu_total", "Vm-name", "Vm-vendor"]);

    assert!(move_fields(&mut state, &[key("Vm-created_on")], MoveDirection::Down).unwrap());
    assert_eq!(selected(&state), ["Vm-cpu_total", "Vm-created_on", "Vm-name", "Vm-vendor"]);
}

#[test]
fn test_move_at_edge_is_a_no_op() {
    let mut state = draft(&["Vm-name", "Vm-vendor"]);
    let before = state.clone();
    assert!(!move_fields(&mut state, &[key("Vm-name")], MoveDirection::Up).unwrap());
    assert!(!move_fields(&mut state, &[key("Vm-vendor")], MoveDirection::Bottom).unwrap());
    assert_eq!(state, before);
}

#[test]
fn test_move_requires_consecutive_block() {
    let mut state = draft(&["Vm-name", "Vm-vendor", "Vm-cpu_total"]);
    let err = move_fields(&mut state, &[key("Vm-name"), key("Vm-cpu_total")], MoveDirection::Down)
        .unwrap_err();
    assert_eq!(err, Error::NotConsecutive);
}

// ============================================================================
// Pivots
// ============================================================================

#[test]
fn test_pivot_calculations_fan_out_in_aggregate_order() {
    let mut state = draft(&["Vm-name", "Vm-vendor", "Vm-cpu_total"]);
    set_pivot_group(&mut state, 1, Some(key("Vm-name"))).unwrap();
    set_pivot_aggregates(
        &mut state,
        &key("Vm-cpu_total"),
        BTreeSet::from([Aggregate::Sum, Aggregate::Min]),
    )
    .unwrap();

    let order: Vec<(String, String)> = expand_field_order(&state)
        .into_iter()
        .map(|e| (e.label, e.key.encode()))
        .collect();
    assert_eq!(
        order,
        [
            ("Name".to_string(), "Vm-name".to_string()),
            ("Vendor".to_string(), "Vm-vendor".to_string()),
            ("CPU Total (Min)".to_string(), "Vm-cpu_total__min".to_string()),
            ("CPU Total (Sum)".to_string(), "Vm-cpu_total__sum".to_string()),
        ]
    );
    assert_eq!(state.headers[&key("Vm-cpu_total__sum")], "CPU Total (Sum)");
}

#[test]
fn test_pivot_calculations_release_sort_on_the_field() {
    let mut state = draft(&["Vm-name", "Vm-cpu_total", "Vm-created_on"]);
    set_sort(&mut state, SortSlot::First, Some(key("Vm-created_on")), None).unwrap();
    set_sort(&mut state, SortSlot::Second, Some(key("Vm-cpu_total")), None).unwrap();
    set_pivot_group(&mut state, 1, Some(key("Vm-name"))).unwrap();
    set_pivot_aggregates(&mut state, &key("Vm-cpu_total"), BTreeSet::from([Aggregate::Sum]))
        .unwrap();
    assert_eq!(state.sort_by1, Some(ColumnKey::plain(key("Vm-created_on"))));
    assert_eq!(state.sort_by2, None);

    let mut state = draft(&["Vm-name", "Vm-cpu_total", "Vm-created_on"]);
    set_group(&mut state, GroupMode::GroupAndShowDetail);
    set_sort(&mut state, SortSlot::First, Some(key("Vm-cpu_total")), None).unwrap();
    set_sort(&mut state, SortSlot::Second, Some(key("Vm-created_on")), None).unwrap();
    let cpu = ColumnKey::plain(key("Vm-cpu_total"));
    assert!(state.col_options[&cpu].break_label.is_some());

    set_pivot_group(&mut state, 1, Some(key("Vm-name"))).unwrap();
    set_pivot_aggregates(&mut state, &key("Vm-cpu_total"), BTreeSet::from([Aggregate::Max]))
        .unwrap();
    assert_eq!(state.sort_by1, None);
    assert_eq!(state.sort_by2, None);
    assert!(!state.col_options.contains_key(&cpu));
}

#[test]
fn test_clearing_first_pivot_group_drops_calculations() {
    let mut state = draft(&["Vm-name", "Vm-vendor", "Vm-cpu_total"]);
    set_pivot_group(&mut state, 1, Some(key("Vm-name"))).unwrap();
    set_pivot_group(&mut state, 2, Some(key("Vm-vendor"))).unwrap();
    set_pivot_aggregates(&mut state, &key("Vm-cpu_total"), BTreeSet::from([Aggregate::Avg]))
        .unwrap();

    set_pivot_group(&mut state, 1, None).unwrap();
    assert!(!state.pivot.is_active());
    assert_eq!(state.pivot.by2, None);
    assert!(state.pivot_aggregates.is_empty());
    assert_eq!(expand_field_order(&state).len(), 3);
}

#[test]
fn test_pivot_field_moves_between_slots() {
    let mut state = draft(&["Vm-name", "Vm-vendor"]);
    set_pivot_group(&mut state, 1, Some(key("Vm-name"))).unwrap();
    set_pivot_group(&mut state, 2, Some(key("Vm-vendor"))).unwrap();
    set_pivot_group(&mut state, 2, Some(key("Vm-name"))).unwrap();
    // Name replaces vendor in slot 2, then the groups close up.
    assert_eq!(state.pivot.by1, Some(key("Vm-name")));
    assert_eq!(state.pivot.by2, None);
}

#[test]
fn test_pivot_errors() {
    let mut state = draft(&["Vm-name", "Vm-cpu_total"]);
    assert_eq!(
        set_pivot_aggregates(&mut state, &key("Vm-cpu_total"), BTreeSet::from([Aggregate::Sum]))
            .unwrap_err(),
        Error::PivotInactive
    );
    assert_eq!(
        set_pivot_group(&mut state, 2, Some(key("Vm-name"))).unwrap_err(),
        Error::PivotSlotUnavailable { slot: 2 }
    );
    assert!(matches!(
        set_pivot_group(&mut state, 4, Some(key("Vm-name"))).unwrap_err(),
        Error::InvalidOption { .. }
    ));

    set_pivot_group(&mut state, 1, Some(key("Vm-name"))).unwrap();
    assert_eq!(
        set_pivot_aggregates(&mut state, &key("Vm-name"), BTreeSet::from([Aggregate::Count]))
            .unwrap_err(),
        Error::PivotGroupField("Vm-name".to_string())
    );
}

#[test]
fn test_removing_pivot_group_shifts_slots() {
    let mut state = draft(&["Vm-name", "Vm-vendor", "Vm-cpu_total"]);
    set_pivot_group(&mut state, 1, Some(key("Vm-name"))).unwrap();
    set_pivot_group(&mut state, 2, Some(key("Vm-vendor"))).unwrap();
    set_pivot_aggregates(&mut state, &key("Vm-cpu_total"), BTreeSet::from([Aggregate::Max]))
        .unwrap();

    remove_fields(&mut state, &[key("Vm-name")]).unwrap();
    assert_eq!(state.pivot.by1, Some(key("Vm-vendor")));
    assert_eq!(state.pivot.by2, None);
    assert!(state.pivot_aggregates.contains_key(&key("Vm-cpu_total")));
}

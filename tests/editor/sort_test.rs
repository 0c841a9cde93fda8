//! Sort slots, time buckets, grouping and break labels.

use reportwright::catalog::{AvailableField, StaticCatalog};
use reportwright::editor::chart::{set_chart_column, set_chart_mode, set_chart_type};
use reportwright::editor::sort::{set_break_format, set_break_label, set_hide_details};
use reportwright::editor::{add_fields, set_group, set_sort, set_sort_bucket, SortSlot};
use reportwright::config::EditorSettings;
use reportwright::model::{
    ChartMode, ChartType, ColumnKey, ColumnType, DraftReportState, FieldKey, GroupMode,
    ReportKind, TimeBucket,
};
use reportwright::Error;

fn key(s: &str) -> FieldKey {
    FieldKey::decode(s).unwrap()
}

fn draft() -> DraftReportState {
    let catalog = StaticCatalog::new()
        .with(AvailableField::new("Name", key("Vm-name"), ColumnType::String))
        .with(AvailableField::new("Vendor", key("Vm-vendor"), ColumnType::String))
        .with(AvailableField::new("CPU Total", key("Vm-cpu_total"), ColumnType::Integer))
        .with(AvailableField::new("Created On", key("Vm-created_on"), ColumnType::DateTime));
    let mut state = DraftReportState::for_model("Vm", ReportKind::Standard);
    let keys = ["Vm-name", "Vm-vendor", "Vm-cpu_total", "Vm-created_on"].map(key);
    add_fields(&mut state, &catalog, &keys, 100).unwrap();
    state
}

fn break_label(state: &DraftReportState, column: &ColumnKey) -> Option<String> {
    state
        .col_options
        .get(column)
        .and_then(|options| options.break_label.clone())
}

#[test]
fn test_sort_field_must_be_displayed() {
    let mut state = draft();
    let err = set_sort(&mut state, SortSlot::First, Some(key("Vm-missing")), None).unwrap_err();
    assert_eq!(err, Error::UnknownField("Vm-missing".to_string()));
}

#[test]
fn test_bucket_requires_temporal_column() {
    let mut state = draft();
    let err = set_sort(&mut state, SortSlot::First, Some(key("Vm-name")), Some(TimeBucket::Day))
        .unwrap_err();
    assert_eq!(err, Error::InvalidBucket("day".to_string()));
    assert_eq!(state.sort_by1, None);
}

#[test]
fn test_second_sort_needs_a_distinct_first() {
    let mut state = draft();
    assert!(matches!(
        set_sort(&mut state, SortSlot::Second, Some(key("Vm-name")), None),
        Err(Error::SortConflict(_))
    ));

    set_sort(&mut state, SortSlot::First, Some(key("Vm-created_on")), Some(TimeBucket::Month))
        .unwrap();
    assert!(matches!(
        set_sort(&mut state, SortSlot::Second, Some(key("Vm-created_on")), None),
        Err(Error::SortConflict(_))
    ));
}

#[test]
fn test_first_sort_taking_second_field_clears_second() {
    let mut state = draft();
    set_sort(&mut state, SortSlot::First, Some(key("Vm-name")), None).unwrap();
    set_sort(&mut state, SortSlot::Second, Some(key("Vm-vendor")), None).unwrap();

    set_sort(&mut state, SortSlot::First, Some(key("Vm-vendor")), None).unwrap();
    assert_eq!(state.sort_by1, Some(ColumnKey::plain(key("Vm-vendor"))));
    assert_eq!(state.sort_by2, None);
}

#[test]
fn test_unrelated_first_sort_change_keeps_second() {
    let mut state = draft();
    set_sort(&mut state, SortSlot::First, Some(key("Vm-name")), None).unwrap();
    set_sort(&mut state, SortSlot::Second, Some(key("Vm-vendor")), None).unwrap();

    set_sort(&mut state, SortSlot::First, Some(key("Vm-cpu_total")), None).unwrap();
    assert_eq!(state.sort_by2, Some(ColumnKey::plain(key("Vm-vendor"))));

    set_sort(&mut state, SortSlot::First, None, None).unwrap();
    assert_eq!(state.sort_by1, None);
    assert_eq!(state.sort_by2, None);
}

#[test]
fn test_break_label_derived_from_bucketed_sort() {
    let mut state = draft();
    set_group(&mut state, GroupMode::GroupAndShowDetail);
    set_sort(
        &mut state,
        SortSlot::First,
        Some(key("Vm-created_on")),
        Some(TimeBucket::DayOfWeek),
    )
    .unwrap();

    let column = ColumnKey::new(key("Vm-created_on"), Some(TimeBucket::DayOfWeek));
    assert_eq!(
        break_label(&state, &column).as_deref(),
        Some("Created On (Day of Week): ")
    );
}

#[test]
fn test_changing_bucket_replaces_break_options() {
    let mut state = draft();
    set_group(&mut state, GroupMode::GroupCountsOnly);
    set_sort(&mut state, SortSlot::First, Some(key("Vm-created_on")), Some(TimeBucket::Day))
        .unwrap();
    set_break_format(&mut state, Some("%a".to_string())).unwrap();

    set_sort_bucket(&mut state, SortSlot::First, Some(TimeBucket::Month)).unwrap();
    let old = ColumnKey::new(key("Vm-created_on"), Some(TimeBucket::Day));
    let new = ColumnKey::new(key("Vm-created_on"), Some(TimeBucket::Month));
    assert!(!state.col_options.contains_key(&old));
    assert_eq!(break_label(&state, &new).as_deref(), Some("Created On (Month): "));
    assert_eq!(state.sort_by1, Some(new));
}

#[test]
fn test_custom_break_label_survives_until_cleared() {
    let mut state = draft();
    set_group(&mut state, GroupMode::GroupAndShowDetail);
    set_sort(&mut state, SortSlot::First, Some(key("Vm-vendor")), None).unwrap();
    let column = ColumnKey::plain(key("Vm-vendor"));

    set_break_label(&mut state, "Maker: ").unwrap();
    set_group(&mut state, GroupMode::GroupCountsOnly);
    assert_eq!(break_label(&state, &column).as_deref(), Some("Maker: "));

    set_break_label(&mut state, "  ").unwrap();
    assert_eq!(break_label(&state, &column).as_deref(), Some("Vendor: "));
}

#[test]
fn test_ungrouping_drops_labels_and_value_charts() {
    let mut state = draft();
    set_group(&mut state, GroupMode::GroupAndShowDetail);
    set_sort(&mut state, SortSlot::First, Some(key("Vm-vendor")), None).unwrap();
    set_hide_details(&mut state, true).unwrap();
    set_chart_type(&mut state, Some(ChartType::Bar), &EditorSettings::default());
    set_chart_mode(&mut state, ChartMode::Values).unwrap();
    set_chart_column(&mut state, Some(key("Vm-cpu_total"))).unwrap();

    set_group(&mut state, GroupMode::None);
    assert!(!state.hide_details);
    assert!(state.col_options.is_empty());
    let graph = state.graph.as_ref().unwrap();
    assert_eq!(graph.mode, ChartMode::Counts);
    assert_eq!(graph.column, None);
}

#[test]
fn test_hiding_details_requires_grouping() {
    let mut state = draft();
    assert!(matches!(
        set_hide_details(&mut state, true),
        Err(Error::SortConflict(_))
    ));
    set_hide_details(&mut state, false).unwrap();
}

#[test]
fn test_break_options_need_a_first_sort() {
    let mut state = draft();
    assert!(set_break_label(&mut state, "X: ").is_err());
    assert!(set_break_format(&mut state, None).is_err());
}

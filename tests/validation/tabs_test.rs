//! Tab availability and save validation.

use reportwright::config::{EditorSettings, ModelSettings};
use reportwright::editor::chart::{set_chart_mode, set_chart_type};
use reportwright::editor::options::{set_chargeback_show_by, set_model};
use reportwright::editor::{set_group, set_sort, SortSlot};
use reportwright::model::{
    ChartMode, ChartType, ColumnType, DraftReportState, FieldKey, GroupMode, ReportKind,
    SelectedField, ShowCostsBy,
};
use reportwright::validation::{
    available_tabs, check_tab, validate_for_save, validate_report, Tab,
};

fn key(s: &str) -> FieldKey {
    FieldKey::decode(s).unwrap()
}

fn draft_on(model: &str, columns: &[&str]) -> DraftReportState {
    let mut state = DraftReportState::default();
    set_model(&mut state, model, &ModelSettings::default(), None).unwrap();
    for column in columns {
        let field = FieldKey::new(model, column).unwrap();
        state
            .selected_fields
            .push(SelectedField::new(column, field).with_type(ColumnType::Integer));
    }
    state.name = "Report".to_string();
    state.title = "Report".to_string();
    state
}

#[test]
fn test_tabs_per_kind() {
    assert_eq!(available_tabs(&ReportKind::Standard), Tab::ALL);
    let trend = draft_on("VimPerformanceTrend", &[]);
    assert_eq!(available_tabs(&trend.kind), [Tab::Columns, Tab::Filter, Tab::Preview]);
    let chargeback = draft_on("ChargebackVm", &[]);
    assert_eq!(
        available_tabs(&chargeback.kind),
        [Tab::Columns, Tab::Formatting, Tab::Filter, Tab::Preview]
    );
}

#[test]
fn test_hidden_tab_redirects_to_columns() {
    let state = draft_on("VimPerformanceTrend", &[]);
    let report = check_tab(&state, Tab::Charts);
    assert_eq!(report.redirect(), Some(Tab::Columns));
    assert_eq!(report.messages(), ["Charts tab is not available for trend reports"]);
}

#[test]
fn test_tabs_need_a_selected_field() {
    let state = draft_on("Vm", &[]);
    assert!(check_tab(&state, Tab::Columns).is_ok());
    for tab in [Tab::Consolidation, Tab::Formatting, Tab::Styling, Tab::Summary, Tab::Filter] {
        let report = check_tab(&state, tab);
        assert_eq!(report.redirect(), Some(Tab::Columns));
        assert_eq!(
            report.messages(),
            [format!("{} tab is not available until at least 1 field has been selected", tab)]
        );
    }
}

#[test]
fn test_charts_need_a_sort_field() {
    let mut state = draft_on("Vm", &["cpu", "name"]);
    let report = check_tab(&state, Tab::Charts);
    assert_eq!(report.redirect(), Some(Tab::Summary));

    set_sort(&mut state, SortSlot::First, Some(key("Vm-name")), None).unwrap();
    assert!(check_tab(&state, Tab::Charts).is_ok());
}

#[test]
fn test_preview_needs_chart_column_in_values_mode() {
    let mut state = draft_on("Vm", &["cpu"]);
    set_sort(&mut state, SortSlot::First, Some(key("Vm-cpu")), None).unwrap();
    set_group(&mut state, GroupMode::GroupAndShowDetail);
    set_chart_type(&mut state, Some(ChartType::Pie), &EditorSettings::default());
    set_chart_mode(&mut state, ChartMode::Values).unwrap();

    let report = check_tab(&state, Tab::Preview);
    assert_eq!(report.redirect(), Some(Tab::Charts));
    assert_eq!(
        report.messages(),
        ["Data column must be selected when chart mode is set to \"Values\""]
    );
}

#[test]
fn test_chargeback_preview_needs_complete_filter() {
    let mut state = draft_on("ChargebackVm", &["cost"]);
    assert_eq!(check_tab(&state, Tab::Preview).redirect(), Some(Tab::Filter));

    set_chargeback_show_by(
        &mut state,
        Some(ShowCostsBy::Entity {
            provider_id: None,
            entity_id: Some("42".to_string()),
        }),
    )
    .unwrap();
    // Saving accepts any entity; previewing also needs the provider.
    assert!(validate_report(&state).is_ok());
    assert_eq!(check_tab(&state, Tab::Preview).redirect(), Some(Tab::Filter));
}

#[test]
fn test_trend_tabs_need_trend_settings() {
    let state = draft_on("VimPerformanceTrend", &[]);
    let report = check_tab(&state, Tab::Preview);
    assert_eq!(
        report.messages(),
        [
            "Preview tab is not available until Trending for field has been selected",
            "Preview tab is not available until Trend Target Limit has been configured",
        ]
    );
}

#[test]
fn test_tab_order() {
    assert_eq!(
        Tab::ALL,
        [
            Tab::Columns,
            Tab::Consolidation,
            Tab::Formatting,
            Tab::Filter,
            Tab::Summary,
            Tab::Charts,
            Tab::Styling,
            Tab::Preview,
        ]
    );
    assert!(Tab::Summary < Tab::Charts);
    assert!(Tab::Charts < Tab::Styling);
}

#[test]
fn test_leftmost_tab_decides_redirect() {
    let mut state = draft_on("ChargebackVm", &["cost"]);
    state.name = " ".to_string();
    state.title.clear();

    let report = validate_for_save(&state);
    assert_eq!(report.redirect(), Some(Tab::Columns));
    assert_eq!(
        report.messages(),
        [
            "Name can't be blank",
            "Title can't be blank",
            "Show Costs by must be selected",
        ]
    );
    assert_eq!(
        report.to_string(),
        "Name can't be blank; Title can't be blank; Show Costs by must be selected"
    );
}

#[test]
fn test_values_chart_without_sort_redirects_to_summary() {
    let mut state = draft_on("Vm", &["cpu"]);
    set_group(&mut state, GroupMode::GroupAndShowDetail);
    set_chart_type(&mut state, Some(ChartType::Bar), &EditorSettings::default());
    set_chart_mode(&mut state, ChartMode::Values).unwrap();

    let report = validate_report(&state);
    assert_eq!(report.redirect(), Some(Tab::Summary));
    assert_eq!(
        report.messages(),
        [
            "A sort field must be selected to show a chart",
            "Data column must be selected when chart mode is set to \"Values\"",
        ]
    );
}

#[test]
fn test_name_and_title_are_only_checked_on_save() {
    let mut state = draft_on("Vm", &["cpu"]);
    state.name.clear();
    state.title = "  ".to_string();
    assert!(validate_report(&state).is_ok());

    let report = validate_for_save(&state);
    assert_eq!(report.redirect(), Some(Tab::Columns));
    assert_eq!(report.messages(), ["Name can't be blank", "Title can't be blank"]);
}

#[test]
fn test_report_without_model() {
    let mut state = draft_on("Vm", &["cpu"]);
    state.model = None;
    let report = validate_report(&state);
    assert_eq!(report.redirect(), Some(Tab::Columns));
    assert_eq!(report.messages(), ["A base model must be selected"]);
}

#[test]
fn test_report_without_fields() {
    let state = draft_on("Vm", &[]);
    let report = validate_report(&state);
    assert_eq!(report.redirect(), Some(Tab::Columns));
    assert_eq!(report.messages(), ["At least one Field must be selected"]);
}

#[test]
fn test_chart_without_sort_is_rejected_on_save() {
    let mut state = draft_on("Vm", &["cpu"]);
    set_chart_type(&mut state, Some(ChartType::Bar), &EditorSettings::default());
    let report = validate_report(&state);
    assert_eq!(report.redirect(), Some(Tab::Summary));
    assert_eq!(report.messages(), ["A sort field must be selected to show a chart"]);
}

#[test]
fn test_trend_save_checks_numeric_limit() {
    let mut state = draft_on("VimPerformanceTrend", &[]);
    if let ReportKind::Trend(trend) = &mut state.kind {
        trend.trend_col = Some("cpu".to_string());
        trend.limit_val = Some("high".to_string());
    }
    assert_eq!(
        validate_report(&state).messages(),
        ["Trend Target Limit must be numeric"]
    );
}

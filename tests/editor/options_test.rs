//! Base model, report kind options and scalar report options.

use reportwright::config::{ModelSettings, Settings};
use reportwright::editor::options::{
    set_calc_avgs_by, set_chargeback_group_by, set_chargeback_interval, set_model,
    set_pdf_page_size, set_perf_interval, set_perf_offsets, set_queue_timeout, set_row_limit,
    set_target_pct, set_trend_column, set_trend_limit,
};
use reportwright::model::{
    AveragesBy, ChargebackGroupBy, ChargebackInterval, DraftReportState, FieldKey, PerfInterval,
    ReportKind, SelectedField,
};
use reportwright::Error;

fn key(s: &str) -> FieldKey {
    FieldKey::decode(s).unwrap()
}

fn draft_on(model: &str) -> DraftReportState {
    let mut state = DraftReportState::default();
    set_model(&mut state, model, &ModelSettings::default(), Some("UTC")).unwrap();
    state
}

// ============================================================================
// Kinds
// ============================================================================

#[test]
fn test_kind_follows_base_model() {
    let settings = ModelSettings::default();
    assert_eq!(ReportKind::for_model("Vm", &settings, None), ReportKind::Standard);
    assert!(matches!(
        ReportKind::for_model("VmPerformance", &settings, None),
        ReportKind::Performance(_)
    ));
    assert!(ReportKind::for_model("VimPerformanceTrend", &settings, None).is_trend());
    assert!(ReportKind::for_model("ChargebackVm", &settings, None).is_chargeback());
    assert!(ReportKind::for_model("MeteringContainerImage", &settings, None).is_chargeback());
}

#[test]
fn test_performance_defaults() {
    let state = draft_on("VmPerformance");
    let ReportKind::Performance(perf) = &state.kind else {
        panic!("expected a performance report, got {:?}", state.kind);
    };
    assert_eq!(perf.interval, PerfInterval::Daily);
    assert_eq!((perf.start_offset, perf.end_offset), (2 * 24 * 3600, 0));
    assert_eq!(perf.calc_avgs_by, AveragesBy::TimeInterval);
    assert_eq!(perf.tz.as_deref(), Some("UTC"));
}

#[test]
fn test_chargeback_defaults() {
    let state = draft_on("ChargebackVm");
    let ReportKind::Chargeback(cb) = &state.kind else {
        panic!("expected a chargeback report, got {:?}", state.kind);
    };
    assert_eq!(cb.cb_model, "Vm");
    assert_eq!(cb.interval, ChargebackInterval::Daily);
    assert_eq!((cb.interval_size, cb.end_interval_offset), (1, 1));
    assert!(cb.include_metrics);
    assert!(!cb.cumulative_rate_calculation);
    assert_eq!(cb.show_by, None);
    assert_eq!(cb.missing().as_deref(), Some("Show Costs by must be selected"));
}

#[test]
fn test_trend_defaults() {
    let state = draft_on("VimPerformanceTrend");
    let ReportKind::Trend(trend) = &state.kind else {
        panic!("expected a trend report, got {:?}", state.kind);
    };
    assert_eq!(trend.target_pcts, [Some(100), None, None]);
    assert!(!trend.has_target_limit());
}

#[test]
fn test_changing_model_resets_columns() {
    let mut state = draft_on("Vm");
    state
        .selected_fields
        .push(SelectedField::new("Name", key("Vm-name")));
    assert!(!set_model(&mut state, "Vm", &ModelSettings::default(), None).unwrap());
    assert_eq!(state.selected_fields.len(), 1);

    assert!(set_model(&mut state, "Host", &ModelSettings::default(), None).unwrap());
    assert!(state.selected_fields.is_empty());
    assert_eq!(state.model.as_deref(), Some("Host"));

    assert!(matches!(
        set_model(&mut state, " ", &ModelSettings::default(), None),
        Err(Error::InvalidOption { .. })
    ));
}

#[test]
fn test_custom_model_settings() {
    let settings: Settings = toml::from_str(
        r#"
        [models]
        trend_model = "Trend"
        performance_suffixes = ["Metrics"]
        "#,
    )
    .unwrap();
    assert!(ReportKind::for_model("Trend", &settings.models, None).is_trend());
    assert!(matches!(
        ReportKind::for_model("HostMetrics", &settings.models, None),
        ReportKind::Performance(_)
    ));
    assert_eq!(settings.editor.max_report_columns, 100);
}

// ============================================================================
// Kind options
// ============================================================================

#[test]
fn test_options_reject_other_kinds() {
    let mut state = draft_on("Vm");
    assert_eq!(
        set_calc_avgs_by(&mut state, AveragesBy::ActiveData).unwrap_err(),
        Error::KindMismatch {
            option: "calculate averages by".to_string(),
            kind: "standard".to_string(),
        }
    );
    assert!(matches!(
        set_chargeback_group_by(&mut state, ChargebackGroupBy::Vm),
        Err(Error::KindMismatch { .. })
    ));
    assert!(matches!(
        set_trend_limit(&mut state, None, Some("10".to_string())),
        Err(Error::KindMismatch { .. })
    ));
}

#[test]
fn test_interval_change_resets_offsets() {
    let mut state = draft_on("VmPerformance");
    set_perf_offsets(&mut state, 3600, 7200).unwrap();
    set_perf_interval(&mut state, PerfInterval::Hourly).unwrap();
    let ReportKind::Performance(perf) = &state.kind else {
        panic!("expected a performance report");
    };
    assert_eq!((perf.start_offset, perf.end_offset), (24 * 3600, 0));
    assert!(set_perf_offsets(&mut state, 0, 0).is_err());
}

#[test]
fn test_trend_column_and_limit() {
    let mut state = draft_on("VimPerformanceTrend");
    set_trend_limit(&mut state, None, Some("80".to_string())).unwrap();
    set_trend_column(&mut state, Some(key("VmPerformance-cpu_usage_rate_average"))).unwrap();
    let ReportKind::Trend(trend) = &state.kind else {
        panic!("expected a trend report");
    };
    assert_eq!(trend.trend_db.as_deref(), Some("VmPerformance"));
    assert_eq!(trend.trend_col.as_deref(), Some("cpu_usage_rate_average"));
    assert_eq!(trend.limit_val, None);

    set_trend_limit(&mut state, Some("max_cpu".to_string()), Some("80".to_string())).unwrap();
    set_target_pct(&mut state, 2, Some(90)).unwrap();
    let ReportKind::Trend(trend) = &state.kind else {
        panic!("expected a trend report");
    };
    assert_eq!(trend.limit_col.as_deref(), Some("max_cpu"));
    assert_eq!(trend.limit_val, None);
    assert_eq!(trend.target_pcts, [Some(100), None, Some(90)]);
    assert!(set_target_pct(&mut state, 3, Some(50)).is_err());
}

#[test]
fn test_chargeback_interval_size_must_be_positive() {
    let mut state = draft_on("ChargebackVm");
    assert!(set_chargeback_interval(&mut state, ChargebackInterval::Weekly, 0, 1).is_err());
    set_chargeback_interval(&mut state, ChargebackInterval::Weekly, 4, 0).unwrap();
    let ReportKind::Chargeback(cb) = &state.kind else {
        panic!("expected a chargeback report");
    };
    assert_eq!(cb.interval, ChargebackInterval::Weekly);
    assert_eq!((cb.interval_size, cb.end_interval_offset), (4, 0));
}

// ============================================================================
// Scalar options
// ============================================================================

#[test]
fn test_scalar_options() {
    let mut state = draft_on("Vm");
    assert_eq!(state.pdf_page_size, "US-Letter");

    set_row_limit(&mut state, Some(50)).unwrap();
    assert_eq!(state.row_limit, Some(50));
    assert!(set_row_limit(&mut state, Some(0)).is_err());

    set_queue_timeout(&mut state, Some(0));
    assert_eq!(state.queue_timeout, None);

    set_pdf_page_size(&mut state, " A4 ").unwrap();
    assert_eq!(state.pdf_page_size, "A4");
    assert!(set_pdf_page_size(&mut state, "").is_err());
}

//! Edit sessions.
//!
//! A session owns one draft, the baseline it was loaded from and the active
//! tab. Inbound edits arrive as [`EditEvent`]s carrying raw strings; each is
//! applied to a copy of the draft and committed only when it succeeds.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::catalog::FieldCatalog;
use crate::compile::compile;
use crate::config::Settings;
use crate::editor::{self, chart, options, sort, style, MoveDirection, Refresh, SortSlot};
use crate::error::{Error, Result};
use crate::load::load;
use crate::model::bucket::TimeBucket;
use crate::model::definition::{ReportRecord, ReportSpecification};
use crate::model::draft::{ChartMode, ChartType, DraftReportState, GroupMode, SortOrder};
use crate::model::field::{Aggregate, FieldKey};
use crate::model::kind::{
    AllocatedMethod, AveragesBy, ChargebackGroupBy, ChargebackInterval, PerfInterval, ShowCostsBy,
};
use crate::model::style::{StyleOperator, StyleValue};
use crate::store::{ReportId, ReportStore};
use crate::validation::{check_tab, validate_for_save, Tab};

/// One logical edit, as sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EditEvent {
    SetModel { model: String },
    SetName { name: String },
    SetTitle { title: String },
    SetPriority { priority: Option<u32> },

    AddFields { keys: Vec<String> },
    RemoveFields { keys: Vec<String> },
    MoveFields { keys: Vec<String>, direction: MoveDirection },
    SetColumnHeader { key: String, header: String },
    SetColumnFormat { key: String, format: Option<String> },

    SetPivotGroup { slot: u8, key: Option<String> },
    SetPivotAggregates { key: String, aggregates: Vec<String> },

    SetSort { slot: SortSlot, key: Option<String>, bucket: Option<String> },
    SetSortBucket { slot: SortSlot, bucket: Option<String> },
    SetSortOrder { order: SortOrder },
    SetGroup { group: GroupMode },
    SetHideDetails { hide: bool },
    SetBreakLabel { label: String },
    SetBreakFormat { format: Option<String> },
    SetGroupCalculations { key: String, aggregates: Vec<String> },

    SetStyleClass { key: String, index: usize, class: Option<String> },
    SetStyleOperator { key: String, index: usize, operator: String },
    SetStyleValue { key: String, index: usize, value: Option<StyleValue> },
    SetStyleSuffix { key: String, index: usize, suffix: Option<String> },

    SetChartType { chart_type: Option<ChartType> },
    SetChartMode { mode: ChartMode },
    SetChartColumn { key: Option<String> },
    SetChartCount { count: u32 },
    SetChartOther { include_other: bool },

    SetPerfInterval { interval: PerfInterval },
    SetPerfOffsets { start_offset: u64, end_offset: u64 },
    SetCalcAvgsBy { by: AveragesBy },
    SetTimeProfile { profile: Option<u64> },
    SetTrendColumn { key: Option<String> },
    SetTrendLimit { limit_col: Option<String>, limit_val: Option<String> },
    SetTargetPct { index: usize, pct: Option<u32> },

    SetChargebackShowBy { show_by: Option<ShowCostsBy> },
    SetChargebackGroupBy { group_by: ChargebackGroupBy },
    SetChargebackInterval { interval: ChargebackInterval, size: u32, end_offset: u32 },
    SetChargebackMetrics { include_metrics: bool, method: AllocatedMethod, cumulative: bool },

    SetRowLimit { limit: Option<u32> },
    SetQueueTimeout { minutes: Option<u32> },
    SetPdfPageSize { size: String },
    SetRecordFilter { filter: Option<Value> },
    SetDisplayFilter { filter: Option<Value> },
}

/// What an accepted edit means for the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditOutcome {
    pub refresh: Refresh,
    /// Whether the draft now differs from the baseline.
    pub changed: bool,
    /// Problems that did not stop the edit.
    pub warnings: Vec<String>,
}

pub struct EditSession {
    draft: DraftReportState,
    baseline: Option<DraftReportState>,
    tab: Tab,
    settings: Settings,
    catalog: Box<dyn FieldCatalog>,
}

impl EditSession {
    /// A session on a new, empty report.
    pub fn new(settings: Settings, catalog: Box<dyn FieldCatalog>) -> Self {
        let mut draft = DraftReportState::default();
        draft.pdf_page_size = settings.editor.default_pdf_page_size.clone();
        Self {
            draft,
            baseline: None,
            tab: Tab::Columns,
            settings,
            catalog,
        }
    }

    /// A session editing a saved report.
    pub fn edit(
        record: &ReportRecord,
        settings: Settings,
        catalog: Box<dyn FieldCatalog>,
    ) -> Result<Self> {
        let draft = load(record, catalog.as_ref(), &settings.models)?;
        Ok(Self {
            baseline: Some(draft.clone()),
            draft,
            tab: Tab::Columns,
            settings,
            catalog,
        })
    }

    /// A session on a copy of a saved report, filed under "Custom".
    pub fn copy(
        record: &ReportRecord,
        settings: Settings,
        catalog: Box<dyn FieldCatalog>,
    ) -> Result<Self> {
        let mut draft = load(record, catalog.as_ref(), &settings.models)?;
        draft.name = format!("Copy of {}", record.name);
        draft.rpt_group = "Custom".to_string();
        draft.rpt_type = "Custom".to_string();
        Ok(Self {
            draft,
            baseline: None,
            tab: Tab::Columns,
            settings,
            catalog,
        })
    }

    pub fn draft(&self) -> &DraftReportState {
        &self.draft
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_changed(&self) -> bool {
        self.baseline.as_ref() != Some(&self.draft)
    }

    /// Apply one edit; on error the draft is left as it was.
    pub fn apply(&mut self, event: EditEvent) -> Result<EditOutcome> {
        let mut draft = self.draft.clone();
        let mut warnings = Vec::new();
        let refresh = self.dispatch(&mut draft, event, &mut warnings)?;
        self.draft = draft;
        debug!(refresh = refresh.as_str(), warnings = warnings.len(), "edit applied");
        Ok(EditOutcome {
            refresh,
            changed: self.is_changed(),
            warnings,
        })
    }

    fn dispatch(
        &self,
        draft: &mut DraftReportState,
        event: EditEvent,
        warnings: &mut Vec<String>,
    ) -> Result<Refresh> {
        use EditEvent::*;

        let refresh = match event {
            SetModel { model } => {
                let tz = draft.kind.tz().map(str::to_string);
                options::set_model(draft, &model, &self.settings.models, tz.as_deref())?;
                Refresh::Editor
            }
            SetName { name } => {
                draft.name = name;
                Refresh::ReportOptions
            }
            SetTitle { title } => {
                draft.title = title;
                Refresh::ReportOptions
            }
            SetPriority { priority } => {
                draft.priority = priority;
                Refresh::ReportOptions
            }

            AddFields { keys } => {
                let keys = parse_keys(&keys)?;
                editor::add_fields(
                    draft,
                    self.catalog.as_ref(),
                    &keys,
                    self.settings.editor.max_report_columns,
                )?;
                Refresh::ColumnLists
            }
            RemoveFields { keys } => {
                let keys = parse_keys(&keys)?;
                for rejected in editor::remove_fields(draft, &keys)? {
                    warnings.push(rejected.to_string());
                }
                Refresh::ColumnLists
            }
            MoveFields { keys, direction } => {
                editor::move_fields(draft, &parse_keys(&keys)?, direction)?;
                Refresh::ColumnLists
            }
            SetColumnHeader { key, header } => {
                editor::fields::set_column_header(draft, &FieldKey::decode(&key)?, &header)?;
                Refresh::ColumnLists
            }
            SetColumnFormat { key, format } => {
                editor::fields::set_column_format(draft, &FieldKey::decode(&key)?, format)?;
                Refresh::ColumnLists
            }

            SetPivotGroup { slot, key } => {
                editor::set_pivot_group(draft, slot, parse_optional_key(key.as_deref())?)?;
                Refresh::PivotOptions
            }
            SetPivotAggregates { key, aggregates } => {
                let kinds = parse_aggregates(&aggregates)?;
                editor::set_pivot_aggregates(draft, &FieldKey::decode(&key)?, kinds)?;
                Refresh::PivotOptions
            }

            SetSort { slot, key, bucket } => {
                let key = parse_optional_key(key.as_deref())?;
                let bucket = TimeBucket::parse_optional(bucket.as_deref())?;
                editor::set_sort(draft, slot, key, bucket)?;
                Refresh::SortOptions
            }
            SetSortBucket { slot, bucket } => {
                let bucket = TimeBucket::parse_optional(bucket.as_deref())?;
                editor::set_sort_bucket(draft, slot, bucket)?;
                Refresh::SortOptions
            }
            SetSortOrder { order } => {
                sort::set_sort_order(draft, order);
                Refresh::SortOptions
            }
            SetGroup { group } => {
                editor::set_group(draft, group);
                Refresh::SortOptions
            }
            SetHideDetails { hide } => {
                sort::set_hide_details(draft, hide)?;
                Refresh::SortOptions
            }
            SetBreakLabel { label } => {
                sort::set_break_label(draft, &label)?;
                Refresh::SortOptions
            }
            SetBreakFormat { format } => {
                sort::set_break_format(draft, format)?;
                Refresh::SortOptions
            }
            SetGroupCalculations { key, aggregates } => {
                let kinds = parse_aggregates(&aggregates)?;
                sort::set_group_calculations(draft, &FieldKey::decode(&key)?, kinds)?;
                Refresh::SortOptions
            }

            SetStyleClass { key, index, class } => {
                style::set_style_class(draft, &FieldKey::decode(&key)?, index, class.as_deref())?;
                Refresh::StyleRules
            }
            SetStyleOperator {
                key,
                index,
                operator,
            } => {
                let operator: StyleOperator = operator.parse()?;
                style::set_style_operator(draft, &FieldKey::decode(&key)?, index, operator)?;
                Refresh::StyleRules
            }
            SetStyleValue { key, index, value } => {
                style::set_style_value(draft, &FieldKey::decode(&key)?, index, value)?;
                Refresh::StyleRules
            }
            SetStyleSuffix { key, index, suffix } => {
                style::set_style_suffix(draft, &FieldKey::decode(&key)?, index, suffix)?;
                Refresh::StyleRules
            }

            SetChartType { chart_type } => {
                chart::set_chart_type(draft, chart_type, &self.settings.editor);
                Refresh::ChartOptions
            }
            SetChartMode { mode } => {
                chart::set_chart_mode(draft, mode)?;
                Refresh::ChartOptions
            }
            SetChartColumn { key } => {
                chart::set_chart_column(draft, parse_optional_key(key.as_deref())?)?;
                Refresh::ChartOptions
            }
            SetChartCount { count } => {
                chart::set_chart_count(draft, count)?;
                Refresh::ChartOptions
            }
            SetChartOther { include_other } => {
                chart::set_chart_other(draft, include_other)?;
                Refresh::ChartOptions
            }

            SetPerfInterval { interval } => {
                options::set_perf_interval(draft, interval)?;
                Refresh::ReportOptions
            }
            SetPerfOffsets {
                start_offset,
                end_offset,
            } => {
                options::set_perf_offsets(draft, start_offset, end_offset)?;
                Refresh::ReportOptions
            }
            SetCalcAvgsBy { by } => {
                options::set_calc_avgs_by(draft, by)?;
                Refresh::ReportOptions
            }
            SetTimeProfile { profile } => {
                options::set_time_profile(draft, profile)?;
                Refresh::ReportOptions
            }
            SetTrendColumn { key } => {
                options::set_trend_column(draft, parse_optional_key(key.as_deref())?)?;
                Refresh::ReportOptions
            }
            SetTrendLimit {
                limit_col,
                limit_val,
            } => {
                options::set_trend_limit(draft, limit_col, limit_val)?;
                Refresh::ReportOptions
            }
            SetTargetPct { index, pct } => {
                options::set_target_pct(draft, index, pct)?;
                Refresh::ReportOptions
            }

            SetChargebackShowBy { show_by } => {
                options::set_chargeback_show_by(draft, show_by)?;
                Refresh::ReportOptions
            }
            SetChargebackGroupBy { group_by } => {
                options::set_chargeback_group_by(draft, group_by)?;
                Refresh::ReportOptions
            }
            SetChargebackInterval {
                interval,
                size,
                end_offset,
            } => {
                options::set_chargeback_interval(draft, interval, size, end_offset)?;
                Refresh::ReportOptions
            }
            SetChargebackMetrics {
                include_metrics,
                method,
                cumulative,
            } => {
                options::set_chargeback_metrics(draft, include_metrics, method, cumulative)?;
                Refresh::ReportOptions
            }

            SetRowLimit { limit } => {
                options::set_row_limit(draft, limit)?;
                Refresh::ReportOptions
            }
            SetQueueTimeout { minutes } => {
                options::set_queue_timeout(draft, minutes);
                Refresh::ReportOptions
            }
            SetPdfPageSize { size } => {
                options::set_pdf_page_size(draft, &size)?;
                Refresh::ReportOptions
            }
            SetRecordFilter { filter } => {
                draft.record_filter = filter;
                Refresh::ReportOptions
            }
            SetDisplayFilter { filter } => {
                draft.display_filter = filter;
                Refresh::ColumnLists
            }
        };
        Ok(refresh)
    }

    /// Switch to `tab`.
    ///
    /// When the tab is not reachable yet the session moves to the tab the
    /// first violation points at and the violations are returned.
    pub fn switch_tab(&mut self, tab: Tab) -> Result<Tab> {
        let report = check_tab(&self.draft, tab);
        match report.redirect() {
            None => {
                self.tab = tab;
                Ok(tab)
            }
            Some(redirect) => {
                warn!(%tab, %redirect, "tab switch rejected");
                self.tab = redirect;
                Err(Error::Validation(report))
            }
        }
    }

    /// Compile the draft without saving it.
    pub fn compile(&self) -> Result<ReportSpecification> {
        compile(&self.draft)
    }

    /// Validate, compile and hand the report to `store`.
    ///
    /// On success the saved draft becomes the new baseline.
    pub fn save(&mut self, store: &mut dyn ReportStore) -> Result<ReportId> {
        let report = validate_for_save(&self.draft);
        if let Some(redirect) = report.redirect() {
            self.tab = redirect;
            return Err(Error::Validation(report));
        }
        let spec = compile(&self.draft)?;
        let record = ReportRecord::new(&self.draft, spec);
        let id = store
            .persist(&record)
            .map_err(|err| Error::PersistenceFailure(err.to_string()))?;
        self.baseline = Some(self.draft.clone());
        info!(report = %record.name, %id, "report saved");
        Ok(id)
    }
}

fn parse_keys(keys: &[String]) -> Result<Vec<FieldKey>> {
    keys.iter()
        .filter(|k| !k.trim().is_empty())
        .map(|k| FieldKey::decode(k))
        .collect()
}

fn parse_optional_key(key: Option<&str>) -> Result<Option<FieldKey>> {
    match key.map(str::trim) {
        None | Some("") => Ok(None),
        Some(key) => FieldKey::decode(key).map(Some),
    }
}

fn parse_aggregates(aggregates: &[String]) -> Result<BTreeSet<Aggregate>> {
    aggregates.iter().map(|a| a.parse()).collect()
}

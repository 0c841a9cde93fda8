// src/model/definition.rs
//! Compiled report definitions: what the rendering engine consumes and what
//! the store persists.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::join::JoinTree;
use crate::model::draft::{ChartMode, ChartType, DraftReportState, SortOrder};
use crate::model::field::Aggregate;
use crate::model::kind::{AllocatedMethod, AveragesBy, ChargebackInterval, PerfInterval};
use crate::model::style::StyleRule;

/// The normalized, flat report definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSpecification {
    /// Base model the report queries.
    pub db: String,
    /// Base model columns, without aggregate suffixes.
    pub cols: Vec<String>,
    /// Joined tables and the columns pulled from each.
    #[serde(default, skip_serializing_if = "JoinTree::is_empty")]
    pub include: JoinTree,
    /// Display order: `table.table.column[__aggregate]`.
    pub col_order: Vec<String>,
    /// Parallel to `col_order`.
    pub headers: Vec<String>,
    /// Parallel to `col_order`.
    pub col_formats: Vec<Option<String>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sortby: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
    /// `y` to group with detail rows, `c` for counts only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pivot_group_cols: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<CompiledGraph>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dims: Option<u8>,

    /// Options per final column (styles, break label/format, group calculations).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub col_options: BTreeMap<String, CompiledColumnOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_filter: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_options: Option<DbOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_profile: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompiledColumnOptions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub style: Vec<StyleRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_format: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub grouping: BTreeSet<Aggregate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledGraph {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub mode: ChartMode,
    /// Final column plotted in values mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub count: u32,
    pub other: bool,
}

/// Query options for reports that are not plain model listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rpt_type", rename_all = "snake_case")]
pub enum DbOptions {
    Performance {
        interval: PerfInterval,
        calc_avgs_by: AveragesBy,
        /// Seconds back from now where the range starts (end offset included).
        start_offset: u64,
        end_offset: u64,
    },
    Trend {
        interval: PerfInterval,
        start_offset: u64,
        end_offset: u64,
        #[serde(default)]
        trend_db: Option<String>,
        #[serde(default)]
        trend_col: Option<String>,
        #[serde(default)]
        limit_col: Option<String>,
        #[serde(default)]
        limit_val: Option<String>,
        target_pcts: Vec<u32>,
    },
    Chargeback {
        /// Rate model, e.g. `Vm`.
        model: String,
        interval: ChargebackInterval,
        interval_size: u32,
        end_interval_offset: u32,
        #[serde(flatten)]
        show_by: ChargebackFilter,
        groupby: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        groupby_tag: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        groupby_label: Option<String>,
        include_metrics: bool,
        method_for_allocated_metrics: AllocatedMethod,
        cumulative_rate_calculation: bool,
    },
}

/// Whose costs a compiled chargeback report covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChargebackFilter {
    Owner { owner: String },
    Tenant { tenant_id: String },
    /// `/managed/<category>/<value>`
    Tag { tag: String },
    Entity {
        #[serde(default)]
        provider_id: Option<String>,
        entity_id: String,
    },
}

/// Everything the store receives for one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub name: String,
    pub title: String,
    pub rpt_group: String,
    pub rpt_type: String,
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub rpt_options: RecordOptions,
    pub spec: ReportSpecification,
}

/// Output options stored next to the definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_page_size: Option<String>,
    #[serde(default)]
    pub hide_detail_rows: bool,
}

impl ReportRecord {
    /// Pair a compiled specification with the draft's scalar fields.
    pub fn new(draft: &DraftReportState, spec: ReportSpecification) -> Self {
        let grouping = draft.group.is_grouping();
        Self {
            name: draft.name.trim().to_string(),
            title: draft.title.trim().to_string(),
            rpt_group: draft.rpt_group.clone(),
            rpt_type: draft.rpt_type.clone(),
            priority: draft.priority,
            categories: draft.categories.clone(),
            rpt_options: RecordOptions {
                row_limit: if grouping { None } else { draft.row_limit },
                queue_timeout: draft.queue_timeout,
                pdf_page_size: Some(draft.pdf_page_size.clone()),
                hide_detail_rows: grouping && draft.hide_details,
            },
            spec,
        }
    }
}

// src/model/draft.rs
//! The in-progress report configuration of one editing session.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::DEFAULT_PDF_PAGE_SIZE;
use crate::model::bucket::ColumnKey;
use crate::model::field::{Aggregate, FieldKey, SUFFIX_SEPARATOR};
use crate::model::kind::ReportKind;
use crate::model::style::StyleRule;

/// Column data types, as far as styling and charting care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    #[default]
    String,
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
    DateTime,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float | ColumnType::Decimal)
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::DateTime)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::String => "string",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Decimal => "decimal",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
        };
        f.write_str(name)
    }
}

/// Type information the catalog reports for a column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnInfo {
    #[serde(default)]
    pub data_type: ColumnType,
    /// Units offered as style value suffixes, e.g. `bytes`, `megabytes`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<String>,
}

/// A field chosen for the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedField {
    pub label: String,
    pub key: FieldKey,
    #[serde(default)]
    pub info: ColumnInfo,
}

impl SelectedField {
    pub fn new(label: &str, key: FieldKey) -> Self {
        Self {
            label: label.to_string(),
            key,
            info: ColumnInfo::default(),
        }
    }

    pub fn with_type(mut self, data_type: ColumnType) -> Self {
        self.info.data_type = data_type;
        self
    }
}

/// Up to three pivot group-by fields, filled in order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PivotOptions {
    #[serde(default)]
    pub by1: Option<FieldKey>,
    #[serde(default)]
    pub by2: Option<FieldKey>,
    #[serde(default)]
    pub by3: Option<FieldKey>,
}

impl PivotOptions {
    pub fn slots(&self) -> [Option<&FieldKey>; 3] {
        [self.by1.as_ref(), self.by2.as_ref(), self.by3.as_ref()]
    }

    pub fn is_active(&self) -> bool {
        self.by1.is_some()
    }

    pub fn contains(&self, key: &FieldKey) -> bool {
        self.slots().into_iter().flatten().any(|k| k == key)
    }

    /// Position (1-based) of `key` among the group fields.
    pub fn slot_of(&self, key: &FieldKey) -> Option<u8> {
        self.slots()
            .into_iter()
            .position(|k| k == Some(key))
            .map(|i| i as u8 + 1)
    }

    /// Remove `key` from the group fields, shifting later slots left.
    pub fn drop_from_selection(&mut self, key: &FieldKey) {
        let remaining: Vec<FieldKey> = self
            .slots()
            .into_iter()
            .flatten()
            .filter(|k| *k != key)
            .cloned()
            .collect();
        self.assign(remaining);
    }

    pub(crate) fn assign(&mut self, keys: Vec<FieldKey>) {
        let mut keys = keys.into_iter();
        self.by1 = keys.next();
        self.by2 = keys.next();
        self.by3 = keys.next();
    }
}

/// Whether sort breaks insert subtotal rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroupMode {
    #[default]
    #[serde(rename = "no")]
    None,
    #[serde(rename = "yes")]
    GroupAndShowDetail,
    #[serde(rename = "counts")]
    GroupCountsOnly,
}

impl GroupMode {
    pub fn is_grouping(self) -> bool {
        self != GroupMode::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Per-column options: style chain, break label/format, group calculations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnOptions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub style: Vec<StyleRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_format: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub grouping: BTreeSet<Aggregate>,
}

impl ColumnOptions {
    pub fn is_empty(&self) -> bool {
        self.style.is_empty()
            && self.break_label.is_none()
            && self.break_format.is_none()
            && self.grouping.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartType {
    Bar,
    Column,
    StackedBar,
    StackedColumn,
    Pie,
    Donut,
    Line,
    Area,
    StackedArea,
}

impl ChartType {
    /// Pie and donut charts plot a single dimension.
    pub fn is_single_dimension(self) -> bool {
        matches!(self, ChartType::Pie | ChartType::Donut)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartMode {
    #[default]
    Counts,
    Values,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphOptions {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub mode: ChartMode,
    /// Data column plotted in `Values` mode.
    #[serde(default)]
    pub column: Option<FieldKey>,
    pub count: u32,
    pub include_other: bool,
}

/// The draft being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftReportState {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    pub rpt_group: String,
    pub rpt_type: String,
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub categories: Vec<String>,

    /// Base model, e.g. `Vm`.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub kind: ReportKind,

    #[serde(default)]
    pub selected_fields: Vec<SelectedField>,
    #[serde(default)]
    pub headers: BTreeMap<FieldKey, String>,
    #[serde(default)]
    pub col_formats: BTreeMap<FieldKey, String>,

    #[serde(default)]
    pub pivot: PivotOptions,
    #[serde(default)]
    pub pivot_aggregates: BTreeMap<FieldKey, BTreeSet<Aggregate>>,

    #[serde(default)]
    pub sort_by1: Option<ColumnKey>,
    #[serde(default)]
    pub sort_by2: Option<ColumnKey>,
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default)]
    pub group: GroupMode,
    #[serde(default)]
    pub hide_details: bool,
    #[serde(default)]
    pub row_limit: Option<u32>,
    #[serde(default)]
    pub queue_timeout: Option<u32>,
    pub pdf_page_size: String,

    #[serde(default)]
    pub col_options: BTreeMap<ColumnKey, ColumnOptions>,
    #[serde(default)]
    pub graph: Option<GraphOptions>,

    /// Row filter produced by the expression editor.
    #[serde(default)]
    pub record_filter: Option<Value>,
    /// Filter applied to the rendered rows; may reference selected fields.
    #[serde(default)]
    pub display_filter: Option<Value>,
}

impl Default for DraftReportState {
    fn default() -> Self {
        Self {
            name: String::new(),
            title: String::new(),
            rpt_group: "Custom".to_string(),
            rpt_type: "Custom".to_string(),
            priority: None,
            categories: Vec::new(),
            model: None,
            kind: ReportKind::Standard,
            selected_fields: Vec::new(),
            headers: BTreeMap::new(),
            col_formats: BTreeMap::new(),
            pivot: PivotOptions::default(),
            pivot_aggregates: BTreeMap::new(),
            sort_by1: None,
            sort_by2: None,
            order: SortOrder::Ascending,
            group: GroupMode::None,
            hide_details: false,
            row_limit: None,
            queue_timeout: None,
            pdf_page_size: DEFAULT_PDF_PAGE_SIZE.to_string(),
            col_options: BTreeMap::new(),
            graph: None,
            record_filter: None,
            display_filter: None,
        }
    }
}

impl DraftReportState {
    /// A blank draft on `model`.
    pub fn for_model(model: &str, kind: ReportKind) -> Self {
        Self {
            model: Some(model.to_string()),
            kind,
            ..Self::default()
        }
    }

    /// The selected field whose key is the base of `key`.
    pub fn field(&self, key: &FieldKey) -> Option<&SelectedField> {
        self.selected_fields.iter().find(|f| f.key.same_field(key))
    }

    pub fn is_selected(&self, key: &FieldKey) -> bool {
        self.field(key).is_some()
    }

    pub fn column_info(&self, key: &FieldKey) -> ColumnInfo {
        self.field(key).map(|f| f.info.clone()).unwrap_or_default()
    }

    /// Header for `key`, falling back to the field label.
    pub fn header(&self, key: &FieldKey) -> Option<&str> {
        self.headers
            .get(key)
            .map(String::as_str)
            .or_else(|| self.field(key).map(|f| f.label.as_str()))
    }

    pub fn record_filter(&self) -> Option<&Value> {
        live_expression(self.record_filter.as_ref())
    }

    pub fn display_filter(&self) -> Option<&Value> {
        live_expression(self.display_filter.as_ref())
    }

    /// Whether the display filter mentions `key` or one of its aggregates.
    pub fn display_filter_references(&self, key: &FieldKey) -> bool {
        let encoded = key.base().encode();
        self.display_filter()
            .is_some_and(|exp| references(exp, &encoded))
    }
}

/// Expression documents that are blank or still hold the editor's `???`
/// placeholder count as absent.
fn live_expression(exp: Option<&Value>) -> Option<&Value> {
    match exp {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) if map.is_empty() || map.contains_key("???") => None,
        Some(exp) => Some(exp),
    }
}

fn references(exp: &Value, encoded: &str) -> bool {
    match exp {
        Value::String(s) => {
            s == encoded
                || s.strip_prefix(encoded)
                    .is_some_and(|rest| rest.starts_with(SUFFIX_SEPARATOR))
        }
        Value::Array(items) => items.iter().any(|v| references(v, encoded)),
        Value::Object(map) => map.values().any(|v| references(v, encoded)),
        _ => false,
    }
}

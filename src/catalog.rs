//! Field catalog.
//!
//! The catalog lists the columns reachable from a base model, with the label
//! the editor shows for each. Labels of joined columns carry their table
//! path: `Vm.Hardwares : CPU Speed`.

use std::collections::BTreeMap;

use inflector::cases::titlecase::to_title_case;
use inflector::string::singularize::to_singular;
use serde::{Deserialize, Serialize};

use crate::model::draft::{ColumnInfo, ColumnType, SelectedField};
use crate::model::field::FieldKey;

const LABEL_SEPARATOR: &str = " : ";

/// A column the user may add to a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableField {
    pub label: String,
    pub key: FieldKey,
    #[serde(flatten)]
    pub info: ColumnInfo,
}

impl AvailableField {
    pub fn new(label: &str, key: FieldKey, data_type: ColumnType) -> Self {
        Self {
            label: label.to_string(),
            key,
            info: ColumnInfo {
                data_type,
                units: Vec::new(),
            },
        }
    }

    pub fn with_units(mut self, units: &[&str]) -> Self {
        self.info.units = units.iter().map(|u| u.to_string()).collect();
        self
    }

    /// Column header shown for the field when it is first added.
    pub fn header(&self) -> String {
        derive_header(&self.label)
    }

    pub fn to_selected(&self) -> SelectedField {
        SelectedField {
            label: self.label.clone(),
            key: self.key.clone(),
            info: self.info.clone(),
        }
    }
}

/// Source of available fields per base model.
pub trait FieldCatalog {
    /// Fields available on `model`, in display order.
    fn available_fields(&self, model: &str) -> Vec<AvailableField>;

    /// The catalog entry for `key`, ignoring any aggregate.
    fn find(&self, key: &FieldKey) -> Option<AvailableField> {
        self.available_fields(key.model())
            .into_iter()
            .find(|f| f.key.same_field(key))
    }
}

/// A catalog held in memory, loadable from a JSON document keyed by model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticCatalog {
    models: BTreeMap<String, Vec<AvailableField>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: AvailableField) {
        self.models
            .entry(field.key.model().to_string())
            .or_default()
            .push(field);
    }

    pub fn with(mut self, field: AvailableField) -> Self {
        self.add(field);
        self
    }
}

impl FieldCatalog for StaticCatalog {
    fn available_fields(&self, model: &str) -> Vec<AvailableField> {
        self.models.get(model).cloned().unwrap_or_default()
    }
}

/// Header for a catalog label.
///
/// Base labels are used as they are. For joined labels the last table of the
/// path is singularized (`OS` excepted) and prefixed to the column label,
/// unless the column label already starts with it.
pub fn derive_header(label: &str) -> String {
    let Some((tables, column)) = label.split_once(LABEL_SEPARATOR) else {
        return label.trim().to_string();
    };
    let last = tables.rsplit('.').next().unwrap_or(tables).trim();
    let table = if last == "OS" {
        last.to_string()
    } else {
        to_singular(last)
    };
    if column.split(' ').next() == Some(table.as_str()) {
        column.to_string()
    } else {
        format!("{} {}", table, column)
    }
}

/// Label for a key the catalog does not know, built from its names.
pub fn fallback_label(key: &FieldKey) -> String {
    let column = to_title_case(key.column());
    if !key.is_joined() {
        return column;
    }
    let tables: Vec<String> = key.join_path().iter().map(|t| to_title_case(t)).collect();
    format!("{}.{}{}{}", key.model(), tables.join("."), LABEL_SEPARATOR, column)
}

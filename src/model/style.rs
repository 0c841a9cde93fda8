//! Conditional column styling rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::draft::ColumnType;

/// Comparison applied to a cell value to decide whether a style applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleOperator {
    #[serde(rename = "DEFAULT")]
    Default,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "INCLUDES")]
    Includes,
    #[serde(rename = "STARTS WITH")]
    StartsWith,
    #[serde(rename = "ENDS WITH")]
    EndsWith,
    #[serde(rename = "IS NIL")]
    IsNil,
    #[serde(rename = "IS NOT NIL")]
    IsNotNil,
    #[serde(rename = "IS EMPTY")]
    IsEmpty,
    #[serde(rename = "IS NOT EMPTY")]
    IsNotEmpty,
}

impl StyleOperator {
    const ALL: [StyleOperator; 14] = [
        StyleOperator::Default,
        StyleOperator::Eq,
        StyleOperator::Ne,
        StyleOperator::Lt,
        StyleOperator::Lte,
        StyleOperator::Gt,
        StyleOperator::Gte,
        StyleOperator::Includes,
        StyleOperator::StartsWith,
        StyleOperator::EndsWith,
        StyleOperator::IsNil,
        StyleOperator::IsNotNil,
        StyleOperator::IsEmpty,
        StyleOperator::IsNotEmpty,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StyleOperator::Default => "DEFAULT",
            StyleOperator::Eq => "=",
            StyleOperator::Ne => "!=",
            StyleOperator::Lt => "<",
            StyleOperator::Lte => "<=",
            StyleOperator::Gt => ">",
            StyleOperator::Gte => ">=",
            StyleOperator::Includes => "INCLUDES",
            StyleOperator::StartsWith => "STARTS WITH",
            StyleOperator::EndsWith => "ENDS WITH",
            StyleOperator::IsNil => "IS NIL",
            StyleOperator::IsNotNil => "IS NOT NIL",
            StyleOperator::IsEmpty => "IS EMPTY",
            StyleOperator::IsNotEmpty => "IS NOT EMPTY",
        }
    }

    /// Operators that test for presence and take no value.
    pub fn is_valueless(self) -> bool {
        matches!(
            self,
            StyleOperator::Default
                | StyleOperator::IsNil
                | StyleOperator::IsNotNil
                | StyleOperator::IsEmpty
                | StyleOperator::IsNotEmpty
        )
    }

    fn is_ordering(self) -> bool {
        matches!(
            self,
            StyleOperator::Lt | StyleOperator::Lte | StyleOperator::Gt | StyleOperator::Gte
        )
    }

    fn is_string_match(self) -> bool {
        matches!(
            self,
            StyleOperator::Includes | StyleOperator::StartsWith | StyleOperator::EndsWith
        )
    }
}

impl fmt::Display for StyleOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StyleOperator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_uppercase();
        StyleOperator::ALL
            .into_iter()
            .find(|op| op.as_str() == wanted)
            .ok_or_else(|| Error::malformed(s, "unknown style operator"))
    }
}

/// Threshold a style rule compares against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Bool(bool),
    Text(String),
}

/// Marker for "the current day" in date comparisons.
pub const TODAY: &str = "Today";

impl StyleValue {
    pub fn today() -> Self {
        StyleValue::Text(TODAY.to_string())
    }

    pub fn empty() -> Self {
        StyleValue::Text(String::new())
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, StyleValue::Text(text) if text.trim().is_empty())
    }

    /// Default threshold for a freshly chosen operator on a column of `data_type`.
    pub fn default_for(data_type: ColumnType) -> Self {
        match data_type {
            ColumnType::Boolean => StyleValue::Bool(true),
            ColumnType::Date | ColumnType::DateTime => StyleValue::today(),
            _ => StyleValue::empty(),
        }
    }
}

/// One conditional formatting instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
    pub operator: StyleOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<StyleValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_suffix: Option<String>,
    #[serde(rename = "class")]
    pub css_class: String,
}

impl StyleRule {
    /// A new rule with the defaults the editor shows for `data_type`.
    pub fn new(css_class: &str, data_type: ColumnType, units: &[String]) -> Self {
        let value_suffix = if data_type.is_numeric() {
            units.first().cloned()
        } else {
            None
        };
        Self {
            operator: StyleOperator::Default,
            value: None,
            value_suffix,
            css_class: css_class.to_string(),
        }
    }

    /// Check the threshold against the column type.
    ///
    /// Returns a message describing the problem, if any.
    pub fn check(&self, data_type: ColumnType) -> Option<String> {
        if self.operator.is_valueless() {
            return None;
        }
        let text = match &self.value {
            None => return None,
            Some(StyleValue::Bool(_)) => {
                return if data_type == ColumnType::Boolean {
                    None
                } else {
                    Some(format!("'{}' needs a {} value", self.operator, data_type))
                };
            }
            Some(StyleValue::Text(text)) => text.trim(),
        };

        if data_type.is_numeric() {
            if self.operator.is_string_match() {
                return Some(format!("'{}' does not apply to numbers", self.operator));
            }
            if text.replace(',', "").parse::<f64>().is_err() {
                return Some(format!("'{}' is not a number", text));
            }
        } else if data_type.is_temporal() {
            if self.operator.is_string_match() {
                return Some(format!("'{}' does not apply to dates", self.operator));
            }
            if text.is_empty() {
                return Some("a date is required".to_string());
            }
        } else if data_type == ColumnType::Boolean {
            if self.operator.is_ordering() || self.operator.is_string_match() {
                return Some(format!("'{}' does not apply to booleans", self.operator));
            }
            if !matches!(text, "true" | "false") {
                return Some(format!("'{}' is not true or false", text));
            }
        }
        None
    }
}

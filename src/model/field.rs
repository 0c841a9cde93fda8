// src/model/field.rs
//! Field keys.
//!
//! A field key names one column reachable from a report's base model:
//!
//! ```text
//! Vm-name                      base table column
//! Vm.hardware-cpu_speed        column of a joined table
//! Vm.hardware.disks-size       column two joins away
//! Vm-cpu__sum                  pivot aggregate of a base column
//! ```
//!
//! Internally a key is always a validated [`FieldKey`]; the string form only
//! appears at the serialization boundary.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

static KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<model>[A-Za-z][A-Za-z0-9_:]*)(?P<path>(?:\.[A-Za-z0-9_]+)*)-(?P<column>[A-Za-z0-9_]+)$",
    )
    .unwrap()
});

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());

/// Separator between a column and its suffix (aggregate or time bucket).
pub const SUFFIX_SEPARATOR: &str = "__";

/// Aggregate calculations available for pivot and group columns.
///
/// Declaration order is the fixed display order used when fanning out pivot
/// columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    Min,
    Avg,
    Max,
    Sum,
    Count,
}

impl Aggregate {
    pub const ALL: [Aggregate; 5] = [
        Aggregate::Min,
        Aggregate::Avg,
        Aggregate::Max,
        Aggregate::Sum,
        Aggregate::Count,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Aggregate::Min => "min",
            Aggregate::Avg => "avg",
            Aggregate::Max => "max",
            Aggregate::Sum => "sum",
            Aggregate::Count => "count",
        }
    }

    /// Title used in derived labels, e.g. `CPU (Sum)`.
    pub fn title(self) -> String {
        inflector::cases::titlecase::to_title_case(self.as_str())
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Aggregate::ALL
            .into_iter()
            .find(|agg| agg.as_str() == s)
            .ok_or_else(|| Error::malformed(s, "unknown aggregate"))
    }
}

/// A validated reference to a column, optionally carrying a pivot aggregate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldKey {
    model: String,
    join_path: Vec<String>,
    column: String,
    aggregate: Option<Aggregate>,
}

impl FieldKey {
    /// A column on the base model.
    pub fn new(model: &str, column: &str) -> Result<Self> {
        Self::joined(model, std::iter::empty::<&str>(), column)
    }

    /// A column reached through `join_path` from the base model.
    pub fn joined<I, S>(model: &str, join_path: I, column: &str) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let join_path: Vec<String> = join_path
            .into_iter()
            .map(|t| t.as_ref().to_string())
            .collect();
        let key = Self {
            model: model.to_string(),
            join_path,
            column: column.to_string(),
            aggregate: None,
        };
        key.check()?;
        Ok(key)
    }

    fn check(&self) -> Result<()> {
        let shown = || self.to_string();
        if self.model.is_empty()
            || !self.model.starts_with(|c: char| c.is_ascii_alphabetic())
            || !self
                .model
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
        {
            return Err(Error::malformed(shown(), "invalid model name"));
        }
        if let Some(table) = self.join_path.iter().find(|t| !NAME_PATTERN.is_match(t)) {
            return Err(Error::malformed(shown(), format!("invalid table name '{}'", table)));
        }
        if !NAME_PATTERN.is_match(&self.column)
            || self.column.contains(SUFFIX_SEPARATOR)
            || self.column.ends_with('_')
        {
            return Err(Error::malformed(shown(), "invalid column name"));
        }
        Ok(())
    }

    /// Decode the string form of a key.
    pub fn decode(key: &str) -> Result<Self> {
        let caps = KEY_PATTERN.captures(key).ok_or_else(|| {
            Error::malformed(key, "expected model[.table...]-column[__aggregate]")
        })?;

        let path = caps.name("path").map(|m| m.as_str()).unwrap_or("");
        let join_path = path.split('.').filter(|t| !t.is_empty());

        let (column, aggregate) = match caps["column"].split_once(SUFFIX_SEPARATOR) {
            Some((column, suffix)) => {
                let aggregate = suffix
                    .parse::<Aggregate>()
                    .map_err(|_| Error::malformed(key, format!("unknown aggregate '{}'", suffix)))?;
                (column, Some(aggregate))
            }
            None => (&caps["column"], None),
        };

        let mut field = Self::joined(&caps["model"], join_path, column)
            .map_err(|err| match err {
                Error::MalformedKey { reason, .. } => Error::malformed(key, reason),
                other => other,
            })?;
        field.aggregate = aggregate;
        Ok(field)
    }

    /// The string form: `model[.table...]-column[__aggregate]`.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// This key carrying a pivot aggregate.
    pub fn with_aggregate(&self, aggregate: Aggregate) -> Self {
        Self {
            aggregate: Some(aggregate),
            ..self.clone()
        }
    }

    /// The underlying field, without any aggregate.
    pub fn base(&self) -> Self {
        Self {
            aggregate: None,
            ..self.clone()
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn join_path(&self) -> &[String] {
        &self.join_path
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn aggregate(&self) -> Option<Aggregate> {
        self.aggregate
    }

    pub fn is_joined(&self) -> bool {
        !self.join_path.is_empty()
    }

    /// Same underlying field, ignoring the aggregate.
    pub fn same_field(&self, other: &FieldKey) -> bool {
        self.model == other.model && self.join_path == other.join_path && self.column == other.column
    }

    /// `table.table.column` (or `column` on the base model), without suffix.
    pub fn qualified_column(&self) -> String {
        if self.join_path.is_empty() {
            self.column.clone()
        } else {
            format!("{}.{}", self.join_path.join("."), self.column)
        }
    }

    /// The column name used by the rendering engine, aggregate included.
    pub fn report_column(&self) -> String {
        match self.aggregate {
            Some(agg) => format!("{}{}{}", self.qualified_column(), SUFFIX_SEPARATOR, agg),
            None => self.qualified_column(),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.model)?;
        for table in &self.join_path {
            write!(f, ".{}", table)?;
        }
        write!(f, "-{}", self.column)?;
        if let Some(agg) = self.aggregate {
            write!(f, "{}{}", SUFFIX_SEPARATOR, agg)?;
        }
        Ok(())
    }
}

impl FromStr for FieldKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FieldKey::decode(s)
    }
}

impl TryFrom<String> for FieldKey {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        FieldKey::decode(&s)
    }
}

impl From<FieldKey> for String {
    fn from(key: FieldKey) -> Self {
        key.to_string()
    }
}

/// Encode a column reference into its string key.
pub fn encode(
    model: &str,
    join_path: &[&str],
    column: &str,
    aggregate: Option<Aggregate>,
) -> Result<String> {
    let key = FieldKey::joined(model, join_path.iter().copied(), column)?;
    Ok(match aggregate {
        Some(agg) => key.with_aggregate(agg).encode(),
        None => key.encode(),
    })
}

/// Decode a string key into its parts.
pub fn decode(key: &str) -> Result<FieldKey> {
    FieldKey::decode(key)
}

//! Time buckets and column keys.
//!
//! A sort on a date/time column may group rows by a time bucket. The bucket
//! travels with the field as a suffix: `Vm-created_on__month`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::field::{FieldKey, SUFFIX_SEPARATOR};

/// Break suffixes for date/time sort columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
    HourOfDay,
    DayOfWeek,
    DayOfMonth,
    WeekOfYear,
    MonthOfYear,
}

impl TimeBucket {
    pub const ALL: [TimeBucket; 11] = [
        TimeBucket::Hour,
        TimeBucket::Day,
        TimeBucket::Week,
        TimeBucket::Month,
        TimeBucket::Quarter,
        TimeBucket::Year,
        TimeBucket::HourOfDay,
        TimeBucket::DayOfWeek,
        TimeBucket::DayOfMonth,
        TimeBucket::WeekOfYear,
        TimeBucket::MonthOfYear,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TimeBucket::Hour => "hour",
            TimeBucket::Day => "day",
            TimeBucket::Week => "week",
            TimeBucket::Month => "month",
            TimeBucket::Quarter => "quarter",
            TimeBucket::Year => "year",
            TimeBucket::HourOfDay => "hour_of_day",
            TimeBucket::DayOfWeek => "day_of_week",
            TimeBucket::DayOfMonth => "day_of_month",
            TimeBucket::WeekOfYear => "week_of_year",
            TimeBucket::MonthOfYear => "month_of_year",
        }
    }

    /// Name shown in break labels, e.g. `Day of Week`.
    pub fn display_name(self) -> &'static str {
        match self {
            TimeBucket::Hour => "Hour",
            TimeBucket::Day => "Day",
            TimeBucket::Week => "Week",
            TimeBucket::Month => "Month",
            TimeBucket::Quarter => "Quarter",
            TimeBucket::Year => "Year",
            TimeBucket::HourOfDay => "Hour of Day",
            TimeBucket::DayOfWeek => "Day of Week",
            TimeBucket::DayOfMonth => "Day of Month",
            TimeBucket::WeekOfYear => "Week of Year",
            TimeBucket::MonthOfYear => "Month of Year",
        }
    }

    /// Parse an optional suffix as sent by the editor; blank means none.
    pub fn parse_optional(suffix: Option<&str>) -> Result<Option<TimeBucket>> {
        match suffix.map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s.parse().map(Some),
        }
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeBucket {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TimeBucket::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| Error::InvalidBucket(s.to_string()))
    }
}

/// A field plus an optional time bucket.
///
/// Sort slots hold column keys, and so do column options: style rules live
/// under the bare field, break labels of a bucketed sort under the bucketed
/// key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColumnKey {
    pub field: FieldKey,
    pub bucket: Option<TimeBucket>,
}

impl ColumnKey {
    pub fn new(field: FieldKey, bucket: Option<TimeBucket>) -> Self {
        Self { field, bucket }
    }

    pub fn plain(field: FieldKey) -> Self {
        Self { field, bucket: None }
    }

    /// Parse `key[__bucket]`. A trailing suffix that is neither an aggregate
    /// nor a bucket is rejected as an invalid bucket.
    pub fn decode(s: &str) -> Result<Self> {
        if let Some((head, suffix)) = s.rsplit_once(SUFFIX_SEPARATOR) {
            if let Ok(bucket) = suffix.parse::<TimeBucket>() {
                return Ok(Self::new(FieldKey::decode(head)?, Some(bucket)));
            }
            return match FieldKey::decode(s) {
                Ok(field) => Ok(Self::plain(field)),
                Err(_) if FieldKey::decode(head).is_ok() => {
                    Err(Error::InvalidBucket(suffix.to_string()))
                }
                Err(err) => Err(err),
            };
        }
        Ok(Self::plain(FieldKey::decode(s)?))
    }

    /// Column name used by the rendering engine, bucket suffix included.
    pub fn report_column(&self) -> String {
        match self.bucket {
            Some(bucket) => format!("{}{}{}", self.field.report_column(), SUFFIX_SEPARATOR, bucket),
            None => self.field.report_column(),
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.field)?;
        if let Some(bucket) = self.bucket {
            write!(f, "{}{}", SUFFIX_SEPARATOR, bucket)?;
        }
        Ok(())
    }
}

impl FromStr for ColumnKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ColumnKey::decode(s)
    }
}

impl TryFrom<String> for ColumnKey {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        ColumnKey::decode(&s)
    }
}

impl From<ColumnKey> for String {
    fn from(key: ColumnKey) -> Self {
        key.to_string()
    }
}

impl From<FieldKey> for ColumnKey {
    fn from(field: FieldKey) -> Self {
        ColumnKey::plain(field)
    }
}

//! Report categories and their option records.
//!
//! The base model decides which category a report belongs to; each
//! category carries its own closed set of options.

use serde::{Deserialize, Serialize};

use crate::config::ModelSettings;

const HOUR: u64 = 60 * 60;
const DAY: u64 = 24 * HOUR;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportKind {
    #[default]
    Standard,
    Performance(PerformanceOptions),
    Trend(TrendOptions),
    Chargeback(ChargebackOptions),
}

impl ReportKind {
    /// The category a base model belongs to, with fresh default options.
    pub fn for_model(model: &str, settings: &ModelSettings, tz: Option<&str>) -> Self {
        if model == settings.trend_model {
            ReportKind::Trend(TrendOptions::new(tz))
        } else if settings
            .chargeback_prefixes
            .iter()
            .any(|prefix| model.starts_with(prefix.as_str()))
        {
            ReportKind::Chargeback(ChargebackOptions::new(model, tz))
        } else if settings
            .performance_suffixes
            .iter()
            .any(|suffix| model.ends_with(suffix.as_str()))
        {
            ReportKind::Performance(PerformanceOptions::new(tz))
        } else {
            ReportKind::Standard
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::Standard => "standard",
            ReportKind::Performance(_) => "performance",
            ReportKind::Trend(_) => "trend",
            ReportKind::Chargeback(_) => "chargeback",
        }
    }

    pub fn is_trend(&self) -> bool {
        matches!(self, ReportKind::Trend(_))
    }

    pub fn is_chargeback(&self) -> bool {
        matches!(self, ReportKind::Chargeback(_))
    }

    pub fn tz(&self) -> Option<&str> {
        match self {
            ReportKind::Standard => None,
            ReportKind::Performance(p) => p.tz.as_deref(),
            ReportKind::Trend(t) => t.tz.as_deref(),
            ReportKind::Chargeback(c) => c.tz.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerfInterval {
    Hourly,
    Daily,
}

impl PerfInterval {
    /// Default `(start, end)` look-back offsets in seconds.
    pub fn default_offsets(self) -> (u64, u64) {
        match self {
            PerfInterval::Hourly => (DAY, 0),
            PerfInterval::Daily => (2 * DAY, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AveragesBy {
    TimeInterval,
    ActiveData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceOptions {
    pub interval: PerfInterval,
    pub calc_avgs_by: AveragesBy,
    /// Seconds covered, counted back from `end_offset`.
    pub start_offset: u64,
    /// Seconds between now and the end of the reported range.
    pub end_offset: u64,
    #[serde(default)]
    pub time_profile: Option<u64>,
    #[serde(default)]
    pub tz: Option<String>,
}

impl PerformanceOptions {
    pub fn new(tz: Option<&str>) -> Self {
        let interval = PerfInterval::Daily;
        let (start_offset, end_offset) = interval.default_offsets();
        Self {
            interval,
            calc_avgs_by: AveragesBy::TimeInterval,
            start_offset,
            end_offset,
            time_profile: None,
            tz: tz.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendOptions {
    pub interval: PerfInterval,
    pub start_offset: u64,
    pub end_offset: u64,
    /// Model the trended column lives on, e.g. `VmPerformance`.
    #[serde(default)]
    pub trend_db: Option<String>,
    #[serde(default)]
    pub trend_col: Option<String>,
    #[serde(default)]
    pub limit_col: Option<String>,
    #[serde(default)]
    pub limit_val: Option<String>,
    /// Up to three target percentages; the first defaults to 100.
    pub target_pcts: [Option<u32>; 3],
    #[serde(default)]
    pub tz: Option<String>,
}

impl TrendOptions {
    pub fn new(tz: Option<&str>) -> Self {
        let interval = PerfInterval::Daily;
        let (start_offset, end_offset) = interval.default_offsets();
        Self {
            interval,
            start_offset,
            end_offset,
            trend_db: None,
            trend_col: None,
            limit_col: None,
            limit_val: None,
            target_pcts: [Some(100), None, None],
            tz: tz.map(str::to_string),
        }
    }

    pub fn has_target_limit(&self) -> bool {
        self.limit_col.is_some() || self.limit_val.is_some()
    }

    pub fn limit_val_is_numeric(&self) -> bool {
        self.limit_val
            .as_deref()
            .map(|v| v.trim().parse::<f64>().is_ok())
            .unwrap_or(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargebackInterval {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocatedMethod {
    Max,
    Avg,
}

/// Whose costs a chargeback report shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum ShowCostsBy {
    Owner { owner_id: Option<String> },
    Tenant { tenant_id: Option<String> },
    Tag { category: Option<String>, value: Option<String> },
    Entity { provider_id: Option<String>, entity_id: Option<String> },
}

impl ShowCostsBy {
    /// The message for an incomplete selection, if any.
    pub fn missing(&self, entity_label: &str) -> Option<String> {
        match self {
            ShowCostsBy::Owner { owner_id: None } => Some("An Owner must be selected".to_string()),
            ShowCostsBy::Tenant { tenant_id: None } => {
                Some("A Tenant Category must be selected".to_string())
            }
            ShowCostsBy::Tag { category: None, .. } => {
                Some("A Tag Category must be selected".to_string())
            }
            ShowCostsBy::Tag { value: None, .. } => Some("A Tag must be selected".to_string()),
            ShowCostsBy::Entity { entity_id: None, .. } => Some(format!(
                "A specific {} or all must be selected",
                entity_label
            )),
            _ => None,
        }
    }

    /// Complete enough to preview: entities also need a provider.
    pub fn is_complete(&self) -> bool {
        match self {
            ShowCostsBy::Owner { owner_id } => owner_id.is_some(),
            ShowCostsBy::Tenant { tenant_id } => tenant_id.is_some(),
            ShowCostsBy::Tag { category, value } => category.is_some() && value.is_some(),
            ShowCostsBy::Entity {
                provider_id,
                entity_id,
            } => provider_id.is_some() && entity_id.is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "by", content = "name", rename_all = "snake_case")]
pub enum ChargebackGroupBy {
    Date,
    Vm,
    Project,
    Tenant,
    Tag(Option<String>),
    Label(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargebackOptions {
    /// Rate model the report is priced with.
    pub cb_model: String,
    pub interval: ChargebackInterval,
    pub interval_size: u32,
    pub end_interval_offset: u32,
    #[serde(default)]
    pub show_by: Option<ShowCostsBy>,
    pub group_by: ChargebackGroupBy,
    pub include_metrics: bool,
    pub method_for_allocated_metrics: AllocatedMethod,
    pub cumulative_rate_calculation: bool,
    #[serde(default)]
    pub tz: Option<String>,
}

impl ChargebackOptions {
    pub fn new(model: &str, tz: Option<&str>) -> Self {
        let cb_model = model
            .strip_prefix("Chargeback")
            .or_else(|| model.strip_prefix("Metering"))
            .filter(|rest| !rest.is_empty())
            .unwrap_or(model)
            .to_string();
        Self {
            cb_model,
            interval: ChargebackInterval::Daily,
            interval_size: 1,
            end_interval_offset: 1,
            show_by: None,
            group_by: ChargebackGroupBy::Date,
            include_metrics: true,
            method_for_allocated_metrics: AllocatedMethod::Max,
            cumulative_rate_calculation: false,
            tz: tz.map(str::to_string),
        }
    }

    /// Problems blocking a save, in the order the editor reports them.
    pub fn missing(&self) -> Option<String> {
        let mut msg = match &self.show_by {
            None => Some("Show Costs by must be selected".to_string()),
            Some(show_by) => show_by.missing(&self.cb_model),
        };
        match &self.group_by {
            ChargebackGroupBy::Tag(tag) if tag.as_deref().map_or(true, str::is_empty) => {
                msg = Some("A Group by Tag must be selected".to_string());
            }
            ChargebackGroupBy::Label(label) if label.as_deref().map_or(true, str::is_empty) => {
                msg = Some("A Group by Label must be selected".to_string());
            }
            _ => {}
        }
        msg
    }
}

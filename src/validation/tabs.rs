//! Editor tabs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::kind::ReportKind;

/// Editor tabs in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    Columns,
    Consolidation,
    Formatting,
    Filter,
    Summary,
    Charts,
    Styling,
    Preview,
}

impl Tab {
    pub const ALL: [Tab; 8] = [
        Tab::Columns,
        Tab::Consolidation,
        Tab::Formatting,
        Tab::Filter,
        Tab::Summary,
        Tab::Charts,
        Tab::Styling,
        Tab::Preview,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Columns => "Columns",
            Tab::Consolidation => "Consolidation",
            Tab::Formatting => "Formatting",
            Tab::Filter => "Filter",
            Tab::Summary => "Summary",
            Tab::Charts => "Charts",
            Tab::Styling => "Styling",
            Tab::Preview => "Preview",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Tabs shown for a report kind, in display order.
pub fn available_tabs(kind: &ReportKind) -> Vec<Tab> {
    match kind {
        ReportKind::Trend(_) => vec![Tab::Columns, Tab::Filter, Tab::Preview],
        ReportKind::Chargeback(_) => {
            vec![Tab::Columns, Tab::Formatting, Tab::Filter, Tab::Preview]
        }
        ReportKind::Standard | ReportKind::Performance(_) => Tab::ALL.to_vec(),
    }
}

//! TOML-based configuration for reportwright.
//!
//! Example configuration:
//! ```toml
//! [editor]
//! max_report_columns = 100
//! graph_max_count = 10
//! default_pdf_page_size = "US-Letter"
//!
//! [models]
//! trend_model = "VimPerformanceTrend"
//! chargeback_prefixes = ["Chargeback", "Metering"]
//! performance_suffixes = ["Performance"]
//!
//! [logging]
//! filter = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Page size new reports are printed on.
pub const DEFAULT_PDF_PAGE_SIZE: &str = "US-Letter";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Editing limits and defaults.
    pub editor: EditorSettings,

    /// How base models map onto report kinds.
    pub models: ModelSettings,

    /// Log filter for the command-line tool.
    pub logging: LoggingSettings,
}

/// Editing limits and defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Maximum number of fields a report may select.
    pub max_report_columns: usize,

    /// Number of chart slices shown before the rest is folded into "Other".
    pub graph_max_count: u32,

    /// Page size for new reports.
    pub default_pdf_page_size: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            max_report_columns: 100,
            graph_max_count: 10,
            default_pdf_page_size: DEFAULT_PDF_PAGE_SIZE.to_string(),
        }
    }
}

/// Base model classification.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelSettings {
    /// The model trend reports are built on.
    pub trend_model: String,

    /// Model name prefixes of chargeback reports.
    pub chargeback_prefixes: Vec<String>,

    /// Model name suffixes of performance reports.
    pub performance_suffixes: Vec<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            trend_model: "VimPerformanceTrend".to_string(),
            chargeback_prefixes: vec!["Chargeback".to_string(), "Metering".to_string()],
            performance_suffixes: vec!["Performance".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing-subscriber` env filter directive.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.check()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `REPORTWRIGHT_CONFIG`
    /// 2. `./reportwright.toml`
    /// 3. `~/.config/reportwright/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("REPORTWRIGHT_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("reportwright.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("reportwright").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    fn check(&self) -> Result<(), SettingsError> {
        if self.editor.max_report_columns == 0 {
            return Err(SettingsError::InvalidConfig(
                "editor.max_report_columns must be at least 1".to_string(),
            ));
        }
        if self.editor.graph_max_count == 0 {
            return Err(SettingsError::InvalidConfig(
                "editor.graph_max_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

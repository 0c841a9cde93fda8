//! Configuration module for reportwright.
//!
//! Handles editor limits, model classification and logging settings.

mod settings;

pub use settings::{
    EditorSettings, LoggingSettings, ModelSettings, Settings, SettingsError,
    DEFAULT_PDF_PAGE_SIZE,
};

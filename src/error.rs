//! Error types for draft editing, compilation and saving.
//!
//! Every edit operation returns [`Result`]. Malformed-input errors abort only
//! the edit that produced them; [`Error::Validation`] aborts compilation;
//! [`Error::InUseByFilter`] is reported alongside a partially applied removal.

use crate::validation::ValidationReport;

/// Result type for draft operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Malformed field key '{key}': {reason}")]
    MalformedKey { key: String, reason: String },

    #[error("Fields not added: adding the selected {requested} fields would exceed the maximum of {max} fields")]
    CapacityExceeded { requested: usize, max: usize },

    #[error("{label} is currently being used in the Display Filter")]
    InUseByFilter { key: String, label: String },

    #[error("Unknown time bucket '{0}'")]
    InvalidBucket(String),

    #[error("{0}")]
    Validation(ValidationReport),

    #[error("Report could not be saved: {0}")]
    PersistenceFailure(String),

    #[error("Field '{0}' is not part of the report")]
    UnknownField(String),

    #[error("Selected fields must be consecutive to be moved")]
    NotConsecutive,

    #[error("Pivot group {slot} can not be set before group {}", .slot - 1)]
    PivotSlotUnavailable { slot: u8 },

    #[error("Pivot calculations require a first pivot group field")]
    PivotInactive,

    #[error("'{0}' is a pivot group field and can not be calculated")]
    PivotGroupField(String),

    #[error("Invalid sort: {0}")]
    SortConflict(String),

    #[error("No style rule {index} for column '{column}'")]
    UnknownStyleRule { column: String, index: usize },

    #[error("Style rules for '{column}' end with a default rule; no rule can follow it")]
    StyleChainClosed { column: String },

    #[error("Option '{option}' does not apply to {kind} reports")]
    KindMismatch { option: String, kind: String },

    #[error("No fields were selected to {0}")]
    NoFieldsSelected(String),

    #[error("Chart option unavailable: {0}")]
    ChartUnavailable(String),

    #[error("Invalid value for {option}: {reason}")]
    InvalidOption { option: String, reason: String },
}

impl Error {
    pub(crate) fn malformed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }

    /// The validation report, when this is a validation failure.
    pub fn validation(&self) -> Option<&ValidationReport> {
        match self {
            Error::Validation(report) => Some(report),
            _ => None,
        }
    }
}

impl From<ValidationReport> for Error {
    fn from(report: ValidationReport) -> Self {
        Error::Validation(report)
    }
}

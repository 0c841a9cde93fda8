//! # Reportwright
//!
//! An interactive report-definition builder that compiles edited drafts into
//! normalized report specifications.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              EditEvent (raw client edits)                │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [session]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 DraftReportState                         │
//! │  (fields, pivots, sorts, styles, charts, kind options)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [validation + compile]
//! ┌─────────────────────────────────────────────────────────┐
//! │          ReportSpecification (+ JoinTree include)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [store]
//! ┌─────────────────────────────────────────────────────────┐
//! │                    ReportRecord                          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [load]
//!                  DraftReportState again
//! ```

pub mod catalog;
pub mod compile;
pub mod config;
pub mod editor;
pub mod error;
pub mod join;
pub mod load;
pub mod model;
pub mod session;
pub mod store;
pub mod validation;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::catalog::{AvailableField, FieldCatalog, StaticCatalog};
    pub use crate::compile::compile;
    pub use crate::config::Settings;
    pub use crate::editor::{MoveDirection, Refresh, SortSlot};
    pub use crate::error::{Error, Result};
    pub use crate::join::JoinTree;
    pub use crate::load::load;
    pub use crate::model::{
        Aggregate, ColumnKey, ColumnType, DraftReportState, FieldKey, ReportKind, ReportRecord,
        ReportSpecification, TimeBucket,
    };
    pub use crate::session::{EditEvent, EditOutcome, EditSession};
    pub use crate::store::{MemoryStore, ReportId, ReportStore};
    pub use crate::validation::{Tab, ValidationReport};
}

pub use compile::compile;
pub use error::{Error, Result};
pub use model::{DraftReportState, FieldKey, ReportSpecification};
pub use session::{EditEvent, EditSession};

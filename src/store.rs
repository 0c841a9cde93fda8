//! Persistence boundary.
//!
//! The editor never writes reports itself; it hands finished records to a
//! [`ReportStore`]. [`MemoryStore`] keeps them in memory for tests and the
//! command-line tool.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::definition::ReportRecord;

/// Identifier the store assigns to a saved report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(Uuid);

impl ReportId {
    pub fn new() -> Self {
        ReportId(Uuid::new_v4())
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Record rejected: {0}")]
    Rejected(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub trait ReportStore {
    /// Save `record`, returning its identifier.
    fn persist(&mut self, record: &ReportRecord) -> Result<ReportId, StoreError>;
}

/// Records kept in memory, keyed by report name.
///
/// Saving a record whose name is already stored replaces it and keeps the
/// existing identifier.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<(ReportId, ReportRecord)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ReportId) -> Option<&ReportRecord> {
        self.records
            .iter()
            .find(|(stored, _)| stored == id)
            .map(|(_, record)| record)
    }

    pub fn find_by_name(&self, name: &str) -> Option<(&ReportId, &ReportRecord)> {
        self.records
            .iter()
            .find(|(_, record)| record.name == name)
            .map(|(id, record)| (id, record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ReportStore for MemoryStore {
    fn persist(&mut self, record: &ReportRecord) -> Result<ReportId, StoreError> {
        if record.name.trim().is_empty() {
            return Err(StoreError::Rejected("a report name is required".to_string()));
        }
        if let Some((id, stored)) = self
            .records
            .iter_mut()
            .find(|(_, stored)| stored.name == record.name)
        {
            *stored = record.clone();
            return Ok(*id);
        }
        let id = ReportId::new();
        self.records.push((id, record.clone()));
        Ok(id)
    }
}

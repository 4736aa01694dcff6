use std::sync::RwLock;

use chrono::Utc;

use cashbook_core::AuditRecordId;
use cashbook_ledger::{AuditRecord, NewAuditRecord};

use super::{AuditError, AuditLog, AuditQuery};

/// In-memory append-only audit log.
///
/// Intended for tests/dev. Records are kept in append order.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    records: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditLog for InMemoryAuditLog {
    fn append(&self, record: NewAuditRecord) -> Result<AuditRecordId, AuditError> {
        if record.description.trim().is_empty() {
            return Err(AuditError::Rejected("description is empty".to_string()));
        }

        let mut records = self
            .records
            .write()
            .map_err(|_| AuditError::Storage("lock poisoned".to_string()))?;

        let id = AuditRecordId::new();
        records.push(AuditRecord::from_new(id, record, Utc::now()));
        Ok(id)
    }

    fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError> {
        let records = self
            .records
            .read()
            .map_err(|_| AuditError::Storage("lock poisoned".to_string()))?;

        Ok(records
            .iter()
            .rev()
            .filter(|r| query.matches(r))
            .take(query.limit)
            .cloned()
            .collect())
    }
}

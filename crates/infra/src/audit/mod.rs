//! Append-only audit trail.
//!
//! Every mutating ledger action appends exactly one record here, inside the
//! same logical unit as the mutation itself. There is deliberately no update
//! or delete operation.

pub mod in_memory;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use cashbook_core::{ActorId, AuditRecordId, DomainError, DomainResult};
use cashbook_ledger::{AuditAction, AuditRecord, EntityType, NewAuditRecord, RequestMeta};

pub use in_memory::InMemoryAuditLog;

/// Audit storage error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("audit storage unavailable: {0}")]
    Storage(String),

    #[error("audit record rejected: {0}")]
    Rejected(String),
}

impl From<AuditError> for DomainError {
    fn from(value: AuditError) -> Self {
        DomainError::persistence(value.to_string())
    }
}

/// Read-side filter for the audit trail. Every set field must match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditQuery {
    pub limit: usize,
    pub actor: Option<ActorId>,
    pub action: Option<AuditAction>,
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<String>,
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            limit: 100,
            actor: None,
            action: None,
            entity_type: None,
            entity_id: None,
        }
    }
}

impl AuditQuery {
    pub fn latest(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn for_entity(entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type: Some(entity_type),
            entity_id: Some(entity_id.into()),
            ..Self::default()
        }
    }

    pub fn with_action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_actor(mut self, actor: ActorId) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn matches(&self, record: &AuditRecord) -> bool {
        self.actor.as_ref().is_none_or(|a| *a == record.actor)
            && self.action.is_none_or(|a| a == record.action)
            && self.entity_type.is_none_or(|t| t == record.entity_type)
            && self
                .entity_id
                .as_ref()
                .is_none_or(|id| record.entity_id.as_ref() == Some(id))
    }
}

/// Append-only audit log.
pub trait AuditLog: Send + Sync {
    /// Persist one record; the log assigns id and timestamp.
    fn append(&self, record: NewAuditRecord) -> Result<AuditRecordId, AuditError>;

    /// Matching records, newest first, at most `query.limit`.
    fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError>;

    /// Record a successful authentication.
    fn record_login(
        &self,
        actor: &ActorId,
        request: Option<RequestMeta>,
    ) -> Result<AuditRecordId, AuditError> {
        self.append(NewAuditRecord {
            actor: actor.clone(),
            action: AuditAction::Login,
            entity_type: EntityType::Session,
            entity_id: None,
            prior_state: None,
            description: format!("login by {actor}"),
            request,
        })
    }
}

impl<L> AuditLog for Arc<L>
where
    L: AuditLog + ?Sized,
{
    fn append(&self, record: NewAuditRecord) -> Result<AuditRecordId, AuditError> {
        (**self).append(record)
    }

    fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError> {
        (**self).query(query)
    }
}

/// Append the audit half of a mutation. On failure the caller must undo the
/// staged data change before releasing its lock.
pub(crate) fn append_for_mutation<A>(audit: &A, record: NewAuditRecord) -> DomainResult<AuditRecordId>
where
    A: AuditLog + ?Sized,
{
    let action = record.action;
    let entity_type = record.entity_type;
    let entity_id = record.entity_id.clone();

    audit.append(record).map_err(|err| {
        tracing::error!(
            %action,
            %entity_type,
            entity_id = entity_id.as_deref().unwrap_or("-"),
            error = %err,
            "audit append failed, rolling back mutation"
        );
        DomainError::audit_failure(err.to_string())
    })
}

/// JSON snapshot of a record for `prior_state`.
pub(crate) fn snapshot<T: Serialize>(value: &T) -> DomainResult<JsonValue> {
    serde_json::to_value(value)
        .map_err(|e| DomainError::persistence(format!("failed to snapshot record: {e}")))
}

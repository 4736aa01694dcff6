use serde_json::Value as JsonValue;

use cashbook_auth::Actor;
use cashbook_core::ActorId;
use cashbook_ledger::{AuditAction, EntityType, NewAuditRecord, RequestMeta};

/// Who is performing an operation, and from where.
///
/// Every mutating store call takes one; its actor becomes the author of new
/// records and the actor of the resulting audit entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationContext {
    pub actor: ActorId,
    pub request: Option<RequestMeta>,
}

impl OperationContext {
    pub fn new(actor: impl Into<ActorId>) -> Self {
        Self {
            actor: actor.into(),
            request: None,
        }
    }

    pub fn with_request(mut self, request: RequestMeta) -> Self {
        self.request = Some(request);
        self
    }

    pub(crate) fn audit(
        &self,
        action: AuditAction,
        entity_type: EntityType,
        entity_id: impl ToString,
        prior_state: Option<JsonValue>,
        description: impl Into<String>,
    ) -> NewAuditRecord {
        NewAuditRecord {
            actor: self.actor.clone(),
            action,
            entity_type,
            entity_id: Some(entity_id.to_string()),
            prior_state,
            description: description.into(),
            request: self.request.clone(),
        }
    }
}

/// An authenticated actor making a call through the service boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub actor: Actor,
    pub request: Option<RequestMeta>,
}

impl Caller {
    pub fn new(actor: Actor) -> Self {
        Self {
            actor,
            request: None,
        }
    }

    pub fn with_request(mut self, request: RequestMeta) -> Self {
        self.request = Some(request);
        self
    }

    pub fn context(&self) -> OperationContext {
        OperationContext {
            actor: self.actor.id.clone(),
            request: self.request.clone(),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use cashbook_core::{ActorId, AuditRecordId};

/// Kind of audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Login,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Login => "LOGIN",
        }
    }
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audited entity type labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Movement,
    Attachment,
    Session,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Movement => "movement",
            EntityType::Attachment => "attachment",
            EntityType::Session => "session",
        }
    }
}

impl core::fmt::Display for EntityType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a request came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    /// Remote address of the client.
    pub origin: Option<String>,
    /// Client identifier (e.g. user agent).
    pub client: Option<String>,
}

impl RequestMeta {
    pub fn new(origin: impl Into<String>, client: impl Into<String>) -> Self {
        Self {
            origin: Some(origin.into()),
            client: Some(client.into()),
        }
    }
}

/// An audit entry before the log assigns its id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditRecord {
    pub actor: ActorId,
    pub action: AuditAction,
    pub entity_type: EntityType,
    pub entity_id: Option<String>,
    /// Full snapshot of the record before the change. Absent for CREATE.
    pub prior_state: Option<JsonValue>,
    pub description: String,
    pub request: Option<RequestMeta>,
}

/// Immutable log entry describing one mutating action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: AuditRecordId,
    pub actor: ActorId,
    pub action: AuditAction,
    pub entity_type: EntityType,
    pub entity_id: Option<String>,
    pub prior_state: Option<JsonValue>,
    pub description: String,
    pub recorded_at: DateTime<Utc>,
    pub request: Option<RequestMeta>,
}

impl AuditRecord {
    pub fn from_new(id: AuditRecordId, new: NewAuditRecord, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id,
            actor: new.actor,
            action: new.action,
            entity_type: new.entity_type,
            entity_id: new.entity_id,
            prior_state: new.prior_state,
            description: new.description,
            recorded_at,
            request: new.request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_serializes_uppercase() {
        let json = serde_json::to_value(AuditAction::Delete).unwrap();
        assert_eq!(json, serde_json::json!("DELETE"));
        assert_eq!(AuditAction::Login.to_string(), "LOGIN");
    }

    #[test]
    fn from_new_keeps_snapshot_and_request() {
        let new = NewAuditRecord {
            actor: ActorId::new("ana"),
            action: AuditAction::Update,
            entity_type: EntityType::Movement,
            entity_id: Some("m-1".to_string()),
            prior_state: Some(serde_json::json!({ "description": "old" })),
            description: "description 'old' -> 'new'".to_string(),
            request: Some(RequestMeta::new("10.0.0.4", "firefox")),
        };
        let record = AuditRecord::from_new(AuditRecordId::new(), new.clone(), Utc::now());
        assert_eq!(record.prior_state, new.prior_state);
        assert_eq!(record.request, new.request);
        assert_eq!(record.entity_type.as_str(), "movement");
    }
}

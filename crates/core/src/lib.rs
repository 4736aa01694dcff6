//! `cashbook-core`: shared building blocks for the cash ledger.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod version;

pub use entity::{Entity, Versioned};
pub use error::{DomainError, DomainResult};
pub use id::{ActorId, AttachmentId, AuditRecordId, MovementId};
pub use version::ExpectedVersion;

//! Petty-cash ledger domain (movements, receipts, audit records).
//!
//! Pure domain logic only: no IO, no locking, no persistence concerns.

pub mod attachment;
pub mod audit;
pub mod balance;
pub mod movement;

pub use attachment::{
    Attachment, AttachmentInfo, AttachmentKind, MAX_ATTACHMENT_BYTES, Upload, validate_upload,
};
pub use audit::{AuditAction, AuditRecord, EntityType, NewAuditRecord, RequestMeta};
pub use balance::{LedgerSummary, balance_of};
pub use movement::{Amount, Movement, MovementKind, MovementPatch, NewMovement, SubjectRef};

//! Receipt file storage keyed by owning movement.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryAttachmentStore;
pub use r#trait::{AttachmentStore, BatchOutcome, RejectedUpload};

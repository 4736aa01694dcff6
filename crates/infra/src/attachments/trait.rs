use std::io::Read;
use std::sync::Arc;

use cashbook_core::{AttachmentId, DomainError, DomainResult, MovementId};
use cashbook_ledger::{Attachment, AttachmentInfo, Upload};

use crate::context::OperationContext;

/// A file from a batch that was not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedUpload {
    pub filename: String,
    pub error: DomainError,
}

/// Result of a batch upload: files are stored independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub stored: Vec<AttachmentId>,
    pub rejected: Vec<RejectedUpload>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

pub trait AttachmentStore: Send + Sync {
    /// Validate and persist one file for `movement_id`.
    fn store(
        &self,
        ctx: &OperationContext,
        movement_id: MovementId,
        upload: Upload,
    ) -> DomainResult<AttachmentId>;

    /// Like [`store`](Self::store), reading the payload from `reader`.
    ///
    /// Reads at most one byte past the size limit. If the reader fails
    /// midway, nothing is persisted.
    fn store_from_reader(
        &self,
        ctx: &OperationContext,
        movement_id: MovementId,
        filename: &str,
        content_type: &str,
        reader: &mut dyn Read,
    ) -> DomainResult<AttachmentId>;

    /// Store each upload independently. Fails as a whole only if the
    /// movement does not exist.
    fn store_batch(
        &self,
        ctx: &OperationContext,
        movement_id: MovementId,
        uploads: Vec<Upload>,
    ) -> DomainResult<BatchOutcome>;

    fn retrieve(&self, id: AttachmentId) -> DomainResult<Attachment>;

    /// Metadata of a movement's attachments in upload order.
    fn list_for(&self, movement_id: MovementId) -> DomainResult<Vec<AttachmentInfo>>;

    /// Full attachments of a movement in upload order.
    fn load_all(&self, movement_id: MovementId) -> DomainResult<Vec<Attachment>>;

    fn delete(&self, ctx: &OperationContext, id: AttachmentId) -> DomainResult<()>;

    /// Remove every attachment of `movement_id`, returning how many went.
    fn delete_all(&self, ctx: &OperationContext, movement_id: MovementId) -> DomainResult<usize>;
}

impl<S> AttachmentStore for Arc<S>
where
    S: AttachmentStore + ?Sized,
{
    fn store(
        &self,
        ctx: &OperationContext,
        movement_id: MovementId,
        upload: Upload,
    ) -> DomainResult<AttachmentId> {
        (**self).store(ctx, movement_id, upload)
    }

    fn store_from_reader(
        &self,
        ctx: &OperationContext,
        movement_id: MovementId,
        filename: &str,
        content_type: &str,
        reader: &mut dyn Read,
    ) -> DomainResult<AttachmentId> {
        (**self).store_from_reader(ctx, movement_id, filename, content_type, reader)
    }

    fn store_batch(
        &self,
        ctx: &OperationContext,
        movement_id: MovementId,
        uploads: Vec<Upload>,
    ) -> DomainResult<BatchOutcome> {
        (**self).store_batch(ctx, movement_id, uploads)
    }

    fn retrieve(&self, id: AttachmentId) -> DomainResult<Attachment> {
        (**self).retrieve(id)
    }

    fn list_for(&self, movement_id: MovementId) -> DomainResult<Vec<AttachmentInfo>> {
        (**self).list_for(movement_id)
    }

    fn load_all(&self, movement_id: MovementId) -> DomainResult<Vec<Attachment>> {
        (**self).load_all(movement_id)
    }

    fn delete(&self, ctx: &OperationContext, id: AttachmentId) -> DomainResult<()> {
        (**self).delete(ctx, id)
    }

    fn delete_all(&self, ctx: &OperationContext, movement_id: MovementId) -> DomainResult<usize> {
        (**self).delete_all(ctx, movement_id)
    }
}

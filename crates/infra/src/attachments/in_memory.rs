use std::io::Read;
use std::sync::Arc;

use chrono::Utc;

use cashbook_core::{AttachmentId, DomainError, DomainResult, MovementId};
use cashbook_ledger::{
    Attachment, AttachmentInfo, AuditAction, EntityType, MAX_ATTACHMENT_BYTES, Upload,
};

use super::r#trait::{AttachmentStore, BatchOutcome, RejectedUpload};
use crate::audit::{AuditLog, append_for_mutation, snapshot};
use crate::context::OperationContext;
use crate::storage::LedgerTables;

/// In-memory attachment store over the shared [`LedgerTables`].
#[derive(Debug)]
pub struct InMemoryAttachmentStore<A> {
    tables: Arc<LedgerTables>,
    audit: A,
    max_bytes: usize,
}

impl<A> InMemoryAttachmentStore<A> {
    /// `max_bytes` can lower the receipt limit but never raise it past
    /// [`MAX_ATTACHMENT_BYTES`].
    pub fn new(tables: Arc<LedgerTables>, audit: A, max_bytes: usize) -> Self {
        Self {
            tables,
            audit,
            max_bytes: max_bytes.min(MAX_ATTACHMENT_BYTES),
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}

fn attachment_not_found(id: AttachmentId) -> DomainError {
    DomainError::not_found(format!("attachment {id}"))
}

fn movement_not_found(id: MovementId) -> DomainError {
    DomainError::not_found(format!("movement {id}"))
}

impl<A> AttachmentStore for InMemoryAttachmentStore<A>
where
    A: AuditLog,
{
    fn store(
        &self,
        ctx: &OperationContext,
        movement_id: MovementId,
        upload: Upload,
    ) -> DomainResult<AttachmentId> {
        let mut attachment = Attachment::from_upload(
            AttachmentId::new(),
            movement_id,
            upload,
            self.max_bytes,
            ctx.actor.clone(),
            Utc::now(),
        )?;
        let id = attachment.id;
        let description = format!(
            "attached {} ({} bytes) to movement {movement_id}",
            attachment.filename, attachment.size
        );
        let size = attachment.size;

        let mut tables = self.tables.write()?;
        if !tables.contains_movement(&movement_id) {
            return Err(movement_not_found(movement_id));
        }

        attachment.uploaded_at = tables.next_timestamp(attachment.uploaded_at);
        tables.insert_attachment(attachment);
        let record = ctx.audit(AuditAction::Create, EntityType::Attachment, id, None, description);
        if let Err(err) = append_for_mutation(&self.audit, record) {
            tables.remove_attachment(&id);
            return Err(err);
        }
        drop(tables);

        tracing::info!(
            attachment_id = %id,
            movement_id = %movement_id,
            size,
            actor = %ctx.actor,
            "attachment stored"
        );
        Ok(id)
    }

    fn store_from_reader(
        &self,
        ctx: &OperationContext,
        movement_id: MovementId,
        filename: &str,
        content_type: &str,
        reader: &mut dyn Read,
    ) -> DomainResult<AttachmentId> {
        let limit = u64::try_from(self.max_bytes)
            .unwrap_or(u64::MAX)
            .saturating_add(1);
        let mut bytes = Vec::new();
        reader.take(limit).read_to_end(&mut bytes).map_err(|e| {
            tracing::warn!(%movement_id, %filename, error = %e, "upload stream aborted");
            DomainError::persistence(format!("upload of {filename} interrupted: {e}"))
        })?;

        self.store(ctx, movement_id, Upload::new(filename, content_type, bytes))
    }

    fn store_batch(
        &self,
        ctx: &OperationContext,
        movement_id: MovementId,
        uploads: Vec<Upload>,
    ) -> DomainResult<BatchOutcome> {
        if !self.tables.read()?.contains_movement(&movement_id) {
            return Err(movement_not_found(movement_id));
        }

        let mut outcome = BatchOutcome::default();
        for upload in uploads {
            let filename = upload.filename.clone();
            match self.store(ctx, movement_id, upload) {
                Ok(id) => outcome.stored.push(id),
                Err(error) => {
                    tracing::warn!(%movement_id, filename = %filename, %error, "attachment rejected");
                    outcome.rejected.push(RejectedUpload { filename, error });
                }
            }
        }
        Ok(outcome)
    }

    fn retrieve(&self, id: AttachmentId) -> DomainResult<Attachment> {
        let tables = self.tables.read()?;
        tables
            .attachment(&id)
            .cloned()
            .ok_or_else(|| attachment_not_found(id))
    }

    fn list_for(&self, movement_id: MovementId) -> DomainResult<Vec<AttachmentInfo>> {
        let tables = self.tables.read()?;
        let mut infos: Vec<AttachmentInfo> =
            tables.attachments_of(movement_id).map(Attachment::info).collect();
        infos.sort_by(|a, b| (a.uploaded_at, a.id).cmp(&(b.uploaded_at, b.id)));
        Ok(infos)
    }

    fn load_all(&self, movement_id: MovementId) -> DomainResult<Vec<Attachment>> {
        let tables = self.tables.read()?;
        let mut attachments: Vec<Attachment> = tables.attachments_of(movement_id).cloned().collect();
        attachments.sort_by(|a, b| (a.uploaded_at, a.id).cmp(&(b.uploaded_at, b.id)));
        Ok(attachments)
    }

    fn delete(&self, ctx: &OperationContext, id: AttachmentId) -> DomainResult<()> {
        let mut tables = self.tables.write()?;
        let attachment = tables
            .remove_attachment(&id)
            .ok_or_else(|| attachment_not_found(id))?;

        let info = attachment.info();
        let prior_state = match snapshot(&info) {
            Ok(v) => v,
            Err(err) => {
                tables.insert_attachment(attachment);
                return Err(err);
            }
        };
        let description = format!(
            "removed {} from movement {}",
            info.filename, info.movement_id
        );
        let record = ctx.audit(
            AuditAction::Delete,
            EntityType::Attachment,
            id,
            Some(prior_state),
            description,
        );
        if let Err(err) = append_for_mutation(&self.audit, record) {
            tables.insert_attachment(attachment);
            return Err(err);
        }
        drop(tables);

        tracing::info!(attachment_id = %id, movement_id = %info.movement_id, actor = %ctx.actor, "attachment deleted");
        Ok(())
    }

    fn delete_all(&self, ctx: &OperationContext, movement_id: MovementId) -> DomainResult<usize> {
        let mut tables = self.tables.write()?;
        let removed = tables.remove_attachments_of(&movement_id);
        if removed.is_empty() {
            return Ok(0);
        }

        let infos: Vec<AttachmentInfo> = removed.iter().map(Attachment::info).collect();
        let prior_state = match snapshot(&infos) {
            Ok(v) => v,
            Err(err) => {
                removed.into_iter().for_each(|a| tables.insert_attachment(a));
                return Err(err);
            }
        };
        let count = removed.len();
        let record = ctx.audit(
            AuditAction::Delete,
            EntityType::Attachment,
            movement_id,
            Some(prior_state),
            format!("removed {count} attachment(s) from movement {movement_id}"),
        );
        if let Err(err) = append_for_mutation(&self.audit, record) {
            removed.into_iter().for_each(|a| tables.insert_attachment(a));
            return Err(err);
        }
        drop(tables);

        tracing::info!(%movement_id, count, actor = %ctx.actor, "attachments deleted");
        Ok(count)
    }
}

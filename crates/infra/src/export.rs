//! Download bundling for a movement's receipts.
//!
//! One receipt is handed back as-is. Several are packed into a gzip-compressed
//! tar archive whose entries carry only base filenames.

use std::collections::HashMap;
use std::io;

use flate2::Compression;
use flate2::write::GzEncoder;

use cashbook_core::{DomainError, DomainResult, MovementId};
use cashbook_ledger::Attachment;

use crate::attachments::AttachmentStore;

pub const ARCHIVE_CONTENT_TYPE: &str = "application/gzip";

/// What the caller streams back to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportBundle {
    Single(Attachment),
    Archive {
        filename: String,
        bytes: Vec<u8>,
        /// Entry names in archive order.
        entries: Vec<String>,
    },
}

impl ExportBundle {
    pub fn filename(&self) -> &str {
        match self {
            ExportBundle::Single(a) => &a.filename,
            ExportBundle::Archive { filename, .. } => filename,
        }
    }

    pub fn content_type(&self) -> &str {
        match self {
            ExportBundle::Single(a) => &a.content_type,
            ExportBundle::Archive { .. } => ARCHIVE_CONTENT_TYPE,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            ExportBundle::Single(a) => &a.bytes,
            ExportBundle::Archive { bytes, .. } => bytes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportAssembler<S> {
    store: S,
}

impl<S> ExportAssembler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S> ExportAssembler<S>
where
    S: AttachmentStore,
{
    pub fn bundle(&self, movement_id: MovementId) -> DomainResult<ExportBundle> {
        let mut attachments = self.store.load_all(movement_id)?;

        match attachments.len() {
            0 => Err(DomainError::not_found(format!(
                "no attachments for movement {movement_id}"
            ))),
            1 => Ok(ExportBundle::Single(attachments.remove(0))),
            n => {
                let entries = entry_names(&attachments);
                let bytes = write_archive(&entries, &attachments).map_err(|e| {
                    tracing::error!(%movement_id, error = %e, "failed to build receipt archive");
                    DomainError::persistence(format!("failed to build archive: {e}"))
                })?;
                tracing::info!(%movement_id, files = n, size = bytes.len(), "receipt archive built");
                Ok(ExportBundle::Archive {
                    filename: format!("movement-{movement_id}-receipts.tar.gz"),
                    bytes,
                    entries,
                })
            }
        }
    }
}

/// Last path component of an uploaded filename.
fn base_name(filename: &str) -> &str {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    match name {
        "" | "." | ".." => "attachment",
        other => other,
    }
}

/// Unique archive entry names; colliding base names get the attachment id
/// as a prefix.
fn entry_names(attachments: &[Attachment]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for a in attachments {
        *counts.entry(base_name(&a.filename)).or_default() += 1;
    }

    attachments
        .iter()
        .map(|a| {
            let name = base_name(&a.filename);
            if counts.get(name).copied().unwrap_or_default() > 1 {
                format!("{}_{name}", a.id)
            } else {
                name.to_string()
            }
        })
        .collect()
}

fn write_archive(names: &[String], attachments: &[Attachment]) -> io::Result<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (name, attachment) in names.iter().zip(attachments) {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(attachment.bytes.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(u64::try_from(attachment.uploaded_at.timestamp()).unwrap_or(0));
        builder.append_data(&mut header, name, attachment.bytes.as_slice())?;
    }

    builder.into_inner()?.finish()
}

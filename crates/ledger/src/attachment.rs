use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cashbook_core::{ActorId, AttachmentId, DomainError, DomainResult, MovementId};

/// Largest accepted receipt file: 16 MiB.
pub const MAX_ATTACHMENT_BYTES: usize = 16 * 1024 * 1024;

/// Generic binary type browsers send when they cannot sniff a file.
const OCTET_STREAM: &str = "application/octet-stream";

/// Allowed receipt file kinds, keyed by filename extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Pdf,
    Png,
    Jpg,
    Jpeg,
    Gif,
    Doc,
    Docx,
}

impl AttachmentKind {
    pub const ALL: [AttachmentKind; 7] = [
        AttachmentKind::Pdf,
        AttachmentKind::Png,
        AttachmentKind::Jpg,
        AttachmentKind::Jpeg,
        AttachmentKind::Gif,
        AttachmentKind::Doc,
        AttachmentKind::Docx,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            AttachmentKind::Pdf => "pdf",
            AttachmentKind::Png => "png",
            AttachmentKind::Jpg => "jpg",
            AttachmentKind::Jpeg => "jpeg",
            AttachmentKind::Gif => "gif",
            AttachmentKind::Doc => "doc",
            AttachmentKind::Docx => "docx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            AttachmentKind::Pdf => "application/pdf",
            AttachmentKind::Png => "image/png",
            AttachmentKind::Jpg | AttachmentKind::Jpeg => "image/jpeg",
            AttachmentKind::Gif => "image/gif",
            AttachmentKind::Doc => "application/msword",
            AttachmentKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// Resolve the kind from the extension of `filename` (case-insensitive).
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        Self::ALL.into_iter().find(|k| k.extension() == ext)
    }

    /// Whether `content_type` (parameters ignored) is acceptable for a receipt.
    pub fn is_allowed_content_type(content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        essence == OCTET_STREAM || Self::ALL.iter().any(|k| k.mime_type() == essence)
    }
}

/// A file submitted for storage, before validation.
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

impl core::fmt::Debug for Upload {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Upload")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Check `upload` against the receipt rules and resolve its kind.
///
/// Rules: a non-empty filename whose extension is in the allow-list, a
/// content type belonging to an allowed kind (or the generic binary type),
/// and at most `max_bytes` of payload.
pub fn validate_upload(upload: &Upload, max_bytes: usize) -> DomainResult<AttachmentKind> {
    let filename = upload.filename.trim();
    if filename.is_empty() {
        return Err(DomainError::validation("attachment filename is empty"));
    }

    let kind = AttachmentKind::from_filename(filename).ok_or_else(|| {
        DomainError::validation(format!("file type not allowed: {filename}"))
    })?;

    if !AttachmentKind::is_allowed_content_type(&upload.content_type) {
        return Err(DomainError::validation(format!(
            "content type not allowed: {} ({filename})",
            upload.content_type
        )));
    }

    if upload.bytes.len() > max_bytes {
        return Err(DomainError::validation(format!(
            "file too large: {filename} is {} bytes, limit is {max_bytes}",
            upload.bytes.len()
        )));
    }

    Ok(kind)
}

/// A stored receipt file bound to exactly one movement.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: AttachmentId,
    pub movement_id: MovementId,
    pub filename: String,
    pub content_type: String,
    pub kind: AttachmentKind,
    pub size: u64,
    pub bytes: Vec<u8>,
    pub uploaded_by: ActorId,
    pub uploaded_at: DateTime<Utc>,
}

impl Attachment {
    /// Validate `upload` and bind it to `movement_id`.
    pub fn from_upload(
        id: AttachmentId,
        movement_id: MovementId,
        upload: Upload,
        max_bytes: usize,
        uploaded_by: ActorId,
        uploaded_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let kind = validate_upload(&upload, max_bytes)?;
        Ok(Self {
            id,
            movement_id,
            filename: upload.filename.trim().to_string(),
            content_type: upload.content_type,
            kind,
            size: upload.bytes.len() as u64,
            bytes: upload.bytes,
            uploaded_by,
            uploaded_at,
        })
    }

    pub fn info(&self) -> AttachmentInfo {
        AttachmentInfo {
            id: self.id,
            movement_id: self.movement_id,
            filename: self.filename.clone(),
            content_type: self.content_type.clone(),
            kind: self.kind,
            size: self.size,
            uploaded_by: self.uploaded_by.clone(),
            uploaded_at: self.uploaded_at,
        }
    }
}

impl core::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Attachment")
            .field("id", &self.id)
            .field("movement_id", &self.movement_id)
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Attachment metadata without the payload (listing views, audit snapshots).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentInfo {
    pub id: AttachmentId,
    pub movement_id: MovementId,
    pub filename: String,
    pub content_type: String,
    pub kind: AttachmentKind,
    pub size: u64,
    pub uploaded_by: ActorId,
    pub uploaded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, content_type: &str, len: usize) -> Upload {
        Upload::new(name, content_type, vec![7u8; len])
    }

    #[test]
    fn accepts_every_allowed_extension_case_insensitively() {
        for kind in AttachmentKind::ALL {
            let name = format!("receipt.{}", kind.extension().to_uppercase());
            let got = validate_upload(&upload(&name, kind.mime_type(), 10), MAX_ATTACHMENT_BYTES)
                .unwrap();
            assert_eq!(got, kind);
        }
    }

    #[test]
    fn rejects_disallowed_extension_and_missing_extension() {
        for name in ["setup.exe", "receipt", "archive.pdf.zip", ""] {
            let err = validate_upload(&upload(name, OCTET_STREAM, 10), MAX_ATTACHMENT_BYTES)
                .unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{name} accepted");
        }
    }

    #[test]
    fn rejects_disallowed_content_type() {
        let err = validate_upload(
            &upload("r.pdf", "application/x-msdownload", 10),
            MAX_ATTACHMENT_BYTES,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn content_type_parameters_are_ignored() {
        assert!(AttachmentKind::is_allowed_content_type("application/pdf; charset=binary"));
        assert!(AttachmentKind::is_allowed_content_type("IMAGE/PNG"));
        assert!(!AttachmentKind::is_allowed_content_type("text/html"));
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(validate_upload(&upload("a.png", "image/png", 64), 64).is_ok());
        let err = validate_upload(&upload("a.png", "image/png", 65), 64).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("too large")));
    }

    #[test]
    fn from_upload_records_size_and_trims_name() {
        let a = Attachment::from_upload(
            AttachmentId::new(),
            MovementId::new(),
            upload("  nota.jpg ", "image/jpeg", 1234),
            MAX_ATTACHMENT_BYTES,
            ActorId::new("cashier"),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(a.filename, "nota.jpg");
        assert_eq!(a.size, 1234);
        assert_eq!(a.info().kind, AttachmentKind::Jpg);
    }
}

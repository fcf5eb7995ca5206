//! Attachment composer
//!
//! Holds the one attachment being composed with the next message. Files are
//! validated locally (type, size, model capability) before they are
//! uploaded; the send itself only carries the server-side file id.

use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use super::types::AttachmentRef;
use crate::api::{ChatBackend, FileUpload};
use crate::auth::SessionManager;
use crate::error::ChatError;
use crate::models::{check_attachment, AttachmentKind};
use crate::utils::{acquire_read_lock, acquire_write_lock};

/// An uploaded file waiting to be sent
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub file_id: String,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    pub kind: AttachmentKind,
    /// Local preview bytes, images only
    preview: Option<Vec<u8>>,
}

impl Attachment {
    pub fn reference(&self) -> AttachmentRef {
        AttachmentRef {
            file_id: self.file_id.clone(),
            kind: self.kind,
        }
    }

    pub fn preview(&self) -> Option<&[u8]> {
        self.preview.as_deref()
    }

    pub(crate) fn release_preview(&mut self) {
        if self.preview.take().is_some() {
            debug!(filename = %self.filename, "Released attachment preview");
        }
    }
}

/// Content type guessed from the file name
pub fn content_type_for(filename: &str) -> Option<&'static str> {
    mime_guess::from_path(filename).first_raw()
}

/// Type and size checks that need no network
pub fn validate_file(filename: &str, size: u64) -> Result<(String, AttachmentKind), ChatError> {
    let content_type = content_type_for(filename).ok_or_else(|| {
        ChatError::InvalidAttachment(format!("Unknown file type: {}", filename))
    })?;
    let kind = AttachmentKind::from_content_type(content_type).ok_or_else(|| {
        ChatError::InvalidAttachment(format!("Unsupported file type: {}", content_type))
    })?;
    if size > kind.max_bytes() {
        return Err(ChatError::InvalidAttachment(format!(
            "File too large ({} bytes, max {} MB for {}s)",
            size,
            kind.max_bytes() / (1024 * 1024),
            kind
        )));
    }
    Ok((content_type.to_string(), kind))
}

pub struct AttachmentComposer {
    backend: Arc<dyn ChatBackend>,
    session: Arc<SessionManager>,
    current: RwLock<Option<Attachment>>,
}

impl AttachmentComposer {
    pub fn new(backend: Arc<dyn ChatBackend>, session: Arc<SessionManager>) -> Self {
        Self {
            backend,
            session,
            current: RwLock::new(None),
        }
    }

    pub fn current(&self) -> Option<Attachment> {
        acquire_read_lock(&self.current).clone()
    }

    /// Read a file from disk and upload it for `model`
    pub async fn upload_path(&self, path: &Path, model: &str) -> Result<Attachment, ChatError> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ChatError::InvalidAttachment("Invalid file name".to_string()))?
            .to_string();
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| ChatError::InvalidAttachment(format!("{}: {}", path.display(), e)))?;
        // Reject oversized files before reading them
        validate_file(&filename, metadata.len())?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ChatError::InvalidAttachment(format!("{}: {}", path.display(), e)))?;
        self.upload(&filename, bytes, model).await
    }

    /// Validate and upload raw bytes. Replaces any current attachment.
    pub async fn upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        model: &str,
    ) -> Result<Attachment, ChatError> {
        let (content_type, kind) = validate_file(filename, bytes.len() as u64)?;
        check_attachment(model, kind)?;
        let token = self.session.require_token()?;

        let preview = (kind == AttachmentKind::Image).then(|| bytes.clone());
        let upload = FileUpload {
            filename: filename.to_string(),
            content_type,
            bytes,
        };
        let uploaded = self
            .backend
            .upload_file(&token, upload)
            .await
            .map_err(ChatError::from_read)?;

        let attachment = Attachment {
            file_id: uploaded.file_id,
            filename: uploaded.filename,
            content_type: uploaded.content_type,
            size: uploaded.size,
            kind: uploaded.kind,
            preview,
        };
        info!(
            filename = %attachment.filename,
            kind = %attachment.kind,
            size = attachment.size,
            "Attachment uploaded"
        );

        let previous = acquire_write_lock(&self.current).replace(attachment.clone());
        if let Some(mut previous) = previous {
            previous.release_preview();
        }
        Ok(attachment)
    }

    /// Check the current attachment against a newly selected model
    pub fn revalidate(&self, model: &str) -> Result<(), ChatError> {
        match acquire_read_lock(&self.current).as_ref() {
            Some(attachment) => check_attachment(model, attachment.kind),
            None => Ok(()),
        }
    }

    /// Remove the current attachment, releasing its preview
    pub fn remove(&self) -> Option<Attachment> {
        let mut attachment = acquire_write_lock(&self.current).take()?;
        attachment.release_preview();
        Some(attachment)
    }
}

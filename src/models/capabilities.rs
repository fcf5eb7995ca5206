//! Per-model attachment capabilities
//!
//! Static lookup: which models accept images and which accept documents.
//! Document support rides on the same multimodal models (text is extracted
//! server-side), so both sets are currently identical.

use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Model used when nothing else has been selected
pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";

pub const IMAGE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];
pub const DOCUMENT_CONTENT_TYPES: &[&str] =
    &["application/pdf", "text/plain", "text/csv", "application/json"];

pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;
pub const MAX_DOCUMENT_BYTES: u64 = 10 * 1024 * 1024;

static VISION_MODELS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "openai/gpt-4o",
        "openai/gpt-4o-mini",
        "anthropic/claude-3.5-sonnet",
        "anthropic/claude-sonnet-4",
        "anthropic/claude-opus-4",
        "anthropic/claude-3.5-haiku",
        "anthropic/claude-3.7-sonnet",
        "anthropic/claude-haiku-4",
        "google/gemini-2.0-flash-001",
        "google/gemini-2.5-flash",
        "google/gemini-2.5-flash-lite",
        "google/gemini-2.5-pro",
        "x-ai/grok-3",
        "x-ai/grok-3-beta",
    ]
    .into_iter()
    .collect()
});

fn document_models() -> &'static HashSet<&'static str> {
    &VISION_MODELS
}

/// Attachment category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Document,
}

impl AttachmentKind {
    /// Classify an allowed MIME type; `None` for anything not accepted
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let content_type = content_type.trim().to_ascii_lowercase();
        if IMAGE_CONTENT_TYPES.contains(&content_type.as_str()) {
            Some(Self::Image)
        } else if DOCUMENT_CONTENT_TYPES.contains(&content_type.as_str()) {
            Some(Self::Document)
        } else {
            None
        }
    }

    pub fn max_bytes(self) -> u64 {
        match self {
            Self::Image => MAX_IMAGE_BYTES,
            Self::Document => MAX_DOCUMENT_BYTES,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCapabilities {
    pub supports_vision: bool,
    pub supports_documents: bool,
}

impl ModelCapabilities {
    /// Look up a model; unknown models get no attachment support
    pub fn for_model(model: &str) -> Self {
        Self {
            supports_vision: VISION_MODELS.contains(model),
            supports_documents: document_models().contains(model),
        }
    }

    pub fn supports(&self, kind: AttachmentKind) -> bool {
        match kind {
            AttachmentKind::Image => self.supports_vision,
            AttachmentKind::Document => self.supports_documents,
        }
    }

    /// Whether any upload affordance should be offered
    pub fn can_upload(&self) -> bool {
        self.supports_vision || self.supports_documents
    }

    /// MIME types a file picker should accept for this model
    pub fn accepted_content_types(&self) -> Vec<&'static str> {
        let mut types = Vec::new();
        if self.supports_vision {
            types.extend_from_slice(IMAGE_CONTENT_TYPES);
        }
        if self.supports_documents {
            types.extend_from_slice(DOCUMENT_CONTENT_TYPES);
        }
        types
    }
}

/// Reject an attachment kind the model cannot take
pub fn check_attachment(model: &str, kind: AttachmentKind) -> Result<(), ChatError> {
    if ModelCapabilities::for_model(model).supports(kind) {
        Ok(())
    } else {
        Err(ChatError::Capability {
            model: model.to_string(),
            kind,
        })
    }
}

//! AI model metadata: attachment capabilities and the priced catalog

mod capabilities;
pub mod catalog;

pub use capabilities::{
    check_attachment, AttachmentKind, ModelCapabilities, DEFAULT_MODEL, DOCUMENT_CONTENT_TYPES,
    IMAGE_CONTENT_TYPES, MAX_DOCUMENT_BYTES, MAX_IMAGE_BYTES,
};

//! Proxy API access
//!
//! All network traffic goes through the [`ChatBackend`] trait; [`HttpBackend`]
//! is the reqwest implementation used by the binary.

mod backend;
mod client;
mod error;
pub mod http_client;
mod types;

pub use backend::ChatBackend;
pub use client::HttpBackend;
pub use error::{ApiError, ErrorDetail};
pub use types::{
    AssistantReply, Attribution, AuthResponse, AvailableModels, ChatResponse, ConversationRecord,
    ConversationSummary, FileUpload, LoginRequest, MessageRecord, ModelPrice, RegisterRequest,
    Role, SendMessageRequest, UploadedFile, User, UserPatch,
};

//! Conversation state, attachments and the send pipeline

mod attachment;
mod conversation;
mod orchestrator;
mod types;


pub use attachment::{content_type_for, validate_file, Attachment, AttachmentComposer};
pub use conversation::ConversationController;
pub use orchestrator::SendOrchestrator;
pub use types::{AttachmentRef, ConversationState, Message, MessageId, SendReceipt};

//! Authentication session and token persistence

mod session;
mod state;
mod storage;

pub use session::{Registration, SessionManager};
pub use state::{PersistEffect, SessionPhase, SessionState};
pub use storage::{
    token_store_for, FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore,
    STORAGE_SLOT,
};

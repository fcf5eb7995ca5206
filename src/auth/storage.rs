//! Token persistence
//!
//! Only the bearer token is persisted, in a single named slot holding
//! `{"state":{"token":"..."}}`. The user profile is always re-fetched.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{ClientConfig, TokenStoreKind};
use crate::error::ChatError;
use crate::utils::{acquire_read_lock, acquire_write_lock};

/// Name of the persisted slot
pub const STORAGE_SLOT: &str = "auth-storage";
const KEYRING_SERVICE: &str = "metered-chat";

/// Synchronous so the persisted copy is written in the same critical
/// section as the in-memory token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, ChatError>;
    fn save(&self, token: &str) -> Result<(), ChatError>;
    fn clear(&self) -> Result<(), ChatError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedSlot {
    #[serde(default)]
    state: PersistedState,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedState {
    #[serde(default)]
    token: Option<String>,
}

fn encode_slot(token: &str) -> Result<String, ChatError> {
    let slot = PersistedSlot {
        state: PersistedState {
            token: Some(token.to_string()),
        },
    };
    serde_json::to_string(&slot).map_err(|e| ChatError::Storage(e.to_string()))
}

/// Corrupt or empty slots read as "no token"
fn decode_slot(raw: &str) -> Option<String> {
    match serde_json::from_str::<PersistedSlot>(raw) {
        Ok(slot) => slot.state.token.filter(|t| !t.is_empty()),
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable token slot");
            None
        }
    }
}

/// JSON slot file `<dir>/auth-storage.json`
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", STORAGE_SLOT)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, ChatError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(decode_slot(&raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ChatError::Storage(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn save(&self, token: &str) -> Result<(), ChatError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ChatError::Storage(format!("Failed to create storage dir: {}", e)))?;
        }
        // Write then rename so a crash never leaves a half-written slot
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, encode_slot(token)?)
            .map_err(|e| ChatError::Storage(format!("Failed to write token: {}", e)))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| ChatError::Storage(format!("Failed to replace token slot: {}", e)))?;
        debug!(path = %self.path.display(), "Token persisted");
        Ok(())
    }

    fn clear(&self) -> Result<(), ChatError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ChatError::Storage(format!("Failed to remove token: {}", e))),
        }
    }
}

/// OS credential store (Keychain, Secret Service, Credential Manager)
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry, ChatError> {
        Entry::new(&self.service, STORAGE_SLOT)
            .map_err(|e| ChatError::Storage(format!("Keychain unavailable: {}", e)))
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<String>, ChatError> {
        match self.entry()?.get_password() {
            Ok(raw) => Ok(decode_slot(&raw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(ChatError::Storage(format!("Failed to read keychain: {}", e))),
        }
    }

    fn save(&self, token: &str) -> Result<(), ChatError> {
        self.entry()?
            .set_password(&encode_slot(token)?)
            .map_err(|e| ChatError::Storage(format!("Failed to write keychain: {}", e)))
    }

    fn clear(&self) -> Result<(), ChatError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ChatError::Storage(format!("Failed to clear keychain: {}", e))),
        }
    }
}

/// Process-lifetime store
#[derive(Default)]
pub struct MemoryTokenStore {
    slot: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            slot: RwLock::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, ChatError> {
        Ok(acquire_read_lock(&self.slot).clone())
    }

    fn save(&self, token: &str) -> Result<(), ChatError> {
        *acquire_write_lock(&self.slot) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ChatError> {
        *acquire_write_lock(&self.slot) = None;
        Ok(())
    }
}

/// Store selected by configuration
pub fn token_store_for(config: &ClientConfig) -> Arc<dyn TokenStore> {
    match config.token_store {
        TokenStoreKind::File => Arc::new(FileTokenStore::new(&config.storage_dir)),
        TokenStoreKind::Keyring => Arc::new(KeyringTokenStore::new()),
        TokenStoreKind::Memory => Arc::new(MemoryTokenStore::default()),
    }
}

//! API key lifecycle: loaded at startup, saved on change, cleared on demand.
//! The key only ever leaves the process inside requests to the generation service.

use super::keyring::KeyringManager;
use crate::domain::error::Result;
use std::sync::Mutex;

pub const KEYRING_SERVICE: &str = "framescribe";
pub const API_KEY_ENTRY: &str = "gemini_api_key";

/// Environment variables consulted when nothing is stored, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    /// Saving a blank key clears the stored credential.
    fn save(&self, api_key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

pub struct KeyringCredentialStore {
    keyring: KeyringManager,
    entry: String,
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self::with_entry(KEYRING_SERVICE, API_KEY_ENTRY)
    }

    pub fn with_entry(service: &str, entry: &str) -> Self {
        Self {
            keyring: KeyringManager::new(service),
            entry: entry.to_string(),
        }
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self
            .keyring
            .get_secret(&self.entry)?
            .filter(|key| !key.trim().is_empty()))
    }

    fn save(&self, api_key: &str) -> Result<()> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return self.clear();
        }
        self.keyring.set_secret(&self.entry, api_key)?;
        tracing::info!("Stored API key in keyring");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.keyring.delete_secret(&self.entry)?;
        tracing::info!("Cleared stored API key");
        Ok(())
    }
}

/// Process-local store, used when no OS keyring should be touched.
#[derive(Default)]
pub struct MemoryCredentialStore {
    api_key: Mutex<Option<String>>,
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.api_key.lock().map(|key| key.clone()).unwrap_or(None))
    }

    fn save(&self, api_key: &str) -> Result<()> {
        let api_key = api_key.trim();
        if let Ok(mut slot) = self.api_key.lock() {
            *slot = if api_key.is_empty() {
                None
            } else {
                Some(api_key.to_string())
            };
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if let Ok(mut slot) = self.api_key.lock() {
            *slot = None;
        }
        Ok(())
    }
}

/// Picks the key for one request: explicit value, then the store, then the environment.
pub fn resolve_api_key(
    explicit: Option<&str>,
    store: &dyn CredentialStore,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<Option<String>> {
    if let Some(key) = explicit.map(str::trim).filter(|key| !key.is_empty()) {
        return Ok(Some(key.to_string()));
    }

    if let Some(key) = store.load()? {
        return Ok(Some(key));
    }

    Ok(API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| env_lookup(name))
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty()))
}

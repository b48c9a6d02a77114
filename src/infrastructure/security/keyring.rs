use crate::domain::error::{AppError, Result};
use keyring::Entry;

pub struct KeyringManager {
    service: String,
}

impl KeyringManager {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key)
            .map_err(|e| AppError::SecurityError(format!("Failed to create entry: {}", e)))
    }

    pub fn set_secret(&self, key: &str, secret: &str) -> Result<()> {
        self.entry(key)?
            .set_password(secret)
            .map_err(|e| AppError::SecurityError(format!("Failed to set password: {}", e)))
    }

    /// `Ok(None)` when nothing has been stored under `key`.
    pub fn get_secret(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AppError::SecurityError(format!(
                "Failed to get password: {}",
                e
            ))),
        }
    }

    /// Deleting a missing entry is not an error.
    pub fn delete_secret(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AppError::SecurityError(format!(
                "Failed to delete password: {}",
                e
            ))),
        }
    }
}

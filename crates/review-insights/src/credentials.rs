//! API key storage.
//!
//! The Gemini key is kept under the fixed name [`API_KEY_NAME`] in a
//! [`CredentialStore`]. The default store is the OS keychain
//! ([`KeyringCredentialStore`]):
//! - **macOS**: Keychain
//! - **Windows**: Credential Manager
//! - **Linux**: the kernel keyring
//!
//! [`FileCredentialStore`] keeps a plain JSON settings file for machines
//! without a keychain, and [`MemoryCredentialStore`] keeps values in
//! process memory.
//!
//! # Behaviour
//!
//! - Reading a missing key is not an error; it returns `Ok(None)`.
//! - Deleting a missing key is not an error either.
//! - Storing an empty or whitespace-only key is rejected.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use keyring::Entry;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info};

use crate::error::{InsightsError, Result, ResultExt};

/// Name the Gemini API key is stored under.
pub const API_KEY_NAME: &str = "gemini-api-key";

/// Service name of every keychain entry.
pub const KEYRING_SERVICE: &str = "review-insights";

/// Key/value store for secrets.
pub trait CredentialStore: Send + Sync {
    fn get(&self, name: &str) -> Result<Option<String>>;

    fn set(&self, name: &str, value: &str) -> Result<()>;

    fn delete(&self, name: &str) -> Result<()>;

    /// Load the Gemini API key.
    fn api_key(&self) -> Result<Option<String>> {
        Ok(self
            .get(API_KEY_NAME)?
            .filter(|key| !key.trim().is_empty()))
    }

    /// Save the Gemini API key.
    fn set_api_key(&self, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(InsightsError::InvalidSelection(
                "API key cannot be empty".to_string(),
            ));
        }
        self.set(API_KEY_NAME, key)
    }
}

/// In-process store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(name).cloned())
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.values.write().remove(name);
        Ok(())
    }
}

/// Store backed by the OS keychain. Each name is one entry under
/// [`KEYRING_SERVICE`], with the name as the user.
pub struct KeyringCredentialStore {
    service: String,
    entries: Mutex<BTreeMap<String, Entry>>,
}

impl std::fmt::Debug for KeyringCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyringCredentialStore")
            .field("service", &self.service)
            .finish()
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self::with_service(KEYRING_SERVICE)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Run `f` on the entry for `name`, creating it on first use.
    fn with_entry<T>(&self, name: &str, f: impl FnOnce(&Entry) -> Result<T>) -> Result<T> {
        let mut entries = self.entries.lock();
        if !entries.contains_key(name) {
            let entry = Entry::new(&self.service, name).map_err(|e| {
                error!("Failed to create keyring entry: {}", e);
                InsightsError::SecureStorage(e.to_string())
            })?;
            entries.insert(name.to_string(), entry);
        }
        match entries.get(name) {
            Some(entry) => f(entry),
            None => Err(InsightsError::Internal(format!(
                "keyring entry '{name}' vanished"
            ))),
        }
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn get(&self, name: &str) -> Result<Option<String>> {
        self.with_entry(name, |entry| match entry.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => {
                error!("Failed to retrieve credential '{}': {}", name, e);
                Err(InsightsError::SecureStorage(e.to_string()))
            }
        })
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        self.with_entry(name, |entry| {
            entry.set_password(value).map_err(|e| {
                error!("Failed to store credential '{}': {}", name, e);
                InsightsError::SecureStorage(e.to_string())
            })
        })?;
        info!("Stored credential '{}' in the OS keychain", name);
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.with_entry(name, |entry| match entry.delete_credential() {
            Ok(()) => {
                info!("Deleted credential '{}' from the OS keychain", name);
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!("Credential '{}' was not stored", name);
                Ok(())
            }
            Err(e) => {
                error!("Failed to delete credential '{}': {}", name, e);
                Err(InsightsError::SecureStorage(e.to_string()))
            }
        })
    }
}

/// Store backed by a JSON object on disk, e.g. `{"gemini-api-key": "..."}`.
///
/// The file is read on every access and rewritten on every change, so
/// several processes see each other's updates.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.review-insights/settings.json`, or `./.review-insights/...`
    /// when no home directory is set.
    pub fn default_location() -> Self {
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(home.join(".review-insights").join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => serde_json::from_str(&text)
                .map_err(InsightsError::from)
                .context(format!("Corrupt settings file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e).context(format!("Failed to read {}", self.path.display())),
        }
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, json)
            .context(format!("Failed to write {}", self.path.display()))
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(name))
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        let mut values = self.load()?;
        values.insert(name.to_string(), value.to_string());
        self.save(&values)?;
        info!("Stored credential '{}' in {}", name, self.path.display());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        let mut values = self.load()?;
        if values.remove(name).is_none() {
            debug!("Credential '{}' was not stored", name);
            return Ok(());
        }
        self.save(&values)
    }
}

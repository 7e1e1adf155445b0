//! Document-backed storage backend.
//!
//! This is the extension-scoped side of the dual store: a single JSON
//! document in the platform configuration directory, matching the profile
//! storage area a browser extension writes through. Its failure modes
//! (missing config directory, I/O errors) model the invalidated-extension
//! condition the page-scoped backend exists to cover.
//!
//! # Storage Location
//!
//! The document lives at `~/.config/flowcourier/slots.json` on Linux/macOS
//! and `%APPDATA%\flowcourier\slots.json` on Windows.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use super::{Secret, StorageBackend, StoreError};

/// On-disk document format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SlotDocument {
    /// Version of the document format (for future migrations).
    version: u32,

    /// All stored slots.
    slots: HashMap<String, String>,
}

impl Default for SlotDocument {
    fn default() -> Self {
        Self {
            version: 1,
            slots: HashMap::new(),
        }
    }
}

/// Document-backed storage backend.
///
/// # Thread Safety
///
/// Uses interior mutability via `RwLock`; every mutation rewrites the
/// whole document.
pub struct FileStore {
    /// Path to the slots JSON file.
    path: PathBuf,

    /// In-memory cache of the document.
    data: RwLock<SlotDocument>,
}

impl FileStore {
    /// Get the default document path.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let dirs = directories::ProjectDirs::from("dev", "flowcourier", "flowcourier").ok_or(
            StoreError::BackendUnavailable {
                message: "configuration directory not available".to_string(),
            },
        )?;

        Ok(dirs.config_dir().join("slots.json"))
    }

    /// Open the store at the default location.
    ///
    /// Creates the file and parent directories if they don't exist.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(Self::default_path()?)
    }

    /// Open the store at a specific path.
    ///
    /// Creates the file and parent directories if they don't exist.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            SlotDocument::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// Write the current document to disk.
    fn save(&self) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(&*self.data.read())?;
        fs::write(&self.path, contents)?;
        Ok(())
    }

    /// Get the document path for this store.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("keys_count", &self.data.read().slots.len())
            .finish()
    }
}

#[async_trait]
impl StorageBackend for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Secret>, StoreError> {
        Ok(self.data.read().slots.get(key).map(|value| Secret::new(value.as_str())))
    }

    async fn set(&self, key: &str, secret: &Secret) -> Result<(), StoreError> {
        self.data
            .write()
            .slots
            .insert(key.to_string(), secret.expose().to_string());
        self.save()
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let removed = self.data.write().slots.remove(key).is_some();
        if removed {
            self.save()?;
        }
        Ok(())
    }
}

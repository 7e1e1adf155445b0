//! Storage abstraction for secrets and handoff state.
//!
//! This module provides:
//! - [`Secret`] - A wrapper for sensitive values that prevents accidental logging
//! - [`StorageBackend`] - Trait for physical storage backends
//! - [`MemoryStore`] - Page-scoped, volatile backend (also the test double)
//! - [`FileStore`] - Extension-scoped, document-backed backend
//! - [`DualStore`] - The two-backend read/write facade every manager goes through
//!
//! # Storage Key Convention
//!
//! Keys follow the pattern: `flowcourier/{slot}`, see [`crate::keys`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

mod dual;
mod file;
mod memory;

pub use dual::DualStore;
pub use file::FileStore;
pub use memory::MemoryStore;

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value,
/// and the backing memory is zeroed on drop.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Consume the secret and return the inner value.
    pub fn into_inner(mut self) -> String {
        std::mem::take(&mut self.0)
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

/// Error type for storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend is not reachable from this context.
    #[error("backend unavailable: {message}")]
    BackendUnavailable { message: String },

    /// The storage backend encountered an error.
    #[error("backend error: {message}")]
    BackendError { message: String },

    /// A write could not be confirmed by reading the value back.
    #[error("write to '{key}' could not be verified")]
    WriteUnverified { key: String },

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O error from a document-backed store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Abstraction over physical storage backends.
///
/// Two backends back every deployment: an extension-scoped store
/// ([`FileStore`]) that survives the page but can fail when the extension
/// context is invalidated, and a page-scoped store ([`MemoryStore`]) that is
/// always reachable but lost on navigation. Callers should not use a backend
/// directly; [`DualStore`] layers the two with defined precedence.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Retrieve a secret by key.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<Secret>, StoreError>;

    /// Store a secret at the given key.
    ///
    /// Overwrites any existing value.
    async fn set(&self, key: &str, secret: &Secret) -> Result<(), StoreError>;

    /// Delete a secret by key.
    ///
    /// Returns `Ok(())` even if the key didn't exist.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug_redacted() {
        let secret = Secret::new("super-secret");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_secret_display_redacted() {
        let secret = Secret::new("super-secret");
        let display = format!("{}", secret);
        assert!(!display.contains("super-secret"));
        assert!(display.contains("REDACTED"));
    }

    #[test]
    fn test_secret_into_inner() {
        let secret = Secret::new("value");
        assert_eq!(secret.into_inner(), "value");
    }

    #[test]
    fn test_secret_json_roundtrip() {
        let secret = Secret::new("tok-123");
        let json = serde_json::to_string(&secret).unwrap();
        assert_eq!(json, "\"tok-123\"");
        let parsed: Secret = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, secret);
    }
}

//! Two-backend storage facade.

use tracing::{debug, warn};

use super::{Secret, StorageBackend, StoreError};

/// Storage facade layering an extension-scoped primary backend over a
/// page-scoped secondary backend.
///
/// Precedence is fixed:
/// - `get` consults the primary first and falls back to the secondary on a
///   backend error or an absent value. Conflicting values are never merged;
///   the primary wins whenever it holds one.
/// - `set` writes the primary, then the secondary regardless of the
///   primary's outcome, then reads the key back through the same precedence.
///   A read-back that does not match the written value yields
///   [`StoreError::WriteUnverified`] so the caller can alert the user
///   instead of proceeding with an unsaved secret.
/// - `remove` deletes from both backends, best-effort.
///
/// Higher-level managers (credential, session, handoff) all go through one
/// shared `DualStore` rather than re-implementing the fallback per call site.
pub struct DualStore {
    primary: Box<dyn StorageBackend>,
    secondary: Box<dyn StorageBackend>,
}

impl DualStore {
    /// Create a dual store over the given backends.
    pub fn new(primary: Box<dyn StorageBackend>, secondary: Box<dyn StorageBackend>) -> Self {
        Self { primary, secondary }
    }

    /// Retrieve a value, primary first.
    ///
    /// Returns `Ok(None)` when neither backend holds the key. A secondary
    /// failure only surfaces when the primary failed too.
    pub async fn get(&self, key: &str) -> Result<Option<Secret>, StoreError> {
        let primary_failed = match self.primary.get(key).await {
            Ok(Some(value)) => return Ok(Some(value)),
            Ok(None) => false,
            Err(e) => {
                warn!(key, error = %e, "primary backend read failed, trying secondary");
                true
            }
        };

        match self.secondary.get(key).await {
            Ok(value) => Ok(value),
            Err(e) if !primary_failed => {
                warn!(key, error = %e, "secondary backend read failed, key absent in primary");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Write a value to both backends and verify the write by reading it back.
    pub async fn set(&self, key: &str, secret: &Secret) -> Result<(), StoreError> {
        if let Err(e) = self.primary.set(key, secret).await {
            warn!(key, error = %e, "primary backend write failed");
        }

        if let Err(e) = self.secondary.set(key, secret).await {
            warn!(key, error = %e, "secondary backend write failed");
        }

        match self.get(key).await {
            Ok(Some(read_back)) if read_back == *secret => Ok(()),
            _ => Err(StoreError::WriteUnverified {
                key: key.to_string(),
            }),
        }
    }

    /// Delete a key from both backends.
    ///
    /// Individual backend failures are swallowed; the slot is cleared
    /// wherever it can be.
    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        if let Err(e) = self.primary.remove(key).await {
            debug!(key, error = %e, "primary backend remove failed");
        }
        if let Err(e) = self.secondary.remove(key).await {
            debug!(key, error = %e, "secondary backend remove failed");
        }
        Ok(())
    }
}

impl std::fmt::Debug for DualStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualStore").finish_non_exhaustive()
    }
}

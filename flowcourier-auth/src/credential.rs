//! Target application API credential lifecycle.
//!
//! This module provides:
//! - [`ApiCredential`] - the validated, opaque API key
//! - [`CredentialManager`] - storage-backed validation, corruption
//!   detection with self-healing, and a post-save connectivity probe
//!
//! A historical failure mode is treated as first-class here: a serialized
//! workflow graph written into the credential slot. A stored value that
//! starts with `{` and carries a `nodes` field is that failure, not a key;
//! on detection the slot is cleared from both backends and the user gets a
//! distinct "cleared automatically" notice.

use std::sync::Arc;
use std::time::Duration;

use flowcourier_core::config::{DeliveryConfig, TargetConfig};
use flowcourier_core::keys;
use flowcourier_core::notice::{Notice, NoticeSink};
use flowcourier_core::store::{DualStore, Secret};

use crate::error::AuthError;

/// Minimum length of a plausible API credential.
pub const MIN_CREDENTIAL_LEN: usize = 10;

/// A validated API credential for the target application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCredential(Secret);

impl ApiCredential {
    /// Expose the credential value for use as a header.
    pub fn expose(&self) -> &str {
        self.0.expose()
    }
}

/// Whether a stored value is a serialized workflow rather than a key.
fn looks_like_workflow_json(raw: &str) -> bool {
    raw.trim_start().starts_with('{') && raw.contains("nodes")
}

/// Format check applied on every read and before every save.
fn validate_format(raw: &str) -> Result<(), AuthError> {
    if looks_like_workflow_json(raw) {
        return Err(AuthError::CredentialShapedLikeWorkflow);
    }
    if raw.is_empty() {
        return Err(AuthError::CredentialInvalidFormat {
            reason: "credential is empty".to_string(),
        });
    }
    if raw.len() < MIN_CREDENTIAL_LEN {
        return Err(AuthError::CredentialInvalidFormat {
            reason: format!(
                "credential is too short ({} chars, need at least {})",
                raw.len(),
                MIN_CREDENTIAL_LEN
            ),
        });
    }
    Ok(())
}

/// Manager for the per-target API credential.
///
/// Exactly one logical credential exists per target instance; later saves
/// overwrite earlier ones.
pub struct CredentialManager {
    store: Arc<DualStore>,
    notices: Arc<dyn NoticeSink>,
    http: reqwest::Client,
    api_key_header: String,
    probe_timeout: Duration,
}

impl CredentialManager {
    /// Create a credential manager over the shared store.
    pub fn new(
        store: Arc<DualStore>,
        notices: Arc<dyn NoticeSink>,
        target: &TargetConfig,
        delivery: &DeliveryConfig,
    ) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AuthError::Network {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            store,
            notices,
            http,
            api_key_header: target.api_key_header.clone(),
            probe_timeout: delivery.connectivity_timeout(),
        })
    }

    /// Read the stored credential, if a valid one exists.
    ///
    /// A workflow-shaped value in the slot is cleared from both backends on
    /// sight and reported to the user; any other invalid value is simply
    /// treated as absent.
    pub async fn get(&self) -> Result<Option<ApiCredential>, AuthError> {
        let raw = match self.store.get(keys::CREDENTIAL).await? {
            Some(secret) => secret,
            None => return Ok(None),
        };

        match validate_format(raw.expose()) {
            Ok(()) => Ok(Some(ApiCredential(raw))),
            Err(AuthError::CredentialShapedLikeWorkflow) => {
                tracing::warn!("credential slot held a serialized workflow, clearing it");
                self.store.remove(keys::CREDENTIAL).await?;
                self.notices.notify(Notice::CorruptedCredentialCleared);
                Ok(None)
            }
            Err(e) => {
                tracing::debug!(error = %e, "stored credential failed validation");
                Ok(None)
            }
        }
    }

    /// Validate and persist a credential the user submitted.
    ///
    /// Workflow-shaped input is rejected with a distinct error before it
    /// ever reaches storage, so the corruption is impossible to persist
    /// through this path.
    pub async fn save(&self, raw: &str) -> Result<(), AuthError> {
        let trimmed = raw.trim();
        validate_format(trimmed)?;

        self.store
            .set(keys::CREDENTIAL, &Secret::new(trimmed))
            .await?;
        tracing::info!("API credential saved");
        Ok(())
    }

    /// Remove the credential and any lingering handoff state.
    ///
    /// The handoff slots are cleared alongside to prevent a stale artifact
    /// from ever contaminating a future credential read.
    pub async fn clear(&self) -> Result<(), AuthError> {
        self.store.remove(keys::CREDENTIAL).await?;
        self.store.remove(keys::PENDING_ARTIFACT).await?;
        self.store.remove(keys::REOPEN_PANEL).await?;
        tracing::info!("API credential cleared");
        Ok(())
    }

    /// Probe the target API with the given credential.
    ///
    /// Read-only call used to give the user immediate feedback after
    /// saving; delivery never waits on it.
    pub async fn test_connectivity(
        &self,
        credential: &ApiCredential,
        base_url: &str,
    ) -> Result<(), AuthError> {
        let url = format!("{}/api/v1/workflows", base_url.trim_end_matches('/'));

        let response = self
            .http
            .get(&url)
            .header(&self.api_key_header, credential.expose())
            .timeout(self.probe_timeout)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(%url, "connectivity probe succeeded");
            Ok(())
        } else if status.as_u16() == 401 || status.as_u16() == 403 {
            Err(AuthError::CredentialRejected {
                status: status.as_u16(),
            })
        } else {
            Err(AuthError::ProviderRejected {
                status: status.as_u16(),
                message: "connectivity probe failed".to_string(),
            })
        }
    }
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("api_key_header", &self.api_key_header)
            .finish_non_exhaustive()
    }
}

//! Error types for delivery.

use flowcourier_core::model::ArtifactError;
use flowcourier_core::store::StoreError;
use thiserror::Error;

/// Error type for delivery operations.
///
/// Strategies never throw across chain boundaries; the orchestrator turns
/// the outcome of the chain into at most one of these.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// No credential is configured and the target demanded one.
    #[error("no API credential configured")]
    CredentialMissing,

    /// The target application rejected the configured credential.
    #[error("the target application rejected the API credential")]
    CredentialRejected,

    /// The credential lacks permission to create workflows.
    #[error("the credential lacks permission to create workflows")]
    RemoteForbidden,

    /// No target application is reachable from the current page.
    #[error("no target application detected from this page")]
    TargetUnreachable,

    /// The target application rejected the request.
    #[error("the target application rejected the request (status {status})")]
    RemoteRejected { status: u16 },

    /// Network failure talking to the target.
    #[error("network error: {message}")]
    Network { message: String },

    /// The artifact failed to serialize or parse.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// Every strategy failed, including the clipboard.
    #[error("clipboard unavailable")]
    ClipboardUnavailable,

    /// Storage error during handoff.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network {
            message: e.to_string(),
        }
    }
}

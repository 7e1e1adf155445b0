//! Error types and provider error mapping.

use flowcourier_core::store::StoreError;
use thiserror::Error;

/// Error type for session and credential operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential is configured for the target application.
    #[error("no API credential configured")]
    CredentialMissing,

    /// The credential slot held a serialized workflow and was cleared.
    #[error("credential slot was corrupted and has been cleared")]
    CredentialCorrupted,

    /// The supplied credential fails format validation.
    #[error("credential rejected: {reason}")]
    CredentialInvalidFormat { reason: String },

    /// The value offered as a credential is a serialized workflow.
    #[error("refusing to save a serialized workflow as an API credential")]
    CredentialShapedLikeWorkflow,

    /// The target application rejected the credential.
    #[error("the target application rejected the credential (status {status})")]
    CredentialRejected { status: u16 },

    /// The session is past its validity window.
    #[error("session expired")]
    SessionExpired,

    /// The refresh-token exchange failed; the session has been cleared.
    #[error("session refresh failed: {message}")]
    RefreshFailed { message: String },

    /// The identity provider rejected the request.
    #[error("identity provider rejected the request (status {status}): {message}")]
    ProviderRejected { status: u16, message: String },

    /// Network failure talking to the identity provider or target.
    #[error("network error: {message}")]
    Network { message: String },

    /// Storage error during auth operations.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network {
            message: e.to_string(),
        }
    }
}

/// The operation an auth error message is reported against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOperation {
    SignUp,
    SignIn,
    SignOut,
    Refresh,
    PasswordReset,
}

impl AuthOperation {
    /// Short verb used in generic fallback messages.
    fn verb(&self) -> &'static str {
        match self {
            Self::SignUp => "Sign-up",
            Self::SignIn => "Sign-in",
            Self::SignOut => "Sign-out",
            Self::Refresh => "Session refresh",
            Self::PasswordReset => "Password reset",
        }
    }
}

/// A user-facing auth message paired with the operation it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthMessage {
    pub message: String,
    pub operation: AuthOperation,
}

/// Map raw identity provider error text to a user-facing message.
///
/// Pure function over the provider's error body; unknown errors fall back
/// to a generic per-operation message.
pub fn map_auth_error(raw: &str, operation: AuthOperation) -> AuthMessage {
    let lowered = raw.to_lowercase();

    let message = if lowered.contains("invalid login credentials") {
        "Incorrect email or password.".to_string()
    } else if lowered.contains("email not confirmed") {
        "Confirm your email address before signing in.".to_string()
    } else if lowered.contains("already registered") || lowered.contains("already been registered")
    {
        "An account with this email already exists. Sign in instead.".to_string()
    } else if lowered.contains("password should be") || lowered.contains("weak password") {
        "That password is too weak. Use at least 6 characters.".to_string()
    } else if lowered.contains("unable to validate email") || lowered.contains("invalid email") {
        "Enter a valid email address.".to_string()
    } else if lowered.contains("error sending request")
        || lowered.contains("network")
        || lowered.contains("timed out")
        || lowered.contains("connection refused")
    {
        "Network problem. Check your connection and try again.".to_string()
    } else {
        format!("{} failed. Try again in a moment.", operation.verb())
    };

    AuthMessage { message, operation }
}

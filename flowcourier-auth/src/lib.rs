//! # Flowcourier Auth
//!
//! Identity session and API credential lifecycle.
//!
//! This crate provides:
//! - [`SessionManager`] - sign-up/sign-in/sign-out, expiry validation with a
//!   safety buffer, and refresh-token rotation
//! - [`CredentialManager`] - the per-target API credential: validation,
//!   corruption detection with self-healing, and a connectivity probe
//! - [`IdentityClient`] - the identity provider's REST endpoints
//! - [`map_auth_error`] - raw provider error text to user-facing messages
//!
//! Both managers persist through the shared
//! [`DualStore`](flowcourier_core::store::DualStore) and surface automatic
//! state changes through the host's
//! [`NoticeSink`](flowcourier_core::notice::NoticeSink).

pub mod credential;
pub mod error;
pub mod identity;
pub mod session;

// Re-export commonly used types at crate root
pub use credential::{
    ApiCredential,
    CredentialManager,
    MIN_CREDENTIAL_LEN,
};

pub use error::{
    AuthError,
    AuthMessage,
    AuthOperation,
    map_auth_error,
};

pub use identity::{
    IdentityClient,
    TokenGrant,
    UserProfile,
};

pub use session::{
    AuthState,
    ListenerId,
    Session,
    SessionManager,
    SESSION_EXPIRY_BUFFER_MINUTES,
};

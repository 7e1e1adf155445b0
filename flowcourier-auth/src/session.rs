//! Identity session lifecycle.
//!
//! This module provides:
//! - [`Session`] - the access/refresh token pair with an absolute expiry
//! - [`AuthState`] - the observable signed-in/signed-out state
//! - [`SessionManager`] - sign-up/sign-in/sign-out, validity checks with a
//!   safety buffer, and atomic refresh-token rotation
//!
//! The manager exclusively owns the session slot; other components only
//! ever read a snapshot. A session is never handed out past its validity
//! window: [`SessionManager::get_session`] either returns a session that is
//! still good for at least the buffer window, or clears state and returns
//! `None`.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use uuid::Uuid;

use flowcourier_core::keys;
use flowcourier_core::store::{DualStore, Secret};

use crate::error::AuthError;
use crate::identity::{IdentityClient, TokenGrant, UserProfile};

/// Validity buffer in minutes.
///
/// A session within this many minutes of its expiry is treated as expired,
/// so a request begun just before the boundary does not fail mid-flight.
pub const SESSION_EXPIRY_BUFFER_MINUTES: i64 = 5;

/// An identity session: token pair, absolute expiry, and the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Short-lived access token.
    pub access_token: Secret,

    /// Long-lived refresh token.
    pub refresh_token: Secret,

    /// Absolute expiry of the access token.
    pub expires_at: DateTime<Utc>,

    /// The signed-in user.
    pub user: UserProfile,
}

impl Session {
    /// Build a session from a token-endpoint grant.
    pub fn from_grant(grant: TokenGrant) -> Self {
        Self {
            access_token: Secret::new(grant.access_token),
            refresh_token: Secret::new(grant.refresh_token),
            expires_at: Utc::now() + Duration::seconds(grant.expires_in),
            user: grant.user,
        }
    }

    /// Whether the session is still valid, honoring the safety buffer.
    pub fn is_valid(&self) -> bool {
        Utc::now() + Duration::minutes(SESSION_EXPIRY_BUFFER_MINUTES) < self.expires_at
    }
}

/// Observable auth state, delivered to registered listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    SignedIn(UserProfile),
    SignedOut,
}

/// Handle for removing a registered listener.
pub type ListenerId = Uuid;

type Listener = Arc<dyn Fn(AuthState) + Send + Sync>;

/// Manager for the user's identity session.
pub struct SessionManager {
    identity: IdentityClient,
    store: Arc<DualStore>,
    current: RwLock<Option<Session>>,
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
}

impl SessionManager {
    /// Create a session manager over the shared store.
    pub fn new(identity: IdentityClient, store: Arc<DualStore>) -> Self {
        Self {
            identity,
            store,
            current: RwLock::new(None),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register a new account and sign in.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let grant = self.identity.sign_up(email, password).await?;
        self.adopt_grant(grant).await
    }

    /// Sign in with email and password.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let grant = self.identity.password_grant(email, password).await?;
        self.adopt_grant(grant).await
    }

    /// Get a usable session, or `None`.
    ///
    /// Resolution order: the in-memory session if still valid, then a
    /// persisted session if still valid, then a refresh with whichever
    /// refresh token is at hand. When all of that fails, local session
    /// state is cleared; a stale session is never returned.
    pub async fn get_session(&self) -> Option<Session> {
        let in_memory = self.current.read().clone();
        if let Some(session) = &in_memory {
            if session.is_valid() {
                return in_memory;
            }
        }

        let persisted = self.load_persisted().await;
        if let Some(session) = &persisted {
            if session.is_valid() {
                tracing::debug!(user = %session.user.email, "adopting persisted session");
                *self.current.write() = persisted.clone();
                return persisted;
            }
        }

        // Expired in both places; try the freshest refresh token we have.
        let refresh_token = in_memory
            .map(|s| s.refresh_token)
            .or(persisted.map(|s| s.refresh_token));

        if let Some(token) = refresh_token {
            match self.refresh(token.expose()).await {
                Ok(session) => return Some(session),
                Err(e) => {
                    tracing::warn!(error = %e, "session refresh failed");
                    return None;
                }
            }
        }

        self.clear_local().await;
        None
    }

    /// Exchange the refresh token for a new token pair.
    ///
    /// The old pair is only discarded once the new pair is obtained and
    /// persisted. Any failure clears the session entirely and notifies
    /// listeners; a half-rotated session is never left behind.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        match self.identity.refresh_grant(refresh_token).await {
            Ok(grant) => {
                let session = Session::from_grant(grant);
                self.persist(&session).await?;
                *self.current.write() = Some(session.clone());
                tracing::info!(user = %session.user.email, "session refreshed");
                Ok(session)
            }
            Err(e) => {
                tracing::warn!(error = %e, "refresh token exchange failed, clearing session");
                self.clear_local().await;
                self.notify_listeners(AuthState::SignedOut);
                Err(AuthError::RefreshFailed {
                    message: e.to_string(),
                })
            }
        }
    }

    /// Sign out.
    ///
    /// Remote revocation is best-effort; the local session is cleared and
    /// listeners are notified unconditionally, so the user's intent to stop
    /// being signed in on this device always succeeds.
    pub async fn sign_out(&self) {
        let access_token = self.current.read().as_ref().map(|s| s.access_token.clone());

        if let Some(token) = access_token {
            if let Err(e) = self.identity.sign_out(token.expose()).await {
                tracing::warn!(error = %e, "remote sign-out failed, clearing locally anyway");
            }
        }

        self.clear_local().await;
        self.notify_listeners(AuthState::SignedOut);
    }

    /// Send a password recovery email.
    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        self.identity.recover(email).await
    }

    /// Whether a signed-in user with a still-valid session exists in memory.
    pub fn is_authenticated(&self) -> bool {
        self.current
            .read()
            .as_ref()
            .map(Session::is_valid)
            .unwrap_or(false)
    }

    /// Snapshot of the current user, if any.
    pub fn current_user(&self) -> Option<UserProfile> {
        self.current.read().as_ref().map(|s| s.user.clone())
    }

    /// Register an auth state listener.
    pub fn on_auth_state_change(
        &self,
        listener: impl Fn(AuthState) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = Uuid::new_v4();
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Remove a previously registered listener.
    pub fn off_auth_state_change(&self, id: ListenerId) {
        self.listeners.write().retain(|(lid, _)| *lid != id);
    }

    /// Adopt a fresh grant: persist, swap into memory, notify.
    async fn adopt_grant(&self, grant: TokenGrant) -> Result<Session, AuthError> {
        let session = Session::from_grant(grant);
        self.persist(&session).await?;
        *self.current.write() = Some(session.clone());
        self.notify_listeners(AuthState::SignedIn(session.user.clone()));
        tracing::info!(user = %session.user.email, "signed in");
        Ok(session)
    }

    async fn persist(&self, session: &Session) -> Result<(), AuthError> {
        let snapshot = serde_json::to_string(session)
            .map_err(flowcourier_core::store::StoreError::from)?;
        self.store.set(keys::SESSION, &Secret::new(snapshot)).await?;
        Ok(())
    }

    async fn load_persisted(&self) -> Option<Session> {
        let raw = match self.store.get(keys::SESSION).await {
            Ok(Some(secret)) => secret,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted session");
                return None;
            }
        };

        match serde_json::from_str(raw.expose()) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, "persisted session did not parse, dropping it");
                None
            }
        }
    }

    async fn clear_local(&self) {
        *self.current.write() = None;
        if let Err(e) = self.store.remove(keys::SESSION).await {
            tracing::debug!(error = %e, "session slot removal failed");
        }
    }

    /// Deliver a state change to every listener.
    ///
    /// A panicking listener is logged and skipped; it never prevents the
    /// remaining listeners from running.
    fn notify_listeners(&self, state: AuthState) {
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();

        for listener in listeners {
            let state = state.clone();
            if catch_unwind(AssertUnwindSafe(move || (*listener)(state))).is_err() {
                tracing::error!("auth state listener panicked");
            }
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("signed_in", &self.current.read().is_some())
            .field("listeners", &self.listeners.read().len())
            .finish_non_exhaustive()
    }
}

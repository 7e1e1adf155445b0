//! Identity provider REST client.
//!
//! Wraps the provider's password-grant token endpoints. Every call carries
//! the public `apikey` header; response bodies never reach the log, only a
//! length/digest summary.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use flowcourier_core::config::IdentityConfig;

use crate::error::AuthError;

fn summarize_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User UUID.
    pub id: String,

    /// Account email address.
    pub email: String,
}

/// A successful token-endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    /// Short-lived access token.
    pub access_token: String,

    /// Long-lived refresh token.
    pub refresh_token: String,

    /// Seconds until the access token expires.
    pub expires_in: i64,

    /// The user the tokens belong to.
    pub user: UserProfile,
}

/// Request body for password-based grants.
#[derive(Debug, Serialize)]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
struct RecoverRequest<'a> {
    email: &'a str,
}

/// REST client for the identity provider.
#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl IdentityClient {
    /// Create a client from the identity section of the configuration.
    pub fn new(config: &IdentityConfig) -> Result<Self, AuthError> {
        Self::with_timeout(config, Duration::from_secs(15))
    }

    /// Create a client with an explicit request timeout.
    pub fn with_timeout(config: &IdentityConfig, timeout: Duration) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Network {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        })
    }

    /// Build the URL for an auth endpoint.
    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Register a new account.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<TokenGrant, AuthError> {
        let response = self
            .http
            .post(self.auth_url("signup"))
            .header("apikey", &self.anon_key)
            .json(&PasswordRequest { email, password })
            .send()
            .await?;

        Self::grant_from(response).await
    }

    /// Exchange email and password for a token pair.
    pub async fn password_grant(
        &self,
        email: &str,
        password: &str,
    ) -> Result<TokenGrant, AuthError> {
        let response = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&PasswordRequest { email, password })
            .send()
            .await?;

        Self::grant_from(response).await
    }

    /// Exchange a refresh token for a new token pair.
    pub async fn refresh_grant(&self, refresh_token: &str) -> Result<TokenGrant, AuthError> {
        let response = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.anon_key)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        Self::grant_from(response).await
    }

    /// Revoke the session on the provider side.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {access_token}"))
            .send()
            .await?;

        Self::expect_success(response).await
    }

    /// Send a password recovery email.
    pub async fn recover(&self, email: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(self.auth_url("recover"))
            .header("apikey", &self.anon_key)
            .json(&RecoverRequest { email })
            .send()
            .await?;

        Self::expect_success(response).await
    }

    /// Parse a token grant out of a provider response.
    async fn grant_from(response: reqwest::Response) -> Result<TokenGrant, AuthError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = %status,
                body_summary = %summarize_body(&body),
                "identity provider rejected token request"
            );
            return Err(AuthError::ProviderRejected {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.json().await?)
    }

    async fn expect_success(response: reqwest::Response) -> Result<(), AuthError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = %status,
                body_summary = %summarize_body(&body),
                "identity provider call failed"
            );
            return Err(AuthError::ProviderRejected {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for IdentityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

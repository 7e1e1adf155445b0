//! Target application REST client.

use std::time::Duration;

use serde::Deserialize;

use flowcourier_auth::ApiCredential;
use flowcourier_core::config::{DeliveryConfig, TargetConfig};
use flowcourier_core::model::Artifact;

use crate::error::DeliveryError;

/// Outcome of a workflow-creation call, by response class.
///
/// Network failures are errors; everything the target actually said is a
/// variant here so the orchestrator can apply distinct semantics per class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// 2xx. Carries the new workflow id when the target returned one.
    Created { id: Option<String> },

    /// 401.
    Unauthorized,

    /// 403.
    Forbidden,

    /// Any other non-2xx status.
    Rejected { status: u16 },
}

#[derive(Debug, Deserialize)]
struct CreatedBody {
    id: Option<String>,
}

/// REST client for the target application's administrative API.
///
/// Requests ride the ambient cookie jar so an existing in-app session can
/// authenticate the call even without an API credential.
pub struct WorkflowApiClient {
    http: reqwest::Client,
    api_key_header: String,
    timeout: Duration,
}

impl WorkflowApiClient {
    /// Create a client from configuration.
    pub fn new(target: &TargetConfig, delivery: &DeliveryConfig) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| DeliveryError::Network {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            api_key_header: target.api_key_header.clone(),
            timeout: delivery.api_timeout(),
        })
    }

    fn workflows_url(base_url: &str) -> String {
        format!("{}/api/v1/workflows", base_url.trim_end_matches('/'))
    }

    /// Create a workflow on the target instance.
    ///
    /// Returns `Err` only on network failure or serialization trouble;
    /// every HTTP response becomes a [`CreateOutcome`].
    pub async fn create_workflow(
        &self,
        base_url: &str,
        artifact: &Artifact,
        credential: Option<&ApiCredential>,
    ) -> Result<CreateOutcome, DeliveryError> {
        let url = Self::workflows_url(base_url);

        let mut request = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(artifact);

        if let Some(credential) = credential {
            request = request.header(&self.api_key_header, credential.expose());
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            let id = response
                .json::<CreatedBody>()
                .await
                .ok()
                .and_then(|body| body.id);
            tracing::info!(%url, ?id, "workflow created via API");
            return Ok(CreateOutcome::Created { id });
        }

        tracing::warn!(%url, status = status.as_u16(), "workflow creation rejected");
        Ok(match status.as_u16() {
            401 => CreateOutcome::Unauthorized,
            403 => CreateOutcome::Forbidden,
            code => CreateOutcome::Rejected { status: code },
        })
    }
}

impl std::fmt::Debug for WorkflowApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowApiClient")
            .field("api_key_header", &self.api_key_header)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

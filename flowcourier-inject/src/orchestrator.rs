//! The ordered delivery chain.
//!
//! One artifact, four strategies, one report. Strategies are tried in a
//! fixed order; each runs only if the prior one failed and its own
//! preconditions hold. Nothing is thrown across strategy boundaries:
//! every attempt collapses into a [`StrategyOutcome`] and the chain loop
//! decides whether to continue.
//!
//! The chain stops early only on a 401/403 from the direct API call:
//! retrying an authentication failure through a different delivery channel
//! cannot help and would only confuse the user.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use flowcourier_auth::{ApiCredential, CredentialManager};
use flowcourier_core::config::{DeliveryConfig, TargetConfig};
use flowcourier_core::model::Artifact;
use flowcourier_core::notice::{Notice, NoticeSink};

use crate::api_client::{CreateOutcome, WorkflowApiClient};
use crate::error::DeliveryError;
use crate::handoff::HandoffSlots;
use crate::page::{ClipboardAccess, Navigator, PageSurface};
use crate::target::{TargetContext, TargetDetector};

/// A delivery mechanism, in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Direct call to the target's workflow API.
    Api,

    /// Persist the artifact and navigate into the target's import route.
    Redirect,

    /// Write the artifact into the page's own import dialog.
    Dom,

    /// Copy the artifact to the system clipboard.
    Clipboard,
}

impl Strategy {
    /// The full chain, in attempt order.
    pub const CHAIN: [Strategy; 4] = [
        Strategy::Api,
        Strategy::Redirect,
        Strategy::Dom,
        Strategy::Clipboard,
    ];

    /// Short name for logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Redirect => "redirect",
            Self::Dom => "dom",
            Self::Clipboard => "clipboard",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a single strategy attempt.
enum StrategyOutcome {
    /// The artifact reached the user; stop the chain.
    Delivered,

    /// Preconditions not met; move on without counting this as a failure.
    Skipped { reason: &'static str },

    /// Attempted and failed; move on.
    Failed { reason: String },

    /// Attempted and failed in a way no later strategy can fix; stop.
    Halt { error: DeliveryError },
}

/// The single result of a [`deliver`](InjectionOrchestrator::deliver) call.
#[derive(Debug)]
pub enum DeliveryReport {
    /// Delivered; `strategy` says through which channel.
    Delivered { strategy: Strategy },

    /// A delivery for the same artifact is already in flight.
    Busy,

    /// Terminal failure. When even the clipboard was unavailable,
    /// `serialized` carries the raw text for the caller to show the user.
    Failed {
        error: DeliveryError,
        serialized: Option<String>,
    },
}

/// Orchestrates the delivery chain for generated artifacts.
///
/// Reads the credential and session slots; never writes them. The only
/// mutual exclusion in the system is the in-flight guard below, which
/// keeps a double-click from issuing the same API call twice.
pub struct InjectionOrchestrator {
    handoff: HandoffSlots,
    credentials: Arc<CredentialManager>,
    detector: TargetDetector,
    api: WorkflowApiClient,
    page: Arc<dyn PageSurface>,
    navigator: Arc<dyn Navigator>,
    clipboard: Arc<dyn ClipboardAccess>,
    notices: Arc<dyn NoticeSink>,
    settle_delay: Duration,
    new_workflow_path: String,
    in_flight: Mutex<HashSet<String>>,
}

impl InjectionOrchestrator {
    /// Create an orchestrator wired to the host's capabilities.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        handoff: HandoffSlots,
        credentials: Arc<CredentialManager>,
        detector: TargetDetector,
        api: WorkflowApiClient,
        page: Arc<dyn PageSurface>,
        navigator: Arc<dyn Navigator>,
        clipboard: Arc<dyn ClipboardAccess>,
        notices: Arc<dyn NoticeSink>,
        target: &TargetConfig,
        delivery: &DeliveryConfig,
    ) -> Self {
        Self {
            handoff,
            credentials,
            detector,
            api,
            page,
            navigator,
            clipboard,
            notices,
            settle_delay: delivery.settle_delay(),
            new_workflow_path: target.new_workflow_path.clone(),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Deliver an artifact through the strategy chain.
    ///
    /// Calls for an artifact already in flight return
    /// [`DeliveryReport::Busy`] immediately instead of issuing a duplicate.
    pub async fn deliver(&self, artifact: &Artifact) -> DeliveryReport {
        let fingerprint = artifact.fingerprint();
        if !self.in_flight.lock().insert(fingerprint.clone()) {
            tracing::debug!(%fingerprint, "delivery already in flight for this artifact");
            return DeliveryReport::Busy;
        }

        let report = self.run_chain(artifact).await;
        self.in_flight.lock().remove(&fingerprint);
        report
    }

    async fn run_chain(&self, artifact: &Artifact) -> DeliveryReport {
        let serialized = match artifact.to_json() {
            Ok(serialized) => serialized,
            Err(e) => {
                let error = DeliveryError::from(e);
                self.notify_terminal(&error);
                return DeliveryReport::Failed {
                    error,
                    serialized: None,
                };
            }
        };

        // Derived fresh every call; the page may have navigated since the
        // last delivery.
        let context = self.detector.detect(&self.navigator.current_url());
        if context.is_none() {
            tracing::debug!("no target base address detected from this page");
        }

        let credential = match self.credentials.get().await {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!(error = %e, "credential read failed, continuing without one");
                None
            }
        };

        for strategy in Strategy::CHAIN {
            let outcome = self
                .attempt(
                    strategy,
                    artifact,
                    &serialized,
                    context.as_ref(),
                    credential.as_ref(),
                )
                .await;

            match outcome {
                StrategyOutcome::Delivered => {
                    tracing::info!(strategy = %strategy, "artifact delivered");
                    return DeliveryReport::Delivered { strategy };
                }
                StrategyOutcome::Skipped { reason } => {
                    tracing::debug!(strategy = %strategy, reason, "strategy skipped");
                }
                StrategyOutcome::Failed { reason } => {
                    tracing::warn!(strategy = %strategy, reason = %reason, "strategy failed");
                }
                StrategyOutcome::Halt { error } => {
                    self.notify_terminal(&error);
                    return DeliveryReport::Failed {
                        error,
                        serialized: None,
                    };
                }
            }
        }

        // Even the clipboard was unavailable; the caller shows the raw
        // text so the user can copy it by hand.
        let error = DeliveryError::ClipboardUnavailable;
        self.notify_terminal(&error);
        DeliveryReport::Failed {
            error,
            serialized: Some(serialized),
        }
    }

    async fn attempt(
        &self,
        strategy: Strategy,
        artifact: &Artifact,
        serialized: &str,
        context: Option<&TargetContext>,
        credential: Option<&ApiCredential>,
    ) -> StrategyOutcome {
        match strategy {
            Strategy::Api => self.attempt_api(artifact, context, credential).await,
            Strategy::Redirect => self.attempt_redirect(artifact, context).await,
            Strategy::Dom => self.attempt_dom(serialized).await,
            Strategy::Clipboard => self.attempt_clipboard(serialized),
        }
    }

    async fn attempt_api(
        &self,
        artifact: &Artifact,
        context: Option<&TargetContext>,
        credential: Option<&ApiCredential>,
    ) -> StrategyOutcome {
        let Some(context) = context else {
            return StrategyOutcome::Skipped {
                reason: "no target base address",
            };
        };

        match self
            .api
            .create_workflow(&context.base_url, artifact, credential)
            .await
        {
            Ok(CreateOutcome::Created { id }) => {
                if id.is_some() {
                    // The created workflow will be opened after a
                    // navigation; arrange for the panel to come back.
                    if let Err(e) = self.handoff.mark_reopen().await {
                        tracing::debug!(error = %e, "failed to set reopen marker");
                    }
                }
                StrategyOutcome::Delivered
            }
            Ok(CreateOutcome::Unauthorized) => {
                let error = if credential.is_none() {
                    DeliveryError::CredentialMissing
                } else {
                    DeliveryError::CredentialRejected
                };
                StrategyOutcome::Halt { error }
            }
            Ok(CreateOutcome::Forbidden) => StrategyOutcome::Halt {
                error: DeliveryError::RemoteForbidden,
            },
            Ok(CreateOutcome::Rejected { status }) => StrategyOutcome::Failed {
                reason: format!("target returned status {status}"),
            },
            Err(e) => StrategyOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    async fn attempt_redirect(
        &self,
        artifact: &Artifact,
        context: Option<&TargetContext>,
    ) -> StrategyOutcome {
        let Some(context) = context else {
            return StrategyOutcome::Skipped {
                reason: "no target base address",
            };
        };

        if !self.navigator.on_target_application() {
            return StrategyOutcome::Skipped {
                reason: "not on the target application",
            };
        }

        // The handoff must be durable before the navigation wipes this
        // context; a stash that cannot be verified means no redirect.
        if let Err(e) = self.handoff.stash_artifact(artifact).await {
            return StrategyOutcome::Failed {
                reason: format!("artifact handoff failed: {e}"),
            };
        }
        if let Err(e) = self.handoff.mark_reopen().await {
            tracing::debug!(error = %e, "failed to set reopen marker");
        }

        let destination = format!("{}{}", context.base_url, self.new_workflow_path);
        tracing::info!(%destination, "redirecting into the target application");
        self.navigator.navigate(&destination);

        // Navigation issued counts as delivered; the bootstrap that runs
        // after the page loads consumes the stashed artifact.
        StrategyOutcome::Delivered
    }

    async fn attempt_dom(&self, serialized: &str) -> StrategyOutcome {
        if !self.page.activate_import_control().await {
            return StrategyOutcome::Failed {
                reason: "no import control found on the page".to_string(),
            };
        }

        // Let the host page react to the click before writing.
        tokio::time::sleep(self.settle_delay).await;

        if !self.page.fill_paste_surface(serialized).await {
            return StrategyOutcome::Failed {
                reason: "no paste surface found on the page".to_string(),
            };
        }

        StrategyOutcome::Delivered
    }

    fn attempt_clipboard(&self, serialized: &str) -> StrategyOutcome {
        if self.clipboard.copy(serialized) {
            StrategyOutcome::Delivered
        } else {
            StrategyOutcome::Failed {
                reason: "clipboard unavailable".to_string(),
            }
        }
    }

    /// Exactly one user notice per terminal failure.
    fn notify_terminal(&self, error: &DeliveryError) {
        let notice = match error {
            DeliveryError::CredentialMissing => Notice::CredentialRequired,
            DeliveryError::CredentialRejected => Notice::CredentialRejected,
            DeliveryError::RemoteForbidden => Notice::AccessDenied,
            other => Notice::DeliveryFailed {
                reason: other.to_string(),
            },
        };
        self.notices.notify(notice);
    }
}

impl std::fmt::Debug for InjectionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectionOrchestrator")
            .field("in_flight", &self.in_flight.lock().len())
            .finish_non_exhaustive()
    }
}

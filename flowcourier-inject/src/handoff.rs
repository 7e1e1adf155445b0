//! Artifact handoff across a navigation boundary.
//!
//! The redirect strategy persists the artifact before navigating; the
//! post-navigation bootstrap consumes it with [`take_pending_artifact`],
//! which deletes the slot so a handoff is picked up at most once.
//!
//! [`take_pending_artifact`]: HandoffSlots::take_pending_artifact

use std::sync::Arc;

use flowcourier_core::keys;
use flowcourier_core::model::Artifact;
use flowcourier_core::store::{DualStore, Secret};

use crate::error::DeliveryError;

/// The handoff and reopen slots, shared with the bootstrap routine.
#[derive(Debug, Clone)]
pub struct HandoffSlots {
    store: Arc<DualStore>,
}

impl HandoffSlots {
    /// Create handoff slots over the shared store.
    pub fn new(store: Arc<DualStore>) -> Self {
        Self { store }
    }

    /// Persist the artifact for pickup after navigation.
    pub async fn stash_artifact(&self, artifact: &Artifact) -> Result<(), DeliveryError> {
        let serialized = artifact.to_json()?;
        self.store
            .set(keys::PENDING_ARTIFACT, &Secret::new(serialized))
            .await?;
        Ok(())
    }

    /// Mark that the side panel should reopen once the page settles.
    pub async fn mark_reopen(&self) -> Result<(), DeliveryError> {
        self.store.set(keys::REOPEN_PANEL, &Secret::new("1")).await?;
        Ok(())
    }

    /// Consume the pending artifact, if one is stashed.
    ///
    /// The slot is deleted before the artifact is returned; an unparsable
    /// stash is deleted too and reported, so it cannot wedge the slot.
    pub async fn take_pending_artifact(&self) -> Result<Option<Artifact>, DeliveryError> {
        let raw = match self.store.get(keys::PENDING_ARTIFACT).await? {
            Some(secret) => secret,
            None => return Ok(None),
        };

        self.store.remove(keys::PENDING_ARTIFACT).await?;

        match Artifact::from_json(raw.expose()) {
            Ok(artifact) => Ok(Some(artifact)),
            Err(e) => {
                tracing::warn!(error = %e, "stashed artifact did not parse, dropping it");
                Err(e.into())
            }
        }
    }

    /// Consume the reopen flag. Returns whether it was set.
    pub async fn take_reopen_flag(&self) -> bool {
        let set = matches!(self.store.get(keys::REOPEN_PANEL).await, Ok(Some(_)));
        if set {
            let _ = self.store.remove(keys::REOPEN_PANEL).await;
        }
        set
    }

    /// Clear both slots.
    pub async fn clear(&self) -> Result<(), DeliveryError> {
        self.store.remove(keys::PENDING_ARTIFACT).await?;
        self.store.remove(keys::REOPEN_PANEL).await?;
        Ok(())
    }
}

//! Logical storage slot names.
//!
//! Slots are backend-agnostic: every name resolves through the same
//! [`DualStore`](crate::store::DualStore) regardless of which physical
//! backend ends up holding the value.

/// The target application API credential.
pub const CREDENTIAL: &str = "flowcourier/credential";

/// The persisted identity session snapshot.
pub const SESSION: &str = "flowcourier/session";

/// A serialized artifact awaiting pickup after a page navigation.
pub const PENDING_ARTIFACT: &str = "flowcourier/pending-artifact";

/// Flag telling the post-navigation bootstrap to reopen the side panel.
pub const REOPEN_PANEL: &str = "flowcourier/reopen-panel";

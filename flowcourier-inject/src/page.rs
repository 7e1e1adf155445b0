//! Capability traits over the live page.
//!
//! The orchestrator never touches the host page directly; the embedding
//! host implements these narrow interfaces, so the page heuristics can be
//! swapped without touching the delivery chain.

use async_trait::async_trait;

/// In-page injection surface.
///
/// Implementations encapsulate the selector heuristics for the target
/// application's markup.
#[async_trait]
pub trait PageSurface: Send + Sync {
    /// Find and activate an import affordance on the current page.
    ///
    /// Returns `false` when no import control can be located.
    async fn activate_import_control(&self) -> bool;

    /// Write the serialized artifact into a paste surface, dispatching the
    /// synthetic input/change events the host framework listens for.
    ///
    /// Returns `false` when no paste surface can be located.
    async fn fill_paste_surface(&self, serialized: &str) -> bool;
}

/// Page location and navigation.
pub trait Navigator: Send + Sync {
    /// The address of the page the extension currently lives in.
    fn current_url(&self) -> String;

    /// Whether the current page is the target application itself, as judged
    /// by the host's page heuristics.
    fn on_target_application(&self) -> bool;

    /// Navigate the page. Everything in flight for this tab dies with the
    /// navigation; callers must persist state first.
    fn navigate(&self, url: &str);
}

/// System clipboard access.
pub trait ClipboardAccess: Send + Sync {
    /// Copy text to the clipboard.
    ///
    /// Implementations try the asynchronous clipboard API first and fall
    /// back to a hidden-textarea copy where it is unavailable. Returns
    /// `false` only when both paths fail.
    fn copy(&self, text: &str) -> bool;
}

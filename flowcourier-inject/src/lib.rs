//! # Flowcourier Inject
//!
//! Target detection and multi-strategy artifact delivery.
//!
//! This crate provides:
//! - [`TargetDetector`] - derives the target application's base address
//!   from the current page location
//! - [`WorkflowApiClient`] - the target application's administrative API
//! - Capability traits ([`PageSurface`], [`Navigator`], [`ClipboardAccess`])
//!   the embedding host implements against the live page
//! - [`HandoffSlots`] - artifact handoff across a navigation boundary
//! - [`InjectionOrchestrator`] - the ordered delivery chain
//!   (direct API → redirect-and-resume → in-page injection → clipboard)
//!
//! ## Delivery
//!
//! ```rust,ignore
//! let report = orchestrator.deliver(&artifact).await;
//! match report {
//!     DeliveryReport::Delivered { strategy } => { /* toast success */ }
//!     DeliveryReport::Busy => { /* ignore the double-click */ }
//!     DeliveryReport::Failed { error, serialized } => { /* render error */ }
//! }
//! ```

pub mod api_client;
pub mod error;
pub mod handoff;
pub mod orchestrator;
pub mod page;
pub mod target;

// Re-export commonly used types at crate root
pub use api_client::{
    CreateOutcome,
    WorkflowApiClient,
};

pub use error::DeliveryError;

pub use handoff::HandoffSlots;

pub use orchestrator::{
    DeliveryReport,
    InjectionOrchestrator,
    Strategy,
};

pub use page::{
    ClipboardAccess,
    Navigator,
    PageSurface,
};

pub use target::{
    TargetContext,
    TargetDetector,
};

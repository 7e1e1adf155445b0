//! # Flowcourier Core
//!
//! Core library for the Flowcourier delivery engine.
//!
//! This crate provides:
//! - The workflow [`model::Artifact`] handed over by the generation layer
//! - A [`store::Secret`] wrapper and storage backends, including the
//!   dual-backend [`store::DualStore`] used by every manager
//! - Logical storage slot names shared across components
//! - The user-notice channel the embedding host renders
//! - Configuration loading and the logging bootstrap
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use flowcourier_core::store::{DualStore, FileStore, MemoryStore};
//!
//! let primary = FileStore::open_default()?;
//! let store = Arc::new(DualStore::new(
//!     Box::new(primary),
//!     Box::new(MemoryStore::new()),
//! ));
//! ```

pub mod config;
pub mod keys;
pub mod logging;
pub mod model;
pub mod notice;
pub mod store;

// Re-export commonly used types at crate root
pub use model::{
    Artifact,
    ArtifactError,
    Node,
};

pub use store::{
    DualStore,
    FileStore,
    MemoryStore,
    Secret,
    StorageBackend,
    StoreError,
};

pub use notice::{
    Notice,
    NoticeSink,
    TracingNoticeSink,
};

pub use config::{
    CourierConfig,
    DeliveryConfig,
    IdentityConfig,
    TargetConfig,
    load_config,
};

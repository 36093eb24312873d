//! Synchronization layer keeping one authoritative bracket state
//! consistent between a mutating manager view and read-only polling
//! viewers.
//!
//! The [`BracketManager`] is the single logical writer: it applies
//! mutations to the in-memory tree and follows every successful one with
//! an unconditional full-state write to the store. [`BracketViewer`]s
//! re-fetch the stored state on a fixed interval and publish snapshots to
//! their subscribers.

pub mod manager;
pub mod viewer;

pub use manager::{BracketManager, BracketStage, SyncError, SyncResult};
pub use viewer::{BracketSnapshot, BracketViewer, DEFAULT_POLL_INTERVAL, ViewerHandle};

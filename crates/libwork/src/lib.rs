#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
//! Core library for parking uncommitted work on a disposable checkpoint branch.
//!
//! A repository is either *clean* (no checkpoint branch, not tracked) or
//! *parked* (a `work-end-checkpoint` branch holds a snapshot commit of the
//! work that was uncommitted when work ended, and its path is recorded in the
//! tracking store). [`Checkpointer`] drives the transitions between the two
//! states through a [`Vcs`] collaborator and keeps a [`TrackingStore`] in
//! sync. The `work` binary in `crates/work` builds on top of this library.

/// Checkpoint lifecycle orchestration.
mod checkpoint;
/// Layered configuration loading.
mod config;
/// Error taxonomy.
mod error;
/// Helper routines for interacting with Git repositories.
mod git;
/// Persisted set of repositories with outstanding checkpoints.
mod store;
/// Target selection for multi-repository runs.
mod targets;
/// Structured outcomes returned by lifecycle operations.
mod types;
/// The version-control collaborator interface.
mod vcs;

pub use checkpoint::{CHECKPOINT_BRANCH, CHECKPOINT_MESSAGE, Checkpointer};
pub use config::{
    DEFAULT_PRIMARY_BRANCH, DEFAULT_REMOTE, DEFAULT_TRACKING_FILE, FileConfig, Settings,
    SettingsOverrides, expand_tilde,
};
pub use error::{Result, WorkError};
pub use git::Git;
pub use store::{FileStore, MemoryStore, TrackingStore};
pub use targets::{ALL_TARGETS, CURRENT_DIR_TARGET, resolve_targets};
pub use types::{
    Batch, BeginBatch, BeginOutcome, EndBatch, EndOutcome, PublishOutcome, RemoteCleanup,
    TargetReport, TrackedEntry, TrackedState, TrackingChange,
};
pub use vcs::Vcs;

use std::path::{Path, PathBuf};

use crate::error::{Result, WorkError};

/// Result of publishing the checkpoint branch to a remote.
#[derive(Debug)]
pub enum PublishOutcome {
    /// The branch was pushed.
    Pushed {
        /// Remote the branch was pushed to.
        remote: String,
        /// Whether `--force` was used.
        forced: bool,
    },
    /// The remote is not configured; the push was skipped.
    RemoteMissing {
        /// Name of the missing remote.
        remote: String,
    },
    /// The push failed. The local checkpoint is unaffected.
    Failed {
        /// Remote the push targeted.
        remote: String,
        /// Why the push failed.
        error: WorkError,
    },
}

/// Result of removing the checkpoint branch from a remote after a restore.
#[derive(Debug)]
pub enum RemoteCleanup {
    /// The remote branch was deleted.
    Deleted {
        /// Remote the branch was deleted from.
        remote: String,
    },
    /// The remote is not configured; nothing was deleted.
    RemoteMissing {
        /// Name of the missing remote.
        remote: String,
    },
    /// The delete failed, e.g. because the branch was never pushed.
    Failed {
        /// Remote the delete targeted.
        remote: String,
        /// Why the delete failed.
        error: WorkError,
    },
}

/// What happened to a repository's entry in the tracking store.
///
/// A store failure only affects the store step. The VCS steps before it
/// stand and the steps after it still run.
#[derive(Debug)]
pub enum TrackingChange {
    /// The entry was added or removed.
    Changed,
    /// The store already agreed with the repository; nothing was written.
    Unchanged,
    /// The store could not be updated.
    Failed(WorkError),
}

impl TrackingChange {
    /// Whether the store was written.
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed)
    }
}

impl From<Result<bool>> for TrackingChange {
    fn from(result: Result<bool>) -> Self {
        match result {
            Ok(true) => Self::Changed,
            Ok(false) => Self::Unchanged,
            Err(err) => Self::Failed(err),
        }
    }
}

/// Outcome of beginning work in a repository.
#[derive(Debug)]
pub enum BeginOutcome {
    /// No checkpoint branch exists; nothing was changed.
    NoCheckpointFound,
    /// The checkpoint was unwound onto the primary branch.
    Restored {
        /// Primary branch now checked out.
        primary: String,
        /// Commit the primary branch points at.
        commit: String,
        /// Removal of the repository from the tracking store.
        tracking: TrackingChange,
        /// What happened to the remote copy of the checkpoint branch.
        remote: RemoteCleanup,
        /// Working-tree status after the restore, when it could be read.
        status: Option<String>,
    },
}

/// Outcome of ending work in a repository.
#[derive(Debug)]
pub enum EndOutcome {
    /// The working tree was clean; no checkpoint was created.
    NothingToCheckpoint,
    /// Uncommitted work was committed to the checkpoint branch.
    Checkpointed {
        /// Id of the checkpoint commit, when it could be resolved.
        commit: Option<String>,
        /// Result of publishing the checkpoint branch.
        publish: PublishOutcome,
        /// Addition of the repository to the tracking store.
        tracking: TrackingChange,
    },
}

/// Per-repository result within a batch run.
#[derive(Debug)]
pub struct TargetReport<T> {
    /// Repository the operation ran against.
    pub repo: PathBuf,
    /// What happened.
    pub result: Result<T>,
}

impl<T> TargetReport<T> {
    /// Short display name for the repository (its directory name).
    pub fn project_name(&self) -> String {
        project_name(&self.repo)
    }
}

/// Ordered per-repository results of a multi-repository run. One target's
/// failure never stops the targets after it.
#[derive(Debug)]
pub struct Batch<T> {
    /// Results in processing order.
    pub results: Vec<TargetReport<T>>,
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
        }
    }
}

impl<T> Batch<T> {
    /// Whether no targets were processed.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of targets that failed.
    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| r.result.is_err()).count()
    }

    /// Whether any target failed a precondition.
    pub fn has_precondition_failure(&self) -> bool {
        self.results
            .iter()
            .any(|r| matches!(&r.result, Err(err) if err.is_precondition()))
    }
}

/// Batch produced by beginning work across several repositories.
pub type BeginBatch = Batch<BeginOutcome>;
/// Batch produced by ending work across several repositories.
pub type EndBatch = Batch<EndOutcome>;

/// Consistency of a tracked repository with its checkpoint branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedState {
    /// The checkpoint branch exists.
    Parked,
    /// Tracked, but the checkpoint branch is gone.
    MissingCheckpoint,
    /// Tracked, but the path is no longer a repository root.
    NotARepository,
    /// The repository's branches could not be inspected.
    Unreadable,
}

/// A tracked repository together with its checkpoint state.
#[derive(Debug, Clone)]
pub struct TrackedEntry {
    /// Tracked repository path.
    pub repo: PathBuf,
    /// Whether the entry agrees with the repository.
    pub state: TrackedState,
}

/// Directory name of a repository path, falling back to the full path.
pub(crate) fn project_name(repo: &Path) -> String {
    repo.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| repo.display().to_string())
}

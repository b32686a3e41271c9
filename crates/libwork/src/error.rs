use std::{io, path::PathBuf, result::Result as StdResult};

use thiserror::Error;

/// Custom Result type for work operations.
pub type Result<T> = StdResult<T, WorkError>;

/// Failures raised while moving a repository between the clean and parked
/// states.
#[derive(Error, Debug)]
pub enum WorkError {
    /// The target path is not the toplevel of a working tree.
    #[error("{} is not the root directory of a git repository", path.display())]
    NotARepositoryRoot {
        /// The path that failed the toplevel check.
        path: PathBuf,
    },

    /// An underlying version-control primitive failed.
    #[error("{step} failed: {message}")]
    VcsCommandFailed {
        /// Name of the step that failed, e.g. `checkout work-end-checkpoint`.
        step: String,
        /// Human-readable error description.
        message: String,
    },

    /// The primary branch has commits the checkpoint branch does not contain.
    #[error(
        "{primary} has moved past the checkpoint base; restoring would undo its new commits"
    )]
    CheckpointDiverged {
        /// Name of the primary branch.
        primary: String,
    },

    /// The tracking store could not be read or written.
    #[error("tracking store {}: {message}", path.display())]
    TrackingStore {
        /// Location of the persisted store.
        path: PathBuf,
        /// Human-readable error description.
        message: String,
    },

    /// Settings could not be loaded.
    #[error("Config error: {0}")]
    Config(String),

    /// An underlying I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl WorkError {
    /// Return the recommended process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotARepositoryRoot { .. } => 2,
            Self::Config(_) => 3,
            Self::TrackingStore { .. } => 4,
            _ => 1,
        }
    }

    /// Whether this error is a failed precondition rather than a failed step.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::NotARepositoryRoot { .. })
    }
}

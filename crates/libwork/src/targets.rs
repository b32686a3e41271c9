use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    error::{Result, WorkError},
    store::TrackingStore,
    vcs::Vcs,
};

/// Target argument selecting exactly the current directory.
pub const CURRENT_DIR_TARGET: &str = ".";
/// Default target argument selecting every tracked repository.
pub const ALL_TARGETS: &str = "all";

/// Select the repositories an operation should run against.
///
/// - `"."` selects `cwd`, which must itself be a repository root.
/// - A directory that is a repository root selects exactly that directory.
/// - Anything else, including [`ALL_TARGETS`], selects every tracked path.
///
/// Selection never mutates the store or any repository.
pub fn resolve_targets<V, S>(explicit: &str, store: &S, cwd: &Path, vcs: &V) -> Result<Vec<PathBuf>>
where
    V: Vcs + ?Sized,
    S: TrackingStore + ?Sized,
{
    if explicit == CURRENT_DIR_TARGET {
        if !vcs.is_toplevel(cwd) {
            return Err(WorkError::NotARepositoryRoot {
                path: cwd.to_path_buf(),
            });
        }
        return Ok(vec![cwd.to_path_buf()]);
    }

    let candidate = cwd.join(explicit);
    if candidate.is_dir() {
        let candidate = fs::canonicalize(&candidate).unwrap_or(candidate);
        if vcs.is_toplevel(&candidate) {
            return Ok(vec![candidate]);
        }
    }

    if explicit != ALL_TARGETS {
        tracing::info!("{explicit} is not a repository root, selecting all tracked repositories");
    }
    store.list()
}

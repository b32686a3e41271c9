use std::path::{Path, PathBuf};

use crate::error::Result;

/// Branch-level version-control primitives the checkpoint lifecycle is built
/// from.
///
/// Every method may fail. Implementations report failures as
/// [`WorkError::VcsCommandFailed`](crate::WorkError::VcsCommandFailed) naming
/// the step that failed.
pub trait Vcs {
    /// Resolve the toplevel directory of the working tree containing `path`.
    fn resolve_toplevel(&self, path: &Path) -> Result<PathBuf>;
    /// Whether a local branch named `name` exists.
    fn branch_exists(&self, repo: &Path, name: &str) -> Result<bool>;
    /// Whether a remote named `name` is configured.
    fn remote_exists(&self, repo: &Path, name: &str) -> Result<bool>;
    /// Whether the working tree has no staged, unstaged or untracked changes.
    fn is_clean(&self, repo: &Path) -> Result<bool>;
    /// Resolve `reference` to a commit id.
    fn rev_parse(&self, repo: &Path, reference: &str) -> Result<String>;
    /// Whether `ancestor` is reachable from `descendant`.
    fn is_ancestor(&self, repo: &Path, ancestor: &str, descendant: &str) -> Result<bool>;
    /// Switch to `reference`, force-creating it at `HEAD` first when `create`
    /// is set.
    fn checkout(&self, repo: &Path, reference: &str, create: bool) -> Result<()>;
    /// Move the current branch and index to `commit`, keeping the working tree.
    fn reset(&self, repo: &Path, commit: &str) -> Result<()>;
    /// Delete the local branch `name`.
    fn delete_branch(&self, repo: &Path, name: &str) -> Result<()>;
    /// Stage every change in the working tree, including untracked files.
    fn add_all(&self, repo: &Path) -> Result<()>;
    /// Commit the index with `message`.
    fn commit(&self, repo: &Path, message: &str) -> Result<()>;
    /// Push `refspec` to `remote`, adding `--force` when `force` is set.
    fn push(&self, repo: &Path, remote: &str, refspec: &str, force: bool) -> Result<()>;
    /// Human-readable working-tree status, for display only.
    fn status(&self, repo: &Path) -> Result<String>;

    /// Whether `path` is itself the toplevel of a working tree.
    fn is_toplevel(&self, path: &Path) -> bool {
        matches!(self.resolve_toplevel(path), Ok(toplevel) if toplevel == path)
    }
}

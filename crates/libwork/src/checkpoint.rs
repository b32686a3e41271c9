use std::path::{Path, PathBuf};

use crate::{
    error::{Result, WorkError},
    store::TrackingStore,
    targets,
    types::{
        BeginBatch, BeginOutcome, EndBatch, EndOutcome, PublishOutcome, RemoteCleanup,
        TargetReport, TrackedEntry, TrackedState, TrackingChange, project_name,
    },
    vcs::Vcs,
};

/// Name of the disposable branch holding parked work.
pub const CHECKPOINT_BRANCH: &str = "work-end-checkpoint";
/// Message of every checkpoint commit.
pub const CHECKPOINT_MESSAGE: &str = "Work end checkpoint commit";

/// Drives repositories between the clean and parked states.
///
/// Ending work commits everything uncommitted onto [`CHECKPOINT_BRANCH`],
/// optionally publishes it, and records the repository in the tracking store.
/// Beginning work unwinds that commit with a mixed reset onto the primary
/// branch, so the parked changes reappear as uncommitted changes, deletes the
/// branch and drops the repository from the store.
///
/// Neither operation rolls back on failure. A failed VCS step stops the
/// remaining steps for that repository; the store is only updated once every
/// VCS step before it has succeeded. A failed store update is reported in the
/// outcome and the steps after it still run.
pub struct Checkpointer<V, S> {
    /// Version-control collaborator.
    vcs: V,
    /// Bookkeeping of parked repositories.
    store: S,
    /// Long-lived integration branch restores reset onto.
    primary_branch: String,
}

impl<V: Vcs, S: TrackingStore> Checkpointer<V, S> {
    /// Create a new [`Checkpointer`].
    pub fn new(vcs: V, store: S, primary_branch: impl Into<String>) -> Self {
        Self {
            vcs,
            store,
            primary_branch: primary_branch.into(),
        }
    }

    /// The version-control collaborator.
    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    /// The tracking store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Name of the primary branch.
    pub fn primary_branch(&self) -> &str {
        &self.primary_branch
    }

    /// Fail with `NotARepositoryRoot` unless `repo` is a working-tree root.
    fn require_toplevel(&self, repo: &Path) -> Result<()> {
        if self.vcs.is_toplevel(repo) {
            Ok(())
        } else {
            Err(WorkError::NotARepositoryRoot {
                path: repo.to_path_buf(),
            })
        }
    }

    /// Apply one tracking-store mutation, logging a failure instead of
    /// aborting the steps around it.
    fn update_store(
        &self,
        repo: &Path,
        apply: impl FnOnce(&S) -> Result<bool>,
    ) -> TrackingChange {
        let change = TrackingChange::from(apply(&self.store));
        if let TrackingChange::Failed(err) = &change {
            tracing::warn!(repo = %repo.display(), "could not update tracking store: {err}");
        }
        change
    }

    /// Select targets for a run; see [`targets::resolve_targets`].
    pub fn resolve_targets(&self, explicit: &str, cwd: &Path) -> Result<Vec<PathBuf>> {
        targets::resolve_targets(explicit, &self.store, cwd, &self.vcs)
    }

    /// Restore a parked repository onto the tip of the primary branch.
    pub fn begin_work(&self, repo: &Path, remote: &str) -> Result<BeginOutcome> {
        self.require_toplevel(repo)?;

        if !self.vcs.branch_exists(repo, CHECKPOINT_BRANCH)? {
            tracing::info!(repo = %repo.display(), "no checkpoint to restore");
            return Ok(BeginOutcome::NoCheckpointFound);
        }

        let primary = self.primary_branch.as_str();
        let primary_tip = self.vcs.rev_parse(repo, primary)?;
        if !self.vcs.is_ancestor(repo, &primary_tip, CHECKPOINT_BRANCH)? {
            return Err(WorkError::CheckpointDiverged {
                primary: primary.to_string(),
            });
        }

        tracing::info!(repo = %repo.display(), "resetting {CHECKPOINT_BRANCH} to {primary}");
        self.vcs.checkout(repo, CHECKPOINT_BRANCH, false)?;
        self.vcs.reset(repo, &primary_tip)?;
        self.vcs.checkout(repo, primary, false)?;
        self.vcs.delete_branch(repo, CHECKPOINT_BRANCH)?;

        let tracking = self.update_store(repo, |store| store.remove(repo));
        let remote = self.delete_remote_checkpoint(repo, remote);

        let status = match self.vcs.status(repo) {
            Ok(status) => Some(status),
            Err(err) => {
                tracing::warn!(repo = %repo.display(), "could not read status: {err}");
                None
            }
        };

        Ok(BeginOutcome::Restored {
            primary: primary.to_string(),
            commit: primary_tip,
            tracking,
            remote,
            status,
        })
    }

    /// Park the repository's uncommitted work on the checkpoint branch.
    pub fn end_work(&self, repo: &Path, remote: &str, force: bool) -> Result<EndOutcome> {
        self.require_toplevel(repo)?;

        if self.vcs.is_clean(repo)? {
            tracing::info!(repo = %repo.display(), "nothing to checkpoint");
            return Ok(EndOutcome::NothingToCheckpoint);
        }

        tracing::info!(repo = %repo.display(), "committing working tree to {CHECKPOINT_BRANCH}");
        self.vcs.checkout(repo, CHECKPOINT_BRANCH, true)?;
        self.vcs.add_all(repo)?;
        self.vcs.commit(repo, CHECKPOINT_MESSAGE)?;

        let commit = match self.vcs.rev_parse(repo, CHECKPOINT_BRANCH) {
            Ok(commit) => Some(commit),
            Err(err) => {
                tracing::warn!(repo = %repo.display(), "could not resolve checkpoint: {err}");
                None
            }
        };

        let publish = self.publish_checkpoint(repo, remote, force);
        let tracking = self.update_store(repo, |store| store.add(repo));

        Ok(EndOutcome::Checkpointed {
            commit,
            publish,
            tracking,
        })
    }

    /// Push the checkpoint branch to `remote`, overwriting the remote copy.
    ///
    /// Never fails: a missing remote or a rejected push is reported in the
    /// outcome and leaves the local checkpoint authoritative.
    pub fn publish_checkpoint(&self, repo: &Path, remote: &str, force: bool) -> PublishOutcome {
        match self.vcs.remote_exists(repo, remote) {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!(repo = %repo.display(), "remote {remote} missing, skipping push");
                return PublishOutcome::RemoteMissing {
                    remote: remote.to_string(),
                };
            }
            Err(error) => {
                return PublishOutcome::Failed {
                    remote: remote.to_string(),
                    error,
                };
            }
        }

        let refspec = format!("+{CHECKPOINT_BRANCH}");
        match self.vcs.push(repo, remote, &refspec, force) {
            Ok(()) => PublishOutcome::Pushed {
                remote: remote.to_string(),
                forced: force,
            },
            Err(error) => {
                tracing::warn!(repo = %repo.display(), "push to {remote} failed: {error}");
                PublishOutcome::Failed {
                    remote: remote.to_string(),
                    error,
                }
            }
        }
    }

    /// Delete the checkpoint branch from `remote` after a restore.
    fn delete_remote_checkpoint(&self, repo: &Path, remote: &str) -> RemoteCleanup {
        match self.vcs.remote_exists(repo, remote) {
            Ok(true) => {}
            Ok(false) => {
                return RemoteCleanup::RemoteMissing {
                    remote: remote.to_string(),
                };
            }
            Err(error) => {
                return RemoteCleanup::Failed {
                    remote: remote.to_string(),
                    error,
                };
            }
        }

        let refspec = format!(":{CHECKPOINT_BRANCH}");
        match self.vcs.push(repo, remote, &refspec, false) {
            Ok(()) => RemoteCleanup::Deleted {
                remote: remote.to_string(),
            },
            Err(error) => RemoteCleanup::Failed {
                remote: remote.to_string(),
                error,
            },
        }
    }

    /// Begin work in each of `targets`, one after another.
    pub fn begin_all(&self, targets: &[PathBuf], remote: &str) -> BeginBatch {
        let mut batch = BeginBatch::default();
        for repo in targets {
            tracing::debug!("beginning work on {}", project_name(repo));
            batch.results.push(TargetReport {
                repo: repo.clone(),
                result: self.begin_work(repo, remote),
            });
        }
        batch
    }

    /// End work in each of `targets`, one after another.
    pub fn end_all(&self, targets: &[PathBuf], remote: &str, force: bool) -> EndBatch {
        let mut batch = EndBatch::default();
        for repo in targets {
            tracing::debug!("ending work on {}", project_name(repo));
            batch.results.push(TargetReport {
                repo: repo.clone(),
                result: self.end_work(repo, remote, force),
            });
        }
        batch
    }

    /// Every tracked repository with its checkpoint state.
    pub fn tracked(&self) -> Result<Vec<TrackedEntry>> {
        let mut entries = Vec::new();
        for repo in self.store.list()? {
            let state = if self.vcs.is_toplevel(&repo) {
                match self.vcs.branch_exists(&repo, CHECKPOINT_BRANCH) {
                    Ok(true) => TrackedState::Parked,
                    Ok(false) => TrackedState::MissingCheckpoint,
                    Err(err) => {
                        tracing::warn!(repo = %repo.display(), "could not inspect branches: {err}");
                        TrackedState::Unreadable
                    }
                }
            } else {
                TrackedState::NotARepository
            };
            entries.push(TrackedEntry { repo, state });
        }
        Ok(entries)
    }
}

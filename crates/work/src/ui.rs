use std::{path::Path, result::Result as StdResult};

use anyhow::{Context, Result};
use libwork::{
    Batch, BeginOutcome, CHECKPOINT_BRANCH, EndOutcome, PublishOutcome, RemoteCleanup,
    TargetReport, TrackingChange,
};

use crate::output::{Output, OutputError};

/// Emit an output result, attaching context to write failures.
pub fn emit(result: StdResult<(), OutputError>) -> Result<()> {
    result.context("Output operation failed")?;
    Ok(())
}

/// Abbreviate a commit id for display.
fn short_id(commit: &str) -> &str {
    commit.get(..10).unwrap_or(commit)
}

/// Process exit code for a finished batch: non-zero only for failed
/// preconditions.
pub fn batch_exit_code<T>(batch: &Batch<T>) -> i32 {
    if batch.has_precondition_failure() { 2 } else { 0 }
}

/// Render the outcome of beginning work in one repository.
pub fn render_begin_report(output: &dyn Output, report: &TargetReport<BeginOutcome>) -> Result<()> {
    let section = output.section(&format!(
        "Starting work on project: {}",
        report.project_name()
    ));
    let section = section.as_ref();

    match &report.result {
        Err(err) => emit(section.fail(&err.to_string()))?,
        Ok(BeginOutcome::NoCheckpointFound) => emit(section.message(&format!(
            "No {CHECKPOINT_BRANCH} branch found. Nothing to restore."
        )))?,
        Ok(BeginOutcome::Restored {
            primary,
            commit,
            tracking,
            remote,
            status,
        }) => {
            emit(section.success(&format!(
                "Reset to tip of {primary} ({}) and deleted the {CHECKPOINT_BRANCH} branch.",
                short_id(commit)
            )))?;
            render_untracking(section, &report.repo, tracking)?;
            render_remote_cleanup(section, remote)?;
            if let Some(status) = status {
                emit(section.block(status))?;
            }
        }
    }

    Ok(())
}

/// Render the outcome of ending work in one repository.
pub fn render_end_report(output: &dyn Output, report: &TargetReport<EndOutcome>) -> Result<()> {
    let section = output.section(&format!(
        "Ending work on project: {}",
        report.project_name()
    ));
    let section = section.as_ref();

    match &report.result {
        Err(err) => emit(section.fail(&err.to_string()))?,
        Ok(EndOutcome::NothingToCheckpoint) => emit(section.message(
            "Working tree is clean. Nothing to checkpoint.",
        ))?,
        Ok(EndOutcome::Checkpointed {
            commit,
            publish,
            tracking,
        }) => {
            let message = match commit {
                Some(commit) => format!(
                    "Committed working tree to {CHECKPOINT_BRANCH} ({}).",
                    short_id(commit)
                ),
                None => format!("Committed working tree to {CHECKPOINT_BRANCH}."),
            };
            emit(section.success(&message))?;
            render_publish(section, publish)?;
            render_tracking(section, &report.repo, tracking)?;
        }
    }

    Ok(())
}

/// Report the addition of `repo` to the tracking file.
fn render_tracking(output: &dyn Output, repo: &Path, change: &TrackingChange) -> Result<()> {
    let repo = repo.display();
    match change {
        TrackingChange::Changed => {
            emit(output.message(&format!("Added {repo} to the tracking file.")))
        }
        TrackingChange::Unchanged => {
            emit(output.message(&format!("{repo} already in the tracking file.")))
        }
        TrackingChange::Failed(err) => emit(output.warn(&format!(
            "Checkpoint kept, but {repo} could not be added to the tracking file: {err}"
        ))),
    }
}

/// Report the removal of `repo` from the tracking file.
fn render_untracking(output: &dyn Output, repo: &Path, change: &TrackingChange) -> Result<()> {
    let repo = repo.display();
    match change {
        TrackingChange::Changed => {
            emit(output.message(&format!("Removed {repo} from the tracking file.")))
        }
        TrackingChange::Unchanged => {
            emit(output.message(&format!("{repo} not in the tracking file.")))
        }
        TrackingChange::Failed(err) => emit(output.warn(&format!(
            "Work restored, but {repo} could not be removed from the tracking file: {err}"
        ))),
    }
}

/// Report the result of publishing the checkpoint branch.
fn render_publish(output: &dyn Output, publish: &PublishOutcome) -> Result<()> {
    match publish {
        PublishOutcome::Pushed { remote, forced } => {
            let mode = if *forced { " (forced)" } else { "" };
            emit(output.success(&format!(
                "Pushed {CHECKPOINT_BRANCH} to {remote} remote{mode}."
            )))
        }
        PublishOutcome::RemoteMissing { remote } => emit(output.warn(&format!(
            "The remote \"{remote}\" doesn't exist. Skipping push."
        ))),
        PublishOutcome::Failed { remote, error } => {
            emit(output.warn(&format!("Push to {remote} failed: {error}")))
        }
    }
}

/// Report what happened to the remote copy of the checkpoint branch.
fn render_remote_cleanup(output: &dyn Output, cleanup: &RemoteCleanup) -> Result<()> {
    match cleanup {
        RemoteCleanup::Deleted { remote } => emit(output.message(&format!(
            "Deleted {CHECKPOINT_BRANCH} from {remote} remote."
        ))),
        RemoteCleanup::RemoteMissing { remote } => emit(output.warn(&format!(
            "The remote \"{remote}\" doesn't exist. Skipping remote branch delete."
        ))),
        RemoteCleanup::Failed { remote, error } => emit(output.warn(&format!(
            "Could not delete {CHECKPOINT_BRANCH} from {remote}: {error}"
        ))),
    }
}

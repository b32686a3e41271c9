use std::path::Path;

use anyhow::Result;
use libwork::{Checkpointer, TrackingStore, Vcs};

use crate::{
    output::Output,
    ui::{batch_exit_code, emit, render_end_report},
};

/// Where and how `work end` publishes checkpoints.
pub struct Publish<'a> {
    /// Remote checkpoints are pushed to.
    pub remote: &'a str,
    /// Whether pushes overwrite the remote branch.
    pub force: bool,
}

/// Run the `work end` command logic, returning the process exit code.
pub fn end<V: Vcs, S: TrackingStore>(
    work: &Checkpointer<V, S>,
    output: &dyn Output,
    repository: &str,
    publish: &Publish<'_>,
    cwd: &Path,
) -> Result<i32> {
    let targets = work.resolve_targets(repository, cwd)?;
    if targets.is_empty() {
        emit(output.message("No tracked repositories to checkpoint."))?;
        return Ok(0);
    }

    let batch = work.end_all(&targets, publish.remote, publish.force);
    if batch.results.len() > 1 {
        tracing::info!(
            targets = batch.results.len(),
            failures = batch.failure_count(),
            "finished ending work"
        );
    }
    for report in &batch.results {
        render_end_report(output, report)?;
    }

    Ok(batch_exit_code(&batch))
}

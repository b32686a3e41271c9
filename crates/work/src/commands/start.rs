use std::path::Path;

use anyhow::Result;
use libwork::{Checkpointer, TrackingStore, Vcs};

use crate::{
    output::Output,
    ui::{batch_exit_code, emit, render_begin_report},
};

/// Run the `work start` command logic, returning the process exit code.
pub fn start<V: Vcs, S: TrackingStore>(
    work: &Checkpointer<V, S>,
    output: &dyn Output,
    repository: &str,
    remote: &str,
    cwd: &Path,
) -> Result<i32> {
    let targets = work.resolve_targets(repository, cwd)?;
    if targets.is_empty() {
        emit(output.message("No tracked repositories to restore."))?;
        return Ok(0);
    }

    let batch = work.begin_all(&targets, remote);
    for report in &batch.results {
        render_begin_report(output, report)?;
    }

    Ok(batch_exit_code(&batch))
}

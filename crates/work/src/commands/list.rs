use anyhow::Result;
use libwork::{Checkpointer, TrackedEntry, TrackedState, TrackingStore, Vcs};

use crate::{output::Output, ui::emit};

/// Run the `work list` command logic.
pub fn list<V: Vcs, S: TrackingStore>(work: &Checkpointer<V, S>, output: &dyn Output) -> Result<()> {
    let entries = work.tracked()?;
    if entries.is_empty() {
        emit(output.message("No parked repositories."))?;
        return Ok(());
    }

    for entry in &entries {
        render_tracked_entry(output, entry)?;
    }

    Ok(())
}

/// Render one tracked repository.
fn render_tracked_entry(output: &dyn Output, entry: &TrackedEntry) -> Result<()> {
    let path = entry.repo.display().to_string();
    match entry.state {
        TrackedState::Parked => emit(output.item(&path, "parked")),
        TrackedState::MissingCheckpoint => {
            emit(output.warn(&format!("{path}: tracked, but no checkpoint branch")))
        }
        TrackedState::NotARepository => {
            emit(output.warn(&format!("{path}: no longer a repository root")))
        }
        TrackedState::Unreadable => {
            emit(output.fail(&format!("{path}: could not read checkpoint state")))
        }
    }
}

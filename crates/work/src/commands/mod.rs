//! Subcommand implementations for the `work` binary.

/// `work end` command.
mod end;
/// `work list` command.
mod list;
/// `work start` command.
mod start;

pub use end::{Publish, end};
pub use list::list;
pub use start::start;

use std::{
    path::{Path, PathBuf},
    process::{Command, Output},
};

use anyhow::{Context, Result};

use crate::{error::WorkError, vcs::Vcs};

/// Run a git command with the given arguments in the specified directory.
/// Returns the output if successful, otherwise returns an error with the full command details.
fn run_git(repo_path: &Path, args: &[&str]) -> Result<Output> {
    tracing::debug!(repo = %repo_path.display(), "git {}", args.join(" "));
    let output = Command::new("git")
        .current_dir(repo_path)
        .args(args)
        .output()
        .with_context(|| format!("Failed to execute git command: git {}", args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let command = format!("git {}", args.join(" "));
        anyhow::bail!("Git command failed: {}\nError: {}", command, stderr.trim());
    }

    Ok(output)
}

/// Run a git command and return its trimmed standard output.
fn git_stdout(repo_path: &Path, args: &[&str]) -> Result<String> {
    let output = run_git(repo_path, args)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Return the toplevel of the working tree containing `path`.
pub fn show_toplevel(path: &Path) -> Result<PathBuf> {
    let toplevel = git_stdout(path, &["rev-parse", "--show-toplevel"])?;
    Ok(PathBuf::from(toplevel))
}

/// Check whether the repository has staged or unstaged changes.
pub fn has_uncommitted_changes(repo_path: &Path) -> Result<bool> {
    let output = run_git(repo_path, &["status", "--porcelain"])?;
    let status_output = String::from_utf8_lossy(&output.stdout);
    Ok(!status_output.trim().is_empty())
}

/// Determine if a branch named `branch_name` exists in the repository.
pub fn has_branch(repo_path: &Path, branch_name: &str) -> Result<bool> {
    let output = run_git(repo_path, &["branch", "--list", branch_name])?;
    let branch_output = String::from_utf8_lossy(&output.stdout);
    Ok(!branch_output.trim().is_empty())
}

/// Determine if a remote named `remote` is configured for the repository.
pub fn has_remote(repo_path: &Path, remote: &str) -> Result<bool> {
    let output = git_stdout(repo_path, &["remote"])?;
    Ok(output.lines().any(|line| line.trim() == remote))
}

/// Resolve `reference` to a full commit hash.
pub fn rev_parse(repo_path: &Path, reference: &str) -> Result<String> {
    let spec = format!("{reference}^{{commit}}");
    git_stdout(repo_path, &["rev-parse", "--verify", "--quiet", &spec])
        .with_context(|| format!("Unknown revision '{reference}'"))
}

/// Check whether `ancestor` is an ancestor of (or equal to) `descendant`.
pub fn is_ancestor(repo_path: &Path, ancestor: &str, descendant: &str) -> Result<bool> {
    let args = ["merge-base", "--is-ancestor", ancestor, descendant];
    tracing::debug!(repo = %repo_path.display(), "git {}", args.join(" "));
    let output = Command::new("git")
        .current_dir(repo_path)
        .args(args)
        .output()
        .with_context(|| format!("Failed to execute git command: git {}", args.join(" ")))?;

    // Exit code 1 means "not an ancestor"; anything else non-zero is an error.
    match output.status.code() {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        Some(_) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "Git command failed: git {}\nError: {}",
                args.join(" "),
                stderr.trim()
            )
        }
        None => anyhow::bail!("Git command terminated by signal: git {}", args.join(" ")),
    }
}

/// Switch to `reference`, force-creating it at `HEAD` when `create` is set.
pub fn checkout(repo_path: &Path, reference: &str, create: bool) -> Result<()> {
    let mut args = vec!["checkout", "--quiet"];
    if create {
        args.push("-B");
    }
    args.push(reference);
    run_git(repo_path, &args)?;
    Ok(())
}

/// Mixed reset of the current branch to `commit`.
pub fn reset(repo_path: &Path, commit: &str) -> Result<()> {
    run_git(repo_path, &["reset", "--quiet", "--mixed", commit])?;
    Ok(())
}

/// Delete the fully merged branch named `branch_name`.
pub fn delete_branch(repo_path: &Path, branch_name: &str) -> Result<()> {
    run_git(repo_path, &["branch", "--delete", branch_name])?;
    Ok(())
}

/// Stage all tracked and untracked changes in the repository.
pub fn add_all(repo_path: &Path) -> Result<()> {
    run_git(repo_path, &["add", "--all", "."])?;
    Ok(())
}

/// Create a commit with the provided `message`.
pub fn commit(repo_path: &Path, message: &str) -> Result<()> {
    run_git(repo_path, &["commit", "--quiet", "-m", message])?;
    Ok(())
}

/// Push `refspec` to `remote`.
pub fn push(repo_path: &Path, remote: &str, refspec: &str, force: bool) -> Result<()> {
    let mut args = vec!["push", "--quiet", remote, refspec];
    if force {
        args.push("--force");
    }
    run_git(repo_path, &args)?;
    Ok(())
}

/// Return the long-form `git status` text.
pub fn status(repo_path: &Path) -> Result<String> {
    let output = run_git(repo_path, &["-c", "color.status=never", "status"])?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Map an error from a git helper into a `WorkError::VcsCommandFailed`.
fn step_error(step: impl Into<String>) -> impl FnOnce(anyhow::Error) -> WorkError {
    move |error| WorkError::VcsCommandFailed {
        step: step.into(),
        message: format!("{error:#}"),
    }
}

/// [`Vcs`] implementation that shells out to the `git` binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct Git;

impl Vcs for Git {
    fn resolve_toplevel(&self, path: &Path) -> crate::Result<PathBuf> {
        show_toplevel(path).map_err(step_error("rev-parse --show-toplevel"))
    }

    fn branch_exists(&self, repo: &Path, name: &str) -> crate::Result<bool> {
        has_branch(repo, name).map_err(step_error(format!("branch --list {name}")))
    }

    fn remote_exists(&self, repo: &Path, name: &str) -> crate::Result<bool> {
        has_remote(repo, name).map_err(step_error("remote"))
    }

    fn is_clean(&self, repo: &Path) -> crate::Result<bool> {
        has_uncommitted_changes(repo)
            .map(|dirty| !dirty)
            .map_err(step_error("status --porcelain"))
    }

    fn rev_parse(&self, repo: &Path, reference: &str) -> crate::Result<String> {
        rev_parse(repo, reference).map_err(step_error(format!("rev-parse {reference}")))
    }

    fn is_ancestor(&self, repo: &Path, ancestor: &str, descendant: &str) -> crate::Result<bool> {
        is_ancestor(repo, ancestor, descendant).map_err(step_error(format!(
            "merge-base --is-ancestor {ancestor} {descendant}"
        )))
    }

    fn checkout(&self, repo: &Path, reference: &str, create: bool) -> crate::Result<()> {
        let step = if create {
            format!("checkout -B {reference}")
        } else {
            format!("checkout {reference}")
        };
        checkout(repo, reference, create).map_err(step_error(step))
    }

    fn reset(&self, repo: &Path, commit: &str) -> crate::Result<()> {
        reset(repo, commit).map_err(step_error(format!("reset {commit}")))
    }

    fn delete_branch(&self, repo: &Path, name: &str) -> crate::Result<()> {
        delete_branch(repo, name).map_err(step_error(format!("branch --delete {name}")))
    }

    fn add_all(&self, repo: &Path) -> crate::Result<()> {
        add_all(repo).map_err(step_error("add"))
    }

    fn commit(&self, repo: &Path, message: &str) -> crate::Result<()> {
        commit(repo, message).map_err(step_error("commit"))
    }

    fn push(&self, repo: &Path, remote: &str, refspec: &str, force: bool) -> crate::Result<()> {
        push(repo, remote, refspec, force).map_err(step_error(format!("push {remote} {refspec}")))
    }

    fn status(&self, repo: &Path) -> crate::Result<String> {
        status(repo).map_err(step_error("status"))
    }
}

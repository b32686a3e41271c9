#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use anyhow::{Context, Result, ensure};
use tempfile::TempDir;

/// Return the path to the compiled `work` binary.
pub fn work_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_work"))
}

/// Run a git command inside `repo_path`, ensuring it succeeds.
pub fn git(repo_path: &Path, args: &[&str]) -> Result<Output> {
    let output = Command::new("git")
        .current_dir(repo_path)
        .args(args)
        .output()
        .with_context(|| format!("failed to run git {}", args.join(" ")))?;

    ensure!(
        output.status.success(),
        "git command failed: git {}\nstdout: {}\nstderr: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    Ok(output)
}

/// Run a git command and return its trimmed stdout.
pub fn git_stdout(repo_path: &Path, args: &[&str]) -> Result<String> {
    let output = git(repo_path, args)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Whether `branch` exists in the repository or bare remote at `path`.
pub fn has_branch(path: &Path, branch: &str) -> Result<bool> {
    Ok(!git_stdout(path, &["branch", "--list", branch])?.is_empty())
}

/// Isolated environment for driving the `work` binary.
pub struct Sandbox {
    /// Owns every path below.
    temp: TempDir,
    /// Canonical root of the sandbox.
    root: PathBuf,
    /// Stand-in home directory.
    pub home: PathBuf,
    /// Tracking file passed via the environment.
    pub tracking_file: PathBuf,
}

impl Sandbox {
    /// Create an empty sandbox with its own home directory.
    pub fn new() -> Result<Self> {
        let temp = TempDir::new()?;
        let root = fs::canonicalize(temp.path())?;
        let home = root.join("home");
        fs::create_dir_all(&home)?;
        let tracking_file = root.join("worked-on");
        Ok(Self {
            temp,
            root,
            home,
            tracking_file,
        })
    }

    /// Canonical root of the sandbox.
    pub fn root(&self) -> PathBuf {
        self.root.clone()
    }

    /// Initialise a repository on `master` with a README commit.
    pub fn create_repo(&self, name: &str) -> Result<PathBuf> {
        let repo_path = self.root().join(name);
        fs::create_dir_all(&repo_path)?;
        git(&repo_path, &["init", "--quiet", "-b", "master"])?;
        git(&repo_path, &["config", "user.email", "test@example.com"])?;
        git(&repo_path, &["config", "user.name", "Test User"])?;
        fs::write(repo_path.join("README.md"), "# Test Project")?;
        git(&repo_path, &["add", "README.md"])?;
        git(&repo_path, &["commit", "--quiet", "-m", "Initial commit"])?;
        Ok(repo_path)
    }

    /// Create a bare repository and register it as `remote` of `repo_path`.
    pub fn add_bare_remote(&self, repo_path: &Path, remote: &str) -> Result<PathBuf> {
        let name = format!(
            "{}-{remote}.git",
            repo_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        );
        let bare = self.root().join(name);
        fs::create_dir_all(&bare)?;
        git(&bare, &["init", "--quiet", "--bare"])?;
        git(
            repo_path,
            &["remote", "add", remote, &bare.display().to_string()],
        )?;
        Ok(bare)
    }

    /// Prepare a `work` command running in `cwd` with an isolated environment.
    pub fn command(&self, cwd: &Path) -> Command {
        let mut cmd = Command::new(work_binary());
        cmd.current_dir(cwd)
            .env("HOME", &self.home)
            .env("WORK_CONFIG", self.home.join("config.toml"))
            .env("WORK_TRACKING_FILE", &self.tracking_file)
            .env_remove("WORK_REMOTE")
            .env_remove("WORK_PRIMARY_BRANCH")
            .env_remove("WORK_LOG")
            .arg("--no-color");
        cmd
    }

    /// Run `work` in `cwd` with `args`.
    pub fn run(&self, cwd: &Path, args: &[&str]) -> Result<Output> {
        self.command(cwd)
            .args(args)
            .output()
            .with_context(|| format!("failed to run work {}", args.join(" ")))
    }

    /// Entries of the tracking file, in order.
    pub fn tracked(&self) -> Result<Vec<PathBuf>> {
        if !self.tracking_file.exists() {
            return Ok(Vec::new());
        }
        Ok(fs::read_to_string(&self.tracking_file)?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(PathBuf::from)
            .collect())
    }
}

/// Stdout of a finished command as a string.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Fail with both streams when `output` did not succeed.
pub fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "work failed\nstdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

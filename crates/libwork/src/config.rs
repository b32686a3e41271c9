use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkError};

/// Tracking file used when nothing else is configured.
pub const DEFAULT_TRACKING_FILE: &str = "~/.work-worked-on";
/// Remote checkpoints are published to by default.
pub const DEFAULT_REMOTE: &str = "private";
/// Primary branch restores reset onto by default.
pub const DEFAULT_PRIMARY_BRANCH: &str = "master";

/// Expand a leading `~` in a filesystem path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(home) = dirs::home_dir() {
        if path == "~" {
            return home;
        }
        if let Some(stripped) = path.strip_prefix("~/") {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Optional settings read from the TOML config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Location of the tracking file.
    pub tracking_file: Option<String>,
    /// Remote to publish checkpoints to.
    pub remote: Option<String>,
    /// Primary branch to restore onto.
    pub primary_branch: Option<String>,
    /// Whether checkpoint pushes use `--force`.
    pub force_push: Option<bool>,
}

impl FileConfig {
    /// Default config file location, `<config dir>/work/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("work").join("config.toml"))
    }

    /// Read a config file. A missing file yields an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|e| {
            WorkError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        toml::from_str(&contents).map_err(|e| {
            WorkError::Config(format!("Failed to parse config file {}: {e}", path.display()))
        })
    }
}

/// Values supplied on the command line, taking precedence over everything.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    /// Explicit config file location.
    pub config_file: Option<PathBuf>,
    /// Tracking file location.
    pub tracking_file: Option<PathBuf>,
    /// Remote name.
    pub remote: Option<String>,
    /// Primary branch name.
    pub primary_branch: Option<String>,
    /// Force-push override.
    pub force_push: Option<bool>,
}

/// Fully resolved settings for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Location of the tracking file.
    pub tracking_file: PathBuf,
    /// Remote to publish checkpoints to.
    pub remote: String,
    /// Primary branch to restore onto.
    pub primary_branch: String,
    /// Whether checkpoint pushes use `--force`.
    pub force_push: bool,
}

impl Settings {
    /// Environment variable naming the config file.
    pub const CONFIG_ENV: &'static str = "WORK_CONFIG";
    /// Environment variable overriding the tracking file.
    pub const TRACKING_FILE_ENV: &'static str = "WORK_TRACKING_FILE";
    /// Environment variable overriding the remote.
    pub const REMOTE_ENV: &'static str = "WORK_REMOTE";
    /// Environment variable overriding the primary branch.
    pub const PRIMARY_BRANCH_ENV: &'static str = "WORK_PRIMARY_BRANCH";

    /// Load settings from the process environment and the config file,
    /// applying `overrides` last.
    pub fn load(overrides: SettingsOverrides) -> Result<Self> {
        let lookup = |key: &str| env::var(key).ok().filter(|value| !value.is_empty());

        let config_path = overrides
            .config_file
            .clone()
            .or_else(|| lookup(Self::CONFIG_ENV).map(|path| expand_tilde(&path)))
            .or_else(FileConfig::default_path);
        let file = match &config_path {
            Some(path) => {
                tracing::debug!("loading config from {}", path.display());
                FileConfig::load(path)?
            }
            None => FileConfig::default(),
        };

        Self::resolve(file, lookup, overrides)
    }

    /// Merge the layers: overrides, then environment (via `lookup`), then
    /// `file`, then built-in defaults.
    pub fn resolve(
        file: FileConfig,
        lookup: impl Fn(&str) -> Option<String>,
        overrides: SettingsOverrides,
    ) -> Result<Self> {
        let tracking_file = overrides
            .tracking_file
            .or_else(|| lookup(Self::TRACKING_FILE_ENV).map(|path| expand_tilde(&path)))
            .or_else(|| file.tracking_file.as_deref().map(expand_tilde))
            .unwrap_or_else(|| expand_tilde(DEFAULT_TRACKING_FILE));
        if tracking_file.starts_with("~") {
            return Err(WorkError::Config(format!(
                "Cannot expand {} without a home directory",
                tracking_file.display()
            )));
        }

        let remote = overrides
            .remote
            .or_else(|| lookup(Self::REMOTE_ENV))
            .or(file.remote)
            .unwrap_or_else(|| DEFAULT_REMOTE.to_string());
        let primary_branch = overrides
            .primary_branch
            .or_else(|| lookup(Self::PRIMARY_BRANCH_ENV))
            .or(file.primary_branch)
            .unwrap_or_else(|| DEFAULT_PRIMARY_BRANCH.to_string());
        let force_push = overrides.force_push.or(file.force_push).unwrap_or(true);

        for (name, value) in [("remote", &remote), ("primary branch", &primary_branch)] {
            if value.trim().is_empty() {
                return Err(WorkError::Config(format!("{name} must not be empty")));
            }
        }

        Ok(Self {
            tracking_file,
            remote,
            primary_branch,
            force_push,
        })
    }
}

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use fs4::FileExt;
use tempfile::NamedTempFile;

use crate::error::{Result, WorkError};

/// Persisted set of repository paths that have an outstanding checkpoint.
///
/// Implementations keep each path at most once: [`add`](Self::add)
/// de-duplicates before writing, so [`list`](Self::list) never has to.
pub trait TrackingStore {
    /// Insert `path` if absent. Returns whether an insertion occurred.
    fn add(&self, path: &Path) -> Result<bool>;
    /// Delete `path` if present. Returns whether a deletion occurred.
    fn remove(&self, path: &Path) -> Result<bool>;
    /// All tracked paths, in storage order.
    fn list(&self) -> Result<Vec<PathBuf>>;

    /// Whether `path` is currently tracked.
    fn contains(&self, path: &Path) -> Result<bool> {
        Ok(self.list()?.iter().any(|entry| entry == path))
    }
}

/// Tracking store backed by a plain text file with one path per line.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Location of the tracking file.
    path: PathBuf,
}

/// Advisory lock held on the store's sidecar lock file.
struct StoreLock {
    /// The lock file handle.
    file: File,
}

impl Drop for StoreLock {
    #[allow(clippy::let_underscore_must_use)]
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl FileStore {
    /// Create a store persisted at `path`. Nothing is touched on disk until
    /// the first mutation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the tracking file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the sidecar file used for advisory locking.
    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Wrap an I/O failure with the store location.
    fn io_error(&self, context: &str, error: &io::Error) -> WorkError {
        WorkError::TrackingStore {
            path: self.path.clone(),
            message: format!("{context}: {error}"),
        }
    }

    /// Acquire the store lock, creating the lock file when needed.
    fn lock(&self, exclusive: bool) -> Result<StoreLock> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(|e| self.io_error("failed to open lock file", &e))?;

        let locked = if exclusive {
            FileExt::lock_exclusive(&file)
        } else {
            FileExt::lock_shared(&file)
        };
        locked.map_err(|e| self.io_error("failed to lock", &e))?;
        Ok(StoreLock { file })
    }

    /// Directory holding the tracking file.
    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Read entries without locking. A missing file reads as empty.
    fn read_entries(&self) -> Result<Vec<PathBuf>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_error("failed to read", &err)),
        };

        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    /// Atomically replace the tracking file with `entries`.
    fn write_entries(&self, entries: &[PathBuf]) -> Result<()> {
        let mut contents = String::new();
        for entry in entries {
            contents.push_str(&entry.to_string_lossy());
            contents.push('\n');
        }

        let target = self.write_target()?;
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)
            .map_err(|e| self.io_error("failed to create temporary file", &e))?;
        tmp.write_all(contents.as_bytes())
            .map_err(|e| self.io_error("failed to write", &e))?;
        tmp.persist(&target)
            .map_err(|e| self.io_error("failed to replace", &e.error))?;
        Ok(())
    }

    /// File the rename lands on. A symlinked tracking file is replaced at its
    /// destination so the link survives.
    fn write_target(&self) -> Result<PathBuf> {
        match fs::canonicalize(&self.path) {
            Ok(target) => Ok(target),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(self.path.clone()),
            Err(err) => Err(self.io_error("failed to resolve", &err)),
        }
    }

    /// Run a read-modify-write cycle under the exclusive lock. `apply`
    /// returns whether it changed the entries; unchanged entries are not
    /// rewritten.
    fn update(&self, apply: impl FnOnce(&mut Vec<PathBuf>) -> bool) -> Result<bool> {
        fs::create_dir_all(self.parent_dir())
            .map_err(|e| self.io_error("failed to create directory", &e))?;
        let _lock = self.lock(true)?;

        let mut entries = self.read_entries()?;
        let changed = apply(&mut entries);
        if changed {
            self.write_entries(&entries)?;
        }
        Ok(changed)
    }
}

/// Reject paths that cannot be stored in a line-oriented file.
fn validate_entry(path: &Path) -> Result<()> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() || text.contains('\n') || text.contains('\r') {
        return Err(WorkError::TrackingStore {
            path: path.to_path_buf(),
            message: "path cannot be stored as a single line".to_string(),
        });
    }
    Ok(())
}

impl TrackingStore for FileStore {
    fn add(&self, path: &Path) -> Result<bool> {
        validate_entry(path)?;
        let added = self.update(|entries| {
            if entries.iter().any(|entry| entry == path) {
                false
            } else {
                entries.push(path.to_path_buf());
                true
            }
        })?;
        tracing::debug!(store = %self.path.display(), added, "track {}", path.display());
        Ok(added)
    }

    fn remove(&self, path: &Path) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        let removed = self.update(|entries| {
            let before = entries.len();
            entries.retain(|entry| entry != path);
            entries.len() != before
        })?;
        tracing::debug!(store = %self.path.display(), removed, "untrack {}", path.display());
        Ok(removed)
    }

    fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let _lock = self.lock(false)?;
        self.read_entries()
    }
}

/// Tracking store held in memory, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Tracked paths in insertion order.
    entries: Mutex<Vec<PathBuf>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `paths`, dropping duplicates.
    pub fn with_entries<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut entries: Vec<PathBuf> = Vec::new();
        for path in paths {
            let path = path.into();
            if !entries.contains(&path) {
                entries.push(path);
            }
        }
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Lock the entries, recovering from a poisoned mutex.
    fn entries(&self) -> MutexGuard<'_, Vec<PathBuf>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TrackingStore for MemoryStore {
    fn add(&self, path: &Path) -> Result<bool> {
        let mut entries = self.entries();
        if entries.iter().any(|entry| entry == path) {
            return Ok(false);
        }
        entries.push(path.to_path_buf());
        Ok(true)
    }

    fn remove(&self, path: &Path) -> Result<bool> {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|entry| entry != path);
        Ok(entries.len() != before)
    }

    fn list(&self) -> Result<Vec<PathBuf>> {
        Ok(self.entries().clone())
    }
}

//! JSON file stores with advisory locking and atomic replacement
//!
//! Every history file is a single pretty-printed JSON document. Writers take
//! a `<file>.lock` guard, and the document is replaced through a temp file in
//! the same directory, so readers never observe a partial write. A lock left
//! behind by a writer that died is cleared on the next acquire.

use crate::error::{Result, ScrivenerError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

const LOCK_ATTEMPTS: u32 = 50;
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(100);
/// Age after which a lock without a usable holder pid counts as abandoned
const STALE_LOCK_AGE: Duration = Duration::from_secs(30);

/// Advisory lock held for as long as the guard lives
#[derive(Debug)]
pub struct FileLock {
    lock_path: PathBuf,
}

impl FileLock {
    /// Lock file path for `path`
    pub fn lock_path_for(path: &Path) -> PathBuf {
        let mut os = path.as_os_str().to_owned();
        os.push(".lock");
        PathBuf::from(os)
    }

    /// Acquire the lock for `path`, retrying for about five seconds
    pub fn acquire(path: &Path) -> Result<Self> {
        Self::acquire_with(path, LOCK_ATTEMPTS, LOCK_RETRY_DELAY)
    }

    pub fn acquire_with(path: &Path, attempts: u32, delay: Duration) -> Result<Self> {
        let lock_path = Self::lock_path_for(path);
        ensure_parent(&lock_path)?;

        let mut waited = 0;
        loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(mut file) => {
                    if let Err(e) = writeln!(file, "{}", std::process::id()) {
                        warn!("Failed to record pid in {}: {}", lock_path.display(), e);
                    }
                    debug!("Acquired lock {}", lock_path.display());
                    return Ok(Self { lock_path });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if clear_stale_lock(&lock_path)? {
                        continue;
                    }
                    waited += 1;
                    if waited >= attempts.max(1) {
                        break;
                    }
                    std::thread::sleep(delay);
                }
                Err(e) => return Err(ScrivenerError::Io(e)),
            }
        }

        warn!("Gave up waiting for lock {}", lock_path.display());
        Err(ScrivenerError::Locked(path.to_path_buf()))
    }
}

/// Remove `lock_path` when its holder is gone. Returns whether the lock is
/// now free to take.
fn clear_stale_lock(lock_path: &Path) -> Result<bool> {
    let holder = match std::fs::read_to_string(lock_path) {
        Ok(contents) => contents.trim().parse::<u32>().ok(),
        // Released between our create and this read
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(ScrivenerError::Io(e)),
    };

    let stale = match holder.and_then(holder_alive) {
        Some(alive) => !alive,
        None => lock_age(lock_path).is_some_and(|age| age > STALE_LOCK_AGE),
    };
    if !stale {
        return Ok(false);
    }

    match holder {
        Some(pid) => warn!("Removing stale lock {} left by process {}", lock_path.display(), pid),
        None => warn!("Removing abandoned lock {}", lock_path.display()),
    }
    match std::fs::remove_file(lock_path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(ScrivenerError::Io(e)),
    }
}

fn lock_age(lock_path: &Path) -> Option<Duration> {
    let modified = std::fs::metadata(lock_path).and_then(|m| m.modified()).ok()?;
    SystemTime::now().duration_since(modified).ok()
}

/// Whether process `pid` is still running, if that can be told
#[cfg(unix)]
fn holder_alive(pid: u32) -> Option<bool> {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).ok().filter(|p| *p > 0)?;
    // Signal 0 only checks for existence
    match kill(Pid::from_raw(raw), None) {
        Ok(()) => Some(true),
        Err(Errno::EPERM) => Some(true),
        Err(Errno::ESRCH) => Some(false),
        Err(_) => None,
    }
}

#[cfg(not(unix))]
fn holder_alive(_pid: u32) -> Option<bool> {
    None
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.lock_path) {
            warn!("Failed to remove lock {}: {}", self.lock_path.display(), e);
        }
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Replace `path` with `contents` via a temp file in the same directory
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    ensure_parent(path)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| ScrivenerError::Io(e.error))?;
    Ok(())
}

/// Run file work that may wait on a lock without stalling the async runtime
pub async fn run_blocking<R, F>(f: F) -> Result<R>
where
    R: Send + 'static,
    F: FnOnce() -> Result<R> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ScrivenerError::Other(format!("Blocking task failed: {}", e)))?
}

/// A typed JSON document on disk
///
/// A missing file loads as `T::default()`. A file that exists but does not
/// parse is a [`ScrivenerError::Parse`] and is never overwritten implicitly.
#[derive(Debug, Clone)]
pub struct JsonStore<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonStore<T>
where
    T: Default + Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<T> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} not found, starting empty", self.path.display());
                return Ok(T::default());
            }
            Err(e) => return Err(ScrivenerError::Io(e)),
        };

        serde_json::from_str(&contents).map_err(|e| ScrivenerError::parse(&self.path, e))
    }

    pub fn save(&self, value: &T) -> Result<()> {
        let _lock = FileLock::acquire(&self.path)?;
        self.write(value)
    }

    /// Lock, load, apply `f`, save. Returns the saved value and `f`'s result.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<(T, R)> {
        let _lock = FileLock::acquire(&self.path)?;
        let mut value = self.load()?;
        let result = f(&mut value);
        self.write(&value)?;
        Ok((value, result))
    }

    /// [`JsonStore::update`] on the blocking pool
    pub async fn update_blocking<R, F>(&self, f: F) -> Result<(T, R)>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: FnOnce(&mut T) -> R + Send + 'static,
    {
        let store = Self::new(self.path.clone());
        run_blocking(move || store.update(f)).await
    }

    fn write(&self, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        write_atomic(&self.path, json.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Doc {
        items: Vec<String>,
    }

    #[test]
    fn test_missing_file_loads_default() {
        let dir = TempDir::new().unwrap();
        let store: JsonStore<Doc> = JsonStore::new(dir.path().join("doc.json"));
        assert_eq!(store.load().unwrap(), Doc::default());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store: JsonStore<Doc> = JsonStore::new(&path);
        let err = store.load().unwrap_err();
        assert!(matches!(err, ScrivenerError::Parse { .. }));
        // left as found
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_update_persists_and_releases_lock() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        let store: JsonStore<Doc> = JsonStore::new(&path);

        let (saved, len) = store
            .update(|doc| {
                doc.items.push("日本語".to_string());
                doc.items.len()
            })
            .unwrap();
        assert_eq!(len, 1);
        assert_eq!(store.load().unwrap(), saved);
        assert!(!FileLock::lock_path_for(&path).exists());

        // non-ASCII written as-is
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("日本語"));
    }

    #[test]
    fn test_lock_contention() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");

        let held = FileLock::acquire(&path).unwrap();
        let err = FileLock::acquire_with(&path, 2, Duration::from_millis(1)).unwrap_err();
        assert!(matches!(err, ScrivenerError::Locked(_)));

        drop(held);
        assert!(FileLock::acquire_with(&path, 1, Duration::from_millis(1)).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_lock_from_dead_process_is_cleared() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("evaluation_history.json");
        // No process can have this pid
        std::fs::write(FileLock::lock_path_for(&path), format!("{}\n", i32::MAX)).unwrap();

        let store: JsonStore<Doc> = JsonStore::new(&path);
        store.update(|doc| doc.items.push("after crash".to_string())).unwrap();

        assert_eq!(store.load().unwrap().items, vec!["after crash"]);
        assert!(!FileLock::lock_path_for(&path).exists());
    }

    #[test]
    fn test_lock_from_live_process_is_kept() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        let lock_path = FileLock::lock_path_for(&path);
        std::fs::write(&lock_path, format!("{}\n", std::process::id())).unwrap();

        let err = FileLock::acquire_with(&path, 2, Duration::from_millis(1)).unwrap_err();
        assert!(matches!(err, ScrivenerError::Locked(_)));
        assert!(lock_path.exists());
    }

    #[test]
    fn test_old_lock_without_pid_is_cleared() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        let lock_path = FileLock::lock_path_for(&path);
        std::fs::write(&lock_path, "").unwrap();

        // Fresh and unattributed: still respected
        assert!(FileLock::acquire_with(&path, 1, Duration::from_millis(1)).is_err());

        let file = std::fs::File::options().write(true).open(&lock_path).unwrap();
        file.set_modified(SystemTime::now() - 2 * STALE_LOCK_AGE).unwrap();
        drop(file);

        let lock = FileLock::acquire_with(&path, 1, Duration::from_millis(1)).unwrap();
        let holder = std::fs::read_to_string(&lock_path).unwrap();
        assert_eq!(holder.trim(), std::process::id().to_string());
        drop(lock);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_update_blocking_waits_off_the_runtime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        let store: JsonStore<Doc> = JsonStore::new(&path);

        let held = FileLock::acquire(&path).unwrap();
        let pending = tokio::spawn({
            let store = store.clone();
            async move { store.update_blocking(|doc| doc.items.push("x".to_string())).await }
        });

        // The runtime keeps making progress while the update waits
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(!pending.is_finished());
        drop(held);

        let (saved, ()) = pending.await.unwrap().unwrap();
        assert_eq!(saved.items, vec!["x"]);
    }

    #[test]
    fn test_write_atomic_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.md");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }
}

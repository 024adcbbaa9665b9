//! Process-exit cleanup of extracted files.
//!
//! # Responsibility
//! - Track files that must not outlive the process.
//! - Remove them best-effort when the process exits normally.
//!
//! # Invariants
//! - The exit hook is installed at most once per process.
//! - Cleanup never panics and never reports failure to callers.

use log::{debug, warn};
use once_cell::sync::{Lazy, OnceCell};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, TryLockError};

static REGISTERED_PATHS: Lazy<Mutex<Vec<PathBuf>>> = Lazy::new(|| Mutex::new(Vec::new()));
static EXIT_HOOK_INSTALLED: OnceCell<bool> = OnceCell::new();

/// Registers `path` for deletion at process exit.
///
/// Returns `true` when an exit hook is active on this platform. When it is
/// not, callers can still trigger deletion with [`cleanup_now`].
pub fn register_for_exit(path: &Path) -> bool {
    {
        let mut paths = registered();
        if !paths.iter().any(|existing| existing == path) {
            paths.push(path.to_path_buf());
        }
    }
    install_exit_hook_once()
}

/// Drops `path` from the registry without touching the file.
pub fn unregister(path: &Path) {
    registered().retain(|existing| existing != path);
}

/// Returns a snapshot of currently registered paths.
pub fn registered_paths() -> Vec<PathBuf> {
    registered().clone()
}

/// Removes every registered file now and clears the registry.
///
/// Returns the number of files actually removed.
pub fn cleanup_now() -> usize {
    let paths = std::mem::take(&mut *registered());
    let mut removed = 0;
    for path in &paths {
        match std::fs::remove_file(path) {
            Ok(()) => {
                removed += 1;
                debug!(
                    "event=temp_cleanup module=cleanup status=ok path={}",
                    path.display()
                );
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(
                "event=temp_cleanup module=cleanup status=error path={} error={}",
                path.display(),
                err
            ),
        }
    }
    removed
}

fn registered() -> MutexGuard<'static, Vec<PathBuf>> {
    // A panic while holding the lock leaves a valid Vec behind.
    REGISTERED_PATHS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(any(unix, windows))]
fn install_exit_hook_once() -> bool {
    *EXIT_HOOK_INSTALLED.get_or_init(|| {
        // SAFETY: `run_exit_hook` is a plain `extern "C"` function with no
        // captured state; registering it has no other preconditions.
        let status = unsafe { libc::atexit(run_exit_hook) };
        if status != 0 {
            warn!("event=exit_hook_install module=cleanup status=error code={status}");
        }
        status == 0
    })
}

#[cfg(not(any(unix, windows)))]
fn install_exit_hook_once() -> bool {
    *EXIT_HOOK_INSTALLED.get_or_init(|| false)
}

/// Takes every registered path unless another thread holds the registry.
#[cfg_attr(not(any(unix, windows)), allow(dead_code))]
fn drain_for_exit() -> Option<Vec<PathBuf>> {
    match REGISTERED_PATHS.try_lock() {
        Ok(mut guard) => Some(std::mem::take(&mut *guard)),
        Err(TryLockError::Poisoned(poisoned)) => {
            Some(std::mem::take(&mut *poisoned.into_inner()))
        }
        Err(TryLockError::WouldBlock) => None,
    }
}

#[cfg(any(unix, windows))]
extern "C" fn run_exit_hook() {
    // The logger may already be torn down at exit, so remove silently.
    // A busy registry means its owner may never run again; skip cleanup.
    let Some(paths) = drain_for_exit() else {
        return;
    };
    for path in paths {
        let _ = std::fs::remove_file(path);
    }
}

#[cfg(test)]
mod tests {
    use super::{drain_for_exit, register_for_exit, registered, registered_paths, unregister};

    #[test]
    fn registration_is_deduplicated_and_reversible() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dedup.bin");

        register_for_exit(&path);
        register_for_exit(&path);
        let count = registered_paths()
            .into_iter()
            .filter(|existing| existing == &path)
            .count();
        assert_eq!(count, 1);

        unregister(&path);
        assert!(!registered_paths().contains(&path));
    }

    #[test]
    fn exit_drain_skips_a_busy_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("busy.bin");
        register_for_exit(&path);

        let guard = registered();
        assert!(drain_for_exit().is_none());
        drop(guard);

        assert!(registered_paths().contains(&path));
        unregister(&path);
    }

    #[cfg(any(unix, windows))]
    #[test]
    fn exit_hook_is_active() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hook.bin");
        assert!(register_for_exit(&path));
        unregister(&path);
    }
}

//! Dynamic loading of the extracted native library.
//!
//! # Responsibility
//! - Load a shared library so code generated at runtime can resolve its
//!   exported symbols.
//! - Expose symbol lookup through a thin, cloneable wrapper.
//!
//! # Invariants
//! - On Unix the library is opened with `RTLD_NOW | RTLD_GLOBAL` before the
//!   standard process-wide load; both handles stay open while the wrapper lives.
//! - Dropping the last wrapper clone closes the handles.

use crate::error::{LoaderError, LoaderResult};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Capability to load a library with symbol visibility sufficient for later
/// runtime code generation.
pub trait LibraryLoader: Send + Sync {
    fn load_global(&self, path: &Path) -> LoaderResult<LoadedLibrary>;
}

/// Open handles of one loaded library.
#[derive(Debug)]
pub struct LoadedLibrary {
    path: PathBuf,
    handles: Vec<libloading::Library>,
}

impl LoadedLibrary {
    /// Wraps already-open handles. The first handle is used for lookups.
    pub fn new(path: impl Into<PathBuf>, handles: Vec<libloading::Library>) -> Self {
        Self {
            path: path.into(),
            handles,
        }
    }

    /// A library record with no native handle; symbol lookups fail.
    pub fn detached(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Vec::new())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn handle_count(&self) -> usize {
        self.handles.len()
    }
}

/// Production loader backed by `libloading`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicLibraryLoader;

impl LibraryLoader for DynamicLibraryLoader {
    fn load_global(&self, path: &Path) -> LoaderResult<LoadedLibrary> {
        let started_at = Instant::now();
        info!(
            "event=library_load module=library status=start path={}",
            path.display()
        );

        match open_handles(path) {
            Ok(handles) => {
                let loaded = LoadedLibrary::new(path, handles);
                info!(
                    "event=library_load module=library status=ok path={} handles={} duration_ms={}",
                    path.display(),
                    loaded.handle_count(),
                    started_at.elapsed().as_millis()
                );
                Ok(loaded)
            }
            Err(err) => {
                error!(
                    "event=library_load module=library status=error path={} duration_ms={} error_code={} error={}",
                    path.display(),
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }
}

#[cfg(unix)]
fn open_handles(path: &Path) -> LoaderResult<Vec<libloading::Library>> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_NOW};

    let load_err = |source| LoaderError::LibraryLoad {
        path: path.to_path_buf(),
        source,
    };
    // SAFETY: loading runs the library's initializers. The library is the
    // trusted artifact shipped with this program.
    let global = unsafe { UnixLibrary::open(Some(path), RTLD_NOW | RTLD_GLOBAL) }
        .map_err(load_err)?;
    // SAFETY: same library as above; the second open only bumps its refcount.
    let standard = unsafe { libloading::Library::new(path) }.map_err(load_err)?;
    Ok(vec![global.into(), standard])
}

#[cfg(not(unix))]
fn open_handles(path: &Path) -> LoaderResult<Vec<libloading::Library>> {
    // SAFETY: see the Unix variant.
    let library = unsafe { libloading::Library::new(path) }.map_err(|source| {
        LoaderError::LibraryLoad {
            path: path.to_path_buf(),
            source,
        }
    })?;
    Ok(vec![library])
}

/// Thin native-call wrapper handed to collaborators.
#[derive(Debug, Clone)]
pub struct NativeWrapper {
    library: Arc<LoadedLibrary>,
}

impl NativeWrapper {
    pub fn new(library: LoadedLibrary) -> Self {
        Self {
            library: Arc::new(library),
        }
    }

    pub fn library_path(&self) -> &Path {
        self.library.path()
    }

    /// Resolves `symbol` from the loaded library.
    ///
    /// # Safety
    /// `T` must match the real type of the exported symbol.
    pub unsafe fn get<T>(&self, symbol: &str) -> LoaderResult<libloading::Symbol<'_, T>> {
        let Some(handle) = self.library.handles.first() else {
            return Err(LoaderError::configuration(format!(
                "library `{}` has no native handle to resolve `{symbol}`",
                self.library.path.display()
            )));
        };
        handle
            .get::<T>(symbol.as_bytes())
            .map_err(|source| LoaderError::SymbolMissing {
                symbol: symbol.to_string(),
                source,
            })
    }
}

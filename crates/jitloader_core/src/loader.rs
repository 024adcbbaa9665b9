//! Native loader instance.
//!
//! # Responsibility
//! - Run the extract-and-load sequence for the native library.
//! - Extract the bytecode resource consumed by the native JIT.
//!
//! # Invariants
//! - The library is extracted and loaded before the bytecode is extracted.
//! - Any failure is reported as `LoaderError::Initialization` wrapping the
//!   step that failed.

use crate::assets::AssetSource;
use crate::error::{LoaderError, LoaderResult};
use crate::extract::{extract_asset, ExtractedFile};
use crate::library::{LibraryLoader, NativeWrapper};
use crate::settings::LoaderSettings;
use log::{error, info};
use std::path::Path;
use std::time::Instant;

/// Extracted resources plus the wrapper over the loaded library.
#[derive(Debug)]
pub struct NativeLoader {
    library_file: ExtractedFile,
    byte_code_file: ExtractedFile,
    wrapper: NativeWrapper,
}

impl NativeLoader {
    /// Extracts and loads the native library, then extracts the bytecode.
    ///
    /// # Side effects
    /// - Writes two files into the resolved temp directory.
    /// - Loads the library into the process.
    /// - Emits `native_init` logging events with duration and status.
    pub fn initialize(
        assets: &dyn AssetSource,
        library_loader: &dyn LibraryLoader,
        settings: &LoaderSettings,
    ) -> LoaderResult<Self> {
        let started_at = Instant::now();
        let temp_dir = settings.resolved_temp_dir();
        info!(
            "event=native_init module=loader status=start library={} temp_dir={}",
            settings.library_name,
            temp_dir.display()
        );

        match Self::setup(assets, library_loader, settings, &temp_dir) {
            Ok(loader) => {
                info!(
                    "event=native_init module=loader status=ok library_path={} byte_code_path={} duration_ms={}",
                    loader.library_file.path().display(),
                    loader.byte_code_file.path().display(),
                    started_at.elapsed().as_millis()
                );
                Ok(loader)
            }
            Err(err) => {
                error!(
                    "event=native_init module=loader status=error duration_ms={} error_code={} error={}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                Err(LoaderError::Initialization {
                    source: Box::new(err),
                })
            }
        }
    }

    fn setup(
        assets: &dyn AssetSource,
        library_loader: &dyn LibraryLoader,
        settings: &LoaderSettings,
        temp_dir: &Path,
    ) -> LoaderResult<Self> {
        let library_file = extract_asset(assets, temp_dir, &settings.library_file_name())?;
        let library = library_loader.load_global(library_file.path())?;
        let byte_code_file = extract_asset(assets, temp_dir, &settings.byte_code_asset)?;
        Ok(Self {
            library_file,
            byte_code_file,
            wrapper: NativeWrapper::new(library),
        })
    }

    /// Path of the extracted bytecode file.
    pub fn byte_code_file_path(&self) -> &Path {
        self.byte_code_file.path()
    }

    /// Path of the extracted shared library.
    pub fn library_path(&self) -> &Path {
        self.library_file.path()
    }

    pub fn wrapper(&self) -> &NativeWrapper {
        &self.wrapper
    }
}

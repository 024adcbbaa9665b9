//! Extraction of bundled assets onto local disk.
//!
//! # Responsibility
//! - Materialize one bundled asset as a uniquely named file.
//! - Register every extracted file for deletion at process exit.
//!
//! # Invariants
//! - File names are `<asset name><uuid v4>`, so concurrent processes sharing
//!   one temp directory never collide.
//! - Target files are created exclusively; an existing file is removed first
//!   or extraction fails.
//! - Extracted bytes are identical to the asset bytes.
//! - A failed extraction removes its file, or keeps it registered for exit
//!   cleanup when removal fails.

use crate::assets::AssetSource;
use crate::cleanup;
use crate::error::{LoaderError, LoaderResult};
use log::{error, info, warn};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

/// One asset written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    asset_name: String,
    path: PathBuf,
    len: u64,
}

impl ExtractedFile {
    /// Logical asset name the file was extracted from.
    pub fn asset_name(&self) -> &str {
        &self.asset_name
    }

    /// Absolute path of the extracted file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of bytes written.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Returns the randomized on-disk name for `asset_name`.
pub(crate) fn unique_file_name(asset_name: &str) -> String {
    format!("{asset_name}{}", Uuid::new_v4())
}

/// Extracts `asset_name` from `assets` into `target_dir`.
///
/// # Errors
/// - `TempDir` when `target_dir` is not an existing directory.
/// - `FileExists` when the generated path is occupied and cannot be removed.
/// - `FileCreate` / `FileWrite` on filesystem failures.
/// - `AssetNotFound` / `AssetRead` from the asset source.
pub fn extract_asset(
    assets: &dyn AssetSource,
    target_dir: &Path,
    asset_name: &str,
) -> LoaderResult<ExtractedFile> {
    extract_asset_as(assets, target_dir, asset_name, &unique_file_name(asset_name))
}

pub(crate) fn extract_asset_as(
    assets: &dyn AssetSource,
    target_dir: &Path,
    asset_name: &str,
    file_name: &str,
) -> LoaderResult<ExtractedFile> {
    let started_at = Instant::now();
    info!(
        "event=asset_extract module=extract status=start asset={} source={}",
        asset_name,
        assets.describe()
    );

    let result = extract_inner(assets, target_dir, asset_name, file_name);
    match &result {
        Ok(extracted) => info!(
            "event=asset_extract module=extract status=ok asset={} path={} bytes={} duration_ms={}",
            asset_name,
            extracted.path.display(),
            extracted.len,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=asset_extract module=extract status=error asset={} duration_ms={} error_code={} error={}",
            asset_name,
            started_at.elapsed().as_millis(),
            err.code(),
            err
        ),
    }
    result
}

fn extract_inner(
    assets: &dyn AssetSource,
    target_dir: &Path,
    asset_name: &str,
    file_name: &str,
) -> LoaderResult<ExtractedFile> {
    if !target_dir.is_dir() {
        return Err(LoaderError::TempDir {
            path: target_dir.to_path_buf(),
        });
    }
    let target_dir = std::path::absolute(target_dir).map_err(|_| LoaderError::TempDir {
        path: target_dir.to_path_buf(),
    })?;

    let path = target_dir.join(file_name);
    let mut file = create_exclusive(&path)?;
    cleanup::register_for_exit(&path);

    match copy_asset(assets, asset_name, &path, &mut file) {
        Ok(len) => Ok(ExtractedFile {
            asset_name: asset_name.to_string(),
            path,
            len,
        }),
        Err(err) => {
            drop(file);
            match std::fs::remove_file(&path) {
                Ok(()) => cleanup::unregister(&path),
                // Still registered, so exit cleanup gets another try.
                Err(remove_err) => warn!(
                    "event=asset_extract module=extract status=rollback_error asset={} path={} error={}",
                    asset_name,
                    path.display(),
                    remove_err
                ),
            }
            Err(err)
        }
    }
}

fn create_exclusive(path: &Path) -> LoaderResult<File> {
    if path.symlink_metadata().is_ok() && std::fs::remove_file(path).is_err() {
        return Err(LoaderError::FileExists {
            path: path.to_path_buf(),
        });
    }
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| LoaderError::FileCreate {
            path: path.to_path_buf(),
            source,
        })
}

fn copy_asset(
    assets: &dyn AssetSource,
    asset_name: &str,
    path: &Path,
    file: &mut File,
) -> LoaderResult<u64> {
    let bytes = assets.fetch_asset(asset_name)?;
    let write_err = |source| LoaderError::FileWrite {
        path: path.to_path_buf(),
        source,
    };
    file.set_len(0).map_err(write_err)?;
    file.write_all(&bytes).map_err(write_err)?;
    file.flush().map_err(write_err)?;
    Ok(bytes.len() as u64)
}

//! Assets packaged as plain files in one directory.

use super::AssetSource;
use crate::error::{LoaderError, LoaderResult};
use crate::settings::is_plain_file_name;
use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};

/// Reads assets from files directly under `root`.
///
/// Names that are not plain file names resolve to `AssetNotFound`, so a
/// lookup can never leave `root`.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirectoryAssets {
    fn fetch_asset(&self, name: &str) -> LoaderResult<Cow<'static, [u8]>> {
        let not_found = || LoaderError::AssetNotFound {
            name: name.to_string(),
        };
        if !is_plain_file_name(name) {
            return Err(not_found());
        }

        let path = self.root.join(name);
        if !path.is_file() {
            return Err(not_found());
        }
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Cow::Owned(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(not_found()),
            Err(err) => Err(LoaderError::AssetRead {
                name: name.to_string(),
                source: err,
            }),
        }
    }

    fn describe(&self) -> String {
        format!("directory({})", self.root.display())
    }
}

//! Loader error taxonomy.
//!
//! # Responsibility
//! - Carry one failure type across extraction, loading and configuration.
//! - Keep the failing step and the underlying cause in the error chain.
//!
//! # Invariants
//! - Every variant renders a message naming the step that failed.
//! - `source()` exposes the wrapped cause when one exists.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

pub type LoaderResult<T> = Result<T, LoaderError>;

#[derive(Debug)]
pub enum LoaderError {
    /// Named asset is absent from the bundled asset source.
    AssetNotFound { name: String },
    /// Asset source exists but reading it failed.
    AssetRead { name: String, source: io::Error },
    /// Target directory is missing or is not a directory.
    TempDir { path: PathBuf },
    FileExists { path: PathBuf },
    FileCreate { path: PathBuf, source: io::Error },
    FileWrite { path: PathBuf, source: io::Error },
    LibraryLoad {
        path: PathBuf,
        source: libloading::Error,
    },
    SymbolMissing {
        symbol: String,
        source: libloading::Error,
    },
    Configuration { message: String },
    InvalidSettings { message: String },
    /// Wraps any failure raised while building the loader instance.
    Initialization { source: Box<LoaderError> },
}

impl LoaderError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_settings(message: impl Into<String>) -> Self {
        Self::InvalidSettings {
            message: message.into(),
        }
    }

    /// Stable short code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AssetNotFound { .. } => "asset_not_found",
            Self::AssetRead { .. } => "asset_read_failed",
            Self::TempDir { .. } => "temp_dir_invalid",
            Self::FileExists { .. } => "file_exists",
            Self::FileCreate { .. } => "file_create_failed",
            Self::FileWrite { .. } => "file_write_failed",
            Self::LibraryLoad { .. } => "library_load_failed",
            Self::SymbolMissing { .. } => "symbol_missing",
            Self::Configuration { .. } => "configuration_failed",
            Self::InvalidSettings { .. } => "invalid_settings",
            Self::Initialization { source } => source.code(),
        }
    }

    /// Returns the innermost loader error, skipping `Initialization` wrappers.
    pub fn root(&self) -> &LoaderError {
        match self {
            Self::Initialization { source } => source.root(),
            other => other,
        }
    }
}

impl Display for LoaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AssetNotFound { name } => {
                write!(f, "`{name}` was not found among bundled assets")
            }
            Self::AssetRead { name, source } => {
                write!(f, "failed to read bundled asset `{name}`: {source}")
            }
            Self::TempDir { path } => write!(
                f,
                "temp directory `{}` does not exist or is not a directory",
                path.display()
            ),
            Self::FileExists { path } => write!(
                f,
                "file `{}` already exists and cannot be removed",
                path.display()
            ),
            Self::FileCreate { path, .. } => {
                write!(f, "file `{}` could not be created", path.display())
            }
            Self::FileWrite { path, .. } => {
                write!(f, "failed to write file `{}`", path.display())
            }
            Self::LibraryLoad { path, .. } => {
                write!(f, "failed to load native library `{}`", path.display())
            }
            Self::SymbolMissing { symbol, .. } => {
                write!(f, "native symbol `{symbol}` could not be resolved")
            }
            Self::Configuration { message } => {
                write!(f, "native configuration failed: {message}")
            }
            Self::InvalidSettings { message } => write!(f, "invalid loader settings: {message}"),
            Self::Initialization { .. } => write!(f, "unable to create native instance"),
        }
    }
}

impl Error for LoaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::AssetRead { source, .. }
            | Self::FileCreate { source, .. }
            | Self::FileWrite { source, .. } => Some(source),
            Self::LibraryLoad { source, .. } | Self::SymbolMissing { source, .. } => Some(source),
            Self::Initialization { source } => Some(source.as_ref()),
            Self::AssetNotFound { .. }
            | Self::TempDir { .. }
            | Self::FileExists { .. }
            | Self::Configuration { .. }
            | Self::InvalidSettings { .. } => None,
        }
    }
}

/// Renders an error and its full `source()` chain as `a: b: c`.
pub fn error_chain(err: &dyn Error) -> String {
    let mut rendered = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        current = cause.source();
    }
    rendered
}

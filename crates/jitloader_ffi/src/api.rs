//! FFI use-case API for foreign callers.
//!
//! # Responsibility
//! - Expose the process-wide loader to callers outside Rust via FRB.
//! - Flatten loader errors into stable response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Failure messages carry the full error chain.

use jitloader_core::{
    error_chain, global, init_logging as init_logging_inner,
    loader_version as loader_version_inner,
};
use log::warn;

/// Expose loader crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn loader_version() -> String {
    loader_version_inner().to_owned()
}

/// Initializes loader logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may create the log directory.
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Default configuration envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationResponse {
    /// Whether a handle is available.
    pub ok: bool,
    /// Native configuration handle; `0` when `ok` is false.
    pub handle: i64,
    /// Human-readable diagnostics.
    pub message: String,
}

/// Extracted bytecode path envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResponse {
    pub ok: bool,
    pub path: Option<String>,
    pub message: String,
}

/// Returns the process-wide default configuration handle.
///
/// # FFI contract
/// - Sync call; the first call extracts and loads the native library.
/// - Later calls return the cached handle.
/// - A failed call leaves nothing cached; the next call retries.
#[flutter_rust_bridge::frb(sync)]
pub fn default_configuration() -> ConfigurationResponse {
    match global::default_configuration() {
        Ok(handle) => ConfigurationResponse {
            ok: true,
            handle: handle.get(),
            message: format!("Default configuration {handle}."),
        },
        Err(err) => {
            warn!(
                "event=ffi_default_config module=ffi status=error error_code={}",
                err.code()
            );
            ConfigurationResponse {
                ok: false,
                handle: 0,
                message: format!("default_configuration failed: {}", error_chain(&err)),
            }
        }
    }
}

/// Returns the path of the extracted bytecode file.
///
/// # FFI contract
/// - Sync call; initializes the loader when needed.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn byte_code_file_path() -> PathResponse {
    match global::instance() {
        Ok(loader) => {
            let path = loader.byte_code_file_path().display().to_string();
            PathResponse {
                ok: true,
                message: "Byte code extracted.".to_string(),
                path: Some(path),
            }
        }
        Err(err) => PathResponse {
            ok: false,
            path: None,
            message: format!("byte_code_file_path failed: {}", error_chain(&err)),
        },
    }
}

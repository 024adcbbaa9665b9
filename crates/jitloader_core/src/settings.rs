//! Loader settings.
//!
//! # Responsibility
//! - Name the library and bytecode assets the loader extracts.
//! - Resolve temp and asset directories from overrides or the environment.
//!
//! # Invariants
//! - Asset names are plain file names (no separators, no `..`).
//! - Blank environment values are ignored, never applied.

use crate::error::{LoaderError, LoaderResult};
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_LIBRARY_NAME: &str = "gandiva_jni";
pub const DEFAULT_BYTE_CODE_ASSET: &str = "irhelpers.bc";
pub const DEFAULT_CONFIG_SYMBOL: &str = "gandiva_build_config_instance";

pub const ENV_LIBRARY_NAME: &str = "JITLOADER_LIBRARY_NAME";
pub const ENV_BYTE_CODE_ASSET: &str = "JITLOADER_BYTECODE_ASSET";
pub const ENV_TEMP_DIR: &str = "JITLOADER_TMPDIR";
pub const ENV_ASSET_DIR: &str = "JITLOADER_ASSET_DIR";
pub const ENV_CONFIG_SYMBOL: &str = "JITLOADER_CONFIG_SYMBOL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderSettings {
    /// Logical library name; platform prefix/suffix are applied on extraction.
    pub library_name: String,
    /// Fixed asset name of the bytecode blob consumed by the native JIT.
    pub byte_code_asset: String,
    /// Extraction directory. Falls back to the OS temp directory.
    pub temp_dir: Option<PathBuf>,
    /// Directory holding packaged assets. Falls back to the executable's directory.
    pub asset_dir: Option<PathBuf>,
    /// Exported C symbol that builds a configuration from a bytecode path.
    pub config_symbol: String,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            library_name: DEFAULT_LIBRARY_NAME.to_string(),
            byte_code_asset: DEFAULT_BYTE_CODE_ASSET.to_string(),
            temp_dir: None,
            asset_dir: None,
            config_symbol: DEFAULT_CONFIG_SYMBOL.to_string(),
        }
    }
}

impl LoaderSettings {
    /// Builds settings from process environment variables over defaults.
    pub fn from_env() -> LoaderResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup over defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> LoaderResult<Self> {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut settings = Self::default();
        if let Some(value) = read(ENV_LIBRARY_NAME) {
            settings.library_name = value;
        }
        if let Some(value) = read(ENV_BYTE_CODE_ASSET) {
            settings.byte_code_asset = value;
        }
        if let Some(value) = read(ENV_TEMP_DIR) {
            settings.temp_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = read(ENV_ASSET_DIR) {
            settings.asset_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = read(ENV_CONFIG_SYMBOL) {
            settings.config_symbol = value;
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Parses settings from JSON; omitted fields keep their defaults.
    pub fn from_json_str(raw: &str) -> LoaderResult<Self> {
        let settings: Self = serde_json::from_str(raw)
            .map_err(|err| LoaderError::invalid_settings(format!("malformed JSON: {err}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> LoaderResult<()> {
        validate_asset_name("library_name", &self.library_name)?;
        validate_asset_name("byte_code_asset", &self.byte_code_asset)?;
        if self.config_symbol.trim().is_empty() {
            return Err(LoaderError::invalid_settings("config_symbol must not be empty"));
        }
        if self.config_symbol.contains('\0') {
            return Err(LoaderError::invalid_settings(
                "config_symbol must not contain NUL",
            ));
        }
        Ok(())
    }

    /// Platform file name of the shared library, e.g. `libgandiva_jni.so`.
    pub fn library_file_name(&self) -> String {
        libloading::library_filename(&self.library_name)
            .to_string_lossy()
            .into_owned()
    }

    pub fn resolved_temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Asset directory override, else the directory holding the executable.
    pub fn resolved_asset_dir(&self) -> LoaderResult<PathBuf> {
        if let Some(dir) = &self.asset_dir {
            return Ok(dir.clone());
        }
        let exe = std::env::current_exe().map_err(|err| {
            LoaderError::invalid_settings(format!("cannot resolve executable path: {err}"))
        })?;
        exe.parent().map(|dir| dir.to_path_buf()).ok_or_else(|| {
            LoaderError::invalid_settings("executable path has no parent directory")
        })
    }
}

/// Returns true when `name` is a single plain file name.
pub(crate) fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

fn validate_asset_name(field: &str, value: &str) -> LoaderResult<()> {
    if value.trim().is_empty() {
        return Err(LoaderError::invalid_settings(format!(
            "{field} must not be empty"
        )));
    }
    if !is_plain_file_name(value) {
        return Err(LoaderError::invalid_settings(format!(
            "{field} must be a plain file name, got `{value}`"
        )));
    }
    Ok(())
}

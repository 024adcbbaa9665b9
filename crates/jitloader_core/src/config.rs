//! Native configuration handles and their builders.
//!
//! # Responsibility
//! - Model the opaque numeric handle owned by the native library.
//! - Define the builder collaborator used to create the default configuration.
//!
//! # Invariants
//! - A `ConfigHandle` is never zero; zero means "no native object".

use crate::error::{LoaderError, LoaderResult};
use crate::library::NativeWrapper;
use std::ffi::{c_char, CString};
use std::fmt::{Display, Formatter};
use std::num::NonZeroI64;
use std::path::{Path, PathBuf};

/// Opaque reference to a native configuration object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigHandle(NonZeroI64);

impl ConfigHandle {
    /// Returns `None` for the null handle `0`.
    pub fn new(raw: i64) -> Option<Self> {
        NonZeroI64::new(raw).map(Self)
    }

    pub fn get(self) -> i64 {
        self.0.get()
    }
}

impl Display for ConfigHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0.get())
    }
}

/// Builds one native configuration from a bytecode file.
pub trait ConfigurationBuilder: Send {
    fn set_byte_code_file_path(&mut self, path: PathBuf);

    fn build_config_instance(&self) -> LoaderResult<ConfigHandle>;

    fn with_byte_code_file_path(mut self, path: impl Into<PathBuf>) -> Self
    where
        Self: Sized,
    {
        self.set_byte_code_file_path(path.into());
        self
    }
}

/// Produces a fresh builder bound to the loaded library.
pub type BuilderFactory =
    Box<dyn Fn(&NativeWrapper) -> Box<dyn ConfigurationBuilder> + Send + Sync>;

/// Signature of the exported configuration constructor.
pub type BuildConfigFn = unsafe extern "C" fn(byte_code_path: *const c_char) -> i64;

/// Builder that calls an exported C constructor in the loaded library.
pub struct NativeConfigurationBuilder {
    wrapper: NativeWrapper,
    symbol: String,
    byte_code_file_path: Option<PathBuf>,
}

impl NativeConfigurationBuilder {
    pub fn new(wrapper: NativeWrapper, symbol: impl Into<String>) -> Self {
        Self {
            wrapper,
            symbol: symbol.into(),
            byte_code_file_path: None,
        }
    }

    /// Factory producing this builder for `symbol`.
    pub fn factory(symbol: impl Into<String>) -> BuilderFactory {
        let symbol = symbol.into();
        Box::new(move |wrapper: &NativeWrapper| {
            Box::new(NativeConfigurationBuilder::new(wrapper.clone(), symbol.clone()))
                as Box<dyn ConfigurationBuilder>
        })
    }
}

impl ConfigurationBuilder for NativeConfigurationBuilder {
    fn set_byte_code_file_path(&mut self, path: PathBuf) {
        self.byte_code_file_path = Some(path);
    }

    fn build_config_instance(&self) -> LoaderResult<ConfigHandle> {
        let path = self
            .byte_code_file_path
            .as_deref()
            .ok_or_else(|| LoaderError::configuration("byte code file path is not set"))?;
        let c_path = path_to_c_string(path)?;

        // SAFETY: the exported constructor is declared with `BuildConfigFn`.
        let build = unsafe { self.wrapper.get::<BuildConfigFn>(&self.symbol)? };
        // SAFETY: `c_path` is a valid NUL-terminated string for the call.
        let raw = unsafe { build(c_path.as_ptr()) };

        ConfigHandle::new(raw).ok_or_else(|| {
            LoaderError::configuration(format!(
                "`{}` returned a null configuration handle",
                self.symbol
            ))
        })
    }
}

fn path_to_c_string(path: &Path) -> LoaderResult<CString> {
    let raw = path.to_str().ok_or_else(|| {
        LoaderError::configuration(format!(
            "byte code path is not valid UTF-8: {}",
            path.display()
        ))
    })?;
    CString::new(raw).map_err(|_| {
        LoaderError::configuration(format!("byte code path contains NUL: {}", path.display()))
    })
}

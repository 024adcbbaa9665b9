//! Native library bootstrap for the expression JIT.
//!
//! Extracts the bundled shared library and bytecode resource to disk, loads
//! the library with global symbol visibility and memoizes the default native
//! configuration handle.

pub mod assets;
pub mod cleanup;
pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod global;
pub mod library;
pub mod loader;
pub mod logging;
pub mod settings;

pub use assets::{AssetSource, DirectoryAssets, EmbeddedAssets, MemoryAssets};
pub use config::{
    BuilderFactory, ConfigHandle, ConfigurationBuilder, NativeConfigurationBuilder,
};
pub use context::{LoaderContext, LoaderContextBuilder};
pub use error::{error_chain, LoaderError, LoaderResult};
pub use extract::{extract_asset, ExtractedFile};
pub use library::{DynamicLibraryLoader, LibraryLoader, LoadedLibrary, NativeWrapper};
pub use loader::NativeLoader;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use settings::LoaderSettings;

/// Returns the loader crate version.
pub fn loader_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

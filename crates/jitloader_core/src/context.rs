//! Explicit loader context with at-most-once initialization.
//!
//! # Responsibility
//! - Own the loader instance and the default configuration handle.
//! - Initialize each of them at most once, on first use.
//!
//! # Invariants
//! - Concurrent first callers run one initialization; all of them observe the
//!   same fully constructed value.
//! - A failed initialization is not cached; the next call starts over.
//! - Once set, the default configuration handle is never rebuilt.

use crate::assets::AssetSource;
use crate::config::{BuilderFactory, ConfigHandle, NativeConfigurationBuilder};
use crate::error::LoaderResult;
use crate::library::{DynamicLibraryLoader, LibraryLoader};
use crate::loader::NativeLoader;
use crate::settings::LoaderSettings;
use log::{error, info};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Owner of the one-time native initialization state.
pub struct LoaderContext {
    assets: Arc<dyn AssetSource>,
    library_loader: Arc<dyn LibraryLoader>,
    builder_factory: BuilderFactory,
    settings: LoaderSettings,
    loader: OnceCell<NativeLoader>,
    default_configuration: OnceCell<ConfigHandle>,
}

impl LoaderContext {
    /// Starts a context over `assets` with production defaults.
    pub fn builder(assets: Arc<dyn AssetSource>) -> LoaderContextBuilder {
        LoaderContextBuilder {
            assets,
            library_loader: None,
            builder_factory: None,
            settings: LoaderSettings::default(),
        }
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    /// Returns the loader, initializing it on first call.
    ///
    /// # Errors
    /// - `Initialization` wrapping the step that failed. The context stays
    ///   uninitialized and a later call retries.
    pub fn instance(&self) -> LoaderResult<&NativeLoader> {
        self.loader.get_or_try_init(|| {
            NativeLoader::initialize(
                self.assets.as_ref(),
                self.library_loader.as_ref(),
                &self.settings,
            )
        })
    }

    /// Returns the cached default configuration handle, building it once.
    pub fn default_configuration(&self) -> LoaderResult<ConfigHandle> {
        self.default_configuration
            .get_or_try_init(|| self.build_default_configuration())
            .copied()
    }

    /// Returns the loader only when it is already initialized.
    pub fn initialized_instance(&self) -> Option<&NativeLoader> {
        self.loader.get()
    }

    pub fn cached_default_configuration(&self) -> Option<ConfigHandle> {
        self.default_configuration.get().copied()
    }

    fn build_default_configuration(&self) -> LoaderResult<ConfigHandle> {
        let loader = self.instance()?;
        let byte_code_path = loader.byte_code_file_path();

        let mut builder = (self.builder_factory)(loader.wrapper());
        builder.set_byte_code_file_path(byte_code_path.to_path_buf());
        match builder.build_config_instance() {
            Ok(handle) => {
                info!(
                    "event=default_config module=context status=ok handle={} byte_code_path={}",
                    handle,
                    byte_code_path.display()
                );
                Ok(handle)
            }
            Err(err) => {
                error!(
                    "event=default_config module=context status=error error_code={} error={}",
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for LoaderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderContext")
            .field("assets", &self.assets.describe())
            .field("settings", &self.settings)
            .field("initialized", &self.loader.get().is_some())
            .field("default_configuration", &self.default_configuration.get())
            .finish_non_exhaustive()
    }
}

/// Collects collaborators for a [`LoaderContext`].
pub struct LoaderContextBuilder {
    assets: Arc<dyn AssetSource>,
    library_loader: Option<Arc<dyn LibraryLoader>>,
    builder_factory: Option<BuilderFactory>,
    settings: LoaderSettings,
}

impl LoaderContextBuilder {
    pub fn library_loader(mut self, library_loader: Arc<dyn LibraryLoader>) -> Self {
        self.library_loader = Some(library_loader);
        self
    }

    pub fn configuration_builder(mut self, factory: BuilderFactory) -> Self {
        self.builder_factory = Some(factory);
        self
    }

    pub fn settings(mut self, settings: LoaderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Validates settings and assembles the context. Nothing is loaded yet.
    pub fn build(self) -> LoaderResult<LoaderContext> {
        self.settings.validate()?;
        let builder_factory = self
            .builder_factory
            .unwrap_or_else(|| NativeConfigurationBuilder::factory(&self.settings.config_symbol));
        Ok(LoaderContext {
            assets: self.assets,
            library_loader: self
                .library_loader
                .unwrap_or_else(|| Arc::new(DynamicLibraryLoader) as Arc<dyn LibraryLoader>),
            builder_factory,
            settings: self.settings,
            loader: OnceCell::new(),
            default_configuration: OnceCell::new(),
        })
    }
}

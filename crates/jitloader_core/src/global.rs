//! Process-wide default loader context.
//!
//! # Responsibility
//! - Offer implicit, lazily created native access for callers that do not
//!   own a [`LoaderContext`].
//!
//! # Invariants
//! - At most one default context exists per process.
//! - A context installed explicitly wins over the environment-derived one.
//! - A failure to assemble the default context is not cached.

use crate::assets::DirectoryAssets;
use crate::config::ConfigHandle;
use crate::context::LoaderContext;
use crate::error::LoaderResult;
use crate::loader::NativeLoader;
use crate::settings::LoaderSettings;
use log::info;
use once_cell::sync::OnceCell;
use std::sync::Arc;

static DEFAULT_CONTEXT: OnceCell<LoaderContext> = OnceCell::new();

/// Installs `context` as the process-wide default.
///
/// Returns the context back when a default already exists.
pub fn install(context: LoaderContext) -> Result<(), LoaderContext> {
    DEFAULT_CONTEXT.set(context)?;
    info!("event=global_install module=global status=ok");
    Ok(())
}

/// Returns the process-wide context, assembling it from the environment on
/// first use.
pub fn context() -> LoaderResult<&'static LoaderContext> {
    DEFAULT_CONTEXT.get_or_try_init(|| {
        let settings = LoaderSettings::from_env()?;
        let assets = DirectoryAssets::new(settings.resolved_asset_dir()?);
        info!(
            "event=global_context module=global status=ok asset_dir={}",
            assets.root().display()
        );
        LoaderContext::builder(Arc::new(assets))
            .settings(settings)
            .build()
    })
}

/// Returns the process-wide loader instance.
pub fn instance() -> LoaderResult<&'static NativeLoader> {
    context()?.instance()
}

/// Returns the process-wide default configuration handle.
pub fn default_configuration() -> LoaderResult<ConfigHandle> {
    context()?.default_configuration()
}

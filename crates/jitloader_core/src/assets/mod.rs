//! Bundled asset sources.
//!
//! # Responsibility
//! - Resolve a logical asset name to its bytes.
//! - Report absent assets as `LoaderError::AssetNotFound`.
//!
//! # Invariants
//! - Lookups are read-only and safe to share across threads.
//! - An asset source never invents bytes for an unknown name.

use crate::error::LoaderResult;
use std::borrow::Cow;

mod directory;
mod embedded;
mod memory;

pub use directory::DirectoryAssets;
pub use embedded::EmbeddedAssets;
pub use memory::MemoryAssets;

/// Lookup of bundled assets by logical name.
pub trait AssetSource: Send + Sync {
    /// Returns the full contents of `name`.
    ///
    /// # Errors
    /// - `AssetNotFound` when the source has no asset with that name.
    /// - `AssetRead` when the asset exists but cannot be read.
    fn fetch_asset(&self, name: &str) -> LoaderResult<Cow<'static, [u8]>>;

    /// Short label used in log events.
    fn describe(&self) -> String;
}

/// Builds an [`EmbeddedAssets`] manifest from `name => "path"` pairs.
///
/// Paths are resolved like `include_bytes!`, relative to the invoking file.
#[macro_export]
macro_rules! embedded_assets {
    ($($name:expr => $path:expr),* $(,)?) => {
        $crate::assets::EmbeddedAssets::new()
            $(.with($name, include_bytes!($path)))*
    };
}

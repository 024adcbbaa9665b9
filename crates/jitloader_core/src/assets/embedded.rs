//! Compile-time embedded asset manifest.

use super::AssetSource;
use crate::error::{LoaderError, LoaderResult};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Explicit manifest of assets compiled into the binary.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedAssets {
    entries: BTreeMap<&'static str, &'static [u8]>,
}

impl EmbeddedAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one entry; a later entry with the same name replaces the earlier one.
    pub fn with(mut self, name: &'static str, bytes: &'static [u8]) -> Self {
        self.entries.insert(name, bytes);
        self
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}

impl AssetSource for EmbeddedAssets {
    fn fetch_asset(&self, name: &str) -> LoaderResult<Cow<'static, [u8]>> {
        self.entries
            .get(name)
            .map(|bytes| Cow::Borrowed(*bytes))
            .ok_or_else(|| LoaderError::AssetNotFound {
                name: name.to_string(),
            })
    }

    fn describe(&self) -> String {
        format!("embedded({})", self.names().collect::<Vec<_>>().join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::EmbeddedAssets;
    use crate::assets::AssetSource;
    use crate::error::LoaderError;

    #[test]
    fn macro_embeds_file_bytes() {
        let assets = crate::embedded_assets! {
            "manifest.toml" => "../../Cargo.toml",
        };
        let expected = std::fs::read(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"))
            .expect("read manifest");

        let fetched = assets.fetch_asset("manifest.toml").expect("embedded asset");
        assert_eq!(fetched.as_ref(), expected.as_slice());
    }

    #[test]
    fn unknown_name_is_not_found() {
        let assets = EmbeddedAssets::new().with("a.bin", b"abc");
        let err = assets.fetch_asset("b.bin").expect_err("missing asset");
        assert!(matches!(err, LoaderError::AssetNotFound { name } if name == "b.bin"));
    }

    #[test]
    fn lists_names_in_order() {
        let assets = EmbeddedAssets::new()
            .with("z.bin", b"z")
            .with("a.bin", b"a");
        assert_eq!(assets.names().collect::<Vec<_>>(), vec!["a.bin", "z.bin"]);
        assert_eq!(assets.describe(), "embedded(a.bin,z.bin)");
    }
}

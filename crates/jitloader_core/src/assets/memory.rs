//! Owned in-memory asset map.

use super::AssetSource;
use crate::error::{LoaderError, LoaderResult};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Assets staged in memory by the caller.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(name.into(), bytes.into());
    }

    pub fn with(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }
}

impl AssetSource for MemoryAssets {
    fn fetch_asset(&self, name: &str) -> LoaderResult<Cow<'static, [u8]>> {
        self.entries
            .get(name)
            .map(|bytes| Cow::Owned(bytes.clone()))
            .ok_or_else(|| LoaderError::AssetNotFound {
                name: name.to_string(),
            })
    }

    fn describe(&self) -> String {
        format!("memory(entries={})", self.entries.len())
    }
}

//! Lazily-filled template store.
//!
//! Template text is read from disk the first time a translator asks for it
//! and kept for the lifetime of the owning [`GatewayConfig`](crate::GatewayConfig).
//! Nothing is ever evicted or reloaded.

use crate::{ConfigError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: RwLock<HashMap<PathBuf, Arc<str>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a template, serving it from the cache when already loaded.
    ///
    /// A file that does not exist yields `Ok(None)` and is not remembered, so
    /// a template dropped in later is still picked up. Any other I/O failure is
    /// reported as [`ConfigError::Template`].
    pub fn load(&self, path: &Path) -> Result<Option<Arc<str>>> {
        if let Some(hit) = self.entries.read().get(path) {
            return Ok(Some(Arc::clone(hit)));
        }

        let text: Arc<str> = match fs::read_to_string(path) {
            Ok(text) => text.into(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No template file present");
                return Ok(None);
            }
            Err(source) => {
                return Err(ConfigError::Template {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        tracing::debug!(path = %path.display(), bytes = text.len(), "Loaded template");

        let mut entries = self.entries.write();
        let cached = entries
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::clone(&text));
        Ok(Some(Arc::clone(cached)))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

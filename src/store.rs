//! Persistence collaborator
//!
//! The engine never does I/O on its own; callers load bundles and progress
//! through a [`BundleStore`] before invoking it and save the results after.
//! Saves of one bundle key must be serialized by the caller.

use crate::data::TranslationBundle;
use crate::error::I18nResult;
use crate::key::{BundleKey, ResourceKey};
use crate::progress::Progress;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key-value storage for translation bundles and progress records
pub trait BundleStore {
    fn load_bundle(&self, key: &BundleKey) -> I18nResult<Option<TranslationBundle>>;

    fn save_bundle(&mut self, bundle: TranslationBundle) -> I18nResult<()>;

    /// Save several bundles; not transactional across bundles
    fn save_all(&mut self, bundles: Vec<TranslationBundle>) -> I18nResult<()> {
        for bundle in bundles {
            self.save_bundle(bundle)?;
        }
        Ok(())
    }

    fn delete_bundle(&mut self, key: &BundleKey) -> I18nResult<()>;

    fn load_progress(&self, resource: &ResourceKey) -> I18nResult<Option<Progress>>;

    fn save_progress(&mut self, progress: Progress) -> I18nResult<()>;
}

/// Bundles and progress held in ordered maps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryStore {
    bundles: BTreeMap<String, TranslationBundle>,
    progress: BTreeMap<String, Progress>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bundle_count(&self) -> usize {
        self.bundles.len()
    }

    pub fn bundles(&self) -> impl Iterator<Item = &TranslationBundle> {
        self.bundles.values()
    }
}

impl BundleStore for InMemoryStore {
    fn load_bundle(&self, key: &BundleKey) -> I18nResult<Option<TranslationBundle>> {
        Ok(self.bundles.get(&key.to_string()).cloned())
    }

    fn save_bundle(&mut self, bundle: TranslationBundle) -> I18nResult<()> {
        self.bundles.insert(bundle.key.to_string(), bundle);
        Ok(())
    }

    fn delete_bundle(&mut self, key: &BundleKey) -> I18nResult<()> {
        self.bundles.remove(&key.to_string());
        Ok(())
    }

    fn load_progress(&self, resource: &ResourceKey) -> I18nResult<Option<Progress>> {
        Ok(self.progress.get(&resource.to_string()).cloned())
    }

    fn save_progress(&mut self, progress: Progress) -> I18nResult<()> {
        self.progress.insert(progress.resource.to_string(), progress);
        Ok(())
    }
}

/// An [`InMemoryStore`] persisted as one JSON document after every write
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: InMemoryStore,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty when the file does not exist
    pub fn open(path: &Path) -> I18nResult<Self> {
        let inner = if path.exists() {
            let content = fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            InMemoryStore::new()
        };
        debug!(path = %path.display(), bundles = inner.bundle_count(), "opened store");
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    fn flush(&self) -> I18nResult<()> {
        let content = serde_json::to_string_pretty(&self.inner)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl BundleStore for JsonFileStore {
    fn load_bundle(&self, key: &BundleKey) -> I18nResult<Option<TranslationBundle>> {
        self.inner.load_bundle(key)
    }

    fn save_bundle(&mut self, bundle: TranslationBundle) -> I18nResult<()> {
        self.inner.save_bundle(bundle)?;
        self.flush()
    }

    fn save_all(&mut self, bundles: Vec<TranslationBundle>) -> I18nResult<()> {
        self.inner.save_all(bundles)?;
        self.flush()
    }

    fn delete_bundle(&mut self, key: &BundleKey) -> I18nResult<()> {
        self.inner.delete_bundle(key)?;
        self.flush()
    }

    fn load_progress(&self, resource: &ResourceKey) -> I18nResult<Option<Progress>> {
        self.inner.load_progress(resource)
    }

    fn save_progress(&mut self, progress: Progress) -> I18nResult<()> {
        self.inner.save_progress(progress)?;
        self.flush()
    }
}

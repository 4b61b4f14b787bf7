//! Commands behind the `course-i18n` binary
//!
//! Content items are read from a JSON array of [`ContentItem`]s and
//! translations live in a single JSON store file. Each command is a plain
//! function so it can be driven from tests without spawning a process.

use course_i18n::{
    BundleKey, BundleStore, ContentItem, EngineConfig, I18nError, I18nResult, ImportReport,
    JsonFileStore, LazyRecomposer, ProgressStatus, ResourceRegistry, TagMarkup, Viewer,
    export_catalogs, import_archive, import_catalog_text, inspect_progress,
    pseudo_translate_catalog,
};
use std::fs;
use std::path::Path;
use tracing::info;

/// Read the content items to translate
pub fn load_content(path: &Path) -> I18nResult<Vec<ContentItem>> {
    let content = fs::read_to_string(path)?;
    let items: Vec<ContentItem> = serde_json::from_str(&content)?;
    info!(path = %path.display(), items = items.len(), "loaded content");
    Ok(items)
}

/// Read the engine configuration, or the defaults when no file is given
pub fn load_config(path: Option<&Path>) -> I18nResult<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}

/// Export catalogs for `locales` as zip bytes
///
/// With `pseudo`, every msgstr is filled with the pseudo-language.
pub fn export(
    items: &[ContentItem],
    store: &JsonFileStore,
    config: &EngineConfig,
    locales: &[String],
    pseudo: bool,
) -> I18nResult<Vec<u8>> {
    let mut set = export_catalogs(
        items,
        store,
        locales,
        &config.export,
        &ResourceRegistry::standard(),
        &TagMarkup,
    )?;
    if pseudo {
        for catalog in &mut set.catalogs {
            pseudo_translate_catalog(catalog)?;
        }
    }
    set.to_zip()
}

/// Import a zip archive, or a single catalog file
pub fn import(
    items: &[ContentItem],
    store: &mut JsonFileStore,
    config: &EngineConfig,
    path: &Path,
) -> I18nResult<ImportReport> {
    let is_zip = path.extension().is_some_and(|ext| ext == "zip");
    if is_zip {
        let bytes = fs::read(path)?;
        import_archive(&bytes, &config.export.extension, items, store, &TagMarkup)
    } else {
        let text = fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        import_catalog_text(&name, &text, items, store, &TagMarkup)
    }
}

/// Render every field of the item `key` points at
///
/// Returns `(field name, rendered document)` pairs.
pub fn render(
    items: &[ContentItem],
    store: &JsonFileStore,
    config: &EngineConfig,
    key: &BundleKey,
    viewer: Viewer,
) -> I18nResult<Vec<(String, String)>> {
    let item = items
        .iter()
        .find(|item| item.resource_key() == key.resource_key())
        .ok_or_else(|| I18nError::InvalidBundleKey(key.to_string()))?;
    let bundle = store.load_bundle(key)?;

    Ok(LazyRecomposer::new(&TagMarkup)
        .recompose_item(item, key, bundle.as_ref())
        .into_iter()
        .map(|(name, result)| (name, result.render(viewer, key, &config.render)))
        .collect())
}

/// Progress of every item in `locale`
pub fn progress(
    items: &[ContentItem],
    store: &mut JsonFileStore,
    locale: &str,
) -> I18nResult<Vec<(String, ProgressStatus)>> {
    items
        .iter()
        .map(|item| {
            let status = inspect_progress(store, item, locale, &TagMarkup)?;
            Ok((item.resource_key().to_string(), status))
        })
        .collect()
}

//! Catalog import
//!
//! An upload is validated as a whole before anything is written: every file
//! must parse, every location must carry a supported protocol version, and
//! exactly one locale must be referenced. Only then is each referenced
//! bundle rebuilt from the current content and saved.

use crate::archive::read_zip;
use crate::catalog::Catalog;
use crate::config::ResourceRegistry;
use crate::data::{ContentItem, TranslationBundle, Verb};
use crate::editor::{build_sections, record_progress, sections_to_bundle};
use crate::error::{I18nError, I18nResult};
use crate::key::{BundleKey, normalize_locale};
use crate::markup::Decomposer;
use crate::memory::{SplitPolicy, TranslationMemory};
use crate::progress::{ProgressStatus, compute_section_status};
use crate::store::BundleStore;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Outcome of a successful import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub locale: String,
    pub catalogs: usize,
    pub bundles_updated: usize,
    pub translations_applied: usize,
    /// Bundle keys that no longer match any content item
    pub unknown_locations: Vec<String>,
    /// Bundle keys whose current content could not be decomposed
    pub skipped: Vec<String>,
}

/// Import a zip archive of catalogs
///
/// # Arguments
/// * `bytes` - The uploaded archive
/// * `extension` - Catalog file extension, without the dot
/// * `items` - Current content; translations are matched against it
/// * `store` - Destination for rebuilt bundles and progress
/// * `decomposer` - Splits rich text into fragments
pub fn import_archive(
    bytes: &[u8],
    extension: &str,
    items: &[ContentItem],
    store: &mut dyn BundleStore,
    decomposer: &dyn Decomposer,
) -> I18nResult<ImportReport> {
    let catalogs = read_zip(bytes, extension)?;
    import_catalogs(&catalogs, items, store, decomposer)
}

/// Import a single catalog file
pub fn import_catalog_text(
    file_name: &str,
    text: &str,
    items: &[ContentItem],
    store: &mut dyn BundleStore,
    decomposer: &dyn Decomposer,
) -> I18nResult<ImportReport> {
    let catalog = Catalog::parse(file_name, text)?;
    import_catalogs(std::slice::from_ref(&catalog), items, store, decomposer)
}

/// The single locale referenced by an upload
///
/// Locales come from each catalog's `Language` header and from the key of
/// every location.
///
/// # Errors
/// `MixedLocales` when more than one locale appears, `MissingLocale` when
/// none does.
pub fn upload_locale(catalogs: &[Catalog]) -> I18nResult<String> {
    let mut locales = BTreeSet::new();
    for catalog in catalogs {
        if !catalog.locale.is_empty() {
            locales.insert(catalog.locale.clone());
        }
        for entry in &catalog.entries {
            for location in &entry.locations {
                locales.insert(location.key.locale.clone());
            }
        }
    }

    let mut locales = locales.into_iter();
    match (locales.next(), locales.next()) {
        (None, _) => Err(I18nError::MissingLocale),
        (Some(locale), None) => Ok(locale),
        (Some(first), Some(second)) => {
            let mut all = vec![first, second];
            all.extend(locales);
            Err(I18nError::MixedLocales(all))
        }
    }
}

/// Apply already parsed catalogs
///
/// Nothing is written unless the whole upload validates.
pub fn import_catalogs(
    catalogs: &[Catalog],
    items: &[ContentItem],
    store: &mut dyn BundleStore,
    decomposer: &dyn Decomposer,
) -> I18nResult<ImportReport> {
    // Step 1: validate the upload as a whole
    let locale = upload_locale(catalogs)?;
    normalize_locale(&locale).map_err(|_| {
        I18nError::Protocol(format!("upload names an invalid locale '{}'", locale))
    })?;

    // Step 2: gather translations by source text
    let mut memory =
        TranslationMemory::new(&locale, SplitPolicy::default(), ResourceRegistry::new());
    for catalog in catalogs {
        for entry in &catalog.entries {
            let (msgid, msgstr) = catalog.decoded(entry)?;
            for location in &entry.locations {
                let message = memory.get_or_create(&location.key, &msgid);
                message.add_location(&location.key, &location.display_name, location.kind);
                message.add_translation(&msgstr);
            }
        }
    }

    // Step 3: rebuild every touched bundle before saving any of them
    let mut report = ImportReport {
        locale: locale.clone(),
        catalogs: catalogs.len(),
        ..ImportReport::default()
    };
    let mut bundles: Vec<TranslationBundle> = Vec::new();
    let mut statuses: Vec<(BundleKey, ProgressStatus)> = Vec::new();

    for (key, translations) in memory.translations_by_bundle() {
        let Some(item) = items.iter().find(|item| item.resource_key() == key.resource_key()) else {
            warn!(key = %key, "skipping translations for unknown content");
            report.unknown_locations.push(key.to_string());
            continue;
        };

        let existing = store.load_bundle(&key)?;
        let mut sections = match build_sections(item, existing.as_ref(), decomposer) {
            Ok(sections) => sections,
            Err(e) => {
                warn!(key = %key, error = %e, "skipping content that cannot be decomposed");
                report.skipped.push(key.to_string());
                continue;
            }
        };

        let mut applied = 0;
        for fragment in sections.iter_mut().flat_map(|s| s.fragments.iter_mut()) {
            let Some(translation) = translations.get(&fragment.source_value) else {
                continue;
            };
            if fragment.verb == Verb::Current && fragment.target_value == *translation {
                continue;
            }
            fragment.edit(translation);
            applied += 1;
        }

        if applied == 0 {
            continue;
        }
        debug!(key = %key, applied, "rebuilt bundle from import");
        report.translations_applied += applied;
        statuses.push((key.clone(), compute_section_status(&sections)));
        bundles.push(sections_to_bundle(&key, &sections));
    }

    // Step 4: persist
    report.bundles_updated = bundles.len();
    store.save_all(bundles)?;
    for (key, status) in &statuses {
        record_progress(store, key, *status)?;
    }

    info!(
        locale = %report.locale,
        catalogs = report.catalogs,
        bundles = report.bundles_updated,
        translations = report.translations_applied,
        unknown = report.unknown_locations.len(),
        skipped = report.skipped.len(),
        "imported translations"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogEntry, CatalogLocation};
    use crate::data::{FieldKind, SourceField};
    use crate::markup::TagMarkup;
    use crate::store::InMemoryStore;

    fn lesson() -> ContentItem {
        ContentItem::new("lesson", "1", "Lesson 1")
            .with_field(SourceField::plain("title", "Title", "Intro"))
            .with_field(SourceField::rich("body", "Body", "<p>Hello</p><p>World</p>"))
    }

    fn entry(msgid: &str, msgstr: &str, key: &str) -> CatalogEntry {
        CatalogEntry {
            locations: vec![CatalogLocation {
                display_name: "Lesson 1".to_string(),
                kind: FieldKind::RichText,
                key: BundleKey::parse(key).unwrap(),
            }],
            msgid: msgid.to_string(),
            msgstr: msgstr.to_string(),
            ..CatalogEntry::default()
        }
    }

    fn catalog(locale: &str, entries: Vec<CatalogEntry>) -> Catalog {
        let mut catalog = Catalog::new("messages.po", locale);
        catalog.entries = entries;
        catalog
    }

    // ========== Locale Validation Tests ==========

    #[test]
    fn test_upload_locale_from_header_and_locations() {
        let catalogs = vec![catalog("fr", vec![entry("Hello", "Bonjour", "lesson:1:fr")])];
        assert_eq!(upload_locale(&catalogs).unwrap(), "fr");

        let headerless = vec![catalog("", vec![entry("Hello", "Bonjour", "lesson:1:fr")])];
        assert_eq!(upload_locale(&headerless).unwrap(), "fr");
    }

    #[test]
    fn test_upload_locale_rejects_mixed_locales() {
        let catalogs = vec![
            catalog("fr", vec![entry("Hello", "Bonjour", "lesson:1:fr")]),
            catalog("de", vec![entry("Hello", "Hallo", "lesson:1:de")]),
        ];
        match upload_locale(&catalogs) {
            Err(I18nError::MixedLocales(locales)) => assert_eq!(locales, vec!["de", "fr"]),
            other => panic!("expected MixedLocales, got {:?}", other),
        }
    }

    #[test]
    fn test_upload_locale_requires_a_locale() {
        assert!(matches!(
            upload_locale(&[catalog("", Vec::new())]),
            Err(I18nError::MissingLocale)
        ));
    }

    // ========== Apply Tests ==========

    #[test]
    fn test_import_applies_translations() {
        let mut store = InMemoryStore::new();
        let catalogs = vec![catalog(
            "fr",
            vec![
                entry("Intro", "Introduction", "lesson:1:fr"),
                entry("Hello", "Bonjour", "lesson:1:fr"),
                entry("World", "", "lesson:1:fr"),
            ],
        )];

        let report = import_catalogs(&catalogs, &[lesson()], &mut store, &TagMarkup).unwrap();
        assert_eq!(report.locale, "fr");
        assert_eq!(report.bundles_updated, 1);
        assert_eq!(report.translations_applied, 2);

        let key = BundleKey::new("lesson", "1", "fr");
        let bundle = store.load_bundle(&key).unwrap().unwrap();
        assert_eq!(bundle.field("title").unwrap().targets(), vec!["Introduction"]);
        assert_eq!(bundle.field("body").unwrap().targets(), vec!["Bonjour", ""]);
        assert_eq!(
            store.load_progress(&key.resource_key()).unwrap().unwrap().get("fr"),
            ProgressStatus::InProgress
        );
    }

    #[test]
    fn test_import_completes_translation() {
        let mut store = InMemoryStore::new();
        let catalogs = vec![catalog(
            "fr",
            vec![
                entry("Intro", "Introduction", "lesson:1:fr"),
                entry("Hello", "Bonjour", "lesson:1:fr"),
                entry("World", "Monde", "lesson:1:fr"),
            ],
        )];
        import_catalogs(&catalogs, &[lesson()], &mut store, &TagMarkup).unwrap();

        let key = BundleKey::new("lesson", "1", "fr");
        assert_eq!(
            store.load_progress(&key.resource_key()).unwrap().unwrap().get("fr"),
            ProgressStatus::Done
        );
        let bundle = store.load_bundle(&key).unwrap();
        let sections = build_sections(&lesson(), bundle.as_ref(), &TagMarkup).unwrap();
        assert!(
            sections
                .iter()
                .flat_map(|s| &s.fragments)
                .all(|f| f.verb == Verb::Current && f.is_translated())
        );
    }

    #[test]
    fn test_import_ignores_translations_for_vanished_text() {
        let mut store = InMemoryStore::new();
        let catalogs = vec![catalog(
            "fr",
            vec![entry("Goodbye", "Au revoir", "lesson:1:fr")],
        )];
        let report = import_catalogs(&catalogs, &[lesson()], &mut store, &TagMarkup).unwrap();
        assert_eq!(report.bundles_updated, 0);
        assert_eq!(store.bundle_count(), 0);
    }

    #[test]
    fn test_import_skips_unknown_content() {
        let mut store = InMemoryStore::new();
        let catalogs = vec![catalog(
            "fr",
            vec![
                entry("Hello", "Bonjour", "lesson:1:fr"),
                entry("Hello", "Bonjour", "lesson:99:fr"),
            ],
        )];
        let report = import_catalogs(&catalogs, &[lesson()], &mut store, &TagMarkup).unwrap();
        assert_eq!(report.unknown_locations, vec!["lesson:99:fr".to_string()]);
        assert_eq!(report.bundles_updated, 1);
    }

    #[test]
    fn test_mixed_upload_writes_nothing() {
        let mut store = InMemoryStore::new();
        let catalogs = vec![
            catalog("fr", vec![entry("Hello", "Bonjour", "lesson:1:fr")]),
            catalog("de", vec![entry("Hello", "Hallo", "lesson:1:de")]),
        ];
        assert!(import_catalogs(&catalogs, &[lesson()], &mut store, &TagMarkup).is_err());
        assert_eq!(store, InMemoryStore::new());
    }

    #[test]
    fn test_bad_escape_writes_nothing() {
        let mut store = InMemoryStore::new();
        let mut broken = catalog("fr", vec![entry("Hello", "Bon\\jour", "lesson:1:fr")]);
        broken.use_square_brackets = true;
        let good = catalog("fr", vec![entry("World", "Monde", "lesson:1:fr")]);

        let result = import_catalogs(&[good, broken], &[lesson()], &mut store, &TagMarkup);
        assert!(matches!(result, Err(I18nError::Protocol(_))));
        assert_eq!(store.bundle_count(), 0);
    }

    #[test]
    fn test_import_skips_content_that_cannot_be_decomposed() {
        let broken = ContentItem::new("lesson", "1", "Lesson 1")
            .with_field(SourceField::rich("body", "Body", "<p>Hello <b</p>"));
        let mut store = InMemoryStore::new();
        let catalogs = vec![catalog("fr", vec![entry("Hello", "Bonjour", "lesson:1:fr")])];

        let report = import_catalogs(&catalogs, &[broken], &mut store, &TagMarkup).unwrap();
        assert_eq!(report.skipped, vec!["lesson:1:fr".to_string()]);
        assert_eq!(store.bundle_count(), 0);
    }

    #[test]
    fn test_import_catalog_text() {
        let text = "msgid \"\"\n\
                    msgstr \"Language: fr\\n\"\n\
                    \n\
                    #: GCB-1|Lesson 1|html|lesson:1:fr\n\
                    msgid \"Hello\"\n\
                    msgstr \"Bonjour\"\n";
        let mut store = InMemoryStore::new();
        let report =
            import_catalog_text("fr/messages.po", text, &[lesson()], &mut store, &TagMarkup)
                .unwrap();
        assert_eq!(report.translations_applied, 1);
    }

    #[test]
    fn test_import_rejects_unknown_location_version() {
        let text = "#: GCB-2|Lesson 1|html|lesson:1:fr\n\
                    msgid \"Hello\"\n\
                    msgstr \"Bonjour\"\n";
        let mut store = InMemoryStore::new();
        let result =
            import_catalog_text("messages.po", text, &[lesson()], &mut store, &TagMarkup);
        assert!(matches!(result, Err(I18nError::Protocol(_))));
    }
}

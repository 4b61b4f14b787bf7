//! Editing surface
//!
//! Builds the verb-tagged view of a content item that a translator edits,
//! and turns edited sections back into a stored bundle. Saving a bundle
//! always recomputes the rolled-up progress for its locale.

use crate::align::align_fragments;
use crate::data::{
    ContentItem, FieldBundle, FieldKind, Section, StoredFragment, TranslationBundle, Verb,
};
use crate::error::I18nResult;
use crate::key::BundleKey;
use crate::markup::Decomposer;
use crate::progress::{Progress, ProgressStatus, compute_section_status};
use crate::store::BundleStore;
use tracing::debug;

/// One section per field of `item`, aligned against the stored bundle
///
/// A stored field whose kind no longer matches the schema is ignored.
pub fn build_sections(
    item: &ContentItem,
    bundle: Option<&TranslationBundle>,
    decomposer: &dyn Decomposer,
) -> I18nResult<Vec<Section>> {
    item.fields
        .iter()
        .map(|field| {
            let stored: &[StoredFragment] = bundle
                .and_then(|b| b.field(&field.name))
                .filter(|f| f.kind == field.kind)
                .map(|f| f.fragments.as_slice())
                .unwrap_or(&[]);

            let (current, source_value) = match field.kind {
                FieldKind::PlainString => (vec![field.value.clone()], None),
                FieldKind::RichText => (
                    decomposer.decompose(&field.value)?,
                    Some(field.value.clone()),
                ),
            };

            Ok(Section {
                name: field.name.clone(),
                label: field.label.clone(),
                kind: field.kind,
                source_value,
                fragments: align_fragments(&current, stored),
            })
        })
        .collect()
}

/// The stored form of edited sections
///
/// Stale translations that were not touched keep the source they were made
/// from, so they are still recognised as CHANGED next time.
pub fn sections_to_bundle(key: &BundleKey, sections: &[Section]) -> TranslationBundle {
    let mut bundle = TranslationBundle::new(key.clone());
    for section in sections {
        let fragments = section
            .fragments
            .iter()
            .map(|fragment| {
                let source = match (&fragment.old_source_value, fragment.verb) {
                    (Some(old), Verb::Changed) if !fragment.edited_this_session => old,
                    _ => &fragment.source_value,
                };
                StoredFragment::new(source, &fragment.target_value)
            })
            .collect();

        let field = FieldBundle {
            kind: section.kind,
            source_value: section.source_value.clone(),
            fragments,
        };
        bundle.fields.insert(section.name.clone(), field);
    }
    bundle
}

/// Persist edited sections and recompute progress
pub fn save_sections(
    store: &mut dyn BundleStore,
    key: &BundleKey,
    sections: &[Section],
) -> I18nResult<ProgressStatus> {
    let status = compute_section_status(sections);
    store.save_bundle(sections_to_bundle(key, sections))?;
    record_progress(store, key, status)?;
    debug!(key = %key, status = ?status, "saved translation");
    Ok(status)
}

/// Remove the translation of `item` into `locale`
pub fn delete_translations(
    store: &mut dyn BundleStore,
    item: &ContentItem,
    locale: &str,
) -> I18nResult<()> {
    let key = item.bundle_key(locale);
    store.delete_bundle(&key)?;
    let resource = key.resource_key();
    if let Some(mut progress) = store.load_progress(&resource)? {
        progress.clear(&key.locale);
        store.save_progress(progress)?;
    }
    Ok(())
}

/// Store `status` as the progress of `key`'s locale
pub fn record_progress(
    store: &mut dyn BundleStore,
    key: &BundleKey,
    status: ProgressStatus,
) -> I18nResult<()> {
    let resource = key.resource_key();
    let mut progress = store
        .load_progress(&resource)?
        .unwrap_or_else(|| Progress::new(resource));
    progress.set(&key.locale, status);
    store.save_progress(progress)
}

/// Progress of `item` in `locale`, computed and stored on first inspection
pub fn inspect_progress(
    store: &mut dyn BundleStore,
    item: &ContentItem,
    locale: &str,
    decomposer: &dyn Decomposer,
) -> I18nResult<ProgressStatus> {
    let key = item.bundle_key(locale);
    if let Some(status) = store
        .load_progress(&key.resource_key())?
        .and_then(|p| p.locales.get(locale).copied())
    {
        return Ok(status);
    }

    let bundle = store.load_bundle(&key)?;
    let sections = build_sections(item, bundle.as_ref(), decomposer)?;
    let status = compute_section_status(&sections);
    record_progress(store, &key, status)?;
    Ok(status)
}

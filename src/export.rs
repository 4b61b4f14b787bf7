//! Catalog export
//!
//! Aligns every translatable field of every content item against what is
//! stored for each requested locale, feeds the results through a
//! [`TranslationMemory`] so identical source text is translated once, and
//! renders one [`Catalog`] per output file.

use crate::archive::CatalogSet;
use crate::catalog::Catalog;
use crate::config::{ExportOptions, ExportWhat, ResourceRegistry};
use crate::data::{ContentItem, Verb};
use crate::editor::build_sections;
use crate::error::I18nResult;
use crate::key::normalize_locale;
use crate::markup::Decomposer;
use crate::memory::{SplitPolicy, TranslationMemory};
use crate::store::BundleStore;
use tracing::{info, warn};

/// Prefix of the translator comment carrying an out-of-date translation
pub const OUT_OF_DATE_PREFIX: &str = "Out of date translation: ";

/// Build the catalogs for `locales`
///
/// Items whose rich text cannot be decomposed are skipped with a warning
/// rather than failing the whole export.
///
/// # Arguments
/// * `items` - Content to export, in the order entries should appear
/// * `store` - Where existing translations are read from
/// * `locales` - Target locales; one set of files is produced per locale
/// * `options` - File layout and filtering
/// * `registry` - Resource types, used to route settings-like content
/// * `decomposer` - Splits rich text into fragments
///
/// # Errors
/// `Config` for invalid options, `InvalidLocale` for a malformed locale, or
/// any store failure.
pub fn export_catalogs(
    items: &[ContentItem],
    store: &dyn BundleStore,
    locales: &[String],
    options: &ExportOptions,
    registry: &ResourceRegistry,
    decomposer: &dyn Decomposer,
) -> I18nResult<CatalogSet> {
    options.validate()?;
    let mut set = CatalogSet::new();

    for locale in locales {
        normalize_locale(locale)?;
        let mut memory =
            TranslationMemory::new(locale, SplitPolicy::from(options), registry.clone());

        for item in items {
            let key = item.bundle_key(locale);
            let bundle = store.load_bundle(&key)?;
            let sections = match build_sections(item, bundle.as_ref(), decomposer) {
                Ok(sections) => sections,
                Err(e) => {
                    warn!(key = %key, error = %e, "skipping item that cannot be decomposed");
                    continue;
                }
            };

            for section in &sections {
                for fragment in &section.fragments {
                    if fragment.source_value.trim().is_empty() {
                        continue;
                    }
                    if options.export_what == ExportWhat::Untranslated
                        && fragment.verb == Verb::Current
                        && fragment.is_translated()
                    {
                        continue;
                    }

                    let message = memory.get_or_create(&key, &fragment.source_value);
                    message.add_location(&key, &item.display_name, section.kind);
                    match fragment.verb {
                        Verb::Current => message.add_translation(&fragment.target_value),
                        Verb::Changed => {
                            message.add_translation("");
                            if let Some(old) = &fragment.old_source_value {
                                message.set_previous_id(old);
                            }
                            if fragment.is_translated() {
                                message.add_comment(&format!(
                                    "{}{}",
                                    OUT_OF_DATE_PREFIX, fragment.target_value
                                ));
                            }
                        }
                        Verb::New => message.add_translation(""),
                    }
                }
            }
        }

        let before = set.len();
        for (file_name, file) in memory.files() {
            set.push(Catalog::from_messages(
                file_name,
                locale,
                file.messages(),
                options.use_square_brackets,
            ));
        }
        info!(
            locale = %locale,
            files = set.len() - before,
            messages = memory.len(),
            "exported catalogs"
        );
    }

    Ok(set)
}

//! Lazy Recomposer
//!
//! Produces the translated form of a field at render time from the current
//! source, the stored translation and the markup collaborator. Rendering
//! must always yield a document, so nothing here returns an error:
//!
//! 1. Decompose the current source and align it against the stored fragments
//! 2. Use the stored target for CURRENT fragments and the untranslated
//!    source fragment for everything else, counting each as a miss
//! 3. Recompose and collect structural errors
//! 4. With no misses and no errors the result is VALID; otherwise fall back
//!    to the last fully stored translation rebuilt against the stored
//!    source and mark the result INVALID
//!
//! Collaborator failures are logged and treated like structural errors.

use crate::align::align;
use crate::config::RenderOptions;
use crate::data::{ContentItem, FieldBundle, FieldKind, TranslationBundle, Verb};
use crate::key::BundleKey;
use crate::markup::Decomposer;
use tracing::{debug, warn};

/// Outcome of recomposing one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomposeStatus {
    /// No stored translation, or an empty source
    NotStarted,
    /// Every fragment translated and reassembled cleanly
    Valid,
    /// A document was produced but it is degraded
    Invalid,
}

/// Who is looking at the rendered document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    /// Sees degradation notices and a link to fix the translation
    Author,
    /// Never sees internal error text
    EndUser,
}

/// A recomposed field and everything needed to render it for any viewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recomposition {
    pub status: RecomposeStatus,
    /// Best-effort document built from the current source
    pub document: String,
    /// Last fully stored translation, when it could be rebuilt
    pub fallback: Option<String>,
    /// The current source text, untouched
    pub source: String,
    pub misses: usize,
    pub errors: Vec<String>,
    /// Human-readable explanation for INVALID results
    pub message: Option<String>,
}

impl Recomposition {
    fn untranslated(status: RecomposeStatus, source: &str) -> Self {
        Self {
            status,
            document: source.to_string(),
            fallback: None,
            source: source.to_string(),
            misses: 0,
            errors: Vec::new(),
            message: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == RecomposeStatus::Valid
    }

    /// The document shown to `viewer`
    ///
    /// Authors get the fallback (or, failing that, the verbatim source)
    /// behind a notice. End users get the bare fallback, or the live
    /// degraded document when no fallback exists.
    pub fn render(&self, viewer: Viewer, key: &BundleKey, options: &RenderOptions) -> String {
        if self.status != RecomposeStatus::Invalid {
            return self.document.clone();
        }

        match viewer {
            Viewer::EndUser => self
                .fallback
                .clone()
                .unwrap_or_else(|| self.document.clone()),
            Viewer::Author => {
                let body = self.fallback.as_deref().unwrap_or(&self.source);
                let message = self.message.as_deref().unwrap_or_default();
                let notice = match options.edit_link(&key.to_string()) {
                    Some(link) => format!(
                        "<div class=\"translation-notice\">{} <a href=\"{}\">Fix translation</a></div>",
                        message, link
                    ),
                    None => format!("<div class=\"translation-notice\">{}</div>", message),
                };
                format!("{}\n{}", notice, body)
            }
        }
    }
}

/// Human-readable count of out-of-date fragments
///
/// # Example
/// ```ignore
/// assert_eq!(out_of_date_message(1), "1 part of this translation is out of date.");
/// ```
pub fn out_of_date_message(misses: usize) -> String {
    match misses {
        0 => "This translation could not be reassembled and may be out of date.".to_string(),
        1 => "1 part of this translation is out of date.".to_string(),
        n => format!("{} parts of this translation are out of date.", n),
    }
}

/// Recomposes translated fields on demand
pub struct LazyRecomposer<'a> {
    decomposer: &'a dyn Decomposer,
}

impl<'a> LazyRecomposer<'a> {
    pub fn new(decomposer: &'a dyn Decomposer) -> Self {
        Self { decomposer }
    }

    /// Recompose every field of `item` from the bundle stored for `key`
    pub fn recompose_item(
        &self,
        item: &ContentItem,
        key: &BundleKey,
        bundle: Option<&TranslationBundle>,
    ) -> Vec<(String, Recomposition)> {
        item.fields
            .iter()
            .map(|field| {
                let stored = bundle.and_then(|b| b.field(&field.name));
                let result = self.recompose_field(key, &field.name, field.kind, &field.value, stored);
                (field.name.clone(), result)
            })
            .collect()
    }

    /// Recompose one field
    pub fn recompose_field(
        &self,
        key: &BundleKey,
        field_name: &str,
        kind: FieldKind,
        current_source: &str,
        stored: Option<&FieldBundle>,
    ) -> Recomposition {
        if current_source.is_empty() {
            return Recomposition::untranslated(RecomposeStatus::NotStarted, current_source);
        }
        let Some(stored) = stored else {
            return Recomposition::untranslated(RecomposeStatus::NotStarted, current_source);
        };

        match kind {
            FieldKind::PlainString => recompose_plain(current_source, stored),
            FieldKind::RichText => self.recompose_rich(key, field_name, current_source, stored),
        }
    }

    fn recompose_rich(
        &self,
        key: &BundleKey,
        field_name: &str,
        current_source: &str,
        stored: &FieldBundle,
    ) -> Recomposition {
        let mut errors = Vec::new();

        // Step 1: decompose the current source
        let current = match self.decomposer.decompose(current_source) {
            Ok(fragments) => fragments,
            Err(e) => {
                warn!(key = %key, field = field_name, error = %e, "failed to decompose source");
                errors.push(e.to_string());
                return self.degrade(current_source, current_source.to_string(), 0, errors, stored);
            }
        };

        // Step 2: align against what was translated
        let entries = align(&current, &stored.sources());

        // Step 3: choose a value per fragment
        let mut misses = 0;
        let values: Vec<String> = entries
            .iter()
            .map(|entry| {
                let translated = match (entry.verb, entry.matched_previous_index) {
                    (Verb::Current, Some(j)) => stored
                        .fragments
                        .get(j)
                        .map(|f| f.target_value.as_str())
                        .filter(|target| !target.is_empty() || entry.source_value.is_empty()),
                    _ => None,
                };
                match translated {
                    Some(target) => target.to_string(),
                    None => {
                        misses += 1;
                        self.decomposer.untranslated(&entry.source_value)
                    }
                }
            })
            .collect();
        // Deleted stored fragments are stale too; appended ones were counted as NEW
        misses += stored.fragments.len().saturating_sub(current.len());

        // Step 4: put the document back together
        let document = match self.decomposer.recompose(current_source, &values, &mut errors) {
            Ok(document) => document,
            Err(e) => {
                warn!(key = %key, field = field_name, error = %e, "failed to recompose translation");
                errors.push(e.to_string());
                current_source.to_string()
            }
        };

        if misses == 0 && errors.is_empty() {
            debug!(key = %key, field = field_name, "translation is valid");
            return Recomposition {
                status: RecomposeStatus::Valid,
                document,
                fallback: None,
                source: current_source.to_string(),
                misses: 0,
                errors,
                message: None,
            };
        }

        self.degrade(current_source, document, misses, errors, stored)
    }

    /// Build the INVALID result, rebuilding the last stored translation as fallback
    fn degrade(
        &self,
        current_source: &str,
        document: String,
        misses: usize,
        errors: Vec<String>,
        stored: &FieldBundle,
    ) -> Recomposition {
        let fallback = stored.source_value.as_deref().and_then(|stored_source| {
            let targets: Vec<String> = stored
                .fragments
                .iter()
                .map(|f| {
                    if f.target_value.is_empty() {
                        self.decomposer.untranslated(&f.source_value)
                    } else {
                        f.target_value.clone()
                    }
                })
                .collect();

            let mut fallback_errors = Vec::new();
            match self
                .decomposer
                .recompose(stored_source, &targets, &mut fallback_errors)
            {
                Ok(doc) if fallback_errors.is_empty() => Some(doc),
                Ok(_) => {
                    debug!(errors = ?fallback_errors, "fallback translation is structurally broken");
                    None
                }
                Err(e) => {
                    warn!(error = %e, "failed to rebuild fallback translation");
                    None
                }
            }
        });

        Recomposition {
            status: RecomposeStatus::Invalid,
            document,
            fallback,
            source: current_source.to_string(),
            misses,
            errors,
            message: Some(out_of_date_message(misses)),
        }
    }
}

fn recompose_plain(current_source: &str, stored: &FieldBundle) -> Recomposition {
    let translated = stored
        .fragments
        .first()
        .filter(|f| !f.target_value.is_empty());

    match translated {
        None => Recomposition::untranslated(RecomposeStatus::NotStarted, current_source),
        Some(f) if f.source_value == current_source => Recomposition {
            status: RecomposeStatus::Valid,
            document: f.target_value.clone(),
            fallback: None,
            source: current_source.to_string(),
            misses: 0,
            errors: Vec::new(),
            message: None,
        },
        Some(_) => Recomposition {
            misses: 1,
            message: Some(out_of_date_message(1)),
            ..Recomposition::untranslated(RecomposeStatus::Invalid, current_source)
        },
    }
}

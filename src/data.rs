//! Core data structures shared by the alignment, export and render paths
//!
//! `TranslationBundle` is the durable shape persisted per [`BundleKey`];
//! `Fragment` and `Section` are the transient, verb-tagged views built from
//! it by aligning against the current source.

use crate::key::{BundleKey, ResourceKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Classification of a fragment relative to the stored translation history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verb {
    /// Never seen before
    New,
    /// The source drifted since it was translated
    Changed,
    /// Unchanged since it was translated
    Current,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Verb::New => "NEW",
            Verb::Changed => "CHANGED",
            Verb::Current => "CURRENT",
        };
        f.write_str(name)
    }
}

/// How a schema field is decomposed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Translated as a single unit, never decomposed
    PlainString,
    /// Markup decomposed into fragments by the markup collaborator
    RichText,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::PlainString => "string",
            FieldKind::RichText => "html",
        }
    }

    /// Inverse of [`FieldKind::as_str`]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(FieldKind::PlainString),
            "html" => Some(FieldKind::RichText),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decomposed, independently translatable unit, tagged against history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub source_value: String,
    /// Empty when untranslated
    pub target_value: String,
    /// The source the current `target_value` was translated against, when it differs
    pub old_source_value: Option<String>,
    pub verb: Verb,
    pub edited_this_session: bool,
}

impl Fragment {
    /// A fragment with no translation history
    pub fn new(source_value: &str) -> Self {
        Self {
            source_value: source_value.to_string(),
            target_value: String::new(),
            old_source_value: None,
            verb: Verb::New,
            edited_this_session: false,
        }
    }

    /// Record a translation entered by a human in the current session
    pub fn edit(&mut self, target_value: &str) {
        self.target_value = target_value.to_string();
        self.edited_this_session = true;
    }

    pub fn is_translated(&self) -> bool {
        !self.target_value.is_empty()
    }
}

/// A stored `(source, target)` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFragment {
    pub source_value: String,
    pub target_value: String,
}

impl StoredFragment {
    pub fn new(source_value: &str, target_value: &str) -> Self {
        Self {
            source_value: source_value.to_string(),
            target_value: target_value.to_string(),
        }
    }
}

/// Stored translation of one schema field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldBundle {
    pub kind: FieldKind,
    /// Full un-decomposed source text the fragments were taken from (rich text only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_value: Option<String>,
    pub fragments: Vec<StoredFragment>,
}

impl FieldBundle {
    pub fn plain(source: &str, target: &str) -> Self {
        Self {
            kind: FieldKind::PlainString,
            source_value: None,
            fragments: vec![StoredFragment::new(source, target)],
        }
    }

    pub fn rich(source: &str, fragments: Vec<StoredFragment>) -> Self {
        Self {
            kind: FieldKind::RichText,
            source_value: Some(source.to_string()),
            fragments,
        }
    }

    pub fn sources(&self) -> Vec<&str> {
        self.fragments
            .iter()
            .map(|f| f.source_value.as_str())
            .collect()
    }

    pub fn targets(&self) -> Vec<String> {
        self.fragments
            .iter()
            .map(|f| f.target_value.clone())
            .collect()
    }
}

/// All translated fields of one content item in one locale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationBundle {
    pub key: BundleKey,
    pub fields: BTreeMap<String, FieldBundle>,
}

impl TranslationBundle {
    pub fn new(key: BundleKey) -> Self {
        Self {
            key,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, field: FieldBundle) -> Self {
        self.fields.insert(name.to_string(), field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldBundle> {
        self.fields.get(name)
    }
}

/// A named group of fragments belonging to one schema field, as shown to an editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    /// Full current source text, kept for rich text so it can be re-decomposed
    pub source_value: Option<String>,
    pub fragments: Vec<Fragment>,
}

impl Section {
    /// Find the first fragment with the given source and translate it
    ///
    /// Returns `false` when no fragment carries `source_value`.
    pub fn edit(&mut self, source_value: &str, target_value: &str) -> bool {
        match self
            .fragments
            .iter_mut()
            .find(|f| f.source_value == source_value)
        {
            Some(fragment) => {
                fragment.edit(target_value);
                true
            }
            None => false,
        }
    }
}

/// One translatable schema field of a content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub value: String,
}

impl SourceField {
    pub fn plain(name: &str, label: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::PlainString,
            value: value.to_string(),
        }
    }

    pub fn rich(name: &str, label: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::RichText,
            value: value.to_string(),
        }
    }
}

/// The translatable view of a content item in its source language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub content_type: String,
    pub content_id: String,
    pub display_name: String,
    pub fields: Vec<SourceField>,
}

impl ContentItem {
    pub fn new(content_type: &str, content_id: &str, display_name: &str) -> Self {
        Self {
            content_type: content_type.to_string(),
            content_id: content_id.to_string(),
            display_name: display_name.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: SourceField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn resource_key(&self) -> ResourceKey {
        ResourceKey::new(&self.content_type, &self.content_id)
    }

    pub fn bundle_key(&self, locale: &str) -> BundleKey {
        self.resource_key().for_locale(locale)
    }

    pub fn field(&self, name: &str) -> Option<&SourceField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

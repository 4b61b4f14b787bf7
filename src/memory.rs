//! Translation Memory
//!
//! A content-addressed store mapping fragment source text to a
//! [`TranslationMessage`]: every candidate translation, every place the text
//! occurs, translator comments and the text it was previously translated
//! from. One memory lives for one export or import pass.
//!
//! Messages are partitioned into output files. By default everything lands
//! in a single catalog; splitting by content type and capping the entries
//! per file can be combined. With a cap, a message goes to the first part
//! file that already holds its source text or still has room, so a source
//! text never ends up in two part files.

use crate::config::{ExportOptions, ResourceRegistry, SETTINGS_FILE_BASE};
use crate::data::FieldKind;
use crate::key::BundleKey;
use std::collections::{BTreeMap, HashMap};

/// Candidate translations of one source text
///
/// A blank candidate is only a placeholder: it is kept while nothing better
/// exists and discarded by the first real translation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Candidates {
    #[default]
    Unset,
    BlankOnly,
    /// Distinct non-blank translations in insertion order
    HasValue(Vec<String>),
}

impl Candidates {
    /// Apply one translation to the set
    pub fn add(&mut self, value: &str) {
        if value.is_empty() {
            if matches!(self, Candidates::Unset) {
                *self = Candidates::BlankOnly;
            }
            return;
        }

        match self {
            Candidates::HasValue(values) => {
                if !values.iter().any(|v| v == value) {
                    values.push(value.to_string());
                }
            }
            Candidates::Unset | Candidates::BlankOnly => {
                *self = Candidates::HasValue(vec![value.to_string()]);
            }
        }
    }

    /// The translation written as msgstr; blank when none exists
    pub fn primary(&self) -> &str {
        match self {
            Candidates::HasValue(values) => values.first().map(String::as_str).unwrap_or(""),
            Candidates::Unset | Candidates::BlankOnly => "",
        }
    }

    /// Every candidate, a single blank one when no real value exists
    pub fn values(&self) -> Vec<&str> {
        match self {
            Candidates::HasValue(values) => values.iter().map(String::as_str).collect(),
            Candidates::Unset | Candidates::BlankOnly => vec![""],
        }
    }

    /// Candidates beyond the primary one
    pub fn alternatives(&self) -> &[String] {
        match self {
            Candidates::HasValue(values) => values.get(1..).unwrap_or(&[]),
            Candidates::Unset | Candidates::BlankOnly => &[],
        }
    }
}

/// Where a source text occurs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub display_name: String,
    pub kind: FieldKind,
}

/// One deduplicated source text and everything known about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationMessage {
    pub source: String,
    pub candidates: Candidates,
    pub locations: BTreeMap<BundleKey, Location>,
    pub comments: Vec<String>,
    /// The source text this was previously translated from
    pub previous_id: Option<String>,
}

impl TranslationMessage {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            candidates: Candidates::Unset,
            locations: BTreeMap::new(),
            comments: Vec::new(),
            previous_id: None,
        }
    }

    pub fn add_translation(&mut self, value: &str) {
        self.candidates.add(value);
    }

    pub fn add_location(&mut self, key: &BundleKey, display_name: &str, kind: FieldKind) {
        self.locations.insert(
            key.clone(),
            Location {
                display_name: display_name.to_string(),
                kind,
            },
        );
    }

    /// Append a translator comment, skipping exact duplicates
    pub fn add_comment(&mut self, text: &str) {
        if !self.comments.iter().any(|c| c == text) {
            self.comments.push(text.to_string());
        }
    }

    pub fn set_previous_id(&mut self, previous: &str) {
        if self.previous_id.is_none() {
            self.previous_id = Some(previous.to_string());
        }
    }
}

/// Messages routed to one output file, in insertion order
#[derive(Debug, Clone, Default)]
pub struct MessageFile {
    messages: Vec<TranslationMessage>,
    index: HashMap<String, usize>,
}

impl MessageFile {
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn contains(&self, source: &str) -> bool {
        self.index.contains_key(source)
    }

    pub fn messages(&self) -> &[TranslationMessage] {
        &self.messages
    }

    fn get_or_create(&mut self, source: &str) -> &mut TranslationMessage {
        let position = match self.index.get(source) {
            Some(&position) => position,
            None => {
                self.messages.push(TranslationMessage::new(source));
                let position = self.messages.len() - 1;
                self.index.insert(source.to_string(), position);
                position
            }
        };
        &mut self.messages[position]
    }
}

/// How messages are partitioned into files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPolicy {
    pub split_by_type: bool,
    pub max_entries_per_file: Option<usize>,
    pub base_name: String,
    pub extension: String,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self::from(&ExportOptions::default())
    }
}

impl From<&ExportOptions> for SplitPolicy {
    fn from(options: &ExportOptions) -> Self {
        Self {
            split_by_type: options.split_by_type,
            max_entries_per_file: options.max_entries_per_file,
            base_name: options.base_name.clone(),
            extension: options.extension.clone(),
        }
    }
}

/// Content-addressed store of translation messages for one locale
#[derive(Debug, Clone)]
pub struct TranslationMemory {
    locale: String,
    policy: SplitPolicy,
    registry: ResourceRegistry,
    files: BTreeMap<String, MessageFile>,
}

impl TranslationMemory {
    pub fn new(locale: &str, policy: SplitPolicy, registry: ResourceRegistry) -> Self {
        Self {
            locale: locale.to_string(),
            policy,
            registry,
            files: BTreeMap::new(),
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Find the message for `source` in the file `key` routes to, creating it if needed
    pub fn get_or_create(&mut self, key: &BundleKey, source: &str) -> &mut TranslationMessage {
        let file_name = self.route(key, source);
        self.files
            .entry(file_name)
            .or_default()
            .get_or_create(source)
    }

    /// Output files in name order
    pub fn files(&self) -> impl Iterator<Item = (&str, &MessageFile)> {
        self.files.iter().map(|(name, file)| (name.as_str(), file))
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Total messages across all files
    pub fn len(&self) -> usize {
        self.files.values().map(MessageFile::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-blank primary translations grouped by the bundle they belong to
    ///
    /// Maps each bundle key to `source -> translation`.
    pub fn translations_by_bundle(&self) -> BTreeMap<BundleKey, BTreeMap<String, String>> {
        let mut grouped: BTreeMap<BundleKey, BTreeMap<String, String>> = BTreeMap::new();
        for message in self.files.values().flat_map(MessageFile::messages) {
            let translation = message.candidates.primary();
            if translation.is_empty() {
                continue;
            }
            for key in message.locations.keys() {
                grouped
                    .entry(key.clone())
                    .or_default()
                    .insert(message.source.clone(), translation.to_string());
            }
        }
        grouped
    }

    fn base_name(&self, key: &BundleKey) -> String {
        if !self.policy.split_by_type {
            return self.policy.base_name.clone();
        }
        if self.registry.is_settings_like(&key.content_type) {
            SETTINGS_FILE_BASE.to_string()
        } else {
            key.content_type.clone()
        }
    }

    fn route(&self, key: &BundleKey, source: &str) -> String {
        let base = self.base_name(key);
        let Some(cap) = self.policy.max_entries_per_file else {
            return format!("{}.{}", base, self.policy.extension);
        };
        let cap = cap.max(1);

        let mut part = 1;
        loop {
            let name = format!("{}_{:03}.{}", base, part, self.policy.extension);
            match self.files.get(&name) {
                Some(file) if !file.contains(source) && file.len() >= cap => part += 1,
                _ => return name,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn memory(policy: SplitPolicy) -> TranslationMemory {
        TranslationMemory::new("fr", policy, ResourceRegistry::standard())
    }

    fn capped(cap: usize) -> SplitPolicy {
        SplitPolicy {
            max_entries_per_file: Some(cap),
            ..SplitPolicy::default()
        }
    }

    // ========== Candidate Tests ==========

    #[test]
    fn test_candidates_blank_until_real_value() {
        let mut candidates = Candidates::default();
        candidates.add("");
        assert_eq!(candidates, Candidates::BlankOnly);
        assert_eq!(candidates.values(), vec![""]);

        candidates.add("Bonjour");
        assert_eq!(candidates, Candidates::HasValue(vec!["Bonjour".to_string()]));
    }

    #[test]
    fn test_candidates_blank_after_value_is_ignored() {
        let mut candidates = Candidates::default();
        candidates.add("Bonjour");
        candidates.add("");
        assert_eq!(candidates.values(), vec!["Bonjour"]);
    }

    #[test]
    fn test_candidates_keep_distinct_values_in_order() {
        let mut candidates = Candidates::default();
        candidates.add("Salut");
        candidates.add("Bonjour");
        candidates.add("Salut");
        assert_eq!(candidates.primary(), "Salut");
        assert_eq!(candidates.alternatives(), &["Bonjour".to_string()]);
    }

    #[test]
    fn test_unset_candidates_render_blank() {
        let candidates = Candidates::Unset;
        assert_eq!(candidates.primary(), "");
        assert_eq!(candidates.values(), vec![""]);
        assert!(candidates.alternatives().is_empty());
    }

    // ========== Dedup Tests ==========

    #[test]
    fn test_same_source_twice_is_one_message() {
        let mut memory = memory(SplitPolicy::default());
        let first = BundleKey::new("unit", "1", "fr");
        let second = BundleKey::new("lesson", "2", "fr");

        memory
            .get_or_create(&first, "Hello")
            .add_location(&first, "Unit 1", FieldKind::PlainString);
        memory
            .get_or_create(&second, "Hello")
            .add_location(&second, "Lesson 2", FieldKind::RichText);

        assert_eq!(memory.len(), 1);
        let message = memory.get_or_create(&first, "Hello");
        assert_eq!(message.locations.len(), 2);
        assert!(message.locations.contains_key(&second));
    }

    #[test]
    fn test_comments_are_not_duplicated() {
        let mut message = TranslationMessage::new("Hello");
        message.add_comment("greeting");
        message.add_comment("greeting");
        assert_eq!(message.comments, vec!["greeting".to_string()]);
    }

    #[test]
    fn test_previous_id_keeps_first_value() {
        let mut message = TranslationMessage::new("Hello there");
        message.set_previous_id("Hello");
        message.set_previous_id("Hi");
        assert_eq!(message.previous_id.as_deref(), Some("Hello"));
    }

    // ========== File Splitting Tests ==========

    #[test]
    fn test_default_single_file() {
        let mut memory = memory(SplitPolicy::default());
        memory.get_or_create(&BundleKey::new("unit", "1", "fr"), "a");
        memory.get_or_create(&BundleKey::new("course_settings", "", "fr"), "b");
        let names: Vec<&str> = memory.files().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["messages.po"]);
    }

    #[test]
    fn test_split_by_type_shares_settings_file() {
        let policy = SplitPolicy {
            split_by_type: true,
            ..SplitPolicy::default()
        };
        let mut memory = memory(policy);
        memory.get_or_create(&BundleKey::new("unit", "1", "fr"), "a");
        memory.get_or_create(&BundleKey::new("lesson", "1", "fr"), "b");
        memory.get_or_create(&BundleKey::new("course_settings", "", "fr"), "c");
        memory.get_or_create(&BundleKey::new("announcement", "4", "fr"), "d");

        let names: Vec<&str> = memory.files().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["course_settings.po", "lesson.po", "unit.po"]);
    }

    #[test]
    fn test_cap_produces_ceil_n_over_k_files() {
        for (n, k) in [(10usize, 3usize), (9, 3), (1, 5), (7, 1), (0, 4)] {
            let mut memory = memory(capped(k));
            let key = BundleKey::new("unit", "1", "fr");
            for i in 0..n {
                memory.get_or_create(&key, &format!("text {}", i));
            }

            assert_eq!(memory.file_count(), n.div_ceil(k), "n={} k={}", n, k);
            assert!(memory.files().all(|(_, file)| file.len() <= k));
        }
    }

    #[test]
    fn test_cap_never_splits_a_source_text() {
        let mut memory = memory(capped(2));
        let key = BundleKey::new("unit", "1", "fr");
        for source in ["a", "b", "c", "a", "d", "b", "e", "c"] {
            memory
                .get_or_create(&key, source)
                .add_location(&key, "Unit 1", FieldKind::PlainString);
        }

        let mut seen = BTreeSet::new();
        for (_, file) in memory.files() {
            for message in file.messages() {
                assert!(seen.insert(message.source.clone()), "{} split", message.source);
            }
        }
        assert_eq!(seen.len(), 5);
        assert_eq!(memory.file_count(), 3);
    }

    #[test]
    fn test_cap_file_names_are_numbered() {
        let mut memory = memory(capped(1));
        let key = BundleKey::new("unit", "1", "fr");
        memory.get_or_create(&key, "a");
        memory.get_or_create(&key, "b");
        let names: Vec<&str> = memory.files().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["messages_001.po", "messages_002.po"]);
    }

    #[test]
    fn test_split_by_type_and_cap_combined() {
        let policy = SplitPolicy {
            split_by_type: true,
            max_entries_per_file: Some(1),
            ..SplitPolicy::default()
        };
        let mut memory = memory(policy);
        memory.get_or_create(&BundleKey::new("unit", "1", "fr"), "a");
        memory.get_or_create(&BundleKey::new("unit", "2", "fr"), "b");
        memory.get_or_create(&BundleKey::new("skill", "9", "fr"), "c");

        let names: Vec<&str> = memory.files().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec!["course_settings_001.po", "unit_001.po", "unit_002.po"]
        );
    }

    #[test]
    fn test_translations_by_bundle_skips_blank() {
        let mut memory = memory(SplitPolicy::default());
        let key = BundleKey::new("unit", "1", "fr");

        let hello = memory.get_or_create(&key, "Hello");
        hello.add_location(&key, "Unit 1", FieldKind::RichText);
        hello.add_translation("Bonjour");

        let world = memory.get_or_create(&key, "World");
        world.add_location(&key, "Unit 1", FieldKind::RichText);
        world.add_translation("");

        let grouped = memory.translations_by_bundle();
        let unit = &grouped[&key];
        assert_eq!(unit.len(), 1);
        assert_eq!(unit["Hello"], "Bonjour");
    }
}

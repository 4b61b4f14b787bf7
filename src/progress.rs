//! Progress Calculator
//!
//! Rolls the fragments of a bundle up into a tri-state completion status.
//! Only the rolled-up status per locale is ever persisted.

use crate::data::{Fragment, Section, Verb};
use crate::key::ResourceKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Completion of one bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Done,
}

/// How much a single fragment contributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Contribution {
    None,
    Partial,
    Full,
}

fn contribution(fragment: &Fragment) -> Contribution {
    if fragment.source_value.is_empty() && fragment.target_value.is_empty() {
        return Contribution::Full;
    }
    if !fragment.is_translated() {
        return Contribution::None;
    }
    if fragment.verb == Verb::Current || fragment.edited_this_session {
        return Contribution::Full;
    }
    if fragment.verb == Verb::Changed {
        return Contribution::Partial;
    }
    Contribution::None
}

/// Status of a set of fragments
///
/// A bundle with no fragments is DONE.
pub fn compute_status<'a>(fragments: impl IntoIterator<Item = &'a Fragment>) -> ProgressStatus {
    let mut all_full = true;
    let mut any = false;

    for fragment in fragments {
        match contribution(fragment) {
            Contribution::Full => any = true,
            Contribution::Partial => {
                any = true;
                all_full = false;
            }
            Contribution::None => all_full = false,
        }
    }

    if all_full {
        ProgressStatus::Done
    } else if any {
        ProgressStatus::InProgress
    } else {
        ProgressStatus::NotStarted
    }
}

/// Status of every fragment across a bundle's sections
pub fn compute_section_status(sections: &[Section]) -> ProgressStatus {
    compute_status(sections.iter().flat_map(|s| s.fragments.iter()))
}

/// Per-locale progress of one content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub resource: ResourceKey,
    pub locales: BTreeMap<String, ProgressStatus>,
}

impl Progress {
    pub fn new(resource: ResourceKey) -> Self {
        Self {
            resource,
            locales: BTreeMap::new(),
        }
    }

    /// Status for `locale`; locales never inspected are NOT_STARTED
    pub fn get(&self, locale: &str) -> ProgressStatus {
        self.locales
            .get(locale)
            .copied()
            .unwrap_or(ProgressStatus::NotStarted)
    }

    pub fn set(&mut self, locale: &str, status: ProgressStatus) {
        self.locales.insert(locale.to_string(), status);
    }

    pub fn clear(&mut self, locale: &str) {
        self.locales.remove(locale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(source: &str, target: &str, verb: Verb, edited: bool) -> Fragment {
        Fragment {
            source_value: source.to_string(),
            target_value: target.to_string(),
            old_source_value: None,
            verb,
            edited_this_session: edited,
        }
    }

    #[test]
    fn test_zero_fragments_is_done() {
        assert_eq!(compute_status(&Vec::<Fragment>::new()), ProgressStatus::Done);
    }

    #[test]
    fn test_all_current_with_target_is_done() {
        let fragments = vec![
            fragment("a", "A", Verb::Current, false),
            fragment("b", "B", Verb::Current, false),
        ];
        assert_eq!(compute_status(&fragments), ProgressStatus::Done);
    }

    #[test]
    fn test_changed_with_old_target_is_in_progress() {
        let fragments = vec![
            fragment("a", "A", Verb::Current, false),
            fragment("b2", "B", Verb::Changed, false),
        ];
        assert_eq!(compute_status(&fragments), ProgressStatus::InProgress);
    }

    #[test]
    fn test_only_stale_fragments_is_in_progress() {
        let fragments = vec![fragment("b2", "B", Verb::Changed, false)];
        assert_eq!(compute_status(&fragments), ProgressStatus::InProgress);
    }

    #[test]
    fn test_edited_changed_fragment_is_done() {
        let fragments = vec![fragment("b2", "B2", Verb::Changed, true)];
        assert_eq!(compute_status(&fragments), ProgressStatus::Done);
    }

    #[test]
    fn test_edited_new_fragment_is_done() {
        let fragments = vec![fragment("c", "C", Verb::New, true)];
        assert_eq!(compute_status(&fragments), ProgressStatus::Done);
    }

    #[test]
    fn test_untranslated_new_fragments_are_not_started() {
        let fragments = vec![
            fragment("a", "", Verb::New, false),
            fragment("b", "", Verb::New, false),
        ];
        assert_eq!(compute_status(&fragments), ProgressStatus::NotStarted);
    }

    #[test]
    fn test_empty_fragments_count_as_satisfied() {
        let fragments = vec![
            fragment("", "", Verb::New, false),
            fragment("a", "A", Verb::Current, false),
        ];
        assert_eq!(compute_status(&fragments), ProgressStatus::Done);
    }

    #[test]
    fn test_mixed_new_and_current_is_in_progress() {
        let fragments = vec![
            fragment("a", "A", Verb::Current, false),
            fragment("b", "", Verb::New, false),
        ];
        assert_eq!(compute_status(&fragments), ProgressStatus::InProgress);
    }

    #[test]
    fn test_progress_defaults_to_not_started() {
        let mut progress = Progress::new(ResourceKey::new("unit", "1"));
        assert_eq!(progress.get("fr"), ProgressStatus::NotStarted);
        progress.set("fr", ProgressStatus::Done);
        assert_eq!(progress.get("fr"), ProgressStatus::Done);
        progress.clear("fr");
        assert_eq!(progress.get("fr"), ProgressStatus::NotStarted);
    }
}

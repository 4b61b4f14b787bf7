//! Alignment Engine
//!
//! Aligns the ordered fragments of the current source against the ordered
//! fragments stored with the last translation, tagging every current
//! fragment with a [`Verb`] and a back-reference to the stored fragment it
//! most plausibly corresponds to.
//!
//! The alignment runs in three passes:
//! 1. **Anchors** - a longest common subsequence under value equality. Every
//!    member is CURRENT.
//! 2. **Moved text** - an unanchored fragment whose text equals an unclaimed
//!    stored fragment elsewhere in the list is CHANGED and points at it.
//! 3. **Positional** - between two consecutive anchors, leftover current and
//!    stored fragments are paired in order. Paired fragments are CHANGED.
//!
//! Anything left over is NEW. Stored fragments nobody claims are dropped.
//! Ties always go to the lowest stored index, and no pass depends on hash
//! iteration order, so the result is a pure function of the two lists.
//!
//! Editing, export and rendering all call this module, so they see the same
//! mapping for the same inputs.

use crate::data::{Fragment, StoredFragment, Verb};
use tracing::debug;

/// One current fragment after alignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedEntry {
    pub source_value: String,
    /// Index into the stored list this entry corresponds to (absent for NEW)
    pub matched_previous_index: Option<usize>,
    pub verb: Verb,
}

/// Verb counts of one alignment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignmentSummary {
    pub current: usize,
    pub changed: usize,
    pub new: usize,
    /// Stored fragments that no current fragment claimed
    pub dropped: usize,
}

impl AlignmentSummary {
    pub fn of(entries: &[AlignedEntry], previous_len: usize) -> Self {
        let mut summary = Self::default();
        for entry in entries {
            match entry.verb {
                Verb::Current => summary.current += 1,
                Verb::Changed => summary.changed += 1,
                Verb::New => summary.new += 1,
            }
        }
        let claimed = entries
            .iter()
            .filter(|e| e.matched_previous_index.is_some())
            .count();
        summary.dropped = previous_len.saturating_sub(claimed);
        summary
    }

    /// Current fragments that cannot reuse a stored translation as-is
    pub fn misses(&self) -> usize {
        self.changed + self.new
    }
}

/// Align `current` fragment texts against `previous` stored fragment texts
///
/// # Example
/// ```ignore
/// let entries = align(&["Hello", "World", "Extra"], &["Hello", "World"]);
/// assert_eq!(entries[2].verb, Verb::New);
/// ```
pub fn align<C, P>(current: &[C], previous: &[P]) -> Vec<AlignedEntry>
where
    C: AsRef<str>,
    P: AsRef<str>,
{
    let current: Vec<&str> = current.iter().map(|c| c.as_ref()).collect();
    let previous: Vec<&str> = previous.iter().map(|p| p.as_ref()).collect();

    let mut matched: Vec<Option<usize>> = vec![None; current.len()];
    let mut verbs: Vec<Verb> = vec![Verb::New; current.len()];
    let mut claimed: Vec<bool> = vec![false; previous.len()];

    // Pass 1: order-preserving exact matches
    let anchors = longest_common_subsequence(&current, &previous);
    for &(i, j) in &anchors {
        matched[i] = Some(j);
        verbs[i] = Verb::Current;
        claimed[j] = true;
    }

    // Pass 2: same text, different position
    for i in 0..current.len() {
        if matched[i].is_some() {
            continue;
        }
        let moved = (0..previous.len()).find(|&j| !claimed[j] && previous[j] == current[i]);
        if let Some(j) = moved {
            matched[i] = Some(j);
            verbs[i] = Verb::Changed;
            claimed[j] = true;
        }
    }

    // Pass 3: pair leftovers positionally inside each gap between anchors
    let mut current_start = 0;
    let mut previous_start = 0;
    let gap_ends = anchors
        .iter()
        .copied()
        .chain(std::iter::once((current.len(), previous.len())));

    for (current_end, previous_end) in gap_ends {
        let free_current: Vec<usize> = (current_start..current_end)
            .filter(|&i| matched[i].is_none())
            .collect();
        let free_previous: Vec<usize> = (previous_start..previous_end)
            .filter(|&j| !claimed[j])
            .collect();

        for (i, j) in free_current.into_iter().zip(free_previous) {
            matched[i] = Some(j);
            verbs[i] = Verb::Changed;
            claimed[j] = true;
        }

        current_start = current_end + 1;
        previous_start = previous_end + 1;
    }

    let entries: Vec<AlignedEntry> = current
        .iter()
        .zip(matched.into_iter().zip(verbs))
        .map(|(source, (matched_previous_index, verb))| AlignedEntry {
            source_value: source.to_string(),
            matched_previous_index,
            verb,
        })
        .collect();

    let summary = AlignmentSummary::of(&entries, previous.len());
    debug!(
        current = summary.current,
        changed = summary.changed,
        new = summary.new,
        dropped = summary.dropped,
        "aligned fragments"
    );

    entries
}

/// Align current fragment texts against stored `(source, target)` pairs
///
/// CURRENT and CHANGED fragments inherit the stored target. CHANGED fragments
/// also record the source that target was translated against when it differs.
pub fn align_fragments<C: AsRef<str>>(current: &[C], previous: &[StoredFragment]) -> Vec<Fragment> {
    let sources: Vec<&str> = previous.iter().map(|p| p.source_value.as_str()).collect();

    align(current, &sources)
        .into_iter()
        .map(|entry| {
            let stored = entry.matched_previous_index.and_then(|j| previous.get(j));
            let (target_value, old_source_value) = match (entry.verb, stored) {
                (Verb::Current, Some(stored)) => (stored.target_value.clone(), None),
                (Verb::Changed, Some(stored)) => {
                    let old_source = (stored.source_value != entry.source_value)
                        .then(|| stored.source_value.clone());
                    (stored.target_value.clone(), old_source)
                }
                _ => (String::new(), None),
            };

            Fragment {
                source_value: entry.source_value,
                target_value,
                old_source_value,
                verb: entry.verb,
                edited_this_session: false,
            }
        })
        .collect()
}

/// Matched `(current, previous)` index pairs of a longest common subsequence
///
/// On ties the walk skips the current entry rather than the stored one,
/// which keeps matches on the lowest available stored index.
///
/// A shared leading run is matched in place. The table covers only what
/// follows it, so memory is `O(n * m)` in the fragments after the first
/// difference. Course fields stay in the hundreds of fragments.
fn longest_common_subsequence(current: &[&str], previous: &[&str]) -> Vec<(usize, usize)> {
    let prefix = current
        .iter()
        .zip(previous)
        .take_while(|(c, p)| c == p)
        .count();
    let mut pairs: Vec<(usize, usize)> = (0..prefix).map(|i| (i, i)).collect();

    let current = &current[prefix..];
    let previous = &previous[prefix..];
    let n = current.len();
    let m = previous.len();

    // table[i][j] = LCS length of current[i..] and previous[j..]
    let mut table = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if current[i] == previous[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    pairs.reserve(table[0][0]);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if current[i] == previous[j] {
            pairs.push((prefix + i, prefix + j));
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

//! Markup collaborator
//!
//! The engine never looks inside rich text itself. It asks a [`Decomposer`]
//! to split a document into translatable fragments and to put translated
//! fragments back into the structure of a source document. [`TagMarkup`]
//! is a small reference implementation for HTML-like text.

use crate::error::{I18nError, I18nResult};
use regex::Regex;
use std::sync::OnceLock;

/// Splits rich text into fragments and puts it back together
pub trait Decomposer {
    /// Ordered translatable fragments of `text`
    fn decompose(&self, text: &str) -> I18nResult<Vec<String>>;

    /// Rebuild `source` with its fragments replaced, in order, by `fragments`
    ///
    /// Structural problems that still allow a document to be produced (such
    /// as a fragment count mismatch) are appended to `errors`; an `Err` means
    /// no document could be produced at all.
    fn recompose(
        &self,
        source: &str,
        fragments: &[String],
        errors: &mut Vec<String>,
    ) -> I18nResult<String>;

    /// Value rendered in place of a fragment that has no usable translation
    fn untranslated(&self, source_fragment: &str) -> String {
        source_fragment.to_string()
    }
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^<>]*>").expect("tag pattern is valid"))
}

/// A piece of a document: either markup structure or text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Tag(&'a str),
    Text(&'a str),
}

/// Treats `<...>` tags as structure and the trimmed text between them as fragments
#[derive(Debug, Clone, Copy, Default)]
pub struct TagMarkup;

impl TagMarkup {
    pub fn new() -> Self {
        Self
    }

    fn segments(text: &str) -> I18nResult<Vec<Segment<'_>>> {
        let mut segments = Vec::new();
        let mut last = 0;

        for tag in tag_pattern().find_iter(text) {
            if tag.start() > last {
                segments.push(Segment::Text(&text[last..tag.start()]));
            }
            segments.push(Segment::Tag(tag.as_str()));
            last = tag.end();
        }
        if last < text.len() {
            segments.push(Segment::Text(&text[last..]));
        }

        for segment in &segments {
            if let Segment::Text(run) = segment {
                if run.contains('<') || run.contains('>') {
                    return Err(I18nError::Collaborator(format!(
                        "unbalanced tag delimiter in '{}'",
                        run.trim()
                    )));
                }
            }
        }

        Ok(segments)
    }
}

impl Decomposer for TagMarkup {
    fn decompose(&self, text: &str) -> I18nResult<Vec<String>> {
        Ok(Self::segments(text)?
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Text(run) if !run.trim().is_empty() => Some(run.trim().to_string()),
                _ => None,
            })
            .collect())
    }

    fn recompose(
        &self,
        source: &str,
        fragments: &[String],
        errors: &mut Vec<String>,
    ) -> I18nResult<String> {
        let segments = Self::segments(source)?;
        let mut fragments = fragments.iter();
        let mut expected = 0;
        let mut supplied = 0;
        let mut out = String::with_capacity(source.len());

        for segment in segments {
            match segment {
                Segment::Tag(tag) => out.push_str(tag),
                Segment::Text(run) if run.trim().is_empty() => out.push_str(run),
                Segment::Text(run) => {
                    expected += 1;
                    let trimmed = run.trim();
                    let start = run.len() - run.trim_start().len();
                    let end = start + trimmed.len();
                    out.push_str(&run[..start]);
                    match fragments.next() {
                        Some(fragment) => {
                            supplied += 1;
                            out.push_str(fragment);
                        }
                        None => out.push_str(trimmed),
                    }
                    out.push_str(&run[end..]);
                }
            }
        }

        supplied += fragments.count();
        if supplied != expected {
            errors.push(format!(
                "expected {} fragments, got {}",
                expected, supplied
            ));
        }

        Ok(out)
    }
}

//! Pseudo-language
//!
//! A reversible stand-in for real translation: ASCII letters outside markup
//! tags have their case swapped. Filling a catalog with it exercises export,
//! import and rendering without a translator.

use crate::catalog::Catalog;
use crate::codec;
use crate::error::I18nResult;

/// Swap the case of ASCII letters that are not inside `<...>`
///
/// # Example
/// ```ignore
/// assert_eq!(pseudo_translate("Hello <b>World</b>"), "hELLO <b>wORLD</b>");
/// ```
pub fn pseudo_translate(text: &str) -> String {
    let mut in_tag = false;
    text.chars()
        .map(|ch| match ch {
            '<' => {
                in_tag = true;
                ch
            }
            '>' => {
                in_tag = false;
                ch
            }
            _ if in_tag => ch,
            _ if ch.is_ascii_lowercase() => ch.to_ascii_uppercase(),
            _ if ch.is_ascii_uppercase() => ch.to_ascii_lowercase(),
            _ => ch,
        })
        .collect()
}

/// Fill every msgstr of `catalog` with the pseudo-translation of its msgid
///
/// Returns the number of entries filled.
///
/// # Errors
/// `Protocol` when a bracket-encoded msgid does not decode.
pub fn pseudo_translate_catalog(catalog: &mut Catalog) -> I18nResult<usize> {
    for entry in &mut catalog.entries {
        entry.msgstr = if catalog.use_square_brackets {
            codec::encode(&pseudo_translate(&codec::decode(&entry.msgid)?))
        } else {
            pseudo_translate(&entry.msgid)
        };
    }
    Ok(catalog.entries.len())
}

//! Bundle addressing
//!
//! A translation bundle is identified by the content item it translates
//! (content type + content id) and the target locale. The canonical string
//! form `type:id:locale` is used as a storage key and inside catalog
//! locations, so it has to parse back losslessly even when the content id
//! itself contains `:`.

use crate::error::{I18nError, I18nResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DELIMITER: char = ':';

/// Identifies one content item, independent of locale
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    pub content_type: String,
    pub content_id: String,
}

impl ResourceKey {
    pub fn new(content_type: &str, content_id: &str) -> Self {
        Self {
            content_type: content_type.to_string(),
            content_id: content_id.to_string(),
        }
    }

    /// Address the translation of this item into `locale`
    pub fn for_locale(&self, locale: &str) -> BundleKey {
        BundleKey::new(&self.content_type, &self.content_id, locale)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.content_type, DELIMITER, self.content_id)
    }
}

/// Identifies a translation bundle: `(content_type, content_id, locale)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BundleKey {
    pub content_type: String,
    pub content_id: String,
    pub locale: String,
}

impl BundleKey {
    pub fn new(content_type: &str, content_id: &str, locale: &str) -> Self {
        Self {
            content_type: content_type.to_string(),
            content_id: content_id.to_string(),
            locale: locale.to_string(),
        }
    }

    pub fn resource_key(&self) -> ResourceKey {
        ResourceKey::new(&self.content_type, &self.content_id)
    }

    /// Parse the canonical `type:id:locale` form
    ///
    /// The content type ends at the first delimiter and the locale starts
    /// after the last one; everything in between is the content id, so ids
    /// containing `:` survive a round trip.
    ///
    /// # Errors
    /// `InvalidBundleKey` when fewer than two delimiters are present or the
    /// type or locale is empty.
    pub fn parse(text: &str) -> I18nResult<Self> {
        let invalid = || I18nError::InvalidBundleKey(text.to_string());

        let (content_type, rest) = text.split_once(DELIMITER).ok_or_else(invalid)?;
        let (content_id, locale) = rest.rsplit_once(DELIMITER).ok_or_else(invalid)?;

        if content_type.is_empty() || locale.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(content_type, content_id, locale))
    }
}

impl fmt::Display for BundleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            self.content_type, DELIMITER, self.content_id, DELIMITER, self.locale
        )
    }
}

impl FromStr for BundleKey {
    type Err = I18nError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Check that `locale` is a well-formed BCP 47 tag and return its canonical form
///
/// # Example
/// ```ignore
/// assert_eq!(normalize_locale("pt-br")?, "pt-BR");
/// ```
pub fn normalize_locale(locale: &str) -> I18nResult<String> {
    let parsed: icu_locale::Locale = locale
        .parse()
        .map_err(|_| I18nError::InvalidLocale(locale.to_string()))?;
    Ok(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_string_form() {
        let key = BundleKey::new("unit", "12", "fr");
        assert_eq!(key.to_string(), "unit:12:fr");
    }

    #[test]
    fn test_parse_round_trip() {
        let key = BundleKey::new("lesson", "7", "pt-BR");
        assert_eq!(BundleKey::parse(&key.to_string()).unwrap(), key);
    }

    #[test]
    fn test_parse_id_containing_delimiter() {
        let key = BundleKey::new("question", "group:3:item", "de");
        let text = key.to_string();
        assert_eq!(text, "question:group:3:item:de");
        assert_eq!(BundleKey::parse(&text).unwrap(), key);
    }

    #[test]
    fn test_parse_empty_id_is_allowed() {
        let key = BundleKey::parse("course_settings::fr").unwrap();
        assert_eq!(key.content_type, "course_settings");
        assert_eq!(key.content_id, "");
        assert_eq!(key.locale, "fr");
    }

    #[test]
    fn test_parse_rejects_short_keys() {
        assert!(BundleKey::parse("unit").is_err());
        assert!(BundleKey::parse("unit:12").is_err());
        assert!(BundleKey::parse(":12:fr").is_err());
        assert!(BundleKey::parse("unit:12:").is_err());
    }

    #[test]
    fn test_resource_key_string() {
        let key = BundleKey::new("unit", "12", "fr");
        assert_eq!(key.resource_key().to_string(), "unit:12");
        assert_eq!(key.resource_key().for_locale("fr"), key);
    }

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale("fr").unwrap(), "fr");
        assert_eq!(normalize_locale("pt-br").unwrap(), "pt-BR");
        assert!(normalize_locale("not a locale!").is_err());
    }
}

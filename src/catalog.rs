//! Gettext catalog codec
//!
//! Reads and writes the `.po` files used for bulk export and import. Every
//! entry lists the places its source text occurs as location comments of
//! the form
//!
//! ```text
//! #: GCB-1|<display name>|<field kind>|<bundle key>
//! ```
//!
//! one per line. The number after `GCB-` is the location protocol version;
//! anything other than `1` is rejected on import.

use crate::codec;
use crate::data::FieldKind;
use crate::error::{I18nError, I18nResult};
use crate::key::BundleKey;
use crate::memory::TranslationMessage;

const LOCATION_PREFIX: &str = "GCB-";
pub const LOCATION_VERSION: u32 = 1;
const SQUARE_BRACKETS_HEADER: &str = "X-Use-Square-Brackets";
const ALTERNATIVE_PREFIX: &str = "Alternative translation: ";

/// Where an entry's source text occurs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLocation {
    pub display_name: String,
    pub kind: FieldKind,
    pub key: BundleKey,
}

impl CatalogLocation {
    /// Format as the versioned pseudo-URI written after `#: `
    pub fn to_reference(&self) -> String {
        format!(
            "{}{}|{}|{}|{}",
            LOCATION_PREFIX,
            LOCATION_VERSION,
            escape_component(&self.display_name),
            self.kind.as_str(),
            escape_component(&self.key.to_string())
        )
    }

    /// Parse a location pseudo-URI
    ///
    /// # Errors
    /// `Protocol` for an unknown protocol version, a wrong number of
    /// components, an unknown field kind or an invalid bundle key.
    pub fn parse(reference: &str) -> I18nResult<Self> {
        let parts: Vec<&str> = reference.split('|').collect();
        let [protocol, display_name, kind, key] = parts.as_slice() else {
            return Err(I18nError::Protocol(format!(
                "location '{}' does not have 4 components",
                reference
            )));
        };

        let version = protocol
            .strip_prefix(LOCATION_PREFIX)
            .ok_or_else(|| {
                I18nError::Protocol(format!("unknown location protocol '{}'", protocol))
            })?;
        if version != LOCATION_VERSION.to_string() {
            return Err(I18nError::Protocol(format!(
                "unsupported location protocol version '{}', expected {}",
                version, LOCATION_VERSION
            )));
        }

        let kind = FieldKind::from_name(kind)
            .ok_or_else(|| I18nError::Protocol(format!("unknown field kind '{}'", kind)))?;
        let key = BundleKey::parse(&unescape_component(key)?)
            .map_err(|e| I18nError::Protocol(e.to_string()))?;

        Ok(Self {
            display_name: unescape_component(display_name)?,
            kind,
            key,
        })
    }
}

/// One msgid/msgstr pair with its annotations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Translator comments (`# `)
    pub comments: Vec<String>,
    pub locations: Vec<CatalogLocation>,
    /// Flags such as `fuzzy` (`#, `)
    pub flags: Vec<String>,
    /// Source text the translation was made from (`#| msgid`)
    pub previous_id: Option<String>,
    pub msgid: String,
    pub msgstr: String,
}

/// A parsed or generated `.po` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    /// Path of the file inside an archive, relative to the locale directory on export
    pub file_name: String,
    pub locale: String,
    /// msgid and msgstr are bracket-encoded
    pub use_square_brackets: bool,
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(file_name: &str, locale: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            locale: locale.to_string(),
            use_square_brackets: false,
            entries: Vec::new(),
        }
    }

    /// Render translation memory messages as catalog entries
    ///
    /// The primary candidate becomes the msgstr; other candidates are kept as
    /// translator comments.
    pub fn from_messages(
        file_name: &str,
        locale: &str,
        messages: &[TranslationMessage],
        use_square_brackets: bool,
    ) -> Self {
        let text = |value: &str| {
            if use_square_brackets {
                codec::encode(value)
            } else {
                value.to_string()
            }
        };

        let entries = messages
            .iter()
            .map(|message| {
                let mut comments = message.comments.clone();
                comments.extend(
                    message
                        .candidates
                        .alternatives()
                        .iter()
                        .map(|alt| format!("{}{}", ALTERNATIVE_PREFIX, alt)),
                );

                CatalogEntry {
                    comments,
                    locations: message
                        .locations
                        .iter()
                        .map(|(key, location)| CatalogLocation {
                            display_name: location.display_name.clone(),
                            kind: location.kind,
                            key: key.clone(),
                        })
                        .collect(),
                    flags: Vec::new(),
                    previous_id: message.previous_id.as_deref().map(text),
                    msgid: text(&message.source),
                    msgstr: text(message.candidates.primary()),
                }
            })
            .collect();

        Self {
            file_name: file_name.to_string(),
            locale: locale.to_string(),
            use_square_brackets,
            entries,
        }
    }

    /// msgid and msgstr of an entry with bracket encoding undone
    ///
    /// # Errors
    /// `Protocol` when either string is not validly encoded.
    pub fn decoded(&self, entry: &CatalogEntry) -> I18nResult<(String, String)> {
        if !self.use_square_brackets {
            return Ok((entry.msgid.clone(), entry.msgstr.clone()));
        }
        Ok((codec::decode(&entry.msgid)?, codec::decode(&entry.msgstr)?))
    }

    /// Serialize as `.po` text
    pub fn to_po(&self) -> String {
        let mut out = String::new();

        out.push_str("msgid \"\"\n");
        out.push_str("msgstr \"\"\n");
        let mut headers = vec![
            ("Project-Id-Version", "course-i18n".to_string()),
            ("Language", self.locale.clone()),
            ("MIME-Version", "1.0".to_string()),
            ("Content-Type", "text/plain; charset=UTF-8".to_string()),
            ("Content-Transfer-Encoding", "8bit".to_string()),
        ];
        if self.use_square_brackets {
            headers.push((SQUARE_BRACKETS_HEADER, "1".to_string()));
        }
        for (name, value) in headers {
            out.push_str(&quote(&format!("{}: {}\n", name, value)));
            out.push('\n');
        }

        for entry in &self.entries {
            out.push('\n');
            for comment in &entry.comments {
                for line in comment.lines() {
                    out.push_str(&format!("# {}\n", line));
                }
            }
            for location in &entry.locations {
                out.push_str(&format!("#: {}\n", location.to_reference()));
            }
            if !entry.flags.is_empty() {
                out.push_str(&format!("#, {}\n", entry.flags.join(", ")));
            }
            if let Some(previous) = &entry.previous_id {
                write_string(&mut out, "#| msgid", "#| ", previous);
            }
            write_string(&mut out, "msgid", "", &entry.msgid);
            write_string(&mut out, "msgstr", "", &entry.msgstr);
        }

        out
    }

    /// Parse `.po` text
    ///
    /// The locale comes from the `Language` header and may be empty; bracket
    /// encoding is detected from the `X-Use-Square-Brackets` header.
    pub fn parse(file_name: &str, text: &str) -> I18nResult<Self> {
        let mut parser = PoParser::new(file_name);
        for (index, line) in text.lines().enumerate() {
            parser.feed(index + 1, line)?;
        }
        let mut entries = parser.finish()?;

        let mut catalog = Catalog::new(file_name, "");
        if entries.first().is_some_and(|e| e.msgid.is_empty()) {
            let header = entries.remove(0);
            for line in header.msgstr.lines() {
                if let Some((name, value)) = line.split_once(':') {
                    match name.trim() {
                        "Language" => catalog.locale = value.trim().to_string(),
                        SQUARE_BRACKETS_HEADER => catalog.use_square_brackets = value.trim() == "1",
                        _ => {}
                    }
                }
            }
        }
        catalog.entries = entries;
        Ok(catalog)
    }
}

/// Which string a continuation line extends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    PreviousId,
    MsgId,
    MsgStr,
}

/// Line-oriented `.po` reader
struct PoParser<'a> {
    file_name: &'a str,
    entries: Vec<CatalogEntry>,
    current: CatalogEntry,
    has_msgid: bool,
    field: Option<Field>,
}

impl<'a> PoParser<'a> {
    fn new(file_name: &'a str) -> Self {
        Self {
            file_name,
            entries: Vec::new(),
            current: CatalogEntry::default(),
            has_msgid: false,
            field: None,
        }
    }

    fn error(&self, line: usize, detail: impl Into<String>) -> I18nError {
        I18nError::MalformedCatalog {
            file: self.file_name.to_string(),
            line,
            detail: detail.into(),
        }
    }

    fn feed(&mut self, number: usize, raw: &str) -> I18nResult<()> {
        let line = raw.trim();

        if line.is_empty() {
            return self.flush(number);
        }

        // A comment after a complete msgstr starts the next entry
        if line.starts_with('#') && self.field == Some(Field::MsgStr) {
            self.flush(number)?;
        }

        if let Some(reference) = line.strip_prefix("#:") {
            let location = CatalogLocation::parse(reference.trim())?;
            self.current.locations.push(location);
        } else if let Some(flags) = line.strip_prefix("#,") {
            self.current
                .flags
                .extend(flags.split(',').map(|f| f.trim().to_string()).filter(|f| !f.is_empty()));
        } else if let Some(previous) = line.strip_prefix("#|") {
            let previous = previous.trim();
            if let Some(value) = previous.strip_prefix("msgid ") {
                self.current.previous_id = Some(self.literal(number, value)?);
                self.field = Some(Field::PreviousId);
            } else if previous.starts_with('"') && self.field == Some(Field::PreviousId) {
                let value = self.literal(number, previous)?;
                if let Some(existing) = self.current.previous_id.as_mut() {
                    existing.push_str(&value);
                }
            }
        } else if let Some(comment) = line.strip_prefix('#') {
            // Translator (`# `) and extracted (`#.`) comments
            let comment = comment.strip_prefix('.').unwrap_or(comment);
            self.current.comments.push(comment.trim().to_string());
        } else if let Some(value) = line.strip_prefix("msgid ") {
            if self.has_msgid {
                self.flush(number)?;
            }
            self.current.msgid = self.literal(number, value)?;
            self.has_msgid = true;
            self.field = Some(Field::MsgId);
        } else if let Some(value) = line.strip_prefix("msgstr ") {
            if self.field != Some(Field::MsgId) {
                return Err(self.error(number, "msgstr without preceding msgid"));
            }
            self.current.msgstr = self.literal(number, value)?;
            self.field = Some(Field::MsgStr);
        } else if line.starts_with('"') {
            let value = self.literal(number, line)?;
            match self.field {
                Some(Field::MsgId) => self.current.msgid.push_str(&value),
                Some(Field::MsgStr) => self.current.msgstr.push_str(&value),
                Some(Field::PreviousId) | None => {
                    return Err(self.error(number, "string continuation outside msgid/msgstr"));
                }
            }
        } else if line.starts_with("msgctxt")
            || line.starts_with("msgid_plural")
            || line.starts_with("msgstr[")
        {
            return Err(self.error(number, "contexts and plural forms are not supported"));
        } else {
            return Err(self.error(number, format!("unexpected line '{}'", line)));
        }

        Ok(())
    }

    fn literal(&self, number: usize, value: &str) -> I18nResult<String> {
        unquote(value.trim()).map_err(|detail| self.error(number, detail))
    }

    fn flush(&mut self, number: usize) -> I18nResult<()> {
        let entry = std::mem::take(&mut self.current);
        let had_msgid = std::mem::replace(&mut self.has_msgid, false);
        let field = self.field.take();

        if !had_msgid {
            // Comments with no msgid are dropped
            return Ok(());
        }
        if field != Some(Field::MsgStr) {
            return Err(self.error(number, "msgid without msgstr"));
        }
        self.entries.push(entry);
        Ok(())
    }

    fn finish(mut self) -> I18nResult<Vec<CatalogEntry>> {
        self.flush(0)?;
        Ok(self.entries)
    }
}

fn write_string(out: &mut String, keyword: &str, prefix: &str, value: &str) {
    let lines: Vec<&str> = value.split_inclusive('\n').collect();
    if lines.len() <= 1 {
        out.push_str(&format!("{} {}\n", keyword, quote(value)));
        return;
    }
    out.push_str(&format!("{} \"\"\n", keyword));
    for line in lines {
        out.push_str(&format!("{}{}\n", prefix, quote(line)));
    }
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

fn unquote(literal: &str) -> Result<String, String> {
    let inner = literal
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .filter(|_| literal.len() >= 2)
        .ok_or_else(|| format!("expected a quoted string, found '{}'", literal))?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            if ch == '"' {
                return Err("unescaped quote inside string".to_string());
            }
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => return Err(format!("unknown escape '\\{}'", other)),
            None => return Err("unterminated escape".to_string()),
        }
    }
    Ok(out)
}

fn escape_component(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('|', "%7C")
        .replace('\n', "%0A")
}

fn unescape_component(value: &str) -> I18nResult<String> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(position) = rest.find('%') {
        out.push_str(&rest[..position]);
        let code = rest.get(position + 1..position + 3);
        let decoded = match code {
            Some("25") => '%',
            Some("7C") => '|',
            Some("0A") => '\n',
            _ => {
                return Err(I18nError::Protocol(format!(
                    "invalid escape in location component '{}'",
                    value
                )));
            }
        };
        out.push(decoded);
        rest = &rest[position + 3..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(display_name: &str, key: &str) -> CatalogLocation {
        CatalogLocation {
            display_name: display_name.to_string(),
            kind: FieldKind::RichText,
            key: BundleKey::parse(key).unwrap(),
        }
    }

    // ========== Location Tests ==========

    #[test]
    fn test_location_reference_format() {
        let loc = location("Unit 1 - Intro", "unit:1:fr");
        assert_eq!(loc.to_reference(), "GCB-1|Unit 1 - Intro|html|unit:1:fr");
        assert_eq!(CatalogLocation::parse(&loc.to_reference()).unwrap(), loc);
    }

    #[test]
    fn test_location_escapes_pipes() {
        let loc = location("A | B 100%", "question:a|b:fr");
        let reference = loc.to_reference();
        assert_eq!(reference.split('|').count(), 4);
        assert_eq!(CatalogLocation::parse(&reference).unwrap(), loc);
    }

    #[test]
    fn test_location_rejects_other_versions() {
        match CatalogLocation::parse("GCB-2|Unit 1|html|unit:1:fr") {
            Err(I18nError::Protocol(msg)) => assert!(msg.contains("version")),
            other => panic!("Expected protocol error, got {:?}", other),
        }
    }

    #[test]
    fn test_location_rejects_bad_shape() {
        assert!(CatalogLocation::parse("GCB-1|Unit 1|html").is_err());
        assert!(CatalogLocation::parse("XYZ-1|Unit 1|html|unit:1:fr").is_err());
        assert!(CatalogLocation::parse("GCB-1|Unit 1|markdown|unit:1:fr").is_err());
        assert!(CatalogLocation::parse("GCB-1|Unit 1|html|unit").is_err());
    }

    // ========== Codec Tests ==========

    fn sample() -> Catalog {
        let mut catalog = Catalog::new("messages.po", "fr");
        catalog.entries.push(CatalogEntry {
            comments: vec!["Alternative translation: Salut".to_string()],
            locations: vec![location("Unit 1", "unit:1:fr"), location("Lesson 2", "lesson:2:fr")],
            msgid: "Hello".to_string(),
            msgstr: "Bonjour".to_string(),
            ..CatalogEntry::default()
        });
        catalog.entries.push(CatalogEntry {
            locations: vec![location("Unit 1", "unit:1:fr")],
            previous_id: Some("Say \"hi\"".to_string()),
            msgid: "Say \"hello\"\nto everyone".to_string(),
            ..CatalogEntry::default()
        });
        catalog
    }

    #[test]
    fn test_write_po_text() {
        let po = sample().to_po();
        assert!(po.contains("\"Language: fr\\n\"\n"));
        assert!(po.contains(
            "#: GCB-1|Unit 1|html|unit:1:fr\n#: GCB-1|Lesson 2|html|lesson:2:fr\nmsgid \"Hello\"\nmsgstr \"Bonjour\"\n"
        ));
        assert!(po.contains("#| msgid \"Say \\\"hi\\\"\"\n"));
        assert!(po.contains("msgid \"\"\n\"Say \\\"hello\\\"\\n\"\n\"to everyone\"\n"));
    }

    #[test]
    fn test_parse_written_catalog() {
        let catalog = sample();
        let parsed = Catalog::parse("messages.po", &catalog.to_po()).unwrap();
        assert_eq!(parsed, catalog);
    }

    #[test]
    fn test_parse_without_blank_separators() {
        let text = "msgid \"\"\nmsgstr \"Language: de\\n\"\n#: GCB-1|U|string|unit:1:de\nmsgid \"a\"\nmsgstr \"b\"\n#: GCB-1|U|string|unit:1:de\nmsgid \"c\"\nmsgstr \"d\"\n";
        let parsed = Catalog::parse("x.po", text).unwrap();
        assert_eq!(parsed.locale, "de");
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[1].msgstr, "d");
    }

    #[test]
    fn test_parse_reports_line_numbers() {
        let text = "msgid \"a\"\nmsgstr \"b\nmsgid \"c\"\n";
        match Catalog::parse("bad.po", text) {
            Err(I18nError::MalformedCatalog { file, line, .. }) => {
                assert_eq!(file, "bad.po");
                assert_eq!(line, 2);
            }
            other => panic!("Expected malformed catalog, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_plural_forms() {
        let text = "msgid \"item\"\nmsgid_plural \"items\"\nmsgstr[0] \"x\"\n";
        assert!(matches!(
            Catalog::parse("p.po", text),
            Err(I18nError::MalformedCatalog { line: 2, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_future_location_version() {
        let text = "#: GCB-7|U|string|unit:1:de\nmsgid \"a\"\nmsgstr \"b\"\n";
        assert!(matches!(Catalog::parse("v.po", text), Err(I18nError::Protocol(_))));
    }

    #[test]
    fn test_square_bracket_catalog() {
        let mut message = TranslationMessage::new("<b>Hi</b>");
        message.add_translation("<b>Salut</b>");
        let catalog = Catalog::from_messages("messages.po", "fr", &[message], true);

        assert_eq!(catalog.entries[0].msgid, "[b]Hi[/b]");
        let parsed = Catalog::parse("messages.po", &catalog.to_po()).unwrap();
        assert!(parsed.use_square_brackets);
        let (msgid, msgstr) = parsed.decoded(&parsed.entries[0]).unwrap();
        assert_eq!(msgid, "<b>Hi</b>");
        assert_eq!(msgstr, "<b>Salut</b>");
    }

    #[test]
    fn test_from_messages_records_alternatives() {
        let mut message = TranslationMessage::new("Hello");
        message.add_translation("Bonjour");
        message.add_translation("Salut");
        message.add_comment("greeting");
        let catalog = Catalog::from_messages("messages.po", "fr", &[message], false);

        let entry = &catalog.entries[0];
        assert_eq!(entry.msgstr, "Bonjour");
        assert_eq!(
            entry.comments,
            vec![
                "greeting".to_string(),
                "Alternative translation: Salut".to_string()
            ]
        );
    }
}

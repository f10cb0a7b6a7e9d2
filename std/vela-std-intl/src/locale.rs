//!
//! Locale Data
//!
//! List patterns follow the CLDR shape: `pair` joins exactly two items,
//! `start`, `middle` and `end` join the first, inner and last pairs of longer
//! lists. Each pattern holds the placeholders `{0}` and `{1}`.
//!

use tracing::{debug, warn};
use vela_std_core::{ListKind, ListStyle, VelaError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPatterns {
    pub pair: String,
    pub start: String,
    pub middle: String,
    pub end: String,
}

impl ListPatterns {
    /// Patterns that place `word` between the last two items
    fn joined_by(word: &str, serial_comma: bool) -> Self {
        let pair = format!("{{0}} {} {{1}}", word);
        let end = if serial_comma {
            format!("{{0}}, {} {{1}}", word)
        } else {
            pair.clone()
        };
        Self {
            pair,
            start: "{0}, {1}".to_string(),
            middle: "{0}, {1}".to_string(),
            end,
        }
    }

    /// Patterns that use `separator` everywhere
    fn uniform(separator: &str) -> Self {
        let p = format!("{{0}}{}{{1}}", separator);
        Self {
            pair: p.clone(),
            start: p.clone(),
            middle: p.clone(),
            end: p,
        }
    }
}

/// Source of list patterns, keyed by resolved locale
pub trait LocaleData {
    fn is_supported(&self, locale: &str) -> bool;

    fn list_patterns(&self, locale: &str, kind: ListKind, style: ListStyle) -> Option<ListPatterns>;
}

struct LocaleEntry {
    tag: &'static str,
    and: &'static str,
    and_short: &'static str,
    /// `None` joins narrow conjunctions with a bare comma
    and_narrow: Option<&'static str>,
    or: &'static str,
    serial_comma: bool,
}

const BUILTIN_LOCALES: &[LocaleEntry] = &[
    LocaleEntry { tag: "en", and: "and", and_short: "&", and_narrow: None, or: "or", serial_comma: true },
    LocaleEntry { tag: "es", and: "y", and_short: "y", and_narrow: Some("y"), or: "o", serial_comma: false },
    LocaleEntry { tag: "de", and: "und", and_short: "und", and_narrow: Some("und"), or: "oder", serial_comma: false },
    LocaleEntry { tag: "fr", and: "et", and_short: "et", and_narrow: Some("et"), or: "ou", serial_comma: false },
];

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinLocaleData;

impl BuiltinLocaleData {
    fn entry(locale: &str) -> Option<&'static LocaleEntry> {
        BUILTIN_LOCALES.iter().find(|e| e.tag == locale)
    }
}

impl LocaleData for BuiltinLocaleData {
    fn is_supported(&self, locale: &str) -> bool {
        Self::entry(locale).is_some()
    }

    fn list_patterns(&self, locale: &str, kind: ListKind, style: ListStyle) -> Option<ListPatterns> {
        let e = Self::entry(locale)?;
        let patterns = match (kind, style) {
            (ListKind::Conjunction, ListStyle::Long) => ListPatterns::joined_by(e.and, e.serial_comma),
            (ListKind::Conjunction, ListStyle::Short) => ListPatterns::joined_by(e.and_short, e.serial_comma),
            (ListKind::Conjunction, ListStyle::Narrow) => match e.and_narrow {
                Some(word) => ListPatterns::joined_by(word, false),
                None => ListPatterns::uniform(", "),
            },
            (ListKind::Disjunction, _) => ListPatterns::joined_by(e.or, e.serial_comma),
            (ListKind::Unit, ListStyle::Narrow) => ListPatterns::uniform(" "),
            (ListKind::Unit, _) => ListPatterns::uniform(", "),
        };
        Some(patterns)
    }
}

/// Whether `tag` is shaped like a BCP 47 language tag
pub fn is_structurally_valid_tag(tag: &str) -> bool {
    let mut subtags = tag.split('-');
    let Some(language) = subtags.next() else {
        return false;
    };
    let language_ok = matches!(language.len(), 2..=3 | 5..=8) && language.chars().all(|c| c.is_ascii_alphabetic());
    language_ok && subtags.all(|s| (1..=8).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Canonical casing: language lowercase, region uppercase, script titlecase
pub fn canonicalize_tag(tag: &str) -> String {
    tag.split('-')
        .enumerate()
        .map(|(i, s)| match (i, s.len()) {
            (0, _) => s.to_ascii_lowercase(),
            (_, 2) => s.to_ascii_uppercase(),
            (_, 4) if s.chars().all(|c| c.is_ascii_alphabetic()) => {
                let mut out = s[..1].to_ascii_uppercase();
                out.push_str(&s[1..].to_ascii_lowercase());
                out
            }
            _ => s.to_ascii_lowercase(),
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Resolve a requested locale against the available data.
///
/// Invalid tags are a `RangeError`. A valid tag is truncated subtag by subtag
/// until a supported locale is found, otherwise `default` is used.
pub fn resolve_locale(requested: Option<&str>, data: &dyn LocaleData, default: &str) -> Result<String, VelaError> {
    let Some(tag) = requested else {
        return Ok(default.to_string());
    };
    if !is_structurally_valid_tag(tag) {
        return Err(VelaError::InvalidLocale(tag.to_string()));
    }
    let mut candidate = canonicalize_tag(tag);
    loop {
        if data.is_supported(&candidate) {
            debug!(requested = tag, resolved = %candidate, "resolved locale");
            return Ok(candidate);
        }
        match candidate.rfind('-') {
            Some(idx) => candidate.truncate(idx),
            None => break,
        }
    }
    warn!(requested = tag, fallback = default, "no locale data for requested locale");
    Ok(default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_validation() {
        assert!(is_structurally_valid_tag("en"));
        assert!(is_structurally_valid_tag("en-US"));
        assert!(is_structurally_valid_tag("zh-Hant-TW"));
        assert!(!is_structurally_valid_tag(""));
        assert!(!is_structurally_valid_tag("e"));
        assert!(!is_structurally_valid_tag("en_US"));
        assert!(!is_structurally_valid_tag("en--US"));
    }

    #[test]
    fn test_canonicalize() {
        assert_eq!(canonicalize_tag("EN-us"), "en-US");
        assert_eq!(canonicalize_tag("zh-hant-tw"), "zh-Hant-TW");
    }

    #[test]
    fn test_resolve_truncates_to_supported() {
        let data = BuiltinLocaleData;
        assert_eq!(resolve_locale(Some("de-AT"), &data, "en"), Ok("de".to_string()));
        assert_eq!(resolve_locale(Some("ja"), &data, "en"), Ok("en".to_string()));
        assert_eq!(resolve_locale(None, &data, "fr"), Ok("fr".to_string()));
        assert_eq!(
            resolve_locale(Some("not a tag"), &data, "en"),
            Err(VelaError::InvalidLocale("not a tag".to_string()))
        );
    }

    #[test]
    fn test_english_patterns() {
        let data = BuiltinLocaleData;
        let long = data.list_patterns("en", ListKind::Conjunction, ListStyle::Long).unwrap();
        assert_eq!(long.pair, "{0} and {1}");
        assert_eq!(long.end, "{0}, and {1}");
        let unit = data.list_patterns("en", ListKind::Unit, ListStyle::Narrow).unwrap();
        assert_eq!(unit.end, "{0} {1}");
        assert!(data.list_patterns("xx", ListKind::Unit, ListStyle::Long).is_none());
    }
}

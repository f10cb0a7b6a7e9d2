//!
//! List Formatting
//!
//! Composes a list CLDR style: two items use the `pair` pattern; longer lists
//! wrap the last two items in `end`, each inner item in `middle` and the first
//! item in `start`. Parts output keeps items as `element` parts and every
//! pattern text between them as a single merged `literal` part.
//!

use serde::Serialize;
use vela_std_core::{ListFormatData, ListKind, ListStyle, VelaError};

use crate::locale::{resolve_locale, LocaleData, ListPatterns};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    Element,
    Literal,
}

impl PartKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PartKind::Element => "element",
            PartKind::Literal => "literal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListPart {
    #[serde(rename = "type")]
    pub kind: PartKind,
    pub value: String,
}

impl ListPart {
    fn element(value: &str) -> Self {
        Self { kind: PartKind::Element, value: value.to_string() }
    }

    fn literal(value: &str) -> Self {
        Self { kind: PartKind::Literal, value: value.to_string() }
    }
}

/// Build the resolved state for a new ListFormat instance
pub fn new_list_format(
    requested_locale: Option<&str>,
    kind: ListKind,
    style: ListStyle,
    data: &dyn LocaleData,
    default_locale: &str,
) -> Result<ListFormatData, VelaError> {
    let locale = resolve_locale(requested_locale, data, default_locale)?;
    Ok(ListFormatData::new(locale, kind, style))
}

pub struct ListFormatter {
    patterns: ListPatterns,
}

impl ListFormatter {
    pub fn new(format: &ListFormatData, data: &dyn LocaleData) -> Result<Self, VelaError> {
        let patterns = data.list_patterns(&format.locale, format.kind, format.style).ok_or_else(|| {
            VelaError::Internal(format!(
                "no list patterns for {} {} {}",
                format.locale, format.kind, format.style
            ))
        })?;
        Ok(Self { patterns })
    }

    pub fn format(&self, items: &[String]) -> String {
        self.format_to_parts(items).into_iter().map(|p| p.value).collect()
    }

    pub fn format_to_parts(&self, items: &[String]) -> Vec<ListPart> {
        let parts = match items {
            [] => Vec::new(),
            [only] => vec![ListPart::element(only)],
            [first, second] => apply(&self.patterns.pair, vec![ListPart::element(first)], vec![ListPart::element(second)]),
            [first, inner @ .., before_last, last] => {
                let mut acc = apply(
                    &self.patterns.end,
                    vec![ListPart::element(before_last)],
                    vec![ListPart::element(last)],
                );
                for item in inner.iter().rev() {
                    acc = apply(&self.patterns.middle, vec![ListPart::element(item)], acc);
                }
                apply(&self.patterns.start, vec![ListPart::element(first)], acc)
            }
        };
        merge_literals(parts)
    }
}

/// Substitute `{0}` and `{1}` in `pattern`, in whichever order they appear
fn apply(pattern: &str, first: Vec<ListPart>, second: Vec<ListPart>) -> Vec<ListPart> {
    let mut out = Vec::with_capacity(first.len() + second.len() + 3);
    let mut slots = [Some(first), Some(second)];
    let mut rest = pattern;
    while let Some(open) = rest.find('{') {
        let placeholder = match rest[open..].get(..3) {
            Some("{0}") => Some(0),
            Some("{1}") => Some(1),
            _ => None,
        };
        match placeholder {
            Some(index) => {
                if open > 0 {
                    out.push(ListPart::literal(&rest[..open]));
                }
                if let Some(parts) = slots[index].take() {
                    out.extend(parts);
                }
                rest = &rest[open + 3..];
            }
            None => {
                out.push(ListPart::literal(&rest[..=open]));
                rest = &rest[open + 1..];
            }
        }
    }
    if !rest.is_empty() {
        out.push(ListPart::literal(rest));
    }
    out
}

fn merge_literals(parts: Vec<ListPart>) -> Vec<ListPart> {
    let mut merged: Vec<ListPart> = Vec::with_capacity(parts.len());
    for part in parts {
        match merged.last_mut() {
            Some(prev) if prev.kind == PartKind::Literal && part.kind == PartKind::Literal => {
                prev.value.push_str(&part.value);
            }
            _ => merged.push(part),
        }
    }
    merged
}

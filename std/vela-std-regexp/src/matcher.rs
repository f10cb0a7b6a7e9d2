//!
//! Matchers and Subjects
//!
//! Patterns are matched over a UTF-8 transcoding of the subject. `Subject`
//! keeps the char boundaries of both forms so positions move between code
//! units (what scripts see) and bytes (what the matcher sees).
//!

use std::ops::Range;

use memchr::memmem;
use regex::{Regex, RegexBuilder};
use smallvec::SmallVec;
use tracing::trace;
use vela_std_core::{Encoding, VelaString};

use crate::error::PatternError;
use crate::flags::PatternFlags;

/// Execution tier of a matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Cheap to build, no lazy DFA
    Interpreted,
    /// Full engine with a lazy DFA
    Native,
}

#[derive(Debug)]
pub struct Matcher {
    regex: Regex,
    tier: Tier,
    encoding: Encoding,
}

/// Capture ranges of a successful match, in code units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub captures: SmallVec<[Option<Range<usize>>; 4]>,
}

impl PatternMatch {
    pub fn range(&self) -> Range<usize> {
        self.captures.first().cloned().flatten().unwrap_or(0..0)
    }

    pub fn group(&self, index: usize) -> Option<Range<usize>> {
        self.captures.get(index).cloned().flatten()
    }
}

pub(crate) fn build_regex(pattern: &str, flags: PatternFlags, tier: Tier) -> Result<Regex, PatternError> {
    let mut builder = RegexBuilder::new(pattern);
    builder
        .case_insensitive(flags.contains(PatternFlags::IGNORE_CASE))
        .multi_line(flags.contains(PatternFlags::MULTILINE))
        .dot_matches_new_line(flags.contains(PatternFlags::DOT_ALL));
    if tier == Tier::Interpreted {
        builder.dfa_size_limit(0);
    }
    builder.build().map_err(|e| PatternError::Syntax {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

impl Matcher {
    pub fn build(pattern: &str, flags: PatternFlags, tier: Tier, encoding: Encoding) -> Result<Self, PatternError> {
        Ok(Self {
            regex: build_regex(pattern, flags, tier)?,
            tier,
            encoding,
        })
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Leftmost match starting at or after `start`; with `sticky`, only a
    /// match beginning exactly at `start`
    pub fn find_at(&self, subject: &Subject, start: usize, sticky: bool) -> Option<PatternMatch> {
        let byte = subject.byte_for_unit(start)?;
        let caps = self.regex.captures_at(&subject.text, byte)?;
        let whole = caps.get(0)?;
        if sticky && whole.start() != byte {
            trace!(start, found = whole.start(), "sticky match rejected");
            return None;
        }
        let captures = (0..caps.len())
            .map(|i| caps.get(i).map(|m| subject.unit_for_byte(m.start())..subject.unit_for_byte(m.end())))
            .collect();
        Some(PatternMatch { captures })
    }
}

/// A subject string prepared for matching
pub struct Subject {
    text: String,
    encoding: Encoding,
    /// (byte offset, unit offset) of every char start, then of the end
    boundaries: Vec<(usize, usize)>,
}

impl Subject {
    pub fn new(s: &VelaString) -> Self {
        Self::from_units(&s.to_units(), s.encoding())
    }

    pub fn from_units(units: &[u16], encoding: Encoding) -> Self {
        let mut text = String::with_capacity(units.len());
        let mut boundaries = Vec::with_capacity(units.len() + 1);
        let mut unit = 0;
        for decoded in char::decode_utf16(units.iter().copied()) {
            boundaries.push((text.len(), unit));
            match decoded {
                Ok(c) => {
                    text.push(c);
                    unit += c.len_utf16();
                }
                Err(_) => {
                    text.push(char::REPLACEMENT_CHARACTER);
                    unit += 1;
                }
            }
        }
        boundaries.push((text.len(), unit));
        Self { text, encoding, boundaries }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn len_units(&self) -> usize {
        self.boundaries.last().map(|b| b.1).unwrap_or(0)
    }

    /// Byte offset of the first char starting at or after `unit`
    pub fn byte_for_unit(&self, unit: usize) -> Option<usize> {
        if unit > self.len_units() {
            return None;
        }
        let i = match self.boundaries.binary_search_by_key(&unit, |b| b.1) {
            Ok(i) | Err(i) => i,
        };
        self.boundaries.get(i).map(|b| b.0)
    }

    pub fn unit_for_byte(&self, byte: usize) -> usize {
        let i = match self.boundaries.binary_search_by_key(&byte, |b| b.0) {
            Ok(i) | Err(i) => i,
        };
        self.boundaries.get(i).map(|b| b.1).unwrap_or_else(|| self.len_units())
    }
}

/// Find `needle` in `subject` at or after `start`, returning the match start
pub fn find_atom(subject: &VelaString, needle: &[u16], start: usize) -> Option<usize> {
    if start > subject.len() {
        return None;
    }
    if needle.is_empty() {
        return Some(start);
    }
    let flat = subject.flatten();
    let flat = flat.as_string()?;
    if let Some(bytes) = flat.seq_one_byte() {
        if needle.iter().any(|&u| u > 0xFF) {
            return None;
        }
        let narrow: Vec<u8> = needle.iter().map(|&u| u as u8).collect();
        return memmem::find(&bytes[start..], &narrow).map(|i| i + start);
    }
    let units = flat.seq_two_byte()?;
    units[start..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(pattern: &str, flags: &str) -> Matcher {
        Matcher::build(pattern, flags.parse().unwrap(), Tier::Native, Encoding::OneByte).unwrap()
    }

    #[test]
    fn test_positions_are_code_units() {
        let s = VelaString::new("\u{1F600}ab");
        let subject = Subject::new(s.as_string().unwrap());
        let found = m("b", "").find_at(&subject, 0, false).unwrap();
        assert_eq!(found.range(), 3..4);
    }

    #[test]
    fn test_latin1_subject_offsets() {
        let s = VelaString::new("caf\u{e9} bar");
        let subject = Subject::new(s.as_string().unwrap());
        let found = m("bar", "").find_at(&subject, 0, false).unwrap();
        assert_eq!(found.range(), 5..8);
        assert!(m("bar", "").find_at(&subject, 6, false).is_none());
    }

    #[test]
    fn test_sticky_requires_exact_start() {
        let s = VelaString::new("xxab");
        let subject = Subject::new(s.as_string().unwrap());
        assert!(m("ab", "").find_at(&subject, 0, true).is_none());
        assert_eq!(m("ab", "").find_at(&subject, 2, true).unwrap().range(), 2..4);
    }

    #[test]
    fn test_groups() {
        let s = VelaString::new("key=value");
        let subject = Subject::new(s.as_string().unwrap());
        let found = m(r"(\w+)=(\w+)?(x)?", "").find_at(&subject, 0, false).unwrap();
        assert_eq!(found.group(1), Some(0..3));
        assert_eq!(found.group(2), Some(4..9));
        assert_eq!(found.group(3), None);
    }

    #[test]
    fn test_interpreted_tier_matches_like_native() {
        let interp = Matcher::build("a+b", PatternFlags::IGNORE_CASE, Tier::Interpreted, Encoding::OneByte).unwrap();
        let s = VelaString::new("xxAAB");
        let subject = Subject::new(s.as_string().unwrap());
        assert_eq!(interp.find_at(&subject, 0, false).unwrap().range(), 2..5);
    }

    #[test]
    fn test_find_atom_narrow_and_wide() {
        let narrow = VelaString::new("needle in a haystack needle");
        assert_eq!(find_atom(narrow.as_string().unwrap(), &"needle".encode_utf16().collect::<Vec<_>>(), 1), Some(21));
        let wide = VelaString::new("\u{3b1}\u{3b2}\u{3b3}\u{3b2}");
        assert_eq!(find_atom(wide.as_string().unwrap(), &[0x3b2], 2), Some(3));
        assert_eq!(find_atom(narrow.as_string().unwrap(), &[0x3b2], 0), None);
        assert_eq!(find_atom(narrow.as_string().unwrap(), &[], 4), Some(4));
    }
}

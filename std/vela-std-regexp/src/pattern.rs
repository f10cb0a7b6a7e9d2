//!
//! Pattern Objects
//!
//! `PatternObject` owns the source, flags and `lastIndex` of a RegExp and, once
//! compiled, its `PatternData`. Callers branch on `type_tag()` before reading
//! variant-specific slots.
//!

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;
use vela_std_core::{Encoding, VelaString};

use crate::data::*;
use crate::error::PatternError;
use crate::flags::PatternFlags;
use crate::matcher::{build_regex, find_atom, Matcher, PatternMatch, Subject, Tier};

/// Executions spent in the interpreted tier before native code is compiled
pub const DEFAULT_TICKS_UNTIL_TIER_UP: u32 = 1;

const SYNTAX_CHARS: &[char] = &['\\', '^', '$', '.', '|', '?', '*', '+', '(', ')', '[', ']', '{', '}'];

#[derive(Debug, Clone)]
pub struct PatternObject {
    source: String,
    flags: PatternFlags,
    pub last_index: usize,
    data: Option<PatternData>,
}

impl PatternObject {
    /// An uncompiled pattern
    pub fn new(source: &str, flags: &str) -> Result<Self, PatternError> {
        Ok(Self {
            source: source.to_string(),
            flags: flags.parse()?,
            last_index: 0,
            data: None,
        })
    }

    /// Parse and compile in one step
    pub fn compiled(source: &str, flags: &str, ticks_until_tier_up: u32) -> Result<Self, PatternError> {
        let mut pattern = Self::new(source, flags)?;
        pattern.compile(ticks_until_tier_up)?;
        Ok(pattern)
    }

    pub(crate) fn from_parts(source: String, flags: PatternFlags, last_index: usize, data: Option<PatternData>) -> Self {
        Self { source, flags, last_index, data }
    }

    /// Build the backing data. Literal sources without `i` or `y` become atoms.
    pub fn compile(&mut self, ticks_until_tier_up: u32) -> Result<(), PatternError> {
        let is_literal = !self.source.contains(SYNTAX_CHARS);
        let atom_flags_ok = !self.flags.contains(PatternFlags::IGNORE_CASE) && !self.flags.is_sticky();
        let data = if is_literal && atom_flags_ok {
            PatternData::Atom(AtomData {
                source: self.source.clone(),
                flags: self.flags,
                needle: self.source.encode_utf16().collect(),
            })
        } else {
            let regex = build_regex(&self.source, self.flags, Tier::Native)?;
            let capture_count = (regex.captures_len() - 1) as u32;
            let names: IndexMap<String, u32> = regex
                .capture_names()
                .enumerate()
                .filter_map(|(i, name)| name.map(|n| (n.to_string(), i as u32)))
                .collect();
            PatternData::Compiled(CompiledData {
                source: self.source.clone(),
                flags: self.flags,
                latin1_code: CodeSlot::Uninitialized,
                uc16_code: CodeSlot::Uninitialized,
                max_register_count: 2 * (capture_count + 1),
                capture_count,
                capture_names: if names.is_empty() { CaptureNameSlot::Absent } else { CaptureNameSlot::Map(names) },
                ticks_until_tier_up,
            })
        };
        debug!(source = %self.source, flags = %self.flags, kind = %data.kind(), "compiled pattern");
        self.data = Some(data);
        Ok(())
    }

    pub fn type_tag(&self) -> PatternKind {
        match &self.data {
            None => PatternKind::Uncompiled,
            Some(data) => data.kind(),
        }
    }

    /// Number of capture groups.
    ///
    /// # Panics
    /// On an uncompiled pattern; check `type_tag()` first.
    pub fn capture_count(&self) -> u32 {
        match &self.data {
            Some(PatternData::Atom(_)) => 0,
            Some(PatternData::Compiled(c)) => c.capture_count,
            None => panic!("capture_count() called on an uncompiled pattern"),
        }
    }

    pub fn flags(&self) -> Result<PatternFlags, PatternError> {
        self.data.as_ref().map(|d| d.flags()).ok_or(PatternError::NotCompiled)
    }

    pub fn pattern(&self) -> Result<&str, PatternError> {
        self.data.as_ref().map(|d| d.source()).ok_or(PatternError::NotCompiled)
    }

    /// Source text as given, available in every state
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Flags as given, available in every state
    pub fn declared_flags(&self) -> PatternFlags {
        self.flags
    }

    /// Named groups, `None` when the pattern has none
    pub fn capture_name_map(&self) -> Result<Option<&IndexMap<String, u32>>, PatternError> {
        let compiled = self.compiled_data()?;
        match &compiled.capture_names {
            CaptureNameSlot::Uninitialized => Err(PatternError::CaptureNamesUninitialized),
            CaptureNameSlot::Absent => Ok(None),
            CaptureNameSlot::Map(map) => Ok(Some(map)),
        }
    }

    pub fn compiled_data(&self) -> Result<&CompiledData, PatternError> {
        match &self.data {
            Some(PatternData::Compiled(c)) => Ok(c),
            other => Err(PatternError::WrongKind {
                expected: PatternKind::Compiled,
                found: other.as_ref().map(|d| d.kind()).unwrap_or(PatternKind::Uncompiled),
            }),
        }
    }

    pub fn data_at(&self, index: usize) -> Result<DataRef<'_>, PatternError> {
        let data = self.data.as_ref().ok_or(PatternError::NotCompiled)?;
        let out_of_range = || PatternError::IndexOutOfRange { index, kind: data.kind() };
        let slot = match (index, data) {
            (TAG_INDEX, _) => DataRef::Tag(data.kind()),
            (SOURCE_INDEX, _) => DataRef::Source(data.source()),
            (FLAGS_INDEX, _) => DataRef::Flags(data.flags()),
            (ATOM_PATTERN_INDEX, PatternData::Atom(a)) => DataRef::Needle(&a.needle),
            (_, PatternData::Atom(_)) => return Err(out_of_range()),
            (LATIN1_CODE_INDEX, PatternData::Compiled(c)) => DataRef::Code(&c.latin1_code),
            (UC16_CODE_INDEX, PatternData::Compiled(c)) => DataRef::Code(&c.uc16_code),
            (MAX_REGISTER_COUNT_INDEX, PatternData::Compiled(c)) => DataRef::Int(c.max_register_count),
            (CAPTURE_COUNT_INDEX, PatternData::Compiled(c)) => DataRef::Int(c.capture_count),
            (CAPTURE_NAME_MAP_INDEX, PatternData::Compiled(c)) => DataRef::CaptureNames(&c.capture_names),
            (TICKS_UNTIL_TIER_UP_INDEX, PatternData::Compiled(c)) => DataRef::Int(c.ticks_until_tier_up),
            (_, PatternData::Compiled(_)) => return Err(out_of_range()),
        };
        Ok(slot)
    }

    /// Store into a mutable slot; header slots below `DATA_INDEX` are rejected
    pub fn set_data_at(&mut self, index: usize, value: DataValue) -> Result<(), PatternError> {
        let data = self.data.as_mut().ok_or(PatternError::NotCompiled)?;
        if index < DATA_INDEX {
            return Err(PatternError::ProtectedSlot(index));
        }
        let kind = data.kind();
        let mismatch = |expected| PatternError::SlotTypeMismatch { index, expected };
        match (data, index, value) {
            (PatternData::Atom(a), ATOM_PATTERN_INDEX, DataValue::Needle(n)) => a.needle = n,
            (PatternData::Atom(_), ATOM_PATTERN_INDEX, _) => return Err(mismatch("a needle")),
            (PatternData::Compiled(c), LATIN1_CODE_INDEX, DataValue::Code(code)) => c.latin1_code = code,
            (PatternData::Compiled(c), UC16_CODE_INDEX, DataValue::Code(code)) => c.uc16_code = code,
            (PatternData::Compiled(_), LATIN1_CODE_INDEX | UC16_CODE_INDEX, _) => return Err(mismatch("code")),
            (PatternData::Compiled(c), MAX_REGISTER_COUNT_INDEX, DataValue::Int(n)) => c.max_register_count = n,
            (PatternData::Compiled(c), CAPTURE_COUNT_INDEX, DataValue::Int(n)) => c.capture_count = n,
            (PatternData::Compiled(c), TICKS_UNTIL_TIER_UP_INDEX, DataValue::Int(n)) => c.ticks_until_tier_up = n,
            (PatternData::Compiled(_), MAX_REGISTER_COUNT_INDEX | CAPTURE_COUNT_INDEX | TICKS_UNTIL_TIER_UP_INDEX, _) => {
                return Err(mismatch("an integer"));
            }
            (PatternData::Compiled(c), CAPTURE_NAME_MAP_INDEX, DataValue::CaptureNames(names)) => c.capture_names = names,
            (PatternData::Compiled(_), CAPTURE_NAME_MAP_INDEX, _) => return Err(mismatch("a capture name map")),
            _ => return Err(PatternError::IndexOutOfRange { index, kind }),
        }
        Ok(())
    }

    pub fn has_compiled_code(&self) -> bool {
        match &self.data {
            Some(PatternData::Compiled(c)) => !c.latin1_code.is_uninitialized() || !c.uc16_code.is_uninitialized(),
            _ => false,
        }
    }

    /// Reset both code slots ahead of a snapshot. Requires compiled code.
    pub fn discard_compiled_code_for_serialization(&mut self) {
        debug_assert!(self.has_compiled_code(), "no compiled code to discard");
        if let Some(PatternData::Compiled(c)) = &mut self.data {
            c.reset_code();
        }
    }

    pub fn code_slot(&self, encoding: Encoding) -> Option<&CodeSlot> {
        match &self.data {
            Some(PatternData::Compiled(c)) => Some(c.code_slot(encoding)),
            _ => None,
        }
    }

    /// Run the pattern against `subject` from `lastIndex` (global or sticky) or 0
    pub fn exec(&mut self, subject: &VelaString) -> Result<Option<PatternMatch>, PatternError> {
        let flags = self.flags()?;
        let uses_last_index = flags.uses_last_index();
        let start = if uses_last_index { self.last_index } else { 0 };
        if start > subject.len() {
            if uses_last_index {
                self.last_index = 0;
            }
            return Ok(None);
        }

        let found = match self.data.as_mut() {
            Some(PatternData::Atom(atom)) => find_atom(subject, &atom.needle, start).map(|at| PatternMatch {
                captures: smallvec::smallvec![Some(at..at + atom.needle.len())],
            }),
            Some(PatternData::Compiled(compiled)) => {
                let matcher = ensure_code(compiled, subject.encoding())?;
                let found = matcher.find_at(&Subject::new(subject), start, flags.is_sticky());
                if matcher.tier() == Tier::Interpreted {
                    tick(compiled);
                }
                found
            }
            None => return Err(PatternError::NotCompiled),
        };

        if uses_last_index {
            self.last_index = found.as_ref().map(|m| m.range().end).unwrap_or(0);
        }
        Ok(found)
    }
}

/// The matcher for `encoding`, building it in the current tier if the slot is empty
fn ensure_code(compiled: &mut CompiledData, encoding: Encoding) -> Result<Arc<Matcher>, PatternError> {
    if let Some(existing) = compiled.code_slot(encoding).matcher() {
        return Ok(existing.clone());
    }
    let tier = if compiled.ticks_until_tier_up > 0 { Tier::Interpreted } else { Tier::Native };
    let matcher = Arc::new(Matcher::build(&compiled.source, compiled.flags, tier, encoding)?);
    debug!(source = %compiled.source, ?encoding, ?tier, "populated code slot");
    *compiled.code_slot_mut(encoding) = match tier {
        Tier::Interpreted => CodeSlot::Bytecode(matcher.clone()),
        Tier::Native => CodeSlot::Native(matcher.clone()),
    };
    Ok(matcher)
}

fn tick(compiled: &mut CompiledData) {
    if compiled.ticks_until_tier_up == 0 {
        return;
    }
    compiled.ticks_until_tier_up -= 1;
    if compiled.ticks_until_tier_up == 0 {
        debug!(source = %compiled.source, "marked for tier-up");
        compiled.reset_code();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(s: &str) -> vela_std_core::Handle {
        VelaString::new(s)
    }

    #[test]
    fn test_uncompiled_pattern() {
        let p = PatternObject::new("a+", "g").unwrap();
        assert_eq!(p.type_tag(), PatternKind::Uncompiled);
        assert_eq!(p.flags(), Err(PatternError::NotCompiled));
        assert_eq!(p.pattern(), Err(PatternError::NotCompiled));
        assert!(!p.has_compiled_code());
        assert!(matches!(p.data_at(TAG_INDEX), Err(PatternError::NotCompiled)));
    }

    #[test]
    #[should_panic(expected = "uncompiled")]
    fn test_capture_count_on_uncompiled_panics() {
        let p = PatternObject::new("a", "").unwrap();
        p.capture_count();
    }

    #[test]
    fn test_literal_becomes_atom() {
        let p = PatternObject::compiled("needle", "g", 1).unwrap();
        assert_eq!(p.type_tag(), PatternKind::Atom);
        assert_eq!(p.capture_count(), 0);
        assert!(!p.has_compiled_code());
        assert!(matches!(p.data_at(ATOM_PATTERN_INDEX), Ok(DataRef::Needle(n)) if n.len() == 6));
        assert!(matches!(p.capture_name_map(), Err(PatternError::WrongKind { .. })));
    }

    #[test]
    fn test_ignore_case_literal_is_compiled() {
        let p = PatternObject::compiled("needle", "i", 1).unwrap();
        assert_eq!(p.type_tag(), PatternKind::Compiled);
    }

    #[test]
    fn test_compiled_records_captures_and_names() {
        let p = PatternObject::compiled(r"(?<year>\d{4})-(\d{2})-(?<day>\d{2})", "", 1).unwrap();
        assert_eq!(p.type_tag(), PatternKind::Compiled);
        assert_eq!(p.capture_count(), 3);
        assert!(matches!(p.data_at(MAX_REGISTER_COUNT_INDEX), Ok(DataRef::Int(8))));
        let names = p.capture_name_map().unwrap().unwrap();
        assert_eq!(names.iter().map(|(k, v)| (k.as_str(), *v)).collect::<Vec<_>>(), vec![("year", 1), ("day", 3)]);
        assert!(!p.has_compiled_code());
    }

    #[test]
    fn test_capture_name_guard() {
        let mut p = PatternObject::compiled("(a)", "", 1).unwrap();
        assert_eq!(p.capture_name_map(), Ok(None));
        p.set_data_at(CAPTURE_NAME_MAP_INDEX, DataValue::CaptureNames(CaptureNameSlot::Uninitialized))
            .unwrap();
        assert_eq!(p.capture_name_map(), Err(PatternError::CaptureNamesUninitialized));
    }

    #[test]
    fn test_set_data_at_protects_header() {
        let mut p = PatternObject::compiled("a|b", "", 1).unwrap();
        for index in [TAG_INDEX, SOURCE_INDEX, FLAGS_INDEX] {
            assert_eq!(p.set_data_at(index, DataValue::Int(0)), Err(PatternError::ProtectedSlot(index)));
        }
        assert!(matches!(
            p.set_data_at(CAPTURE_COUNT_INDEX, DataValue::Needle(vec![])),
            Err(PatternError::SlotTypeMismatch { .. })
        ));
        assert!(matches!(
            p.set_data_at(COMPILED_DATA_SIZE, DataValue::Int(0)),
            Err(PatternError::IndexOutOfRange { .. })
        ));
        p.set_data_at(TICKS_UNTIL_TIER_UP_INDEX, DataValue::Int(5)).unwrap();
        assert!(matches!(p.data_at(TICKS_UNTIL_TIER_UP_INDEX), Ok(DataRef::Int(5))));
    }

    #[test]
    fn test_code_slots_populate_per_encoding() {
        let mut p = PatternObject::compiled("b+", "", 0).unwrap();
        let narrow = subject("abbbc");
        assert_eq!(p.exec(narrow.as_string().unwrap()).unwrap().unwrap().range(), 1..4);
        assert!(p.has_compiled_code());
        assert!(matches!(p.code_slot(Encoding::OneByte), Some(CodeSlot::Native(_))));
        assert!(p.code_slot(Encoding::TwoByte).unwrap().is_uninitialized());

        let wide = subject("\u{3b1}bb");
        assert_eq!(p.exec(wide.as_string().unwrap()).unwrap().unwrap().range(), 1..3);
        assert!(matches!(p.code_slot(Encoding::TwoByte), Some(CodeSlot::Native(_))));
    }

    #[test]
    fn test_tier_up_after_ticks() {
        let mut p = PatternObject::compiled("b+", "", 2).unwrap();
        let s = subject("abc");
        p.exec(s.as_string().unwrap()).unwrap();
        assert!(matches!(p.code_slot(Encoding::OneByte), Some(CodeSlot::Bytecode(_))));
        p.exec(s.as_string().unwrap()).unwrap();
        // ticks exhausted: slots reset until the next execution
        assert!(!p.has_compiled_code());
        p.exec(s.as_string().unwrap()).unwrap();
        assert!(matches!(p.code_slot(Encoding::OneByte), Some(CodeSlot::Native(_))));
    }

    #[test]
    fn test_discard_compiled_code() {
        let mut p = PatternObject::compiled("x+", "", 0).unwrap();
        let s = subject("xx");
        p.exec(s.as_string().unwrap()).unwrap();
        assert!(p.has_compiled_code());
        p.discard_compiled_code_for_serialization();
        assert!(!p.has_compiled_code());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "no compiled code")]
    fn test_discard_without_code_asserts() {
        let mut p = PatternObject::compiled("x+", "", 0).unwrap();
        p.discard_compiled_code_for_serialization();
    }

    #[test]
    fn test_global_exec_advances_last_index() {
        let mut p = PatternObject::compiled("ab", "g", 1).unwrap();
        let s = subject("ab-ab");
        assert_eq!(p.exec(s.as_string().unwrap()).unwrap().unwrap().range(), 0..2);
        assert_eq!(p.last_index, 2);
        assert_eq!(p.exec(s.as_string().unwrap()).unwrap().unwrap().range(), 3..5);
        assert_eq!(p.last_index, 5);
        assert!(p.exec(s.as_string().unwrap()).unwrap().is_none());
        assert_eq!(p.last_index, 0);
    }

    #[test]
    fn test_sticky_exec() {
        let mut p = PatternObject::compiled("a", "y", 1).unwrap();
        let s = subject("aab");
        assert!(p.exec(s.as_string().unwrap()).unwrap().is_some());
        assert!(p.exec(s.as_string().unwrap()).unwrap().is_some());
        assert_eq!(p.last_index, 2);
        assert!(p.exec(s.as_string().unwrap()).unwrap().is_none());
        assert_eq!(p.last_index, 0);
    }

    #[test]
    fn test_non_global_ignores_last_index() {
        let mut p = PatternObject::compiled("a", "", 1).unwrap();
        p.last_index = 10;
        let s = subject("a");
        assert!(p.exec(s.as_string().unwrap()).unwrap().is_some());
        assert_eq!(p.last_index, 10);
    }

    #[test]
    fn test_syntax_error() {
        let err = PatternObject::compiled("(", "", 1).unwrap_err();
        assert!(matches!(err, PatternError::Syntax { ref pattern, .. } if pattern == "("));
    }
}

//!
//! Snapshot Boundary
//!
//! Generated code cannot be persisted, so a pattern is always stripped of its
//! code slots before it is written out. Restored patterns start with both
//! slots uninitialized and repopulate on first execution.
//!

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::data::*;
use crate::error::PatternError;
use crate::flags::PatternFlags;
use crate::pattern::PatternObject;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSnapshot {
    pub source: String,
    pub flags: String,
    pub last_index: usize,
    pub kind: PatternKind,
    #[serde(default)]
    pub capture_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_names: Option<IndexMap<String, u32>>,
    #[serde(default)]
    pub ticks_until_tier_up: u32,
}

impl PatternObject {
    /// Discard compiled code (if any) and capture the persistable state
    pub fn prepare_for_snapshot(&mut self) -> PatternSnapshot {
        if self.has_compiled_code() {
            self.discard_compiled_code_for_serialization();
        }
        let kind = self.type_tag();
        let (capture_count, capture_names, ticks_until_tier_up) = match self.compiled_data() {
            Ok(c) => (
                c.capture_count,
                match &c.capture_names {
                    CaptureNameSlot::Map(map) => Some(map.clone()),
                    _ => None,
                },
                c.ticks_until_tier_up,
            ),
            Err(_) => (0, None, 0),
        };
        PatternSnapshot {
            source: self.source().to_string(),
            flags: self.declared_flags().to_string(),
            last_index: self.last_index,
            kind,
            capture_count,
            capture_names,
            ticks_until_tier_up,
        }
    }

    pub fn from_snapshot(snapshot: &PatternSnapshot) -> Result<Self, PatternError> {
        let flags: PatternFlags = snapshot.flags.parse()?;
        let data = match snapshot.kind {
            PatternKind::Uncompiled => None,
            PatternKind::Atom => Some(PatternData::Atom(AtomData {
                source: snapshot.source.clone(),
                flags,
                needle: snapshot.source.encode_utf16().collect(),
            })),
            PatternKind::Compiled => Some(PatternData::Compiled(CompiledData {
                source: snapshot.source.clone(),
                flags,
                latin1_code: CodeSlot::Uninitialized,
                uc16_code: CodeSlot::Uninitialized,
                max_register_count: 2 * (snapshot.capture_count + 1),
                capture_count: snapshot.capture_count,
                capture_names: match &snapshot.capture_names {
                    Some(map) => CaptureNameSlot::Map(map.clone()),
                    None => CaptureNameSlot::Absent,
                },
                ticks_until_tier_up: snapshot.ticks_until_tier_up,
            })),
        };
        Ok(PatternObject::from_parts(snapshot.source.clone(), flags, snapshot.last_index, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_std_core::{Encoding, VelaString};

    #[test]
    fn test_snapshot_discards_code() {
        let mut p = PatternObject::compiled("(?<word>[a-z]+)", "g", 0).unwrap();
        let s = VelaString::new("hello world");
        p.exec(s.as_string().unwrap()).unwrap();
        assert!(p.has_compiled_code());

        let snapshot = p.prepare_for_snapshot();
        assert!(!p.has_compiled_code());
        assert_eq!(snapshot.kind, PatternKind::Compiled);
        assert_eq!(snapshot.last_index, 5);
        assert_eq!(snapshot.capture_count, 1);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["kind"], "compiled");
        assert_eq!(json["capture_names"]["word"], 1);
    }

    #[test]
    fn test_restore_executes_again() {
        let mut p = PatternObject::compiled("o+", "g", 0).unwrap();
        let snapshot = p.prepare_for_snapshot();
        let mut restored = PatternObject::from_snapshot(&snapshot).unwrap();
        assert_eq!(restored.type_tag(), PatternKind::Compiled);
        assert!(!restored.has_compiled_code());
        let s = VelaString::new("foo");
        assert_eq!(restored.exec(s.as_string().unwrap()).unwrap().unwrap().range(), 1..3);
        assert!(restored.code_slot(Encoding::OneByte).is_some_and(|c| !c.is_uninitialized()));
    }

    #[test]
    fn test_snapshot_of_atom_and_uncompiled() {
        let mut atom = PatternObject::compiled("lit", "", 1).unwrap();
        let snapshot = atom.prepare_for_snapshot();
        assert_eq!(snapshot.kind, PatternKind::Atom);
        assert_eq!(PatternObject::from_snapshot(&snapshot).unwrap().capture_count(), 0);

        let mut raw = PatternObject::new("a", "i").unwrap();
        let snapshot = raw.prepare_for_snapshot();
        assert_eq!(snapshot.kind, PatternKind::Uncompiled);
        assert_eq!(snapshot.flags, "i");
        let restored = PatternObject::from_snapshot(&snapshot).unwrap();
        assert_eq!(restored.declared_flags(), PatternFlags::IGNORE_CASE);
    }
}

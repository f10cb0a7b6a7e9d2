//!
//! Pattern Data
//!
//! The backing store of a compiled pattern, addressed by slot index:
//!
//! | index | atom | compiled |
//! |---|---|---|
//! | 0 | tag | tag |
//! | 1 | source | source |
//! | 2 | flags | flags |
//! | 3 | needle | latin1 code |
//! | 4 | | uc16 code |
//! | 5 | | max register count |
//! | 6 | | capture count |
//! | 7 | | capture name map |
//! | 8 | | ticks until tier-up |
//!
//! Slots below `DATA_INDEX` are fixed at compile time.
//!

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use vela_std_core::Encoding;

use crate::flags::PatternFlags;
use crate::matcher::Matcher;

pub const TAG_INDEX: usize = 0;
pub const SOURCE_INDEX: usize = 1;
pub const FLAGS_INDEX: usize = 2;
pub const DATA_INDEX: usize = 3;

pub const ATOM_PATTERN_INDEX: usize = 3;
pub const ATOM_DATA_SIZE: usize = 4;

pub const LATIN1_CODE_INDEX: usize = 3;
pub const UC16_CODE_INDEX: usize = 4;
pub const MAX_REGISTER_COUNT_INDEX: usize = 5;
pub const CAPTURE_COUNT_INDEX: usize = 6;
pub const CAPTURE_NAME_MAP_INDEX: usize = 7;
pub const TICKS_UNTIL_TIER_UP_INDEX: usize = 8;
pub const COMPILED_DATA_SIZE: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Uncompiled,
    Atom,
    Compiled,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PatternKind::Uncompiled => "uncompiled",
            PatternKind::Atom => "atom",
            PatternKind::Compiled => "compiled",
        })
    }
}

/// One encoding's code: nothing yet, interpretable bytecode, or native code
#[derive(Debug, Clone, Default)]
pub enum CodeSlot {
    #[default]
    Uninitialized,
    Bytecode(Arc<Matcher>),
    Native(Arc<Matcher>),
}

impl CodeSlot {
    pub fn is_uninitialized(&self) -> bool {
        matches!(self, CodeSlot::Uninitialized)
    }

    pub fn matcher(&self) -> Option<&Arc<Matcher>> {
        match self {
            CodeSlot::Uninitialized => None,
            CodeSlot::Bytecode(m) | CodeSlot::Native(m) => Some(m),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CaptureNameSlot {
    #[default]
    Uninitialized,
    /// The pattern has no named groups
    Absent,
    /// Group name to capture index, in source order
    Map(IndexMap<String, u32>),
}

#[derive(Debug, Clone)]
pub struct AtomData {
    pub source: String,
    pub flags: PatternFlags,
    pub needle: Vec<u16>,
}

#[derive(Debug, Clone)]
pub struct CompiledData {
    pub source: String,
    pub flags: PatternFlags,
    pub latin1_code: CodeSlot,
    pub uc16_code: CodeSlot,
    pub max_register_count: u32,
    pub capture_count: u32,
    pub capture_names: CaptureNameSlot,
    pub ticks_until_tier_up: u32,
}

impl CompiledData {
    pub fn code_slot(&self, encoding: Encoding) -> &CodeSlot {
        match encoding {
            Encoding::OneByte => &self.latin1_code,
            Encoding::TwoByte => &self.uc16_code,
        }
    }

    pub fn code_slot_mut(&mut self, encoding: Encoding) -> &mut CodeSlot {
        match encoding {
            Encoding::OneByte => &mut self.latin1_code,
            Encoding::TwoByte => &mut self.uc16_code,
        }
    }

    pub fn reset_code(&mut self) {
        self.latin1_code = CodeSlot::Uninitialized;
        self.uc16_code = CodeSlot::Uninitialized;
    }
}

#[derive(Debug, Clone)]
pub enum PatternData {
    Atom(AtomData),
    Compiled(CompiledData),
}

impl PatternData {
    pub fn kind(&self) -> PatternKind {
        match self {
            PatternData::Atom(_) => PatternKind::Atom,
            PatternData::Compiled(_) => PatternKind::Compiled,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PatternData::Atom(_) => ATOM_DATA_SIZE,
            PatternData::Compiled(_) => COMPILED_DATA_SIZE,
        }
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn source(&self) -> &str {
        match self {
            PatternData::Atom(a) => &a.source,
            PatternData::Compiled(c) => &c.source,
        }
    }

    pub fn flags(&self) -> PatternFlags {
        match self {
            PatternData::Atom(a) => a.flags,
            PatternData::Compiled(c) => c.flags,
        }
    }
}

/// A borrowed view of one data slot
#[derive(Debug, Clone, Copy)]
pub enum DataRef<'a> {
    Tag(PatternKind),
    Source(&'a str),
    Flags(PatternFlags),
    Needle(&'a [u16]),
    Code(&'a CodeSlot),
    Int(u32),
    CaptureNames(&'a CaptureNameSlot),
}

/// A value to store into a mutable data slot
#[derive(Debug, Clone)]
pub enum DataValue {
    Needle(Vec<u16>),
    Code(CodeSlot),
    Int(u32),
    CaptureNames(CaptureNameSlot),
}

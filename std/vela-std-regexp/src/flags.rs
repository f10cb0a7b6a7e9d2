//!
//! Pattern Flags
//!

use std::fmt;
use std::str::FromStr;

use crate::error::PatternError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PatternFlags(u8);

impl PatternFlags {
    pub const NONE: PatternFlags = PatternFlags(0);
    pub const GLOBAL: PatternFlags = PatternFlags(1 << 0);
    pub const IGNORE_CASE: PatternFlags = PatternFlags(1 << 1);
    pub const MULTILINE: PatternFlags = PatternFlags(1 << 2);
    pub const STICKY: PatternFlags = PatternFlags(1 << 3);
    pub const UNICODE: PatternFlags = PatternFlags(1 << 4);
    pub const DOT_ALL: PatternFlags = PatternFlags(1 << 5);

    /// Flag characters in the order the `flags` getter reports them
    const CANONICAL: [(char, PatternFlags); 6] = [
        ('g', Self::GLOBAL),
        ('i', Self::IGNORE_CASE),
        ('m', Self::MULTILINE),
        ('s', Self::DOT_ALL),
        ('u', Self::UNICODE),
        ('y', Self::STICKY),
    ];

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn from_bits(bits: u8) -> Option<Self> {
        if bits & !0b11_1111 == 0 {
            Some(PatternFlags(bits))
        } else {
            None
        }
    }

    pub fn contains(self, other: PatternFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: PatternFlags) {
        self.0 |= other.0;
    }

    pub fn is_global(self) -> bool {
        self.contains(Self::GLOBAL)
    }

    pub fn is_sticky(self) -> bool {
        self.contains(Self::STICKY)
    }

    /// Global or sticky patterns read and update `lastIndex`
    pub fn uses_last_index(self) -> bool {
        self.0 & (Self::GLOBAL.0 | Self::STICKY.0) != 0
    }
}

impl FromStr for PatternFlags {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = PatternFlags::NONE;
        for c in s.chars() {
            let flag = Self::CANONICAL
                .iter()
                .find(|(ch, _)| *ch == c)
                .map(|(_, f)| *f)
                .ok_or_else(|| PatternError::InvalidFlags(s.to_string()))?;
            if flags.contains(flag) {
                return Err(PatternError::InvalidFlags(s.to_string()));
            }
            flags.insert(flag);
        }
        Ok(flags)
    }
}

impl fmt::Display for PatternFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (c, flag) in Self::CANONICAL {
            if self.contains(flag) {
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_canonical_order() {
        let flags: PatternFlags = "yusmig".parse().unwrap();
        assert_eq!(flags.to_string(), "gimsuy");
        assert_eq!(flags.bits(), 0b11_1111);
    }

    #[test]
    fn test_rejects_duplicate_and_unknown() {
        assert_eq!("gg".parse::<PatternFlags>(), Err(PatternError::InvalidFlags("gg".into())));
        assert!("x".parse::<PatternFlags>().is_err());
        assert_eq!("".parse::<PatternFlags>(), Ok(PatternFlags::NONE));
    }

    #[test]
    fn test_last_index_flags() {
        assert!(PatternFlags::GLOBAL.uses_last_index());
        assert!(PatternFlags::STICKY.uses_last_index());
        assert!(!PatternFlags::IGNORE_CASE.uses_last_index());
        assert_eq!(PatternFlags::from_bits(0x40), None);
    }
}

//!
//! String Table
//!
//! Canonical interned copies of strings, keyed by content. Interned strings
//! are always sequential and use the narrowest encoding that fits.
//!

use std::collections::HashMap;

use crate::string::{mark_interned, VelaString};
use crate::value::Handle;

#[derive(Default)]
pub struct StringTable {
    entries: HashMap<Vec<u16>, Handle>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The canonical string with the same content as `s`
    pub fn internalize(&mut self, s: &VelaString) -> Handle {
        if s.is_interned() {
            return s.retain();
        }
        if s.is_empty() {
            return VelaString::empty();
        }
        let units = s.to_units();
        if let Some(existing) = self.entries.get(&units) {
            return existing.clone();
        }
        let copy = VelaString::from_units(&units);
        if let Some(fresh) = copy.as_string() {
            unsafe { mark_interned(fresh.as_ptr()) };
            fresh.hash_code();
        }
        self.entries.insert(units, copy.clone());
        copy
    }

    pub fn lookup(&self, s: &str) -> Option<Handle> {
        let units: Vec<u16> = s.encode_utf16().collect();
        self.entries.get(&units).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::string::StringRepr;

    #[test]
    fn test_internalize_returns_canonical_copy() {
        let mut table = StringTable::new();
        let a = VelaString::new("key");
        let b = VelaString::new("key");
        let ia = table.internalize(a.as_string().unwrap());
        let ib = table.internalize(b.as_string().unwrap());
        assert!(ia.ptr_eq(&ib));
        assert!(!ia.ptr_eq(&a));
        assert!(ia.as_string().unwrap().is_interned());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_internalize_flattens_and_narrows() {
        let mut table = StringTable::new();
        let wide = VelaString::two_byte(&[0x61, 0x62]);
        let tail = VelaString::new("c");
        let cons = VelaString::cons(wide.as_string().unwrap(), tail.as_string().unwrap());
        let interned = table.internalize(cons.as_string().unwrap());
        let s = interned.as_string().unwrap();
        assert_eq!(s.repr(), StringRepr::Seq);
        assert!(s.is_one_byte());
        assert_eq!(s.to_rust_string(), "abc");
        assert!(table.lookup("abc").is_some());
    }
}

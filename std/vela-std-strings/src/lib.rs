//!
//! vela-std-strings - String Case Conversion
//!
//! ## Narrow strings
//! - `LATIN1_TO_LOWER_TABLE` - one entry per Latin-1 unit, exported for generated code
//! - `vela_convert_one_byte_to_lower(src, dst)` - table-driven conversion of a
//!   sequential one-byte string into a caller-allocated buffer
//!
//! ## Any string
//! - `to_lower_case(s)` - full Unicode lowercasing of any string shape
//!

pub mod case;

pub use case::to_lower_case;

use std::cell::Cell;

use tracing::trace;
use vela_std_core::{vela_string_decref, vela_string_incref, VelaString};

const fn build_lower_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let c = i as u8;
        let upper = matches!(c, b'A'..=b'Z') || (c >= 0xC0 && c <= 0xDE && c != 0xD7);
        table[i] = if upper { c + 0x20 } else { c };
        i += 1;
    }
    table
}

/// Latin-1 unit to its lowercase Latin-1 unit
#[unsafe(export_name = "vela_latin1_to_lower_table")]
pub static LATIN1_TO_LOWER_TABLE: [u8; 256] = build_lower_table();

thread_local! {
    static ONE_BYTE_LOWER_CALLS: Cell<u64> = const { Cell::new(0) };
}

pub mod stats {
    use super::ONE_BYTE_LOWER_CALLS;

    /// How many times `vela_convert_one_byte_to_lower` ran on this thread
    pub fn one_byte_lower_calls() -> u64 {
        ONE_BYTE_LOWER_CALLS.with(|c| c.get())
    }
}

/// Lowercase a sequential one-byte `src` into `dst`.
///
/// `src` is borrowed and `dst` is owned: a fresh one-byte string of the same
/// length. Returns an owned reference to `src` (releasing `dst`) when no unit
/// changes, otherwise `dst` holding the converted content.
///
/// # Safety
/// `src` must be a live sequential one-byte string and `dst` a sequential
/// one-byte string of equal length that nothing else references.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_convert_one_byte_to_lower(
    src: *mut VelaString,
    dst: *mut VelaString,
) -> *mut VelaString {
    ONE_BYTE_LOWER_CALLS.with(|c| c.set(c.get() + 1));
    unsafe {
        let (Some(input), Some(len)) = ((*src).seq_one_byte(), (*dst).seq_one_byte().map(|d| d.len())) else {
            trace!("one-byte lower called with a non-sequential string");
            vela_string_decref(dst);
            vela_string_incref(src);
            return src;
        };
        debug_assert_eq!(input.len(), len);

        let Some(first) = input.iter().position(|&c| LATIN1_TO_LOWER_TABLE[c as usize] != c) else {
            trace!(len, "one-byte lower: unchanged");
            vela_string_decref(dst);
            vela_string_incref(src);
            return src;
        };

        let out = std::slice::from_raw_parts_mut(
            (dst as *mut u8).add(vela_std_core::STRING_DATA_OFFSET as usize),
            len,
        );
        out[..first].copy_from_slice(&input[..first]);
        for (o, &c) in out[first..].iter_mut().zip(&input[first..]) {
            *o = LATIN1_TO_LOWER_TABLE[c as usize];
        }
        trace!(len, first, "one-byte lower: converted");
        dst
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_std_core::{vela_string_alloc_one_byte, Handle, Value};

    fn lower_native(s: &Handle) -> Handle {
        let src = s.value().0 as *mut VelaString;
        let len = s.as_string().unwrap().len();
        unsafe {
            let dst = vela_string_alloc_one_byte(len);
            Handle::from_owned(Value::from_ptr(vela_convert_one_byte_to_lower(src, dst)))
        }
    }

    #[test]
    fn test_table_maps_latin1_uppercase() {
        assert_eq!(LATIN1_TO_LOWER_TABLE[b'A' as usize], b'a');
        assert_eq!(LATIN1_TO_LOWER_TABLE[b'Z' as usize], b'z');
        assert_eq!(LATIN1_TO_LOWER_TABLE[0xC0], 0xE0);
        assert_eq!(LATIN1_TO_LOWER_TABLE[0xDE], 0xFE);
        // multiplication sign, sharp s and micro sign have no narrow lowercase
        assert_eq!(LATIN1_TO_LOWER_TABLE[0xD7], 0xD7);
        assert_eq!(LATIN1_TO_LOWER_TABLE[0xDF], 0xDF);
        assert_eq!(LATIN1_TO_LOWER_TABLE[0xB5], 0xB5);
        assert_eq!(LATIN1_TO_LOWER_TABLE[b'@' as usize], b'@');
    }

    #[test]
    fn test_table_agrees_with_unicode() {
        for c in 0u8..=255 {
            let expected: Vec<char> = (c as char).to_lowercase().collect();
            if expected.len() == 1 && (expected[0] as u32) <= 0xFF {
                assert_eq!(LATIN1_TO_LOWER_TABLE[c as usize] as u32, expected[0] as u32, "unit {:#x}", c);
            }
        }
    }

    #[test]
    fn test_convert_returns_source_when_unchanged() {
        let s = VelaString::new("already lower case text here");
        let result = lower_native(&s);
        assert!(result.ptr_eq(&s));
        assert_eq!(s.refcount(), Some(2));
    }

    #[test]
    fn test_convert_writes_destination() {
        let s = VelaString::new("Hello \u{c9}COLE, Long Enough Input");
        let result = lower_native(&s);
        assert!(!result.ptr_eq(&s));
        assert_eq!(result.as_string().unwrap().to_rust_string(), "hello \u{e9}cole, long enough input");
        assert_eq!(s.as_string().unwrap().to_rust_string(), "Hello \u{c9}COLE, Long Enough Input");
    }

    #[test]
    fn test_convert_counts_calls() {
        let before = stats::one_byte_lower_calls();
        let s = VelaString::new("X");
        drop(lower_native(&s));
        assert_eq!(stats::one_byte_lower_calls(), before + 1);
    }
}

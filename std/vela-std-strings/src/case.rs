//!
//! Unicode Case Folding
//!
//! The general lowercase conversion. Handles every string shape and both
//! encodings; the generated fast path must agree with it on narrow input.
//!

use tracing::trace;
use vela_std_core::{Handle, VelaString};

use crate::LATIN1_TO_LOWER_TABLE;

/// Lowercase `s`, returning `s` itself when nothing changes
pub fn to_lower_case(s: &VelaString) -> Handle {
    if s.is_empty() {
        return s.retain();
    }
    let units = s.to_units();
    let lowered = if s.is_one_byte() {
        units.iter().map(|&u| LATIN1_TO_LOWER_TABLE[u as usize] as u16).collect()
    } else {
        lower_units(&units)
    };
    if lowered == units {
        trace!(len = units.len(), "to_lower_case: unchanged");
        return s.retain();
    }
    VelaString::from_units(&lowered)
}

/// Lowercase UTF-16 units; unpaired surrogates are kept as they are
pub fn lower_units(units: &[u16]) -> Vec<u16> {
    let mut out = Vec::with_capacity(units.len());
    let mut run = String::new();
    for decoded in char::decode_utf16(units.iter().copied()) {
        match decoded {
            Ok(c) => run.push(c),
            Err(e) => {
                flush_run(&mut run, &mut out);
                out.push(e.unpaired_surrogate());
            }
        }
    }
    flush_run(&mut run, &mut out);
    out
}

fn flush_run(run: &mut String, out: &mut Vec<u16>) {
    if !run.is_empty() {
        out.extend(run.to_lowercase().encode_utf16());
        run.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_std_core::Encoding;

    fn lower(s: &str) -> String {
        let h = VelaString::new(s);
        to_lower_case(h.as_string().unwrap()).as_string().unwrap().to_rust_string()
    }

    #[test]
    fn test_wide_lowercase() {
        assert_eq!(lower("\u{391}\u{392}\u{393}"), "\u{3b1}\u{3b2}\u{3b3}");
        assert_eq!(lower("\u{41f}\u{420}\u{418}\u{412}\u{415}\u{422}"), "\u{43f}\u{440}\u{438}\u{432}\u{435}\u{442}");
    }

    #[test]
    fn test_final_sigma() {
        assert_eq!(lower("\u{39f}\u{394}\u{3a3}"), "\u{3bf}\u{3b4}\u{3c2}");
    }

    #[test]
    fn test_dotted_capital_i_expands() {
        assert_eq!(lower("\u{130}"), "i\u{307}");
    }

    #[test]
    fn test_unchanged_returns_same_object() {
        let h = VelaString::new("\u{3b1}\u{3b2}");
        let result = to_lower_case(h.as_string().unwrap());
        assert!(result.ptr_eq(&h));
    }

    #[test]
    fn test_lone_surrogate_is_kept() {
        assert_eq!(lower_units(&[0x41, 0xD800, 0x42]), vec![0x61, 0xD800, 0x62]);
    }

    #[test]
    fn test_result_narrows_when_possible() {
        let wide = VelaString::two_byte(&[0x41, 0x42]);
        let result = to_lower_case(wide.as_string().unwrap());
        let s = result.as_string().unwrap();
        assert_eq!(s.encoding(), Encoding::OneByte);
        assert_eq!(s.to_rust_string(), "ab");
    }

    #[test]
    fn test_cons_input() {
        let a = VelaString::new("AB");
        let b = VelaString::new("\u{3a9}");
        let c = VelaString::cons(a.as_string().unwrap(), b.as_string().unwrap());
        let result = to_lower_case(c.as_string().unwrap());
        assert_eq!(result.as_string().unwrap().to_rust_string(), "ab\u{3c9}");
    }
}

use tracing::trace;
use vela_std_core::{display_value, Handle, Value, VelaError};

/// Full Unicode lowercase of a string of any shape or encoding
pub fn string_to_lower_case_intl(value: Value) -> Result<Handle, VelaError> {
    let s = value.as_string().ok_or_else(|| VelaError::NotAString {
        value: display_value(value),
    })?;
    trace!(len = s.len(), repr = ?s.repr(), encoding = ?s.encoding(), "runtime lowercase");
    if s.is_empty() {
        return Ok(s.retain());
    }
    Ok(vela_std_strings::to_lower_case(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_std_core::VelaString;

    fn lower(s: &Handle) -> String {
        let out = string_to_lower_case_intl(s.value()).unwrap();
        out.as_string().unwrap().to_rust_string()
    }

    #[test]
    fn test_lowercases_every_shape() {
        let left = VelaString::new("HeLLo ");
        let right = VelaString::two_byte(&"WÖRLD Σ".encode_utf16().collect::<Vec<_>>());
        let cons = VelaString::cons(left.as_string().unwrap(), right.as_string().unwrap());
        assert_eq!(lower(&cons), "hello wörld σ");

        let sliced = VelaString::sliced(cons.as_string().unwrap(), 0, 5).unwrap();
        assert_eq!(lower(&sliced), "hello");

        let thin = VelaString::thin(left.as_string().unwrap());
        assert_eq!(lower(&thin), "hello ");
    }

    #[test]
    fn test_empty_returns_same_object() {
        let empty = VelaString::empty();
        let out = string_to_lower_case_intl(empty.value()).unwrap();
        assert!(out.ptr_eq(&empty));
    }

    #[test]
    fn test_unchanged_indirect_strings_return_same_object() {
        let parent = VelaString::new("hello world");
        let sliced = VelaString::sliced(parent.as_string().unwrap(), 6, 5).unwrap();
        let out = string_to_lower_case_intl(sliced.value()).unwrap();
        assert!(out.ptr_eq(&sliced));

        let cons = VelaString::cons(parent.as_string().unwrap(), sliced.as_string().unwrap());
        assert!(string_to_lower_case_intl(cons.value()).unwrap().ptr_eq(&cons));
    }

    #[test]
    fn test_rejects_non_string() {
        let err = string_to_lower_case_intl(Value::smi(3)).unwrap_err();
        assert!(err.is_type_error());
    }
}

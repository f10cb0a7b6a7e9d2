//!
//! Coercion Helpers
//!
//! Native helpers generated builtins call for receiver coercion, capability
//! failures and list materialization. Each returns an owned value or
//! `Value::EXCEPTION` with the error pending in the context.
//!

use tracing::trace;
use vela_std_core::{display_value, iterator_source, Handle, HeapTag, Value, VelaArray, VelaError, VelaString};

use crate::context::Context;
use crate::runtime::MethodName;

fn method_name(method: u32) -> &'static str {
    MethodName::from_raw(method).map(MethodName::as_str).unwrap_or("<unknown method>")
}

/// # Safety
/// `ctx` must be a live context; `receiver` must be a valid value.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_throw_incompatible_receiver(ctx: *mut Context, method: u32, receiver: u64) -> u64 {
    let ctx = unsafe { &mut *ctx };
    ctx.throw(VelaError::IncompatibleReceiver {
        method: method_name(method),
        receiver: display_value(Value(receiver)),
    })
}

/// Coerce a receiver to a string
///
/// # Safety
/// `ctx` must be a live context; `value` must be a valid value.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_to_this_string(ctx: *mut Context, value: u64, method: u32) -> u64 {
    let ctx = unsafe { &mut *ctx };
    let result = to_this_string(Value(value), method_name(method));
    ctx.complete(result)
}

pub fn to_this_string(value: Value, method: &'static str) -> Result<Handle, VelaError> {
    if let Some(s) = value.as_string() {
        return Ok(s.retain());
    }
    if value.is_null_or_undefined() {
        return Err(VelaError::CalledOnNullOrUndefined { method });
    }
    Ok(VelaString::new(&display_value(value)))
}

/// Materialize an iterable into a fresh array
///
/// # Safety
/// `ctx` must be a live context; `value` must be a valid value.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_iterable_to_list(ctx: *mut Context, value: u64) -> u64 {
    let ctx = unsafe { &mut *ctx };
    ctx.stats_mut().iterable_to_list_calls += 1;
    let result = iterable_to_list(Value(value));
    ctx.complete(result)
}

pub fn iterable_to_list(value: Value) -> Result<Handle, VelaError> {
    match value.heap_tag() {
        Some(HeapTag::Array) => {
            let items = value.as_array().map(|a| a.values()).unwrap_or_default();
            trace!(len = items.len(), "iterable is an array");
            Ok(VelaArray::from_values(
                items.iter().map(|&v| unsafe { Handle::retain(v) }).collect::<Vec<_>>(),
            ))
        }
        Some(HeapTag::String) => {
            let text = value.as_string().map(|s| s.to_units()).unwrap_or_default();
            Ok(VelaArray::from_values(code_points(&text).map(VelaString::from_units).collect::<Vec<_>>()))
        }
        Some(HeapTag::Iterator) => {
            let Some(source) = iterator_source(&value) else {
                return Err(VelaError::Internal("iterator object without a source".to_string()));
            };
            let mut items = Vec::new();
            while let Some(item) = source.next()? {
                items.push(item);
            }
            trace!(len = items.len(), "drained iterator");
            Ok(VelaArray::from_values(items))
        }
        _ => Err(VelaError::NotIterable {
            value: display_value(value),
        }),
    }
}

/// Split UTF-16 units at code point boundaries, keeping lone surrogates alone
fn code_points(units: &[u16]) -> impl Iterator<Item = &[u16]> {
    let mut rest = units;
    std::iter::from_fn(move || {
        let first = *rest.first()?;
        let width = match rest.get(1) {
            Some(&second) if (0xD800..0xDC00).contains(&first) && (0xDC00..0xE000).contains(&second) => 2,
            _ => 1,
        };
        let (head, tail) = rest.split_at(width);
        rest = tail;
        Some(head)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_std_core::IteratorSource;

    fn strings(list: &Handle) -> Vec<String> {
        list.as_array()
            .unwrap()
            .values()
            .iter()
            .map(|v| v.as_string().unwrap().to_rust_string())
            .collect()
    }

    #[test]
    fn test_array_is_copied() {
        let a = VelaString::new("a");
        let source = VelaArray::from_values([a.clone()]);
        let list = iterable_to_list(source.value()).unwrap();
        assert!(!list.ptr_eq(&source));
        assert_eq!(strings(&list), ["a"]);
        assert_eq!(a.refcount(), Some(3));
    }

    #[test]
    fn test_string_splits_by_code_point() {
        let s = VelaString::new("a😀b");
        let list = iterable_to_list(s.value()).unwrap();
        assert_eq!(strings(&list), ["a", "😀", "b"]);
    }

    #[test]
    fn test_iterator_is_drained() {
        let mut remaining = vec!["second", "first"];
        let iter = IteratorSource::new(move || Ok(remaining.pop().map(VelaString::new)));
        let list = iterable_to_list(iter.value()).unwrap();
        assert_eq!(strings(&list), ["first", "second"]);
    }

    #[test]
    fn test_iterator_error_propagates() {
        let iter = IteratorSource::new(|| Err(VelaError::Thrown("boom".to_string())));
        assert_eq!(iterable_to_list(iter.value()).unwrap_err(), VelaError::Thrown("boom".to_string()));
    }

    #[test]
    fn test_non_iterable() {
        let err = iterable_to_list(Value::smi(7)).unwrap_err();
        assert_eq!(err.to_string(), "TypeError: 7 is not iterable");
    }

    #[test]
    fn test_this_string_coercion() {
        let s = VelaString::new("x");
        assert!(to_this_string(s.value(), "m").unwrap().ptr_eq(&s));
        assert_eq!(to_this_string(Value::TRUE, "m").unwrap().as_string().unwrap().to_rust_string(), "true");
        assert_eq!(
            to_this_string(Value::NULL, "String.prototype.toLowerCase").unwrap_err(),
            VelaError::CalledOnNullOrUndefined { method: "String.prototype.toLowerCase" }
        );
    }
}

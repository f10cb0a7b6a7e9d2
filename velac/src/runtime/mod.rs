//!
//! Runtime Fallback Table
//!
//! Numbered runtime functions the generated builtins call when they leave the
//! fast path. Every entry is also callable directly, which makes the table the
//! reference implementation the generated code is checked against.
//!
//! Arguments are borrowed; the returned value is owned by the caller.
//!

pub mod coerce;
pub mod list_format;
pub mod strings;

use tracing::debug;
use vela_std_core::{Value, VelaError};

use crate::context::Context;

pub use coerce::{vela_iterable_to_list, vela_throw_incompatible_receiver, vela_to_this_string};

/// Stable runtime function numbers shared with generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RuntimeFunctionId {
    StringToLowerCaseIntl = 0,
    FormatList = 1,
    FormatListToParts = 2,
}

impl RuntimeFunctionId {
    pub fn from_raw(id: u32) -> Option<Self> {
        match id {
            0 => Some(RuntimeFunctionId::StringToLowerCaseIntl),
            1 => Some(RuntimeFunctionId::FormatList),
            2 => Some(RuntimeFunctionId::FormatListToParts),
            _ => None,
        }
    }

    pub fn arity(self) -> usize {
        match self {
            RuntimeFunctionId::StringToLowerCaseIntl => 1,
            RuntimeFunctionId::FormatList | RuntimeFunctionId::FormatListToParts => 2,
        }
    }
}

/// Method names generated code passes by number when it throws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MethodName {
    StringPrototypeToLowerCase = 0,
    ListFormatPrototypeFormat = 1,
    ListFormatPrototypeFormatToParts = 2,
}

impl MethodName {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(MethodName::StringPrototypeToLowerCase),
            1 => Some(MethodName::ListFormatPrototypeFormat),
            2 => Some(MethodName::ListFormatPrototypeFormatToParts),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MethodName::StringPrototypeToLowerCase => "String.prototype.toLowerCase",
            MethodName::ListFormatPrototypeFormat => "Intl.ListFormat.prototype.format",
            MethodName::ListFormatPrototypeFormatToParts => "Intl.ListFormat.prototype.formatToParts",
        }
    }
}

/// Entry point for generated code
///
/// # Safety
/// `ctx` must be a live context and `argv` must point to `argc` values.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_call_runtime(ctx: *mut Context, id: u32, argc: i64, argv: *const u64) -> u64 {
    unsafe {
        let ctx = &mut *ctx;
        let args: &[Value] = if argv.is_null() || argc <= 0 {
            &[]
        } else {
            std::slice::from_raw_parts(argv as *const Value, argc as usize)
        };
        call(ctx, id, args)
    }
}

/// Run runtime function `id`, leaving any error pending in `ctx`
pub fn call(ctx: &mut Context, id: u32, args: &[Value]) -> u64 {
    let Some(function) = RuntimeFunctionId::from_raw(id) else {
        return ctx.throw(VelaError::Internal(format!("unknown runtime function {}", id)));
    };
    debug!(?function, argc = args.len(), "runtime call");

    if args.len() < function.arity() {
        return ctx.throw(VelaError::Internal(format!(
            "{:?} expects {} arguments, got {}",
            function,
            function.arity(),
            args.len()
        )));
    }

    let result = match function {
        RuntimeFunctionId::StringToLowerCaseIntl => {
            ctx.stats_mut().lower_case_runtime_calls += 1;
            strings::string_to_lower_case_intl(args[0])
        }
        RuntimeFunctionId::FormatList => {
            ctx.stats_mut().format_list_calls += 1;
            list_format::format_list(ctx, args[0], args[1])
        }
        RuntimeFunctionId::FormatListToParts => {
            ctx.stats_mut().format_list_to_parts_calls += 1;
            list_format::format_list_to_parts(ctx, args[0], args[1])
        }
    };
    ctx.complete(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_std_intl::BuiltinLocaleData;

    fn context() -> Context {
        Context::new(Box::new(BuiltinLocaleData), "en")
    }

    #[test]
    fn test_ids_are_stable() {
        assert_eq!(RuntimeFunctionId::StringToLowerCaseIntl as u32, 0);
        assert_eq!(RuntimeFunctionId::FormatList as u32, 1);
        assert_eq!(RuntimeFunctionId::FormatListToParts as u32, 2);
        for raw in 0..3 {
            assert_eq!(RuntimeFunctionId::from_raw(raw).map(|f| f as u32), Some(raw));
        }
        assert_eq!(RuntimeFunctionId::from_raw(3), None);
    }

    #[test]
    fn test_unknown_id_is_internal_error() {
        let mut ctx = context();
        assert_eq!(call(&mut ctx, 42, &[]), Value::EXCEPTION.0);
        assert!(matches!(ctx.take_pending(), Some(VelaError::Internal(_))));
    }

    #[test]
    fn test_missing_arguments_is_internal_error() {
        let mut ctx = context();
        assert_eq!(call(&mut ctx, RuntimeFunctionId::FormatList as u32, &[Value::UNDEFINED]), Value::EXCEPTION.0);
        assert!(matches!(ctx.take_pending(), Some(VelaError::Internal(_))));
        assert_eq!(ctx.stats().format_list_calls, 0);
    }
}

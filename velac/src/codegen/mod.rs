///
/// Code Generation Module
///
/// Builtins are generated as Cranelift IR and compiled into a JIT module at
/// engine start-up:
///
/// 1. Register the native helpers and data symbols the builtins import
/// 2. Declare every builtin so builtins can call each other
/// 3. Emit and define each builtin
/// 4. Finalize the module and hand out entry points
///

pub mod cranelift;

use thiserror::Error;

use crate::context::Context;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("JIT compilation failed: {0}")]
    JitCompile(String),

    #[error("Execution failed: {0}")]
    Execution(String),
}

/// Calling convention of a generated builtin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinAbi {
    /// `(ctx, string) -> value`, called from other builtins
    Direct,
    /// `(ctx, receiver, argc, argv) -> value`, a script-visible method
    Method,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    StringToLowerCaseIntl,
    StringPrototypeToLowerCaseIntl,
    ListFormatPrototypeFormat,
    ListFormatPrototypeFormatToParts,
}

impl Builtin {
    pub const ALL: [Builtin; 4] = [
        Builtin::StringToLowerCaseIntl,
        Builtin::StringPrototypeToLowerCaseIntl,
        Builtin::ListFormatPrototypeFormat,
        Builtin::ListFormatPrototypeFormatToParts,
    ];

    pub fn symbol_name(self) -> &'static str {
        match self {
            Builtin::StringToLowerCaseIntl => "vela_builtin_string_to_lower_case_intl",
            Builtin::StringPrototypeToLowerCaseIntl => "vela_builtin_string_prototype_to_lower_case_intl",
            Builtin::ListFormatPrototypeFormat => "vela_builtin_list_format_prototype_format",
            Builtin::ListFormatPrototypeFormatToParts => "vela_builtin_list_format_prototype_format_to_parts",
        }
    }

    pub fn abi(self) -> BuiltinAbi {
        match self {
            Builtin::StringToLowerCaseIntl => BuiltinAbi::Direct,
            _ => BuiltinAbi::Method,
        }
    }
}

pub type DirectBuiltinFn = unsafe extern "C" fn(*mut Context, u64) -> u64;
pub type MethodBuiltinFn = unsafe extern "C" fn(*mut Context, u64, i64, *const u64) -> u64;

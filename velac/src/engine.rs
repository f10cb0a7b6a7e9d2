//!
//! Engine
//!
//! Owns the compiled builtins, the context they run against and the string
//! table. `call` runs generated code; `call_runtime` runs the fallback table
//! directly, so the two paths can be compared value for value.
//!

use vela_std_core::{
    display_value, Handle, ListKind, ListStyle, StringTable, Value, VelaError, VelaString,
    LIST_PART_TYPE_FIELD, LIST_PART_VALUE_FIELD,
};
use vela_std_intl::{new_list_format, BuiltinLocaleData, ListPart, LocaleData, PartKind};
use vela_std_regexp::{new_pattern_object, PatternError};

use crate::codegen::cranelift::{BuiltinCompiler, CompiledBuiltins};
use crate::codegen::{Builtin, BuiltinAbi};
use crate::config::VelaConfig;
use crate::context::{Context, RuntimeStats};
use crate::error::EngineError;
use crate::runtime::{self, RuntimeFunctionId};

pub struct Engine {
    // Boxed so generated code can hold a stable pointer to it
    context: Box<Context>,
    builtins: CompiledBuiltins,
    strings: StringTable,
    config: VelaConfig,
}

impl Engine {
    pub fn new(config: VelaConfig) -> Result<Self, EngineError> {
        Self::with_locale_data(config, Box::new(BuiltinLocaleData))
    }

    pub fn with_locale_data(config: VelaConfig, locale_data: Box<dyn LocaleData>) -> Result<Self, EngineError> {
        let builtins = BuiltinCompiler::new(&config.jit)?.compile_all()?;
        let context = Box::new(Context::new(locale_data, config.intl.default_locale.clone()));
        Ok(Self {
            context,
            builtins,
            strings: StringTable::new(),
            config,
        })
    }

    /// Run a generated builtin; arguments stay owned by the caller
    pub fn call(&mut self, builtin: Builtin, receiver: Value, args: &[Value]) -> Result<Handle, VelaError> {
        let ctx: *mut Context = &mut *self.context;
        let raw = match builtin.abi() {
            BuiltinAbi::Direct => {
                if receiver.as_string().is_none() {
                    return Err(VelaError::NotAString {
                        value: display_value(receiver),
                    });
                }
                let entry = self.builtins.direct(builtin).map_err(|e| VelaError::Internal(e.to_string()))?;
                unsafe { entry(ctx, receiver.0) }
            }
            BuiltinAbi::Method => {
                let entry = self.builtins.method(builtin).map_err(|e| VelaError::Internal(e.to_string()))?;
                unsafe { entry(ctx, receiver.0, args.len() as i64, args.as_ptr() as *const u64) }
            }
        };
        self.finish_call(raw)
    }

    /// Run a runtime fallback function directly
    pub fn call_runtime(&mut self, function: RuntimeFunctionId, args: &[Value]) -> Result<Handle, VelaError> {
        let raw = runtime::call(&mut self.context, function as u32, args);
        self.finish_call(raw)
    }

    fn finish_call(&mut self, raw: u64) -> Result<Handle, VelaError> {
        if raw == Value::EXCEPTION.0 {
            return Err(self
                .context
                .take_pending()
                .unwrap_or_else(|| VelaError::Internal("builtin threw without a pending error".to_string())));
        }
        Ok(unsafe { Handle::from_owned(Value(raw)) })
    }

    /// `StringToLowerCaseIntl` on a string
    pub fn string_to_lower_case(&mut self, string: &Handle) -> Result<Handle, VelaError> {
        self.call(Builtin::StringToLowerCaseIntl, string.value(), &[])
    }

    /// `String.prototype.toLowerCase` on any receiver
    pub fn to_lower_case(&mut self, receiver: Value) -> Result<Handle, VelaError> {
        self.call(Builtin::StringPrototypeToLowerCaseIntl, receiver, &[])
    }

    /// Construct an `Intl.ListFormat` instance
    pub fn list_format(&self, locale: Option<&str>, kind: ListKind, style: ListStyle) -> Result<Handle, VelaError> {
        let data = new_list_format(
            locale,
            kind,
            style,
            self.context.locale_data(),
            self.context.default_locale(),
        )?;
        Ok(data.into_object())
    }

    pub fn format(&mut self, list_format: Value, args: &[Value]) -> Result<Handle, VelaError> {
        self.call(Builtin::ListFormatPrototypeFormat, list_format, args)
    }

    pub fn format_to_parts(&mut self, list_format: Value, args: &[Value]) -> Result<Handle, VelaError> {
        self.call(Builtin::ListFormatPrototypeFormatToParts, list_format, args)
    }

    pub fn compile_pattern(&self, source: &str, flags: &str) -> Result<Handle, PatternError> {
        new_pattern_object(source, flags, self.config.regexp.tier_up_ticks)
    }

    pub fn internalize(&mut self, string: &VelaString) -> Handle {
        self.strings.internalize(string)
    }

    pub fn stats(&self) -> RuntimeStats {
        self.context.stats()
    }

    pub fn config(&self) -> &VelaConfig {
        &self.config
    }
}

pub fn read_string(value: &Handle) -> Option<String> {
    value.as_string().map(|s| s.to_rust_string())
}

/// Decode the array of `{ type, value }` records `formatToParts` returns
pub fn read_parts(value: &Handle) -> Option<Vec<ListPart>> {
    value
        .as_array()?
        .values()
        .iter()
        .map(|part| {
            let record = part.as_struct()?;
            let kind = record.field(LIST_PART_TYPE_FIELD)?;
            let text = record.field(LIST_PART_VALUE_FIELD)?;
            let kind = match kind.as_string()?.to_rust_string().as_str() {
                "element" => PartKind::Element,
                "literal" => PartKind::Literal,
                _ => return None,
            };
            Some(ListPart {
                kind,
                value: text.as_string()?.to_rust_string(),
            })
        })
        .collect()
}

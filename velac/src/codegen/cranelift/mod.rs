//!
//! Cranelift JIT Compiler
//!
//! Emits the builtin fast paths as Cranelift IR and compiles them into a JIT
//! module. Builtins import native helpers from the runtime crates by symbol
//! and reach the runtime fallback table through `vela_call_runtime`.
//!

mod direct;
mod errors;
mod guards;
mod list_format;
mod loops;
mod runtime;
mod strings;
mod types;

use std::collections::HashMap;
use std::panic;

use cranelift::prelude::*;
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{DataId, FuncId, Linkage, Module};
use tracing::debug;

use crate::codegen::{Builtin, CodegenError, DirectBuiltinFn, MethodBuiltinFn};
use crate::config::JitConfig;
use errors::convert_cranelift_error;

pub use list_format::ListFormatMode;
pub use strings::MAX_SHORT_STRING_LENGTH;

/// What an emitter sees of the module it is generating code for
pub struct CompileContext<'a> {
    pub module: &'a mut JITModule,
    pub runtime_funcs: &'a HashMap<String, FuncId>,
    pub data_ids: &'a HashMap<String, DataId>,
    pub builtin_ids: &'a HashMap<Builtin, FuncId>,
}

impl CompileContext<'_> {
    pub fn ptr_type(&self) -> Type {
        self.module.target_config().pointer_type()
    }
}

pub struct BuiltinCompiler {
    module: JITModule,
    ctx: codegen::Context,
    runtime_funcs: HashMap<String, FuncId>,
    data_ids: HashMap<String, DataId>,
    builtin_ids: HashMap<Builtin, FuncId>,
}

impl BuiltinCompiler {
    pub fn new(config: &JitConfig) -> Result<Self, CodegenError> {
        let set_flag = |flags: &mut settings::Builder, name: &str, value: &str| {
            flags
                .set(name, value)
                .map_err(|e| CodegenError::JitCompile(format!("Failed to set {}={}: {}", name, value, e)))
        };

        let mut flag_builder = settings::builder();
        set_flag(&mut flag_builder, "use_colocated_libcalls", "false")?;
        set_flag(&mut flag_builder, "is_pic", "false")?;
        set_flag(&mut flag_builder, "opt_level", config.opt_level.as_setting())?;
        set_flag(&mut flag_builder, "enable_verifier", if config.verify { "true" } else { "false" })?;

        let isa_builder = cranelift_native::builder()
            .map_err(|e| CodegenError::JitCompile(format!("Failed to create ISA builder: {}", e)))?;

        let isa = isa_builder
            .finish(settings::Flags::new(flag_builder))
            .map_err(|e| CodegenError::JitCompile(format!("Failed to create ISA: {}", e)))?;

        let mut builder = JITBuilder::with_isa(isa, cranelift_module::default_libcall_names());
        runtime::register_symbols(&mut builder);

        let module = JITModule::new(builder);
        let ctx = module.make_context();

        let mut compiler = Self {
            module,
            ctx,
            runtime_funcs: HashMap::new(),
            data_ids: HashMap::new(),
            builtin_ids: HashMap::new(),
        };
        runtime::declare_runtime_functions(&mut compiler.module, &mut compiler.runtime_funcs)?;
        runtime::declare_data_symbols(&mut compiler.module, &mut compiler.data_ids)?;
        compiler.declare_builtins()?;
        Ok(compiler)
    }

    fn declare_builtins(&mut self) -> Result<(), CodegenError> {
        for builtin in Builtin::ALL {
            let sig = types::builtin_signature(&self.module, builtin.abi());
            let func_id = self
                .module
                .declare_function(builtin.symbol_name(), Linkage::Local, &sig)
                .map_err(|e| CodegenError::JitCompile(format!("Failed to declare {}: {}", builtin.symbol_name(), e)))?;
            self.builtin_ids.insert(builtin, func_id);
        }
        Ok(())
    }

    /// Emit and define every builtin, then finalize the module
    pub fn compile_all(mut self) -> Result<CompiledBuiltins, CodegenError> {
        for builtin in Builtin::ALL {
            self.define_builtin(builtin)?;
        }
        self.finish()
    }

    fn define_builtin(&mut self, builtin: Builtin) -> Result<(), CodegenError> {
        let name = builtin.symbol_name();
        let func_id = *self
            .builtin_ids
            .get(&builtin)
            .ok_or_else(|| CodegenError::JitCompile(format!("Undeclared builtin: {}", name)))?;

        self.ctx.func.signature = types::builtin_signature(&self.module, builtin.abi());

        let mut builder_ctx = FunctionBuilderContext::new();
        let emitted = {
            let mut builder = FunctionBuilder::new(&mut self.ctx.func, &mut builder_ctx);
            let mut ctx = CompileContext {
                module: &mut self.module,
                runtime_funcs: &self.runtime_funcs,
                data_ids: &self.data_ids,
                builtin_ids: &self.builtin_ids,
            };

            let entry_block = builder.create_block();
            builder.append_block_params_for_function_params(entry_block);
            builder.switch_to_block(entry_block);

            let result = emit_builtin(&mut ctx, &mut builder, builtin, entry_block);
            if result.is_ok() {
                builder.seal_all_blocks();
                builder.finalize();
            }
            result
        };
        if let Err(e) = emitted {
            self.module.clear_context(&mut self.ctx);
            return Err(e);
        }

        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            self.module.define_function(func_id, &mut self.ctx)
        }));

        let outcome = match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(CodegenError::JitCompile(format!("Failed to define {}: {}", name, e))),
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown internal error".to_string()
                };
                Err(convert_cranelift_error(&panic_msg, name))
            }
        };

        self.module.clear_context(&mut self.ctx);
        if outcome.is_ok() {
            debug!(builtin = name, "compiled builtin");
        }
        outcome
    }

    fn finish(mut self) -> Result<CompiledBuiltins, CodegenError> {
        self.module
            .finalize_definitions()
            .map_err(|e| CodegenError::JitCompile(format!("Failed to finalize: {}", e)))?;

        let entries = self
            .builtin_ids
            .iter()
            .map(|(&builtin, &func_id)| (builtin, self.module.get_finalized_function(func_id)))
            .collect();

        Ok(CompiledBuiltins {
            module: Some(self.module),
            entries,
        })
    }
}

fn emit_builtin(
    ctx: &mut CompileContext<'_>,
    builder: &mut FunctionBuilder<'_>,
    builtin: Builtin,
    entry_block: Block,
) -> Result<(), CodegenError> {
    let params = builder.block_params(entry_block).to_vec();
    match builtin {
        Builtin::StringToLowerCaseIntl => strings::emit_string_to_lower_case_intl(ctx, builder, params[0], params[1]),
        Builtin::StringPrototypeToLowerCaseIntl => {
            strings::emit_string_prototype_to_lower_case_intl(ctx, builder, params[0], params[1])
        }
        Builtin::ListFormatPrototypeFormat => list_format::emit_list_format_common(
            ctx,
            builder,
            &params,
            ListFormatMode::String,
        ),
        Builtin::ListFormatPrototypeFormatToParts => list_format::emit_list_format_common(
            ctx,
            builder,
            &params,
            ListFormatMode::Parts,
        ),
    }
}

/// Finalized machine code for every builtin
pub struct CompiledBuiltins {
    module: Option<JITModule>,
    entries: HashMap<Builtin, *const u8>,
}

impl CompiledBuiltins {
    pub fn direct(&self, builtin: Builtin) -> Result<DirectBuiltinFn, CodegenError> {
        let ptr = self.entry(builtin, super::BuiltinAbi::Direct)?;
        Ok(unsafe { std::mem::transmute::<*const u8, DirectBuiltinFn>(ptr) })
    }

    pub fn method(&self, builtin: Builtin) -> Result<MethodBuiltinFn, CodegenError> {
        let ptr = self.entry(builtin, super::BuiltinAbi::Method)?;
        Ok(unsafe { std::mem::transmute::<*const u8, MethodBuiltinFn>(ptr) })
    }

    fn entry(&self, builtin: Builtin, abi: super::BuiltinAbi) -> Result<*const u8, CodegenError> {
        if builtin.abi() != abi {
            return Err(CodegenError::Execution(format!(
                "{} uses the {:?} calling convention",
                builtin.symbol_name(),
                builtin.abi()
            )));
        }
        self.entries
            .get(&builtin)
            .copied()
            .ok_or_else(|| CodegenError::Execution(format!("{} was not compiled", builtin.symbol_name())))
    }
}

impl Drop for CompiledBuiltins {
    fn drop(&mut self) {
        if let Some(module) = self.module.take() {
            unsafe { module.free_memory() };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiles_every_builtin() {
        let compiled = BuiltinCompiler::new(&JitConfig::default()).unwrap().compile_all().unwrap();
        assert!(compiled.direct(Builtin::StringToLowerCaseIntl).is_ok());
        assert!(compiled.method(Builtin::ListFormatPrototypeFormat).is_ok());
        assert!(compiled.method(Builtin::StringToLowerCaseIntl).is_err());
    }

    #[test]
    fn test_compiles_without_optimization() {
        let config = JitConfig {
            opt_level: crate::config::OptLevel::None,
            verify: true,
        };
        assert!(BuiltinCompiler::new(&config).unwrap().compile_all().is_ok());
    }
}

use std::collections::HashMap;

use cranelift::prelude::*;
use cranelift_frontend::FunctionBuilder;
use cranelift_codegen::ir::FuncRef;
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{DataId, FuncId, Linkage, Module};
use vela_std_core::Value as VelaValue;

use crate::codegen::cranelift::types::VALUE;
use crate::codegen::cranelift::CompileContext;
use crate::codegen::{Builtin, CodegenError};
use crate::runtime::{MethodName, RuntimeFunctionId};

pub const LOWER_TABLE_SYMBOL: &str = "vela_latin1_to_lower_table";

pub fn register_symbols(builder: &mut JITBuilder) {
    // String runtime functions
    builder.symbol("vela_string_incref", vela_std_core::vela_string_incref as *const u8);
    builder.symbol("vela_string_decref", vela_std_core::vela_string_decref as *const u8);
    builder.symbol("vela_string_alloc_one_byte", vela_std_core::vela_string_alloc_one_byte as *const u8);
    builder.symbol("vela_string_empty", vela_std_core::vela_string_empty as *const u8);
    builder.symbol(
        "vela_convert_one_byte_to_lower",
        vela_std_strings::vela_convert_one_byte_to_lower as *const u8,
    );
    builder.symbol(LOWER_TABLE_SYMBOL, vela_std_strings::LATIN1_TO_LOWER_TABLE.as_ptr());

    // Values and arrays
    builder.symbol("vela_value_decref", vela_std_core::vela_value_decref as *const u8);
    builder.symbol("vela_array_new", vela_std_core::vela_array_new as *const u8);

    // Runtime fallback and coercion
    builder.symbol("vela_call_runtime", crate::runtime::vela_call_runtime as *const u8);
    builder.symbol(
        "vela_throw_incompatible_receiver",
        crate::runtime::vela_throw_incompatible_receiver as *const u8,
    );
    builder.symbol("vela_to_this_string", crate::runtime::vela_to_this_string as *const u8);
    builder.symbol("vela_iterable_to_list", crate::runtime::vela_iterable_to_list as *const u8);
}

pub fn declare_runtime_functions(
    module: &mut JITModule,
    runtime_funcs: &mut HashMap<String, FuncId>,
) -> Result<(), CodegenError> {
    let ptr = module.target_config().pointer_type();
    let i64t = types::I64;
    let i32t = types::I32;

    let declare = |module: &mut JITModule, cache: &mut HashMap<String, FuncId>,
                   name: &str, params: &[Type], returns: &[Type]| -> Result<(), CodegenError> {
        let mut sig = module.make_signature();
        for &p in params { sig.params.push(AbiParam::new(p)); }
        for &r in returns { sig.returns.push(AbiParam::new(r)); }
        let func_id = module
            .declare_function(name, Linkage::Import, &sig)
            .map_err(|e| CodegenError::JitCompile(format!("Failed to declare {}: {}", name, e)))?;
        cache.insert(name.to_string(), func_id);
        Ok(())
    };

    // String functions
    declare(module, runtime_funcs, "vela_string_incref", &[ptr], &[])?;
    declare(module, runtime_funcs, "vela_string_decref", &[ptr], &[])?;
    declare(module, runtime_funcs, "vela_string_alloc_one_byte", &[i64t], &[ptr])?;
    declare(module, runtime_funcs, "vela_string_empty", &[], &[ptr])?;
    declare(module, runtime_funcs, "vela_convert_one_byte_to_lower", &[ptr, ptr], &[ptr])?;

    // Values and arrays
    declare(module, runtime_funcs, "vela_value_decref", &[VALUE], &[])?;
    declare(module, runtime_funcs, "vela_array_new", &[i64t], &[ptr])?;

    // Runtime fallback and coercion
    declare(module, runtime_funcs, "vela_call_runtime", &[ptr, i32t, i64t, ptr], &[VALUE])?;
    declare(module, runtime_funcs, "vela_throw_incompatible_receiver", &[ptr, i32t, VALUE], &[VALUE])?;
    declare(module, runtime_funcs, "vela_to_this_string", &[ptr, VALUE, i32t], &[VALUE])?;
    declare(module, runtime_funcs, "vela_iterable_to_list", &[ptr, VALUE], &[VALUE])?;

    Ok(())
}

pub fn declare_data_symbols(
    module: &mut JITModule,
    data_ids: &mut HashMap<String, DataId>,
) -> Result<(), CodegenError> {
    let table = module
        .declare_data(LOWER_TABLE_SYMBOL, Linkage::Import, false, false)
        .map_err(|e| CodegenError::JitCompile(format!("Failed to declare {}: {}", LOWER_TABLE_SYMBOL, e)))?;
    data_ids.insert(LOWER_TABLE_SYMBOL.to_string(), table);
    Ok(())
}

pub fn rt_func_ref(
    ctx: &mut CompileContext<'_>,
    builder: &mut FunctionBuilder<'_>,
    name: &str,
) -> Result<FuncRef, CodegenError> {
    let func_id = *ctx
        .runtime_funcs
        .get(name)
        .ok_or_else(|| CodegenError::JitCompile(format!("Unknown runtime function: {}", name)))?;
    Ok(ctx.module.declare_func_in_func(func_id, builder.func))
}

pub fn builtin_func_ref(
    ctx: &mut CompileContext<'_>,
    builder: &mut FunctionBuilder<'_>,
    builtin: Builtin,
) -> Result<FuncRef, CodegenError> {
    let func_id = *ctx
        .builtin_ids
        .get(&builtin)
        .ok_or_else(|| CodegenError::JitCompile(format!("Undeclared builtin: {}", builtin.symbol_name())))?;
    Ok(ctx.module.declare_func_in_func(func_id, builder.func))
}

/// Address of an imported data symbol
pub fn data_symbol_addr(
    ctx: &mut CompileContext<'_>,
    builder: &mut FunctionBuilder<'_>,
    name: &str,
) -> Result<Value, CodegenError> {
    let data_id = *ctx
        .data_ids
        .get(name)
        .ok_or_else(|| CodegenError::JitCompile(format!("Unknown data symbol: {}", name)))?;
    let gv = ctx.module.declare_data_in_func(data_id, builder.func);
    let ptr_type = ctx.ptr_type();
    Ok(builder.ins().symbol_value(ptr_type, gv))
}

/// Call a runtime helper and return its single result
pub fn call_rt(
    ctx: &mut CompileContext<'_>,
    builder: &mut FunctionBuilder<'_>,
    name: &str,
    args: &[Value],
) -> Result<Value, CodegenError> {
    let func_ref = rt_func_ref(ctx, builder, name)?;
    let call = builder.ins().call(func_ref, args);
    builder
        .inst_results(call)
        .first()
        .copied()
        .ok_or_else(|| CodegenError::JitCompile(format!("{} returns no value", name)))
}

/// Call a runtime helper for its side effect
pub fn call_rt_void(
    ctx: &mut CompileContext<'_>,
    builder: &mut FunctionBuilder<'_>,
    name: &str,
    args: &[Value],
) -> Result<(), CodegenError> {
    let func_ref = rt_func_ref(ctx, builder, name)?;
    builder.ins().call(func_ref, args);
    Ok(())
}

/// Call a numbered runtime function with `args` spilled to a stack slot
pub fn emit_call_runtime(
    ctx: &mut CompileContext<'_>,
    builder: &mut FunctionBuilder<'_>,
    context: Value,
    id: RuntimeFunctionId,
    args: &[Value],
) -> Result<Value, CodegenError> {
    let ptr_type = ctx.ptr_type();
    let slot = builder.create_sized_stack_slot(StackSlotData::new(
        StackSlotKind::ExplicitSlot,
        (args.len().max(1) * 8) as u32,
        3,
    ));
    for (i, &arg) in args.iter().enumerate() {
        builder.ins().stack_store(arg, slot, (i * 8) as i32);
    }
    let argv = builder.ins().stack_addr(ptr_type, slot, 0);
    let id = builder.ins().iconst(types::I32, id as i64);
    let argc = builder.ins().iconst(types::I64, args.len() as i64);
    call_rt(ctx, builder, "vela_call_runtime", &[context, id, argc, argv])
}

pub fn emit_method_name(builder: &mut FunctionBuilder<'_>, method: MethodName) -> Value {
    builder.ins().iconst(types::I32, method as i64)
}

/// Return `value` from the builtin when it is the exception marker
pub fn emit_return_if_exception(builder: &mut FunctionBuilder<'_>, value: Value) {
    let throw_block = builder.create_block();
    let continue_block = builder.create_block();
    let is_exception = builder.ins().icmp_imm(IntCC::Equal, value, VelaValue::EXCEPTION.0 as i64);
    builder.ins().brif(is_exception, throw_block, &[], continue_block, &[]);

    builder.switch_to_block(throw_block);
    builder.ins().return_(&[value]);

    builder.switch_to_block(continue_block);
}

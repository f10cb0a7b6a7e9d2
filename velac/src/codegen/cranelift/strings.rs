//!
//! String Case Builtins
//!
//! `StringToLowerCaseIntl` lowercases narrow strings without leaving generated
//! code when they are short, hands long narrow strings to a native routine and
//! sends everything else to the runtime fallback.
//!

use cranelift::prelude::*;
use vela_std_core::{SHAPE_TWO_BYTE, STRING_DATA_OFFSET, STRING_LEN_OFFSET};

use crate::codegen::cranelift::direct::emit_to_direct_string;
use crate::codegen::cranelift::loops::build_fast_loop;
use crate::codegen::cranelift::runtime::{
    builtin_func_ref, call_rt, call_rt_void, data_symbol_addr, emit_call_runtime, emit_method_name,
    emit_return_if_exception, LOWER_TABLE_SYMBOL,
};
use crate::codegen::cranelift::CompileContext;
use crate::codegen::{Builtin, CodegenError};
use crate::runtime::{MethodName, RuntimeFunctionId};

/// Longest narrow input lowercased by the inline loop
pub const MAX_SHORT_STRING_LENGTH: i64 = 24;

pub fn emit_string_to_lower_case_intl(
    ctx: &mut CompileContext<'_>,
    builder: &mut FunctionBuilder<'_>,
    context: Value,
    string: Value,
) -> Result<(), CodegenError> {
    let empty_block = builder.create_block();
    let nonempty_block = builder.create_block();
    let runtime_block = builder.create_block();
    let narrow_block = builder.create_block();
    let short_block = builder.create_block();
    let long_block = builder.create_block();
    let changed_block = builder.create_block();
    let unchanged_block = builder.create_block();

    let len = builder.ins().load(types::I64, MemFlags::trusted(), string, STRING_LEN_OFFSET);
    let is_empty = builder.ins().icmp_imm(IntCC::Equal, len, 0);
    builder.ins().brif(is_empty, empty_block, &[], nonempty_block, &[]);

    builder.switch_to_block(empty_block);
    call_rt_void(ctx, builder, "vela_string_incref", &[string])?;
    builder.ins().return_(&[string]);

    builder.switch_to_block(nonempty_block);
    let direct = emit_to_direct_string(builder, string, runtime_block);
    let two_byte = builder.ins().band_imm(direct.shape, SHAPE_TWO_BYTE as i64);
    builder.ins().brif(two_byte, runtime_block, &[], narrow_block, &[]);

    builder.switch_to_block(runtime_block);
    let result = emit_call_runtime(ctx, builder, context, RuntimeFunctionId::StringToLowerCaseIntl, &[string])?;
    builder.ins().return_(&[result]);

    // Capacity is reserved before any unit is read
    builder.switch_to_block(narrow_block);
    let dst = call_rt(ctx, builder, "vela_string_alloc_one_byte", &[len])?;
    let is_short = builder.ins().icmp_imm(IntCC::SignedLessThanOrEqual, len, MAX_SHORT_STRING_LENGTH);
    builder.ins().brif(is_short, short_block, &[], long_block, &[]);

    builder.switch_to_block(long_block);
    let result = call_rt(ctx, builder, "vela_convert_one_byte_to_lower", &[direct.string, dst])?;
    builder.ins().return_(&[result]);

    builder.switch_to_block(short_block);
    let table = data_symbol_addr(ctx, builder, LOWER_TABLE_SYMBOL)?;
    let src_data = builder.ins().iadd_imm(direct.string, STRING_DATA_OFFSET as i64);
    let dst_data = builder.ins().iadd_imm(dst, STRING_DATA_OFFSET as i64);
    let start = builder.ins().iconst(types::I64, 0);
    let not_changed = builder.ins().iconst(types::I8, 0);

    let exit_vars = build_fast_loop(builder, &[(types::I8, not_changed)], start, len, 1, |b, index, vars| {
        let flags = MemFlags::trusted();
        let src_addr = b.ins().iadd(src_data, index);
        let c = b.ins().uload8(types::I64, flags, src_addr, 0);
        let table_addr = b.ins().iadd(table, c);
        let lower = b.ins().uload8(types::I64, flags, table_addr, 0);
        let dst_addr = b.ins().iadd(dst_data, index);
        b.ins().istore8(flags, lower, dst_addr, 0);
        let differs = b.ins().icmp(IntCC::NotEqual, c, lower);
        Ok(vec![b.ins().bor(vars[0], differs)])
    })?;
    builder.ins().brif(exit_vars[0], changed_block, &[], unchanged_block, &[]);

    builder.switch_to_block(changed_block);
    builder.ins().return_(&[dst]);

    builder.switch_to_block(unchanged_block);
    call_rt_void(ctx, builder, "vela_string_decref", &[dst])?;
    call_rt_void(ctx, builder, "vela_string_incref", &[string])?;
    builder.ins().return_(&[string]);

    Ok(())
}

pub fn emit_string_prototype_to_lower_case_intl(
    ctx: &mut CompileContext<'_>,
    builder: &mut FunctionBuilder<'_>,
    context: Value,
    receiver: Value,
) -> Result<(), CodegenError> {
    let method = emit_method_name(builder, MethodName::StringPrototypeToLowerCase);
    let string = call_rt(ctx, builder, "vela_to_this_string", &[context, receiver, method])?;
    emit_return_if_exception(builder, string);

    let lower = builtin_func_ref(ctx, builder, Builtin::StringToLowerCaseIntl)?;
    let call = builder.ins().call(lower, &[context, string]);
    let result = builder.inst_results(call)[0];
    call_rt_void(ctx, builder, "vela_value_decref", &[string])?;
    builder.ins().return_(&[result]);
    Ok(())
}

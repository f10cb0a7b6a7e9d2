use cranelift::prelude::*;
use vela_std_core::{HeapTag, HEADER_TAG_OFFSET, ODDBALL_LIMIT};

use crate::codegen::cranelift::runtime::{call_rt, emit_method_name};
use crate::codegen::cranelift::CompileContext;
use crate::codegen::CodegenError;
use crate::runtime::MethodName;

/// Branch to `matched` if `value` is a heap object tagged `tag`, else to `mismatch`
pub fn emit_branch_if_instance_type(
    builder: &mut FunctionBuilder<'_>,
    value: Value,
    tag: HeapTag,
    matched: Block,
    mismatch: Block,
) {
    let check_oddball_block = builder.create_block();
    let check_tag_block = builder.create_block();

    let smi_bit = builder.ins().band_imm(value, 1);
    builder.ins().brif(smi_bit, mismatch, &[], check_oddball_block, &[]);

    builder.switch_to_block(check_oddball_block);
    let is_oddball = builder.ins().icmp_imm(IntCC::UnsignedLessThan, value, ODDBALL_LIMIT as i64);
    builder.ins().brif(is_oddball, mismatch, &[], check_tag_block, &[]);

    builder.switch_to_block(check_tag_block);
    let found = builder.ins().uload8(types::I32, MemFlags::trusted(), value, HEADER_TAG_OFFSET);
    let is_tag = builder.ins().icmp_imm(IntCC::Equal, found, tag as i64);
    builder.ins().brif(is_tag, matched, &[], mismatch, &[]);
}

/// Throw an incompatible-receiver type error naming `method` unless `value`
/// is tagged `tag`. Leaves the builder on the passing path.
pub fn emit_throw_if_not_instance_type(
    ctx: &mut CompileContext<'_>,
    builder: &mut FunctionBuilder<'_>,
    context: Value,
    value: Value,
    tag: HeapTag,
    method: MethodName,
) -> Result<(), CodegenError> {
    let pass_block = builder.create_block();
    let throw_block = builder.create_block();
    emit_branch_if_instance_type(builder, value, tag, pass_block, throw_block);

    builder.switch_to_block(throw_block);
    let method = emit_method_name(builder, method);
    let exception = call_rt(ctx, builder, "vela_throw_incompatible_receiver", &[context, method, value])?;
    builder.ins().return_(&[exception]);

    builder.switch_to_block(pass_block);
    Ok(())
}

//!
//! Direct String Views
//!
//! A direct string exposes its code units contiguously in its own payload.
//! Sequential strings are direct. A thin string and a cons string whose second
//! half is empty are unwrapped one level; sliced strings are left alone. Any
//! other shape branches to the caller's bailout block.
//!

use cranelift::prelude::*;
use vela_std_core::{
    CONS_FIRST_OFFSET, CONS_SECOND_OFFSET, SHAPE_CONS, SHAPE_REPR_MASK, SHAPE_SEQ, SHAPE_THIN,
    STRING_LEN_OFFSET, STRING_SHAPE_OFFSET, THIN_ACTUAL_OFFSET,
};

use crate::codegen::cranelift::types::VALUE;

pub struct DirectString {
    /// The sequential string holding the units
    pub string: Value,
    /// Its shape word
    pub shape: Value,
}

fn load_shape(builder: &mut FunctionBuilder<'_>, string: Value) -> (Value, Value) {
    let shape = builder.ins().load(types::I32, MemFlags::trusted(), string, STRING_SHAPE_OFFSET);
    let repr = builder.ins().band_imm(shape, SHAPE_REPR_MASK as i64);
    (shape, repr)
}

/// Leaves the builder in the block where the direct view is available
pub fn emit_to_direct_string(builder: &mut FunctionBuilder<'_>, string: Value, bailout: Block) -> DirectString {
    let direct_block = builder.create_block();
    builder.append_block_param(direct_block, VALUE);
    builder.append_block_param(direct_block, types::I32);
    let unwrapped_block = builder.create_block();
    builder.append_block_param(unwrapped_block, VALUE);

    let not_seq_block = builder.create_block();
    let thin_block = builder.create_block();
    let check_cons_block = builder.create_block();
    let cons_block = builder.create_block();
    let flat_cons_block = builder.create_block();

    let (shape, repr) = load_shape(builder, string);
    let is_seq = builder.ins().icmp_imm(IntCC::Equal, repr, SHAPE_SEQ as i64);
    builder.ins().brif(is_seq, direct_block, &[string, shape], not_seq_block, &[]);

    builder.switch_to_block(not_seq_block);
    let is_thin = builder.ins().icmp_imm(IntCC::Equal, repr, SHAPE_THIN as i64);
    builder.ins().brif(is_thin, thin_block, &[], check_cons_block, &[]);

    builder.switch_to_block(thin_block);
    let actual = builder.ins().load(VALUE, MemFlags::trusted(), string, THIN_ACTUAL_OFFSET);
    builder.ins().jump(unwrapped_block, &[actual]);

    // Sliced strings are not unpacked
    builder.switch_to_block(check_cons_block);
    let is_cons = builder.ins().icmp_imm(IntCC::Equal, repr, SHAPE_CONS as i64);
    builder.ins().brif(is_cons, cons_block, &[], bailout, &[]);

    builder.switch_to_block(cons_block);
    let second = builder.ins().load(VALUE, MemFlags::trusted(), string, CONS_SECOND_OFFSET);
    let second_len = builder.ins().load(types::I64, MemFlags::trusted(), second, STRING_LEN_OFFSET);
    let is_flat = builder.ins().icmp_imm(IntCC::Equal, second_len, 0);
    builder.ins().brif(is_flat, flat_cons_block, &[], bailout, &[]);

    builder.switch_to_block(flat_cons_block);
    let first = builder.ins().load(VALUE, MemFlags::trusted(), string, CONS_FIRST_OFFSET);
    builder.ins().jump(unwrapped_block, &[first]);

    // One redirection only: the target must already be sequential
    builder.switch_to_block(unwrapped_block);
    let target = builder.block_params(unwrapped_block)[0];
    let (target_shape, target_repr) = load_shape(builder, target);
    let target_is_seq = builder.ins().icmp_imm(IntCC::Equal, target_repr, SHAPE_SEQ as i64);
    builder.ins().brif(target_is_seq, direct_block, &[target, target_shape], bailout, &[]);

    builder.switch_to_block(direct_block);
    let params = builder.block_params(direct_block);
    DirectString {
        string: params[0],
        shape: params[1],
    }
}

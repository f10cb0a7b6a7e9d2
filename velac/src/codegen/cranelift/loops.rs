use cranelift::prelude::*;
use cranelift_frontend::FunctionBuilder;

use crate::codegen::CodegenError;

/// Emit a counted loop over `start..end` advancing by `increment`.
///
/// `vars` are loop-carried values with their types and initial values. `body`
/// gets the current index and the carried values and returns their values for
/// the next iteration. Returns the carried values on exit, with the builder
/// positioned in the exit block.
pub fn build_fast_loop<F>(
    builder: &mut FunctionBuilder<'_>,
    vars: &[(Type, Value)],
    start: Value,
    end: Value,
    increment: i64,
    mut body: F,
) -> Result<Vec<Value>, CodegenError>
where
    F: FnMut(&mut FunctionBuilder<'_>, Value, &[Value]) -> Result<Vec<Value>, CodegenError>,
{
    let header_block = builder.create_block();
    let body_block = builder.create_block();
    let exit_block = builder.create_block();

    let index_type = builder.func.dfg.value_type(start);
    builder.append_block_param(header_block, index_type);
    for &(ty, _) in vars {
        builder.append_block_param(header_block, ty);
        builder.append_block_param(exit_block, ty);
    }

    let mut initial = Vec::with_capacity(vars.len() + 1);
    initial.push(start);
    initial.extend(vars.iter().map(|&(_, v)| v));
    builder.ins().jump(header_block, &initial);

    builder.switch_to_block(header_block);
    let params = builder.block_params(header_block).to_vec();
    let index = params[0];
    let carried = &params[1..];
    let done = builder.ins().icmp(IntCC::UnsignedGreaterThanOrEqual, index, end);
    builder.ins().brif(done, exit_block, carried, body_block, &[]);

    builder.switch_to_block(body_block);
    let next = body(builder, index, carried)?;
    if next.len() != vars.len() {
        return Err(CodegenError::JitCompile(format!(
            "Loop body produced {} values for {} loop variables",
            next.len(),
            vars.len()
        )));
    }
    let next_index = builder.ins().iadd_imm(index, increment);
    let mut back_edge = Vec::with_capacity(next.len() + 1);
    back_edge.push(next_index);
    back_edge.extend(next);
    builder.ins().jump(header_block, &back_edge);

    builder.switch_to_block(exit_block);
    Ok(builder.block_params(exit_block).to_vec())
}

//!
//! ListFormat Builtins
//!
//! `format` and `formatToParts` share one generated body: check the receiver,
//! short-circuit a missing list, materialize the iterable and hand both to the
//! numbered runtime formatter.
//!

use cranelift::prelude::*;
use vela_std_core::{HeapTag, Value as VelaValue};

use crate::codegen::cranelift::guards::emit_throw_if_not_instance_type;
use crate::codegen::cranelift::runtime::{call_rt, call_rt_void, emit_call_runtime, emit_return_if_exception};
use crate::codegen::cranelift::types::VALUE;
use crate::codegen::cranelift::CompileContext;
use crate::codegen::CodegenError;
use crate::runtime::{MethodName, RuntimeFunctionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormatMode {
    String,
    Parts,
}

impl ListFormatMode {
    pub fn runtime_function(self) -> RuntimeFunctionId {
        match self {
            ListFormatMode::String => RuntimeFunctionId::FormatList,
            ListFormatMode::Parts => RuntimeFunctionId::FormatListToParts,
        }
    }

    pub fn method(self) -> MethodName {
        match self {
            ListFormatMode::String => MethodName::ListFormatPrototypeFormat,
            ListFormatMode::Parts => MethodName::ListFormatPrototypeFormatToParts,
        }
    }
}

pub fn emit_list_format_common(
    ctx: &mut CompileContext<'_>,
    builder: &mut FunctionBuilder<'_>,
    params: &[Value],
    mode: ListFormatMode,
) -> Result<(), CodegenError> {
    let [context, receiver, argc, argv] = params else {
        return Err(CodegenError::JitCompile(format!(
            "ListFormat builtin expects 4 parameters, got {}",
            params.len()
        )));
    };
    let (context, receiver, argc, argv) = (*context, *receiver, *argc, *argv);

    emit_throw_if_not_instance_type(ctx, builder, context, receiver, HeapTag::ListFormat, mode.method())?;

    let load_block = builder.create_block();
    let empty_block = builder.create_block();
    let list_block = builder.create_block();

    let has_arg = builder.ins().icmp_imm(IntCC::SignedGreaterThan, argc, 0);
    builder.ins().brif(has_arg, load_block, &[], empty_block, &[]);

    builder.switch_to_block(load_block);
    let list = builder.ins().load(VALUE, MemFlags::trusted(), argv, 0);
    let is_undefined = builder.ins().icmp_imm(IntCC::Equal, list, VelaValue::UNDEFINED.0 as i64);
    builder.ins().brif(is_undefined, empty_block, &[], list_block, &[]);

    builder.switch_to_block(empty_block);
    let empty = match mode {
        ListFormatMode::String => call_rt(ctx, builder, "vela_string_empty", &[])?,
        ListFormatMode::Parts => {
            let capacity = builder.ins().iconst(types::I64, 0);
            call_rt(ctx, builder, "vela_array_new", &[capacity])?
        }
    };
    builder.ins().return_(&[empty]);

    builder.switch_to_block(list_block);
    let items = call_rt(ctx, builder, "vela_iterable_to_list", &[context, list])?;
    emit_return_if_exception(builder, items);
    let result = emit_call_runtime(ctx, builder, context, mode.runtime_function(), &[receiver, items])?;
    call_rt_void(ctx, builder, "vela_value_decref", &[items])?;
    builder.ins().return_(&[result]);

    Ok(())
}

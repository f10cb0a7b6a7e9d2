//!
//! Type Mappings (vela -> Cranelift)
//!
//! - tagged value -> I64
//! - context, argv and string pointers -> pointer type
//! - argc -> I64
//! - runtime function id and method name -> I32
//!

use cranelift::prelude::{types, AbiParam, Type};
use cranelift_codegen::ir::Signature;
use cranelift_jit::JITModule;
use cranelift_module::Module;

use crate::codegen::BuiltinAbi;

pub const VALUE: Type = types::I64;

pub fn builtin_signature(module: &JITModule, abi: BuiltinAbi) -> Signature {
    let ptr = module.target_config().pointer_type();
    let mut sig = module.make_signature();
    sig.params.push(AbiParam::new(ptr));
    match abi {
        BuiltinAbi::Direct => {
            sig.params.push(AbiParam::new(VALUE));
        }
        BuiltinAbi::Method => {
            sig.params.push(AbiParam::new(VALUE));
            sig.params.push(AbiParam::new(types::I64));
            sig.params.push(AbiParam::new(ptr));
        }
    }
    sig.returns.push(AbiParam::new(VALUE));
    sig
}

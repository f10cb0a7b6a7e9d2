use crate::codegen::CodegenError;

pub fn convert_cranelift_error(panic_msg: &str, builtin_name: &str) -> CodegenError {
    if panic_msg.contains("declared type of variable") && panic_msg.contains("doesn't match type of value") {
        CodegenError::JitCompile(format!(
            "Type mismatch in builtin '{}': a variable was assigned a value of another IR type.",
            builtin_name
        ))
    } else if panic_msg.contains("block") && panic_msg.contains("not sealed") {
        CodegenError::JitCompile(format!(
            "Internal error in builtin '{}': a block was left unsealed.",
            builtin_name
        ))
    } else if panic_msg.contains("already filled") || panic_msg.contains("filled block") {
        CodegenError::JitCompile(format!(
            "Internal error in builtin '{}': instructions were added after a terminator.",
            builtin_name
        ))
    } else if panic_msg.contains("signature") {
        CodegenError::JitCompile(format!(
            "Signature mismatch in builtin '{}': a call passed arguments of the wrong types.",
            builtin_name
        ))
    } else {
        CodegenError::JitCompile(format!("Compilation error in builtin '{}': {}", builtin_name, panic_msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_panics_are_rewritten() {
        let err = convert_cranelift_error("block2 not sealed", "lower");
        assert!(err.to_string().contains("unsealed"));
        assert!(err.to_string().contains("'lower'"));
    }

    #[test]
    fn test_unknown_panic_keeps_message() {
        let err = convert_cranelift_error("something odd", "format");
        assert_eq!(
            err.to_string(),
            "JIT compilation failed: Compilation error in builtin 'format': something odd"
        );
    }
}

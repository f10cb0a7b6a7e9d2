use thiserror::Error;

use crate::data::PatternKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern has not been compiled")]
    NotCompiled,

    #[error("data slot {0} is a protected header slot")]
    ProtectedSlot(usize),

    #[error("data slot {index} is out of range for {kind} pattern data")]
    IndexOutOfRange { index: usize, kind: PatternKind },

    #[error("data slot {index} does not hold {expected}")]
    SlotTypeMismatch { index: usize, expected: &'static str },

    #[error("capture name map slot is uninitialized")]
    CaptureNamesUninitialized,

    #[error("operation requires {expected} pattern data, found {found}")]
    WrongKind { expected: PatternKind, found: PatternKind },

    #[error("Invalid regular expression: /{pattern}/: {message}")]
    Syntax { pattern: String, message: String },

    #[error("Invalid regular expression flags: {0}")]
    InvalidFlags(String),
}

//!
//! Builtin Errors
//!
//! Errors a builtin can leave pending in its context. The display form is the
//! message a script would observe, prefixed with the error constructor name.
//!

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VelaError {
    #[error("TypeError: Method {method} called on incompatible receiver {receiver}")]
    IncompatibleReceiver {
        method: &'static str,
        receiver: String,
    },

    #[error("TypeError: {method} called on null or undefined")]
    CalledOnNullOrUndefined { method: &'static str },

    #[error("TypeError: {value} is not iterable")]
    NotIterable { value: String },

    #[error("TypeError: Iterable yielded {value} which is not a string")]
    NotAString { value: String },

    #[error("RangeError: Incorrect locale information provided: {0}")]
    InvalidLocale(String),

    #[error("RangeError: Value {value} out of range for Intl.ListFormat options property {option}")]
    InvalidOption { option: &'static str, value: String },

    /// A value thrown by script code, such as an iterator's `next`
    #[error("{0}")]
    Thrown(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VelaError {
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            VelaError::IncompatibleReceiver { .. }
                | VelaError::CalledOnNullOrUndefined { .. }
                | VelaError::NotIterable { .. }
                | VelaError::NotAString { .. }
        )
    }

    pub fn is_range_error(&self) -> bool {
        matches!(self, VelaError::InvalidLocale(_) | VelaError::InvalidOption { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incompatible_receiver_message() {
        let err = VelaError::IncompatibleReceiver {
            method: "Intl.ListFormat.prototype.format",
            receiver: "[object Object]".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "TypeError: Method Intl.ListFormat.prototype.format called on incompatible receiver [object Object]"
        );
        assert!(err.is_type_error());
        assert!(!err.is_range_error());
    }

    #[test]
    fn test_error_classes() {
        assert!(VelaError::InvalidLocale("x".into()).is_range_error());
        assert!(!VelaError::Thrown("boom".into()).is_type_error());
    }
}

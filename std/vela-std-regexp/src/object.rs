//!
//! Pattern Heap Objects
//!

use std::cell::RefCell;

use vela_std_core::{Handle, HeapTag, NativeObject, Value};

use crate::error::PatternError;
use crate::pattern::PatternObject;

/// Compile `source` and place it on the heap as a RegExp object
pub fn new_pattern_object(source: &str, flags: &str, ticks_until_tier_up: u32) -> Result<Handle, PatternError> {
    let pattern = PatternObject::compiled(source, flags, ticks_until_tier_up)?;
    Ok(NativeObject::alloc(HeapTag::Pattern, RefCell::new(pattern)))
}

pub fn pattern_object(value: &Value) -> Option<&RefCell<PatternObject>> {
    value.as_native::<RefCell<PatternObject>>(HeapTag::Pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_std_core::VelaString;

    #[test]
    fn test_pattern_object_round_trip_through_heap() {
        let re = new_pattern_object("b", "g", 1).unwrap();
        assert_eq!(re.value().heap_tag(), Some(HeapTag::Pattern));
        let value = re.value();
        let cell = pattern_object(&value).unwrap();
        let s = VelaString::new("abc");
        let found = cell.borrow_mut().exec(s.as_string().unwrap()).unwrap();
        assert_eq!(found.map(|m| m.range()), Some(1..2));
        assert_eq!(cell.borrow().last_index, 2);
    }

    #[test]
    fn test_other_values_are_not_patterns() {
        let s = VelaString::new("b");
        let value = s.value();
        assert!(pattern_object(&value).is_none());
        assert!(matches!(new_pattern_object("[", "", 1), Err(PatternError::Syntax { .. })));
    }
}

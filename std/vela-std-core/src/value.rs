//!
//! Runtime Value Representation
//!
//! vela values are 64-bit tagged words:
//! - Bit 0 set: a small integer (`smi`) stored in the upper bits
//! - Bit 0 clear and at or above `ODDBALL_LIMIT`: a pointer to a heap object
//! - Bit 0 clear below the limit: one of the reserved oddballs
//!
//! Every heap object starts with a `HeapHeader`. Generated code reads the tag
//! byte at `HEADER_TAG_OFFSET` to decide what kind of object it holds.
//!

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::array::{VelaArray, vela_array_decref, vela_array_incref};
use crate::native::{native_decref, native_incref, NativePrefix};
use crate::string::{VelaString, vela_string_decref, vela_string_incref};
use crate::structs::{VelaStruct, vela_struct_decref, vela_struct_incref};

/// Type tags for heap objects
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeapTag {
    String = 0,
    Array = 1,
    Struct = 2,
    ListFormat = 3,
    Pattern = 4,
    Iterator = 5,
}

impl HeapTag {
    /// Whether objects with this tag are `NativeObject`s
    pub fn is_native(self) -> bool {
        matches!(self, HeapTag::ListFormat | HeapTag::Pattern | HeapTag::Iterator)
    }
}

// HeapHeader layout: refcount(8) + tag(1) + pad(7)
pub const HEADER_REFCOUNT_OFFSET: i32 = 0;
pub const HEADER_TAG_OFFSET: i32 = 8;
pub const HEADER_SIZE: usize = 16;

/// Header for all heap-allocated objects
#[repr(C)]
pub struct HeapHeader {
    pub refcount: AtomicUsize,
    pub tag: HeapTag,
    pub _pad: [u8; 7],
}

impl HeapHeader {
    pub fn new(tag: HeapTag) -> Self {
        Self {
            refcount: AtomicUsize::new(1),
            tag,
            _pad: [0; 7],
        }
    }

    pub fn incref(&self) {
        self.refcount.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decref(&self) -> bool {
        if self.refcount.fetch_sub(1, Ordering::Release) == 1 {
            std::sync::atomic::fence(Ordering::Acquire);
            true
        } else {
            false
        }
    }

    pub fn refcount(&self) -> usize {
        self.refcount.load(Ordering::Relaxed)
    }
}

/// Raw values below this bound with bit 0 clear are oddballs, never pointers.
pub const ODDBALL_LIMIT: u64 = 0x100;

/// A tagged 64-bit runtime value
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Value(pub u64);

impl Value {
    pub const UNDEFINED: Value = Value(0x02);
    pub const NULL: Value = Value(0x04);
    pub const FALSE: Value = Value(0x06);
    pub const TRUE: Value = Value(0x08);
    /// Returned by builtins when an error is pending in the context
    pub const EXCEPTION: Value = Value(0x0a);

    pub fn smi(n: i32) -> Self {
        Value(((n as i64 as u64) << 1) | 1)
    }

    pub fn bool(b: bool) -> Self {
        if b { Value::TRUE } else { Value::FALSE }
    }

    pub fn from_ptr<T>(ptr: *const T) -> Self {
        Value(ptr as u64)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn is_smi(self) -> bool {
        self.0 & 1 == 1
    }

    pub fn as_smi(self) -> Option<i32> {
        if self.is_smi() {
            Some(((self.0 as i64) >> 1) as i32)
        } else {
            None
        }
    }

    pub fn is_undefined(self) -> bool {
        self == Value::UNDEFINED
    }

    pub fn is_null_or_undefined(self) -> bool {
        self == Value::UNDEFINED || self == Value::NULL
    }

    pub fn is_heap(self) -> bool {
        self.0 & 1 == 0 && self.0 >= ODDBALL_LIMIT
    }

    pub fn as_header(&self) -> Option<&HeapHeader> {
        if self.is_heap() {
            unsafe { Some(&*(self.0 as *const HeapHeader)) }
        } else {
            None
        }
    }

    pub fn heap_tag(self) -> Option<HeapTag> {
        self.as_header().map(|h| h.tag)
    }

    pub fn as_string(&self) -> Option<&VelaString> {
        match self.heap_tag() {
            Some(HeapTag::String) => unsafe { Some(&*(self.0 as *const VelaString)) },
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&VelaArray> {
        match self.heap_tag() {
            Some(HeapTag::Array) => unsafe { Some(&*(self.0 as *const VelaArray)) },
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&VelaStruct> {
        match self.heap_tag() {
            Some(HeapTag::Struct) => unsafe { Some(&*(self.0 as *const VelaStruct)) },
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Value::UNDEFINED => write!(f, "undefined"),
            Value::NULL => write!(f, "null"),
            Value::TRUE => write!(f, "true"),
            Value::FALSE => write!(f, "false"),
            Value::EXCEPTION => write!(f, "<exception>"),
            v if v.is_smi() => write!(f, "smi({})", v.as_smi().unwrap_or_default()),
            v => match v.heap_tag() {
                Some(tag) => write!(f, "{:?}@{:#x}", tag, v.0),
                None => write!(f, "oddball({:#x})", v.0),
            },
        }
    }
}

/// Increment the reference count of any heap value (immediates are ignored)
///
/// # Safety
/// `value` must be an immediate or point to a live heap object.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_value_incref(value: u64) {
    let value = Value(value);
    unsafe {
        match value.heap_tag() {
            Some(HeapTag::String) => vela_string_incref(value.0 as *mut VelaString),
            Some(HeapTag::Array) => vela_array_incref(value.0 as *mut VelaArray),
            Some(HeapTag::Struct) => vela_struct_incref(value.0 as *mut VelaStruct),
            Some(_) => native_incref(value.0 as *mut NativePrefix),
            None => {}
        }
    }
}

/// Decrement the reference count of any heap value and free it at zero
///
/// # Safety
/// `value` must be an immediate or an owned reference to a live heap object.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_value_decref(value: u64) {
    let value = Value(value);
    unsafe {
        match value.heap_tag() {
            Some(HeapTag::String) => vela_string_decref(value.0 as *mut VelaString),
            Some(HeapTag::Array) => vela_array_decref(value.0 as *mut VelaArray),
            Some(HeapTag::Struct) => vela_struct_decref(value.0 as *mut VelaStruct),
            Some(_) => native_decref(value.0 as *mut NativePrefix),
            None => {}
        }
    }
}

/// An owned reference to a value.
///
/// Cloning increments the reference count, dropping decrements it.
/// Immediates pass through untouched.
pub struct Handle {
    value: Value,
    _not_send: PhantomData<*const ()>,
}

impl Handle {
    /// Take over a +1 reference.
    ///
    /// # Safety
    /// `value` must be an immediate or an owned reference to a live heap object.
    pub unsafe fn from_owned(value: Value) -> Self {
        Self {
            value,
            _not_send: PhantomData,
        }
    }

    /// Acquire a new reference to a borrowed value.
    ///
    /// # Safety
    /// `value` must be an immediate or point to a live heap object.
    pub unsafe fn retain(value: Value) -> Self {
        unsafe {
            vela_value_incref(value.0);
            Self::from_owned(value)
        }
    }

    pub fn immediate(value: Value) -> Self {
        debug_assert!(!value.is_heap(), "immediate() called with a heap value");
        Self {
            value,
            _not_send: PhantomData,
        }
    }

    pub fn undefined() -> Self {
        Self::immediate(Value::UNDEFINED)
    }

    pub fn value(&self) -> Value {
        self.value
    }

    pub fn raw(&self) -> u64 {
        self.value.0
    }

    /// Release ownership without decrementing
    pub fn into_value(self) -> Value {
        let value = self.value;
        std::mem::forget(self);
        value
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Handle) -> bool {
        self.value == other.value
    }

    pub fn as_string(&self) -> Option<&VelaString> {
        self.value.as_string()
    }

    pub fn as_array(&self) -> Option<&VelaArray> {
        self.value.as_array()
    }

    pub fn as_struct(&self) -> Option<&VelaStruct> {
        self.value.as_struct()
    }

    pub fn as_native<T: 'static>(&self, tag: HeapTag) -> Option<&T> {
        self.value.as_native(tag)
    }

    pub fn refcount(&self) -> Option<usize> {
        self.value.as_header().map(|h| h.refcount())
    }
}

impl Clone for Handle {
    fn clone(&self) -> Self {
        unsafe { Handle::retain(self.value) }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        unsafe { vela_value_decref(self.value.0) }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_string() {
            Some(s) => write!(f, "{:?}", s.to_rust_string()),
            None => write!(f, "{:?}", self.value),
        }
    }
}

/// String form of a value, as used for receiver coercion and error messages
pub fn display_value(value: Value) -> String {
    match value {
        Value::UNDEFINED => "undefined".to_string(),
        Value::NULL => "null".to_string(),
        Value::TRUE => "true".to_string(),
        Value::FALSE => "false".to_string(),
        v if v.is_smi() => v.as_smi().unwrap_or_default().to_string(),
        v => match v.heap_tag() {
            Some(HeapTag::String) => v.as_string().map(|s| s.to_rust_string()).unwrap_or_default(),
            Some(HeapTag::Array) => v
                .as_array()
                .map(|a| {
                    a.values()
                        .iter()
                        .map(|e| if e.is_null_or_undefined() { String::new() } else { display_value(*e) })
                        .collect::<Vec<_>>()
                        .join(",")
                })
                .unwrap_or_default(),
            Some(HeapTag::ListFormat) => "[object Intl.ListFormat]".to_string(),
            Some(HeapTag::Pattern) => "[object RegExp]".to_string(),
            Some(HeapTag::Iterator) => "[object Iterator]".to_string(),
            Some(HeapTag::Struct) => "[object Object]".to_string(),
            None => format!("<oddball {:#x}>", v.0),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smi_round_trip_keeps_sign() {
        let v = Value::smi(-42);
        assert!(v.is_smi());
        assert!(!v.is_heap());
        assert_eq!(v.as_smi(), Some(-42));
        assert_eq!(Value::smi(i32::MAX).as_smi(), Some(i32::MAX));
    }

    #[test]
    fn test_oddballs_are_not_heap_values() {
        for v in [Value::UNDEFINED, Value::NULL, Value::TRUE, Value::FALSE, Value::EXCEPTION] {
            assert!(!v.is_heap());
            assert!(!v.is_smi());
            assert_eq!(v.heap_tag(), None);
        }
    }

    #[test]
    fn test_header_layout_matches_offsets() {
        assert_eq!(std::mem::size_of::<HeapHeader>(), HEADER_SIZE);
        assert_eq!(std::mem::offset_of!(HeapHeader, tag) as i32, HEADER_TAG_OFFSET);
        assert_eq!(std::mem::offset_of!(HeapHeader, refcount) as i32, HEADER_REFCOUNT_OFFSET);
    }

    #[test]
    fn test_handle_clone_and_drop_track_refcount() {
        let s = VelaString::new("abc");
        assert_eq!(s.refcount(), Some(1));
        let t = s.clone();
        assert_eq!(s.refcount(), Some(2));
        assert!(s.ptr_eq(&t));
        drop(t);
        assert_eq!(s.refcount(), Some(1));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(Value::smi(7)), "7");
        assert_eq!(display_value(Value::NULL), "null");
        let s = VelaString::new("hi");
        assert_eq!(display_value(s.value()), "hi");
    }
}

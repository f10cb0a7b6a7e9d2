//!
//! Native Heap Objects
//!
//! Objects whose payload is an ordinary Rust value. The prefix records the
//! heap tag, a type-erased finalizer and the payload's `TypeId`, so a value
//! can be checked against both the tag generated code sees and the Rust type
//! the runtime expects.
//!

use std::any::TypeId;

use crate::value::{Handle, HeapHeader, HeapTag, Value};

#[repr(C)]
pub struct NativePrefix {
    pub header: HeapHeader,
    finalize: unsafe fn(*mut NativePrefix),
    type_id: TypeId,
}

#[repr(C)]
pub struct NativeObject<T: 'static> {
    prefix: NativePrefix,
    value: T,
}

impl<T: 'static> NativeObject<T> {
    /// Box `value` behind a header carrying `tag`
    pub fn alloc(tag: HeapTag, value: T) -> Handle {
        debug_assert!(tag.is_native(), "{:?} is not a native tag", tag);
        let object = Box::new(NativeObject {
            prefix: NativePrefix {
                header: HeapHeader::new(tag),
                finalize: Self::finalize,
                type_id: TypeId::of::<T>(),
            },
            value,
        });
        unsafe { Handle::from_owned(Value::from_ptr(Box::into_raw(object))) }
    }

    unsafe fn finalize(prefix: *mut NativePrefix) {
        unsafe { drop(Box::from_raw(prefix as *mut NativeObject<T>)) }
    }
}

/// # Safety
/// `prefix` must be null or point to a live native object.
pub unsafe fn native_incref(prefix: *mut NativePrefix) {
    if !prefix.is_null() {
        unsafe { (*prefix).header.incref() }
    }
}

/// # Safety
/// `prefix` must be null or an owned reference to a live native object.
pub unsafe fn native_decref(prefix: *mut NativePrefix) {
    if !prefix.is_null() {
        unsafe {
            if (*prefix).header.decref() {
                ((*prefix).finalize)(prefix);
            }
        }
    }
}

impl Value {
    /// Borrow the payload if this is a native object with `tag` holding a `T`
    pub fn as_native<T: 'static>(&self, tag: HeapTag) -> Option<&T> {
        if self.heap_tag()? != tag || !tag.is_native() {
            return None;
        }
        unsafe {
            let prefix = &*(self.0 as *const NativePrefix);
            if prefix.type_id != TypeId::of::<T>() {
                return None;
            }
            Some(&(*(self.0 as *const NativeObject<T>)).value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct DropFlag(Rc<Cell<bool>>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }

    #[test]
    fn test_payload_dropped_with_last_reference() {
        let dropped = Rc::new(Cell::new(false));
        let obj = NativeObject::alloc(HeapTag::Iterator, DropFlag(dropped.clone()));
        let other = obj.clone();
        drop(obj);
        assert!(!dropped.get());
        drop(other);
        assert!(dropped.get());
    }

    #[test]
    fn test_downcast_checks_tag_and_type() {
        let obj = NativeObject::alloc(HeapTag::ListFormat, 17u32);
        assert_eq!(obj.as_native::<u32>(HeapTag::ListFormat), Some(&17));
        assert!(obj.as_native::<u64>(HeapTag::ListFormat).is_none());
        assert!(obj.as_native::<u32>(HeapTag::Pattern).is_none());
        assert!(Value::smi(1).as_native::<u32>(HeapTag::ListFormat).is_none());
    }
}

//!
//! Runtime Array Type
//!
//! Heap-allocated, reference-counted arrays of tagged values. An array owns
//! one reference to each of its elements and releases them when freed.
//!

use std::alloc::{alloc, dealloc, handle_alloc_error, realloc, Layout};

use crate::value::{vela_value_decref, Handle, HeapHeader, HeapTag, Value};

// VelaArray layout: header(16) + len(8) + capacity(8) + data(8)
pub const ARRAY_LEN_OFFSET: i32 = 16;
pub const ARRAY_CAPACITY_OFFSET: i32 = 24;
pub const ARRAY_DATA_OFFSET: i32 = 32;

/// A heap-allocated array of tagged values
#[repr(C)]
pub struct VelaArray {
    pub header: HeapHeader,
    pub len: usize,
    pub capacity: usize,
    pub data: *mut u64,
}

fn data_layout(capacity: usize) -> Layout {
    match Layout::array::<u64>(capacity) {
        Ok(layout) => layout,
        Err(_) => panic!("array capacity {} overflows the address space", capacity),
    }
}

/// Create a new empty array with given initial capacity
#[unsafe(no_mangle)]
pub extern "C" fn vela_array_new(capacity: usize) -> *mut VelaArray {
    unsafe {
        let layout = Layout::new::<VelaArray>();
        let ptr = alloc(layout) as *mut VelaArray;
        if ptr.is_null() {
            handle_alloc_error(layout);
        }

        let cap = if capacity == 0 { 4 } else { capacity };
        let data = alloc(data_layout(cap)) as *mut u64;
        if data.is_null() {
            dealloc(ptr as *mut u8, layout);
            handle_alloc_error(data_layout(cap));
        }

        ptr.write(VelaArray {
            header: HeapHeader::new(HeapTag::Array),
            len: 0,
            capacity: cap,
            data,
        });
        ptr
    }
}

/// Increment reference count
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_array_incref(arr: *mut VelaArray) {
    if !arr.is_null() {
        unsafe { (*arr).header.incref(); }
    }
}

/// Decrement reference count and free if zero, releasing every element
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_array_decref(arr: *mut VelaArray) {
    if !arr.is_null() {
        unsafe {
            if (*arr).header.decref() {
                for i in 0..(*arr).len {
                    vela_value_decref(*(*arr).data.add(i));
                }
                dealloc((*arr).data as *mut u8, data_layout((*arr).capacity));
                dealloc(arr as *mut u8, Layout::new::<VelaArray>());
            }
        }
    }
}

/// Get array length
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_array_len(arr: *const VelaArray) -> i64 {
    if arr.is_null() {
        0
    } else {
        unsafe { (*arr).len as i64 }
    }
}

/// Borrow the element at index (undefined if out of bounds)
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_array_get(arr: *const VelaArray, index: i64) -> u64 {
    if arr.is_null() || index < 0 {
        return Value::UNDEFINED.0;
    }
    unsafe {
        let idx = index as usize;
        if idx >= (*arr).len {
            return Value::UNDEFINED.0;
        }
        *(*arr).data.add(idx)
    }
}

/// Push element to end of array, taking over the caller's reference
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_array_push(arr: *mut VelaArray, value: u64) {
    if arr.is_null() {
        unsafe { vela_value_decref(value) };
        return;
    }

    unsafe {
        if (*arr).len >= (*arr).capacity {
            let new_capacity = (*arr).capacity * 2;
            let old_layout = data_layout((*arr).capacity);
            let new_layout = data_layout(new_capacity);

            let new_data = realloc((*arr).data as *mut u8, old_layout, new_layout.size()) as *mut u64;
            if new_data.is_null() {
                handle_alloc_error(new_layout);
            }

            (*arr).data = new_data;
            (*arr).capacity = new_capacity;
        }

        *(*arr).data.add((*arr).len) = value;
        (*arr).len += 1;
    }
}

impl VelaArray {
    /// Build an array that takes ownership of each handle
    pub fn from_values(values: impl IntoIterator<Item = Handle>) -> Handle {
        let iter = values.into_iter();
        let arr = vela_array_new(iter.size_hint().0);
        for value in iter {
            unsafe { vela_array_push(arr, value.into_value().0) };
        }
        unsafe { Handle::from_owned(Value::from_ptr(arr)) }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Borrowed view of the elements
    pub fn values(&self) -> &[Value] {
        unsafe { std::slice::from_raw_parts(self.data as *const Value, self.len) }
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.values().get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::string::VelaString;

    #[test]
    fn test_layout_matches_offsets() {
        assert_eq!(std::mem::offset_of!(VelaArray, len) as i32, ARRAY_LEN_OFFSET);
        assert_eq!(std::mem::offset_of!(VelaArray, capacity) as i32, ARRAY_CAPACITY_OFFSET);
        assert_eq!(std::mem::offset_of!(VelaArray, data) as i32, ARRAY_DATA_OFFSET);
    }

    #[test]
    fn test_push_grows_past_initial_capacity() {
        let arr = VelaArray::from_values((0..10).map(|i| Handle::immediate(Value::smi(i))));
        let a = arr.as_array().unwrap();
        assert_eq!(a.len(), 10);
        assert!(a.capacity >= 10);
        assert_eq!(a.get(9), Some(Value::smi(9)));
        assert_eq!(a.get(10), None);
    }

    #[test]
    fn test_array_releases_elements() {
        let s = VelaString::new("element");
        let arr = VelaArray::from_values([s.clone(), s.clone()]);
        assert_eq!(s.refcount(), Some(3));
        drop(arr);
        assert_eq!(s.refcount(), Some(1));
    }

    #[test]
    fn test_get_out_of_bounds_is_undefined() {
        let arr = VelaArray::from_values(std::iter::empty());
        unsafe {
            assert_eq!(vela_array_get(arr.value().0 as *const VelaArray, 0), Value::UNDEFINED.0);
            assert_eq!(vela_array_get(arr.value().0 as *const VelaArray, -1), Value::UNDEFINED.0);
        }
    }
}

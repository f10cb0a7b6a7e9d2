//!
//! Runtime Struct Records
//!
//! Fixed-size records of owned values. `type_id` distinguishes record kinds;
//! the builtins only produce list-format part records (`{ type, value }`).
//!

use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};

use crate::value::{vela_value_decref, Handle, HeapHeader, HeapTag, Value};

// VelaStruct layout: header(16) + type_id(4) + field_count(4) + fields
pub const STRUCT_TYPE_ID_OFFSET: i32 = 16;
pub const STRUCT_FIELD_COUNT_OFFSET: i32 = 20;
pub const STRUCT_FIELDS_OFFSET: i32 = 24;

/// Record kind of `{ type, value }` list-format parts
pub const TYPE_ID_LIST_PART: u32 = 1;
pub const LIST_PART_TYPE_FIELD: u32 = 0;
pub const LIST_PART_VALUE_FIELD: u32 = 1;

#[repr(C)]
pub struct VelaStruct {
    pub header: HeapHeader,
    pub type_id: u32,
    pub field_count: u32,
    pub fields: [u64; 0],
}

fn struct_layout(field_count: u32) -> Layout {
    match Layout::from_size_align(
        std::mem::size_of::<VelaStruct>() + (field_count as usize) * std::mem::size_of::<u64>(),
        std::mem::align_of::<VelaStruct>(),
    ) {
        Ok(layout) => layout,
        Err(_) => panic!("struct with {} fields overflows the address space", field_count),
    }
}

/// Allocate a record with every field set to undefined
#[unsafe(no_mangle)]
pub extern "C" fn vela_struct_new(type_id: u32, field_count: u32) -> *mut VelaStruct {
    unsafe {
        let layout = struct_layout(field_count);
        let ptr = alloc(layout) as *mut VelaStruct;
        if ptr.is_null() {
            handle_alloc_error(layout);
        }

        ptr.write(VelaStruct {
            header: HeapHeader::new(HeapTag::Struct),
            type_id,
            field_count,
            fields: [],
        });

        let fields_ptr = (ptr as *mut u8).add(STRUCT_FIELDS_OFFSET as usize) as *mut u64;
        for i in 0..field_count as usize {
            *fields_ptr.add(i) = Value::UNDEFINED.0;
        }

        ptr
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_struct_incref(s: *mut VelaStruct) {
    if !s.is_null() {
        unsafe { (*s).header.incref(); }
    }
}

/// Decrement reference count and free if zero, releasing every field
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_struct_decref(s: *mut VelaStruct) {
    if !s.is_null() {
        unsafe {
            if (*s).header.decref() {
                let field_count = (*s).field_count;
                let fields_ptr = (s as *mut u8).add(STRUCT_FIELDS_OFFSET as usize) as *mut u64;
                for i in 0..field_count as usize {
                    vela_value_decref(*fields_ptr.add(i));
                }
                dealloc(s as *mut u8, struct_layout(field_count));
            }
        }
    }
}

/// Borrow field value by index (undefined if out of range)
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_struct_get_field(s: *const VelaStruct, field_index: u32) -> u64 {
    if s.is_null() {
        return Value::UNDEFINED.0;
    }

    unsafe {
        if field_index >= (*s).field_count {
            return Value::UNDEFINED.0;
        }
        *((s as *const u8).add(STRUCT_FIELDS_OFFSET as usize) as *const u64).add(field_index as usize)
    }
}

/// Set field value by index, taking over the caller's reference and releasing the old one
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_struct_set_field(s: *mut VelaStruct, field_index: u32, value: u64) {
    unsafe {
        if s.is_null() || field_index >= (*s).field_count {
            vela_value_decref(value);
            return;
        }
        let slot = ((s as *mut u8).add(STRUCT_FIELDS_OFFSET as usize) as *mut u64).add(field_index as usize);
        let old = *slot;
        *slot = value;
        vela_value_decref(old);
    }
}

impl VelaStruct {
    pub fn new(type_id: u32, fields: impl IntoIterator<Item = Handle>) -> Handle {
        let fields: Vec<Handle> = fields.into_iter().collect();
        let ptr = vela_struct_new(type_id, fields.len() as u32);
        for (i, field) in fields.into_iter().enumerate() {
            unsafe { vela_struct_set_field(ptr, i as u32, field.into_value().0) };
        }
        unsafe { Handle::from_owned(Value::from_ptr(ptr)) }
    }

    pub fn field(&self, index: u32) -> Option<Value> {
        if index < self.field_count {
            unsafe { Some(Value(vela_struct_get_field(self, index))) }
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::string::VelaString;

    #[test]
    fn test_layout_matches_offsets() {
        assert_eq!(std::mem::offset_of!(VelaStruct, type_id) as i32, STRUCT_TYPE_ID_OFFSET);
        assert_eq!(std::mem::offset_of!(VelaStruct, field_count) as i32, STRUCT_FIELD_COUNT_OFFSET);
        assert_eq!(std::mem::size_of::<VelaStruct>() as i32, STRUCT_FIELDS_OFFSET);
    }

    #[test]
    fn test_fields_are_owned() {
        let kind = VelaString::new("element");
        let value = VelaString::new("a");
        let part = VelaStruct::new(TYPE_ID_LIST_PART, [kind.clone(), value.clone()]);
        assert_eq!(kind.refcount(), Some(2));
        let rec = part.as_struct().unwrap();
        assert_eq!(rec.type_id, TYPE_ID_LIST_PART);
        assert_eq!(rec.field(LIST_PART_VALUE_FIELD), Some(value.value()));
        assert_eq!(rec.field(2), None);
        drop(part);
        assert_eq!(kind.refcount(), Some(1));
        assert_eq!(value.refcount(), Some(1));
    }

    #[test]
    fn test_set_field_releases_previous_value() {
        let first = VelaString::new("first");
        let rec = VelaStruct::new(TYPE_ID_LIST_PART, [first.clone(), Handle::undefined()]);
        unsafe {
            vela_struct_set_field(rec.value().0 as *mut VelaStruct, 0, Value::NULL.0);
        }
        assert_eq!(first.refcount(), Some(1));
        assert_eq!(rec.as_struct().unwrap().field(0), Some(Value::NULL));
    }
}

//!
//! Heap Strings
//!
//! A `VelaString` is a fixed 32-byte head followed by a shape-dependent payload:
//!
//! - `Seq`: the code units themselves, one byte (Latin-1) or two bytes (UTF-16) each
//! - `Cons`: two owned string pointers whose concatenation is the content
//! - `Sliced`: an owned pointer to a sequential parent plus a start offset
//! - `Thin`: a single owned pointer to the string holding the content
//!
//! The encoding bit records whether the content fits in one byte per unit.
//! Lengths are always in code units.
//!

use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::cell::Cell;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::value::{Handle, HeapHeader, HeapTag, Value};

// VelaString layout: header(16) + shape(4) + hash(4) + len(8) + payload
pub const STRING_SHAPE_OFFSET: i32 = 16;
pub const STRING_HASH_OFFSET: i32 = 20;
pub const STRING_LEN_OFFSET: i32 = 24;
pub const STRING_DATA_OFFSET: i32 = 32;
pub const CONS_FIRST_OFFSET: i32 = 32;
pub const CONS_SECOND_OFFSET: i32 = 40;
pub const SLICED_PARENT_OFFSET: i32 = 32;
pub const SLICED_START_OFFSET: i32 = 40;
pub const THIN_ACTUAL_OFFSET: i32 = 32;

pub const SHAPE_REPR_MASK: u32 = 0b0011;
pub const SHAPE_SEQ: u32 = 0;
pub const SHAPE_CONS: u32 = 1;
pub const SHAPE_SLICED: u32 = 2;
pub const SHAPE_THIN: u32 = 3;
pub const SHAPE_TWO_BYTE: u32 = 0b0100;
pub const SHAPE_INTERNED: u32 = 0b1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringRepr {
    Seq,
    Cons,
    Sliced,
    Thin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    OneByte,
    TwoByte,
}

/// A heap-allocated string
#[repr(C)]
pub struct VelaString {
    pub header: HeapHeader,
    pub shape: u32,
    pub hash: AtomicU32,
    pub len: usize,
    pub payload: [u64; 0],
}

fn payload_size(shape: u32, len: usize) -> usize {
    match shape & SHAPE_REPR_MASK {
        SHAPE_SEQ if shape & SHAPE_TWO_BYTE != 0 => len * 2,
        SHAPE_SEQ => len,
        SHAPE_THIN => 8,
        _ => 16,
    }
}

fn string_layout(shape: u32, len: usize) -> Layout {
    match Layout::from_size_align(
        std::mem::size_of::<VelaString>() + payload_size(shape, len),
        std::mem::align_of::<VelaString>(),
    ) {
        Ok(layout) => layout,
        Err(_) => panic!("string of length {} overflows the address space", len),
    }
}

unsafe fn allocate(shape: u32, len: usize) -> *mut VelaString {
    let layout = string_layout(shape, len);
    unsafe {
        let ptr = alloc_zeroed(layout) as *mut VelaString;
        if ptr.is_null() {
            handle_alloc_error(layout);
        }
        ptr.write(VelaString {
            header: HeapHeader::new(HeapTag::String),
            shape,
            hash: AtomicU32::new(0),
            len,
            payload: [],
        });
        ptr
    }
}

fn payload_ptr(s: *const VelaString) -> *mut u8 {
    unsafe { (s as *mut u8).add(STRING_DATA_OFFSET as usize) }
}

unsafe fn write_ptr_field(s: *mut VelaString, index: usize, value: *mut VelaString) {
    unsafe { *(payload_ptr(s) as *mut *mut VelaString).add(index) = value }
}

unsafe fn read_ptr_field(s: *const VelaString, index: usize) -> *mut VelaString {
    unsafe { *(payload_ptr(s) as *const *mut VelaString).add(index) }
}

/// Allocate a sequential one-byte string, copying `len` bytes from `data` when non-null
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_string_new_one_byte(data: *const u8, len: usize) -> *mut VelaString {
    unsafe {
        let ptr = allocate(SHAPE_SEQ, len);
        if !data.is_null() && len > 0 {
            std::ptr::copy_nonoverlapping(data, payload_ptr(ptr), len);
        }
        ptr
    }
}

/// Allocate a sequential two-byte string, copying `len` units from `data` when non-null
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_string_new_two_byte(data: *const u16, len: usize) -> *mut VelaString {
    unsafe {
        let ptr = allocate(SHAPE_SEQ | SHAPE_TWO_BYTE, len);
        if !data.is_null() && len > 0 {
            std::ptr::copy_nonoverlapping(data, payload_ptr(ptr) as *mut u16, len);
        }
        ptr
    }
}

/// Allocate a zero-filled sequential one-byte string of `len` units
#[unsafe(no_mangle)]
pub extern "C" fn vela_string_alloc_one_byte(len: usize) -> *mut VelaString {
    unsafe { allocate(SHAPE_SEQ, len) }
}

thread_local! {
    static EMPTY_STRING: Cell<*mut VelaString> = const { Cell::new(std::ptr::null_mut()) };
}

/// The shared empty string (returns a new reference)
#[unsafe(no_mangle)]
pub extern "C" fn vela_string_empty() -> *mut VelaString {
    EMPTY_STRING.with(|cell| {
        let mut ptr = cell.get();
        if ptr.is_null() {
            ptr = unsafe { allocate(SHAPE_SEQ | SHAPE_INTERNED, 0) };
            cell.set(ptr);
        }
        unsafe { (*ptr).header.incref() };
        ptr
    })
}

/// Increment reference count of a string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_string_incref(s: *mut VelaString) {
    if !s.is_null() {
        unsafe { (*s).header.incref(); }
    }
}

/// Decrement reference count and free if zero, releasing referenced strings
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_string_decref(s: *mut VelaString) {
    if !s.is_null() {
        unsafe {
            if (*s).header.decref() {
                free_string(s);
            }
        }
    }
}

unsafe fn free_string(s: *mut VelaString) {
    unsafe {
        let shape = (*s).shape;
        let len = (*s).len;
        match shape & SHAPE_REPR_MASK {
            SHAPE_CONS => {
                vela_string_decref(read_ptr_field(s, 0));
                vela_string_decref(read_ptr_field(s, 1));
            }
            SHAPE_SLICED | SHAPE_THIN => vela_string_decref(read_ptr_field(s, 0)),
            _ => {}
        }
        dealloc(s as *mut u8, string_layout(shape, len));
    }
}

/// Get string length in code units
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_string_len(s: *const VelaString) -> i64 {
    if s.is_null() {
        0
    } else {
        unsafe { (*s).len as i64 }
    }
}

impl VelaString {
    /// Allocate a sequential string, one-byte when every char fits in Latin-1
    pub fn new(s: &str) -> Handle {
        if s.chars().all(|c| (c as u32) <= 0xFF) {
            let bytes: Vec<u8> = s.chars().map(|c| c as u8).collect();
            Self::one_byte(&bytes)
        } else {
            let units: Vec<u16> = s.encode_utf16().collect();
            Self::two_byte(&units)
        }
    }

    pub fn one_byte(units: &[u8]) -> Handle {
        unsafe {
            let ptr = vela_string_new_one_byte(units.as_ptr(), units.len());
            Handle::from_owned(Value::from_ptr(ptr))
        }
    }

    /// Allocate a two-byte string even when the content would fit in one byte
    pub fn two_byte(units: &[u16]) -> Handle {
        unsafe {
            let ptr = vela_string_new_two_byte(units.as_ptr(), units.len());
            Handle::from_owned(Value::from_ptr(ptr))
        }
    }

    /// Allocate the narrowest sequential string holding `units`
    pub fn from_units(units: &[u16]) -> Handle {
        if units.iter().all(|&u| u <= 0xFF) {
            let bytes: Vec<u8> = units.iter().map(|&u| u as u8).collect();
            Self::one_byte(&bytes)
        } else {
            Self::two_byte(units)
        }
    }

    pub fn empty() -> Handle {
        unsafe { Handle::from_owned(Value::from_ptr(vela_string_empty())) }
    }

    pub fn cons(first: &VelaString, second: &VelaString) -> Handle {
        let mut shape = SHAPE_CONS;
        if !first.is_one_byte() || !second.is_one_byte() {
            shape |= SHAPE_TWO_BYTE;
        }
        unsafe {
            let ptr = allocate(shape, first.len + second.len);
            write_ptr_field(ptr, 0, first.retain().into_value().0 as *mut VelaString);
            write_ptr_field(ptr, 1, second.retain().into_value().0 as *mut VelaString);
            Handle::from_owned(Value::from_ptr(ptr))
        }
    }

    /// A thin string redirecting to `actual` (or to what `actual` redirects to)
    pub fn thin(actual: &VelaString) -> Handle {
        if let Some(target) = actual.thin_actual() {
            return Self::thin(target);
        }
        let shape = SHAPE_THIN | (actual.shape & SHAPE_TWO_BYTE);
        unsafe {
            let ptr = allocate(shape, actual.len);
            write_ptr_field(ptr, 0, actual.retain().into_value().0 as *mut VelaString);
            Handle::from_owned(Value::from_ptr(ptr))
        }
    }

    /// A slice of `len` units starting at `start`; slices always reference a sequential parent
    pub fn sliced(parent: &VelaString, start: usize, len: usize) -> Option<Handle> {
        if start.checked_add(len)? > parent.len {
            return None;
        }
        let (base, offset) = match parent.repr() {
            StringRepr::Seq => (parent.retain(), start),
            StringRepr::Sliced => {
                let (base, base_start) = parent.sliced_parts()?;
                (base.retain(), base_start + start)
            }
            StringRepr::Thin => return Self::sliced(parent.thin_actual()?, start, len),
            StringRepr::Cons => {
                let flat = parent.flatten();
                return Self::sliced(flat.as_string()?, start, len);
            }
        };
        let base_shape = base.as_string()?.shape;
        let shape = SHAPE_SLICED | (base_shape & SHAPE_TWO_BYTE);
        unsafe {
            let ptr = allocate(shape, len);
            write_ptr_field(ptr, 0, base.into_value().0 as *mut VelaString);
            *(payload_ptr(ptr) as *mut usize).add(1) = offset;
            Some(Handle::from_owned(Value::from_ptr(ptr)))
        }
    }

    /// A sequential string with the same content and encoding
    pub fn flatten(&self) -> Handle {
        if self.repr() == StringRepr::Seq {
            return self.retain();
        }
        let units = self.to_units();
        if self.is_one_byte() {
            let bytes: Vec<u8> = units.iter().map(|&u| u as u8).collect();
            Self::one_byte(&bytes)
        } else {
            Self::two_byte(&units)
        }
    }

    pub fn as_ptr(&self) -> *mut VelaString {
        self as *const VelaString as *mut VelaString
    }

    /// A new owned reference to this string
    pub fn retain(&self) -> Handle {
        self.header.incref();
        unsafe { Handle::from_owned(Value::from_ptr(self.as_ptr())) }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn repr(&self) -> StringRepr {
        match self.shape & SHAPE_REPR_MASK {
            SHAPE_SEQ => StringRepr::Seq,
            SHAPE_CONS => StringRepr::Cons,
            SHAPE_SLICED => StringRepr::Sliced,
            _ => StringRepr::Thin,
        }
    }

    pub fn encoding(&self) -> Encoding {
        if self.shape & SHAPE_TWO_BYTE != 0 {
            Encoding::TwoByte
        } else {
            Encoding::OneByte
        }
    }

    pub fn is_one_byte(&self) -> bool {
        self.encoding() == Encoding::OneByte
    }

    pub fn is_interned(&self) -> bool {
        self.shape & SHAPE_INTERNED != 0
    }

    pub fn seq_one_byte(&self) -> Option<&[u8]> {
        if self.shape & (SHAPE_REPR_MASK | SHAPE_TWO_BYTE) == SHAPE_SEQ {
            unsafe { Some(std::slice::from_raw_parts(payload_ptr(self), self.len)) }
        } else {
            None
        }
    }

    pub fn seq_two_byte(&self) -> Option<&[u16]> {
        if self.shape & (SHAPE_REPR_MASK | SHAPE_TWO_BYTE) == SHAPE_SEQ | SHAPE_TWO_BYTE {
            unsafe { Some(std::slice::from_raw_parts(payload_ptr(self) as *const u16, self.len)) }
        } else {
            None
        }
    }

    pub fn cons_parts(&self) -> Option<(&VelaString, &VelaString)> {
        if self.repr() == StringRepr::Cons {
            unsafe { Some((&*read_ptr_field(self, 0), &*read_ptr_field(self, 1))) }
        } else {
            None
        }
    }

    pub fn sliced_parts(&self) -> Option<(&VelaString, usize)> {
        if self.repr() == StringRepr::Sliced {
            unsafe {
                let start = *(payload_ptr(self) as *const usize).add(1);
                Some((&*read_ptr_field(self, 0), start))
            }
        } else {
            None
        }
    }

    pub fn thin_actual(&self) -> Option<&VelaString> {
        if self.repr() == StringRepr::Thin {
            unsafe { Some(&*read_ptr_field(self, 0)) }
        } else {
            None
        }
    }

    /// Append the content to `out`, walking any indirection
    pub fn write_units(&self, out: &mut Vec<u16>) {
        out.reserve(self.len);
        let mut pending: Vec<&VelaString> = vec![self];
        while let Some(s) = pending.pop() {
            match s.repr() {
                StringRepr::Seq => match s.seq_one_byte() {
                    Some(bytes) => out.extend(bytes.iter().map(|&b| b as u16)),
                    None => out.extend_from_slice(s.seq_two_byte().unwrap_or_default()),
                },
                StringRepr::Cons => {
                    if let Some((first, second)) = s.cons_parts() {
                        pending.push(second);
                        pending.push(first);
                    }
                }
                StringRepr::Thin => {
                    if let Some(actual) = s.thin_actual() {
                        pending.push(actual);
                    }
                }
                StringRepr::Sliced => {
                    if let Some((parent, start)) = s.sliced_parts() {
                        let end = start + s.len;
                        match parent.seq_one_byte() {
                            Some(bytes) => out.extend(bytes[start..end].iter().map(|&b| b as u16)),
                            None => out.extend_from_slice(&parent.seq_two_byte().unwrap_or_default()[start..end]),
                        }
                    }
                }
            }
        }
    }

    pub fn to_units(&self) -> Vec<u16> {
        let mut out = Vec::with_capacity(self.len);
        self.write_units(&mut out);
        out
    }

    /// Decode as UTF-16, replacing lone surrogates
    pub fn to_rust_string(&self) -> String {
        char::decode_utf16(self.to_units())
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }

    pub fn content_eq(&self, other: &VelaString) -> bool {
        self.len == other.len && self.to_units() == other.to_units()
    }

    /// Memoized content hash; never zero once computed
    pub fn hash_code(&self) -> u32 {
        let cached = self.hash.load(Ordering::Relaxed);
        if cached != 0 {
            return cached;
        }
        let mut h: u32 = 0x811c_9dc5;
        for unit in self.to_units() {
            h ^= unit as u32;
            h = h.wrapping_mul(0x0100_0193);
        }
        let h = if h == 0 { 1 } else { h };
        self.hash.store(h, Ordering::Relaxed);
        h
    }

    pub fn has_cached_hash(&self) -> bool {
        self.hash.load(Ordering::Relaxed) != 0
    }
}

/// Mark a freshly allocated, not yet shared string as interned
pub(crate) unsafe fn mark_interned(s: *mut VelaString) {
    unsafe { (*s).shape |= SHAPE_INTERNED }
}

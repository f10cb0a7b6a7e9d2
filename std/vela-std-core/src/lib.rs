//!
//! vela-std-core - Core Runtime Types
//!
//! This crate provides the heap model shared by the builtin compiler and the
//! runtime library crates:
//!
//! - `Value`, `HeapHeader` and `HeapTag` for tagged, reference-counted objects
//! - `VelaString` in sequential, cons, sliced and thin shapes, one-byte or two-byte
//! - `VelaArray` and `VelaStruct` collections of owned values
//! - `NativeObject` for objects whose payload is an ordinary Rust type
//! - `ListFormatData` and `IteratorSource`, the payloads builtins dispatch on
//! - `VelaError`, the error thrown by builtins
//!
//! Layouts that generated code reads are `#[repr(C)]` and publish their field
//! offsets as constants next to the struct definition.
//!

pub mod value;
pub mod string;
pub mod string_table;
pub mod array;
pub mod structs;
pub mod native;
pub mod list_format;
pub mod iterator;
pub mod error;

pub use value::*;
pub use string::*;
pub use string_table::*;
pub use array::*;
pub use structs::*;
pub use native::*;
pub use list_format::*;
pub use iterator::*;
pub use error::*;

//!
//! Script Iterators
//!
//! A native object wrapping a `next` callback. Each call yields an owned value,
//! `None` once exhausted, or an error the callback threw. Exhaustion is sticky.
//!

use std::cell::{Cell, RefCell};

use crate::error::VelaError;
use crate::native::NativeObject;
use crate::value::{Handle, HeapTag, Value};

pub type NextFn = Box<dyn FnMut() -> Result<Option<Handle>, VelaError>>;

pub struct IteratorSource {
    next: RefCell<NextFn>,
    done: Cell<bool>,
}

impl IteratorSource {
    /// Allocate an iterator object driven by `next`
    pub fn new(next: impl FnMut() -> Result<Option<Handle>, VelaError> + 'static) -> Handle {
        NativeObject::alloc(
            HeapTag::Iterator,
            IteratorSource {
                next: RefCell::new(Box::new(next)),
                done: Cell::new(false),
            },
        )
    }

    pub fn next(&self) -> Result<Option<Handle>, VelaError> {
        if self.done.get() {
            return Ok(None);
        }
        let mut next = self
            .next
            .try_borrow_mut()
            .map_err(|_| VelaError::Internal("iterator re-entered its own next()".to_string()))?;
        match next() {
            Ok(Some(value)) => Ok(Some(value)),
            Ok(None) => {
                self.done.set(true);
                Ok(None)
            }
            Err(e) => {
                self.done.set(true);
                Err(e)
            }
        }
    }

    pub fn is_done(&self) -> bool {
        self.done.get()
    }
}

pub fn iterator_source(value: &Value) -> Option<&IteratorSource> {
    value.as_native::<IteratorSource>(HeapTag::Iterator)
}

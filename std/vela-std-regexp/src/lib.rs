//!
//! vela-std-regexp - Compiled Search Patterns
//!
//! A `PatternObject` is uncompiled, an atom (a literal needle) or a compiled
//! pattern. Compiled patterns keep one code slot per subject encoding; each
//! slot starts uninitialized and is filled on the first execution against a
//! subject of that encoding.
//!
//! ## Modules
//! - `flags` - the `PatternFlags` bitset
//! - `data` - slot indices, code slots and the typed backing store
//! - `matcher` - building matchers and running them over string subjects
//! - `pattern` - the `PatternObject` accessors, compilation and `exec`
//! - `snapshot` - the serializable form taken at a persistence boundary
//! - `object` - placing patterns on the heap
//!

pub mod error;
pub mod flags;
pub mod data;
pub mod matcher;
pub mod pattern;
pub mod snapshot;
pub mod object;

pub use error::*;
pub use flags::*;
pub use data::*;
pub use matcher::{Matcher, PatternMatch, Subject, Tier};
pub use pattern::*;
pub use snapshot::*;
pub use object::*;

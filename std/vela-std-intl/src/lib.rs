//!
//! vela-std-intl - Locale-Aware List Formatting
//!
//! ## Locale data
//! - `LocaleData` - supplies list patterns for a locale, type and style
//! - `BuiltinLocaleData` - patterns for `en`, `es`, `de` and `fr`
//! - `resolve_locale(requested, data, default)` - validate a tag and pick a supported locale
//!
//! ## Formatting
//! - `ListFormatter::format(items)` - join items into one string
//! - `ListFormatter::format_to_parts(items)` - the same output as element/literal parts
//!

pub mod locale;
pub mod format;

pub use locale::*;
pub use format::*;

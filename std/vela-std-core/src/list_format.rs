//!
//! ListFormat Instances
//!
//! The resolved state of an `Intl.ListFormat` object: a locale and the
//! `type`/`style` options. Instances are immutable native objects tagged
//! `HeapTag::ListFormat`; the tag is what builtins check before treating a
//! receiver as a list formatter.
//!

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VelaError;
use crate::native::NativeObject;
use crate::value::{Handle, HeapTag, Value};

/// The `type` option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    #[default]
    Conjunction,
    Disjunction,
    Unit,
}

/// The `style` option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    #[default]
    Long,
    Short,
    Narrow,
}

impl ListKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ListKind::Conjunction => "conjunction",
            ListKind::Disjunction => "disjunction",
            ListKind::Unit => "unit",
        }
    }
}

impl ListStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            ListStyle::Long => "long",
            ListStyle::Short => "short",
            ListStyle::Narrow => "narrow",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ListStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListKind {
    type Err = VelaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conjunction" => Ok(ListKind::Conjunction),
            "disjunction" => Ok(ListKind::Disjunction),
            "unit" => Ok(ListKind::Unit),
            _ => Err(VelaError::InvalidOption { option: "type", value: s.to_string() }),
        }
    }
}

impl FromStr for ListStyle {
    type Err = VelaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "long" => Ok(ListStyle::Long),
            "short" => Ok(ListStyle::Short),
            "narrow" => Ok(ListStyle::Narrow),
            _ => Err(VelaError::InvalidOption { option: "style", value: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFormatData {
    pub locale: String,
    #[serde(rename = "type")]
    pub kind: ListKind,
    pub style: ListStyle,
}

impl ListFormatData {
    pub fn new(locale: impl Into<String>, kind: ListKind, style: ListStyle) -> Self {
        Self {
            locale: locale.into(),
            kind,
            style,
        }
    }

    /// Allocate a ListFormat instance holding this state
    pub fn into_object(self) -> Handle {
        NativeObject::alloc(HeapTag::ListFormat, self)
    }
}

/// The state behind a ListFormat instance, or `None` for any other value
pub fn list_format_data(value: &Value) -> Option<&ListFormatData> {
    value.as_native::<ListFormatData>(HeapTag::ListFormat)
}

//!
//! Builtin Context
//!
//! The context handle passed as the first argument to every builtin. A builtin
//! that fails stores its error here and returns `Value::EXCEPTION`.
//!

use tracing::trace;
use vela_std_core::{Handle, Value, VelaError};
use vela_std_intl::LocaleData;

/// Counters for the fallback paths, used to observe which path a call took
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub lower_case_runtime_calls: u64,
    pub format_list_calls: u64,
    pub format_list_to_parts_calls: u64,
    pub iterable_to_list_calls: u64,
}

pub struct Context {
    pending: Option<VelaError>,
    locale_data: Box<dyn LocaleData>,
    default_locale: String,
    stats: RuntimeStats,
}

impl Context {
    pub fn new(locale_data: Box<dyn LocaleData>, default_locale: impl Into<String>) -> Self {
        Self {
            pending: None,
            locale_data,
            default_locale: default_locale.into(),
            stats: RuntimeStats::default(),
        }
    }

    /// Record `error` as pending and return the exception marker
    pub fn throw(&mut self, error: VelaError) -> u64 {
        trace!(%error, "builtin threw");
        self.pending = Some(error);
        Value::EXCEPTION.0
    }

    /// Hand a result back across the builtin boundary
    pub fn complete(&mut self, result: Result<Handle, VelaError>) -> u64 {
        match result {
            Ok(value) => value.into_value().0,
            Err(error) => self.throw(error),
        }
    }

    pub fn take_pending(&mut self) -> Option<VelaError> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn locale_data(&self) -> &dyn LocaleData {
        self.locale_data.as_ref()
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    pub fn stats_mut(&mut self) -> &mut RuntimeStats {
        &mut self.stats
    }
}

//!
//! Engine Configuration
//!
//! Loaded from a TOML file; every section and key is optional:
//!
//! ```toml
//! [jit]
//! opt_level = "speed"
//! verify = true
//!
//! [intl]
//! default_locale = "en"
//!
//! [regexp]
//! tier_up_ticks = 1
//!
//! [log]
//! filter = "warn"
//! ```
//!

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Cranelift `opt_level` setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptLevel {
    None,
    #[default]
    Speed,
    SpeedAndSize,
}

impl OptLevel {
    pub fn as_setting(self) -> &'static str {
        match self {
            OptLevel::None => "none",
            OptLevel::Speed => "speed",
            OptLevel::SpeedAndSize => "speed_and_size",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitConfig {
    pub opt_level: OptLevel,
    /// Run the Cranelift IR verifier on every builtin
    pub verify: bool,
}

impl Default for JitConfig {
    fn default() -> Self {
        Self {
            opt_level: OptLevel::Speed,
            verify: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntlConfig {
    pub default_locale: String,
}

impl Default for IntlConfig {
    fn default() -> Self {
        Self {
            default_locale: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegexpConfig {
    pub tier_up_ticks: u32,
}

impl Default for RegexpConfig {
    fn default() -> Self {
        Self {
            tier_up_ticks: vela_std_regexp::DEFAULT_TICKS_UNTIL_TIER_UP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directives, used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VelaConfig {
    pub jit: JitConfig,
    pub intl: IntlConfig,
    pub regexp: RegexpConfig,
    pub log: LogConfig,
}

impl VelaConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: VelaConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !vela_std_intl::is_structurally_valid_tag(&self.intl.default_locale) {
            return Err(ConfigError::Invalid(format!(
                "intl.default_locale '{}' is not a language tag",
                self.intl.default_locale
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = VelaConfig::from_toml_str("").unwrap();
        assert_eq!(config, VelaConfig::default());
        assert_eq!(config.jit.opt_level.as_setting(), "speed");
        assert!(config.jit.verify);
        assert_eq!(config.intl.default_locale, "en");
        assert_eq!(config.regexp.tier_up_ticks, 1);
    }

    #[test]
    fn test_partial_sections() {
        let config = VelaConfig::from_toml_str(
            r#"
            [jit]
            opt_level = "speed_and_size"

            [regexp]
            tier_up_ticks = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.jit.opt_level, OptLevel::SpeedAndSize);
        assert!(config.jit.verify);
        assert_eq!(config.regexp.tier_up_ticks, 0);
        assert_eq!(config.log.filter, "warn");
    }

    #[test]
    fn test_rejects_unknown_opt_level() {
        let err = VelaConfig::from_toml_str("[jit]\nopt_level = \"fastest\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_rejects_invalid_default_locale() {
        let err = VelaConfig::from_toml_str("[intl]\ndefault_locale = \"en_US\"").unwrap_err();
        assert!(err.to_string().contains("en_US"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vela.toml");
        std::fs::write(&path, "[intl]\ndefault_locale = \"de\"\n").unwrap();
        assert_eq!(VelaConfig::load(&path).unwrap().intl.default_locale, "de");

        let missing = dir.path().join("missing.toml");
        assert!(matches!(VelaConfig::load(&missing), Err(ConfigError::Io { .. })));
    }
}

//! Harness configuration.
//!
//! Precedence, lowest first: built-in defaults, a TOML file, `LZT_*`
//! environment variables, then command-line flags (applied by the caller).

use crate::context::{CheckOptions, FlagComparison};
use crate::error::{ConfigError, HarnessError};
use lzt_level_zero::{DeviceApi, FakeApi, LoaderApi};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            #[default]
            $($variant),+
        }

        impl FromStr for $name {
            type Err = ConfigError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ConfigError::Invalid(format!(
                        concat!("unknown ", stringify!($name), " '{}'. Expected one of: ", $($text, " "),+),
                        other
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($text),)+
                }
            }
        }
    };
}

string_enum! {
    /// Where device queries go.
    BackendKind { Loader => "loader", Fake => "fake" }
}

string_enum! {
    ReportFormat { Text => "text", Json => "json" }
}

string_enum! {
    LogFormat { Pretty => "pretty", Compact => "compact", Json => "json" }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// Explicit loader library; the platform default names are tried otherwise.
    pub loader_path: Option<PathBuf>,
    /// Fake topology file. Required when `kind = "fake"`.
    pub topology: Option<PathBuf>,
}

impl BackendConfig {
    pub fn open(&self) -> Result<Box<dyn DeviceApi>, HarnessError> {
        match self.kind {
            BackendKind::Loader => {
                let api = match &self.loader_path {
                    Some(path) => LoaderApi::load_from(path)?,
                    None => LoaderApi::load()?,
                };
                Ok(Box::new(api))
            }
            BackendKind::Fake => {
                let path = self.topology.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("the fake backend needs a topology file".to_string())
                })?;
                info!(topology = %path.display(), "using fake backend");
                Ok(Box::new(FakeApi::from_path(path)?))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub filter: Option<String>,
    pub strict_skips: bool,
    pub flag_comparison: FlagComparison,
    pub min_devices: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { filter: None, strict_skips: false, flag_comparison: FlagComparison::Or, min_devices: 2 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: ReportFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: LogFormat::Pretty }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub backend: BackendConfig,
    pub run: RunConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid(format!("{name}: expected a boolean, got '{other}'"))),
    }
}

impl HarnessConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        debug!(path = %path.display(), "loaded configuration file");
        Self::from_toml_str(&text)
    }

    /// Apply `LZT_*` variables on top of the current values.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(v) = env_var("LZT_BACKEND") {
            self.backend.kind = v.parse()?;
        }
        if let Some(v) = env_var("LZT_LOADER_PATH") {
            self.backend.loader_path = Some(PathBuf::from(v));
        }
        if let Some(v) = env_var("LZT_TOPOLOGY") {
            self.backend.topology = Some(PathBuf::from(v));
        }
        if let Some(v) = env_var("LZT_FILTER") {
            self.run.filter = Some(v);
        }
        if let Some(v) = env_var("LZT_STRICT_SKIPS") {
            self.run.strict_skips = parse_bool("LZT_STRICT_SKIPS", &v)?;
        }
        if let Some(v) = env_var("LZT_FLAG_COMPARISON") {
            self.run.flag_comparison = v.parse().map_err(ConfigError::Invalid)?;
        }
        if let Some(v) = env_var("LZT_FORMAT") {
            self.output.format = v.parse()?;
        }
        if let Some(v) = env_var("LZT_LOG_LEVEL") {
            self.logging.level = v;
        }
        Ok(())
    }

    /// Defaults, then `path` if given, then the environment.
    pub fn load_with_precedence(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.min_devices < 2 {
            return Err(ConfigError::Invalid(format!(
                "run.min_devices must be at least 2, got {}",
                self.run.min_devices
            )));
        }
        if self.backend.kind == BackendKind::Fake && self.backend.topology.is_none() {
            return Err(ConfigError::Invalid(
                "backend.kind = \"fake\" requires backend.topology".to_string(),
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unknown log level '{}'. Expected one of: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    pub fn check_options(&self) -> CheckOptions {
        CheckOptions { flag_comparison: self.run.flag_comparison, min_devices: self.run.min_devices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_and_use_the_loader() {
        let config = HarnessConfig::default();
        config.validate().unwrap();
        assert_eq!(config.backend.kind, BackendKind::Loader);
        assert_eq!(config.check_options(), CheckOptions::default());
    }

    #[test]
    fn toml_sections_parse() {
        let config = HarnessConfig::from_toml_str(
            r#"
            [backend]
            kind = "fake"
            topology = "two-gpus.toml"

            [run]
            filter = "sku_consistency.*"
            strict_skips = true
            flag_comparison = "masked"

            [output]
            format = "json"

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.backend.topology.as_deref(), Some(Path::new("two-gpus.toml")));
        assert_eq!(config.run.flag_comparison, FlagComparison::Masked);
        assert_eq!(config.run.min_devices, 2);
        assert_eq!(config.output.format, ReportFormat::Json);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!(matches!(
            HarnessConfig::from_toml_str("[backend]\nkind = \"opencl\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            HarnessConfig::from_toml_str("[run]\nretries = 3"),
            Err(ConfigError::Parse(_))
        ));
        assert!("xml".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn validation_catches_inconsistent_settings() {
        let mut config = HarnessConfig::default();
        config.run.min_devices = 1;
        assert!(config.validate().is_err());

        let mut config = HarnessConfig::default();
        config.backend.kind = BackendKind::Fake;
        assert!(config.validate().is_err());

        let mut config = HarnessConfig::default();
        config.logging.level = "chatty".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = HarnessConfig::from_file(Path::new("/nonexistent/lzt.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

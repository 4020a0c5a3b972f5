//! Core configuration.
//!
//! # Responsibility
//! - Parse host-provided JSON settings into typed sections.
//! - Reject out-of-range values before any component uses them.
//!
//! # Invariants
//! - Every field has a default; `{}` is a valid config.
//! - Unknown keys are rejected so typos surface at load time.

use crate::logging::normalize_level;
use crate::render::{RenderContext, RenderOptions};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_NOTICE_TTL_MS: u64 = 5_000;
const DEFAULT_AUTOSAVE_DEBOUNCE_MS: u64 = 1_500;
const MAX_NOTICE_TTL_MS: u64 = 60_000;
const MAX_AUTOSAVE_DEBOUNCE_MS: u64 = 60_000;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Invalid { field: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config JSON: {err}"),
            Self::Invalid { field, message } => write!(f, "invalid `{field}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `trace|debug|info|warn|error`; build-mode default when absent.
    pub level: Option<String>,
    /// Absolute log directory; file logging stays off when absent.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    pub notice_ttl_ms: u64,
    pub autosave_debounce_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            notice_ttl_ms: DEFAULT_NOTICE_TTL_MS,
            autosave_debounce_ms: DEFAULT_AUTOSAVE_DEBOUNCE_MS,
        }
    }
}

impl EditorConfig {
    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub context: RenderContext,
    pub highlight_code: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            context: RenderContext::Published,
            highlight_code: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// SQLite file; an in-memory store is used when absent.
    pub path: Option<PathBuf>,
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl StoreConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub logging: LoggingConfig,
    pub editor: EditorConfig,
    pub render: RenderConfig,
    pub store: StoreConfig,
}

impl CoreConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config = serde_json::from_str::<Self>(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(level) = self.logging.level.as_deref() {
            normalize_level(level).map_err(|err| ConfigError::Invalid {
                field: "logging.level",
                message: err.to_string(),
            })?;
        }
        if let Some(dir) = self.logging.dir.as_deref() {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid {
                    field: "logging.dir",
                    message: format!("must be an absolute path, got `{}`", dir.display()),
                });
            }
        }
        check_range(
            "editor.notice_ttl_ms",
            self.editor.notice_ttl_ms,
            MAX_NOTICE_TTL_MS,
        )?;
        check_range(
            "editor.autosave_debounce_ms",
            self.editor.autosave_debounce_ms,
            MAX_AUTOSAVE_DEBOUNCE_MS,
        )?;
        check_range(
            "store.busy_timeout_ms",
            self.store.busy_timeout_ms,
            MAX_BUSY_TIMEOUT_MS,
        )?;
        Ok(())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            context: self.render.context,
            highlight_code: self.render.highlight_code,
        }
    }
}

fn check_range(field: &'static str, value: u64, max: u64) -> Result<(), ConfigError> {
    if value == 0 || value > max {
        return Err(ConfigError::Invalid {
            field,
            message: format!("expected 1..={max}, got {value}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use crate::render::RenderContext;
    use std::time::Duration;

    #[test]
    fn empty_document_uses_defaults() {
        let config = CoreConfig::from_json_str("{}").expect("empty config");
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.editor.notice_ttl(), Duration::from_secs(5));
        assert_eq!(config.render.context, RenderContext::Published);
    }

    #[test]
    fn unknown_level_is_rejected() {
        let err = CoreConfig::from_json_str(r#"{"logging":{"level":"loud"}}"#)
            .expect_err("unknown level");
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "logging.level",
                ..
            }
        ));
    }

    #[test]
    fn zero_debounce_is_rejected() {
        let err = CoreConfig::from_json_str(r#"{"editor":{"autosave_debounce_ms":0}}"#)
            .expect_err("zero debounce");
        assert!(err.to_string().contains("editor.autosave_debounce_ms"));
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        let err = CoreConfig::from_json_str(r#"{"render":{"theme":"dark"}}"#)
            .expect_err("unknown key");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}

//! Session configuration via `quiver.toml`
//!
//! Every field has a default, so an empty file (or no file at all) gives
//! the default behaviour. [`Session::open`](crate::Session::open) picks up a
//! `quiver.toml` found next to the data it opens (see
//! [`SessionConfig::discover`]). Derived sessions share their parent's
//! configuration.

use quiver_core::{BinaryOp, Error, FloatErrors, Result};
use quiver_durability::EngineOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Config file name looked up next to session data by [`SessionConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "quiver.toml";

/// What to do with floating-point errors raised by an elementwise operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloatErrorPolicy {
    /// Emit one `warn!` event per operation
    #[default]
    Warn,
    /// Say nothing
    Ignore,
}

/// Callback receiving the floating-point errors of one elementwise operation
///
/// Installed with [`Session::set_float_error_handler`](crate::Session::set_float_error_handler),
/// it replaces the configured [`FloatErrorPolicy`].
pub type FloatErrorHandler = Arc<dyn Fn(BinaryOp, &FloatErrors) + Send + Sync>;

/// `[csv]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CsvConfig {
    /// Single ASCII field delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

fn default_delimiter() -> String {
    ",".to_string()
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
        }
    }
}

/// `[bundle]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleConfig {
    /// zstd level, 1 to 22
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
}

fn default_compression_level() -> i32 {
    3
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            compression_level: default_compression_level(),
        }
    }
}

/// Session configuration loaded from `quiver.toml`
///
/// # Example
///
/// ```toml
/// float_errors = "warn"
/// skip_invalid_sources = false
///
/// [csv]
/// delimiter = ";"
///
/// [bundle]
/// compression_level = 9
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SessionConfig {
    /// Floating-point error policy for elementwise operations
    #[serde(default)]
    pub float_errors: FloatErrorPolicy,
    /// Default for [`LoadOptions::skip_invalid`](crate::LoadOptions::skip_invalid)
    #[serde(default)]
    pub skip_invalid_sources: bool,
    /// Delimited text settings
    #[serde(default)]
    pub csv: CsvConfig,
    /// Bundle archive settings
    #[serde(default)]
    pub bundle: BundleConfig,
}

impl SessionConfig {
    /// CSV delimiter as a byte
    ///
    /// # Errors
    ///
    /// Returns an error unless the delimiter is exactly one ASCII character.
    pub fn csv_delimiter(&self) -> Result<u8> {
        match self.csv.delimiter.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(Error::Config(format!(
                "csv delimiter must be a single ASCII character, got {:?}",
                self.csv.delimiter
            ))),
        }
    }

    /// Options handed to the built-in format engines
    ///
    /// # Errors
    ///
    /// Returns an error if the delimiter or compression level is invalid.
    pub fn engine_options(&self) -> Result<EngineOptions> {
        let level = self.bundle.compression_level;
        if !(1..=22).contains(&level) {
            return Err(Error::Config(format!(
                "bundle compression_level must be between 1 and 22, got {}",
                level
            )));
        }
        Ok(EngineOptions {
            csv_delimiter: self.csv_delimiter()?,
            compression_level: level,
        })
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# quiver session configuration
#
# Floating-point errors raised by elementwise operations (division by zero,
# invalid operations): "warn" (default) logs one warning per operation,
# "ignore" drops them.
float_errors = "warn"

# Log and skip sources that fail to load instead of failing the whole load.
skip_invalid_sources = false

[csv]
delimiter = ","

[bundle]
# zstd level, 1 (fast) to 22 (small)
compression_level = 3
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: SessionConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.engine_options()?;
        Ok(config)
    }

    /// Configuration stored next to `source`
    ///
    /// Looks for [`CONFIG_FILE_NAME`] in `source` itself when it is a
    /// directory, otherwise in its parent (a file or a glob pattern). No
    /// config file gives the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated.
    pub fn discover(source: &Path) -> Result<Self> {
        let dir = if source.is_dir() {
            source
        } else {
            source.parent().unwrap_or_else(|| Path::new(""))
        };
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(Self::default());
        }
        debug!(target: "quiver::session", path = %path.display(), "Using config file");
        Self::from_file(&path)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::Config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

impl fmt::Display for FloatErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FloatErrorPolicy::Warn => f.write_str("warn"),
            FloatErrorPolicy::Ignore => f.write_str("ignore"),
        }
    }
}

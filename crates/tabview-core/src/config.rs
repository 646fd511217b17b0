//! View configuration
//!
//! Stored as TOML, e.g. `~/.config/tabview/tabview.toml`:
//!
//! ```toml
//! default_page_size = 25
//! max_page_size = 200
//! refresh_interval_secs = 10
//! ```

use crate::error::{CoreError, Result};
use crate::paginate::PageRequest;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Defaults and limits applied by the presentation shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Page size when the caller does not ask for one
    pub default_page_size: usize,

    /// Largest page size honoured; larger requests are clamped
    pub max_page_size: usize,

    /// Interval between timer-driven refreshes
    pub refresh_interval_secs: u64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 500,
            refresh_interval_secs: 5,
        }
    }
}

impl ViewConfig {
    /// Load and validate a TOML config file; missing keys take defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| CoreError::TomlParse {
            path: path.to_path_buf(),
            message: source.message().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// `load(path)` when a path is given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 {
            return Err(CoreError::InvalidConfig {
                message: "default_page_size must be positive".to_string(),
            });
        }
        if self.default_page_size > self.max_page_size {
            return Err(CoreError::InvalidConfig {
                message: format!(
                    "default_page_size ({}) exceeds max_page_size ({})",
                    self.default_page_size, self.max_page_size
                ),
            });
        }
        if self.refresh_interval_secs == 0 {
            return Err(CoreError::InvalidConfig {
                message: "refresh_interval_secs must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Page request with the default size filled in and the max applied
    ///
    /// An explicit size of 0 is passed through so the paginator reports it.
    pub fn page_request(&self, page_index: usize, page_size: Option<usize>) -> PageRequest {
        let size = match page_size {
            None => self.default_page_size,
            Some(size) if size > self.max_page_size => {
                tracing::warn!(
                    requested = size,
                    max = self.max_page_size,
                    "Page size clamped to maximum"
                );
                self.max_page_size
            }
            Some(size) => size,
        };
        PageRequest::new(page_index, size)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Serialize back to TOML (for `config --show`)
    pub fn to_toml(&self) -> String {
        // Three integer fields always serialize
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ViewConfig::default().validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_page_size = 25").unwrap();

        let config = ViewConfig::load(file.path()).unwrap();
        assert_eq!(config.default_page_size, 25);
        assert_eq!(config.max_page_size, 500);
    }

    #[test]
    fn test_load_rejects_inconsistent_sizes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_page_size = 50\nmax_page_size = 20").unwrap();

        let err = ViewConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
    }

    #[test]
    fn test_load_reports_toml_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_page_size = \"ten\"").unwrap();

        let err = ViewConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, CoreError::TomlParse { .. }));
    }

    #[test]
    fn test_page_request_clamps() {
        let config = ViewConfig::default();
        assert_eq!(config.page_request(2, None), PageRequest::new(2, 10));
        assert_eq!(config.page_request(1, Some(10_000)), PageRequest::new(1, 500));
        assert_eq!(config.page_request(1, Some(0)), PageRequest::new(1, 0));
    }

    #[test]
    fn test_to_toml_round_trip() {
        let config = ViewConfig {
            default_page_size: 20,
            ..ViewConfig::default()
        };
        let parsed: ViewConfig = toml::from_str(&config.to_toml()).unwrap();
        assert_eq!(parsed, config);
    }
}

//! Interpreter configuration
//!
//! Read from a TOML file:
//!
//! ```toml
//! [interpreter]
//! max_call_depth = 256
//! stdlib = true
//! trace_loops = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnostics::Error;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub interpreter: InterpreterConfig,
}

/// `[interpreter]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterpreterConfig {
    /// Nested user function calls allowed before `CallDepthExceeded`
    pub max_call_depth: usize,
    /// Pre-bind the standard library (`print`, `printi`, ...)
    pub stdlib: bool,
    /// Log every loop iteration at `trace` level
    pub trace_loops: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            max_call_depth: 256,
            stdlib: true,
            trace_loops: false,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.interpreter.max_call_depth, 256);
        assert!(config.interpreter.stdlib);
    }

    #[test]
    fn test_partial_table() {
        let config = Config::from_toml_str("[interpreter]\nmax_call_depth = 32\n").unwrap();
        assert_eq!(config.interpreter.max_call_depth, 32);
        assert!(config.interpreter.stdlib);
        assert!(!config.interpreter.trace_loops);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Config::from_toml_str("[interpreter]\njit = true\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/nonexistent/tigris.toml").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}

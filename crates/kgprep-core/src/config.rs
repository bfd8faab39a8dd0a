//! kgprep Configuration Management
//!
//! Settings come from an optional TOML file, then environment variables,
//! then command-line flags. Every field has a default so running without
//! any configuration reproduces the plain export behaviour.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main preprocessing configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Delimited output dialect
    pub output: OutputConfig,

    /// Sparse matrix export policies
    pub matrix: MatrixConfig,
}

impl PreprocessConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("KGPREP_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("KGPREP_LOG_JSON") {
            self.logging.json_format = parse_bool("KGPREP_LOG_JSON", &json)?;
        }
        if let Some(policy) = lookup("KGPREP_MATRIX_LITERALS") {
            self.matrix.literals = policy.parse()?;
        }
        if let Some(orientation) = lookup("KGPREP_MATRIX_ORIENTATION") {
            self.matrix.orientation = orientation.parse()?;
        }

        Ok(self)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.output.validate()
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Dialect of the delimited output files
///
/// Fields are quoted only when they contain the delimiter, the quote
/// character or a line terminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Field delimiter
    pub delimiter: char,

    /// Quote character
    pub quote: char,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            delimiter: '\t',
            quote: '|',
        }
    }
}

impl OutputConfig {
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    pub fn quote_byte(&self) -> u8 {
        self.quote as u8
    }

    /// Delimiter and quote must be distinct single-byte characters
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, c) in [("output.delimiter", self.delimiter), ("output.quote", self.quote)] {
            if !c.is_ascii() || c == '\n' || c == '\r' {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: c.escape_default().to_string(),
                });
            }
        }
        if self.delimiter == self.quote {
            return Err(ConfigError::InvalidValue {
                key: "output.quote".to_string(),
                value: self.quote.escape_default().to_string(),
            });
        }
        Ok(())
    }
}

/// Sparse matrix export configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    /// Whether literal-object triples become graph edges
    pub literals: LiteralPolicy,

    /// Adjacency orientation
    pub orientation: Orientation,
}

/// Treatment of triples whose object is a literal when building the graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralPolicy {
    /// Literals become nodes, every triple becomes an edge
    #[default]
    Include,
    /// Literal-object triples are dropped, as in the index files
    Exclude,
}

impl std::str::FromStr for LiteralPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "include" => Ok(Self::Include),
            "exclude" => Ok(Self::Exclude),
            _ => Err(ConfigError::InvalidValue {
                key: "matrix.literals".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for LiteralPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Include => write!(f, "include"),
            Self::Exclude => write!(f, "exclude"),
        }
    }
}

/// Orientation of the adjacency matrix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Entry (s, o) counts triples from s to o
    #[default]
    Directed,
    /// Entries are symmetric; self loops are counted once
    Undirected,
}

impl std::str::FromStr for Orientation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "directed" => Ok(Self::Directed),
            "undirected" => Ok(Self::Undirected),
            _ => Err(ConfigError::InvalidValue {
                key: "matrix.orientation".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directed => write!(f, "directed"),
            Self::Undirected => write!(f, "undirected"),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PreprocessConfig::default();
        assert_eq!(config.output.delimiter, '\t');
        assert_eq!(config.output.quote, '|');
        assert_eq!(config.matrix.literals, LiteralPolicy::Include);
        assert_eq!(config.matrix.orientation, Orientation::Directed);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(
            "exclude".parse::<LiteralPolicy>().unwrap(),
            LiteralPolicy::Exclude
        );
        assert_eq!(
            "Undirected".parse::<Orientation>().unwrap(),
            Orientation::Undirected
        );
        assert!("sometimes".parse::<LiteralPolicy>().is_err());
        assert!("sideways".parse::<Orientation>().is_err());
    }

    #[test]
    fn test_env_override() {
        let env: HashMap<&str, &str> = [
            ("KGPREP_LOG_LEVEL", "debug"),
            ("KGPREP_LOG_JSON", "true"),
            ("KGPREP_MATRIX_LITERALS", "exclude"),
        ]
        .into_iter()
        .collect();

        let config = PreprocessConfig::default()
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
        assert_eq!(config.matrix.literals, LiteralPolicy::Exclude);
        assert_eq!(config.matrix.orientation, Orientation::Directed);
    }

    #[test]
    fn test_env_override_invalid_value() {
        let result = PreprocessConfig::default().apply_env(|key| {
            (key == "KGPREP_MATRIX_ORIENTATION").then(|| "diagonal".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\ndelimiter = \",\"\n\n[matrix]\norientation = \"undirected\"").unwrap();

        let config = PreprocessConfig::from_file(file.path()).unwrap();
        assert_eq!(config.output.delimiter, ',');
        assert_eq!(config.output.quote, '|');
        assert_eq!(config.matrix.orientation, Orientation::Undirected);
        assert_eq!(config.matrix.literals, LiteralPolicy::Include);
    }

    #[test]
    fn test_from_file_rejects_same_delimiter_and_quote() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\ndelimiter = \"|\"").unwrap();

        let result = PreprocessConfig::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_from_file_missing() {
        let result = PreprocessConfig::from_file("/nonexistent/kgprep.toml");
        assert!(matches!(result, Err(ConfigError::FileReadError { .. })));
    }
}

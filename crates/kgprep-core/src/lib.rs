//! kgprep Core - Data model, errors and shared types
//!
//! This crate defines the abstractions shared by every export path:
//! - RDF term model (identifiers, literals, triples)
//! - Input format detection
//! - Output path derivation
//! - Common error types
//! - Configuration management

pub mod config;
pub mod paths;

pub use config::{
    ConfigError, LiteralPolicy, LoggingConfig, MatrixConfig, Orientation, OutputConfig,
    PreprocessConfig,
};
pub use paths::OutputPaths;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for kgprep operations
#[derive(Error, Debug)]
pub enum KgError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed RDF in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KgError {
    /// Wrap an IO error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, KgError>;

// ============================================================================
// Term Model
// ============================================================================

/// A literal value, optionally typed or language-tagged
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    /// Lexical form
    pub value: String,

    /// Datatype IRI
    pub datatype: Option<String>,

    /// Language tag; not part of the canonical text
    pub language: Option<String>,
}

impl Literal {
    /// Create a plain literal
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// Set the datatype IRI
    pub fn with_datatype(mut self, datatype: impl Into<String>) -> Self {
        self.datatype = Some(datatype.into());
        self
    }

    /// Set the language tag
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.datatype {
            Some(datatype) => write!(f, "{}^^{}", self.value, datatype),
            None => f.write_str(&self.value),
        }
    }
}

/// Object position of a triple: an identifier or a literal
///
/// Identifiers are IRIs (stored without angle brackets), blank nodes
/// (stored as `_:id`) or quoted triples (stored in N-Triples form).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    Identifier(String),
    Literal(Literal),
}

impl Term {
    /// Create an identifier term
    pub fn identifier(text: impl Into<String>) -> Self {
        Self::Identifier(text.into())
    }

    /// Create a plain literal term
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(Literal::new(value))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// Canonical textual form used for keys, sorting and output
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Identifier(text) => Cow::Borrowed(text),
            Self::Literal(lit) if lit.datatype.is_none() => Cow::Borrowed(&lit.value),
            Self::Literal(lit) => Cow::Owned(lit.to_string()),
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier(text) => f.write_str(text),
            Self::Literal(lit) => lit.fmt(f),
        }
    }
}

/// A subject-predicate-object statement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    /// Subject identifier text
    pub subject: String,

    /// Predicate identifier text
    pub predicate: String,

    /// Object term
    pub object: Term,
}

impl Triple {
    /// Create a new triple
    pub fn new(subject: impl Into<String>, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object,
        }
    }

    /// Triples with a literal object are excluded from entity indexing
    pub fn has_literal_object(&self) -> bool {
        self.object.is_literal()
    }
}

// ============================================================================
// Input Formats
// ============================================================================

/// Supported RDF serializations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RdfFormat {
    #[default]
    NTriples,
    Turtle,
}

impl RdfFormat {
    /// Detect format from extension, `None` when the extension is not recognised
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "nt" | "ntriples" => Some(Self::NTriples),
            "ttl" | "turtle" => Some(Self::Turtle),
            _ => None,
        }
    }

    /// Detect format from path, defaulting to N-Triples
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .unwrap_or_default()
    }
}

impl std::str::FromStr for RdfFormat {
    type Err = KgError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_extension(s)
            .ok_or_else(|| KgError::InvalidInput(format!("unknown RDF format: {s}")))
    }
}

impl std::fmt::Display for RdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NTriples => write!(f, "ntriples"),
            Self::Turtle => write!(f, "turtle"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

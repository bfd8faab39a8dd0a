//! kgprep Parser - RDF parsing for triple-store dumps
//!
//! Supports parsing of:
//! - N-Triples (`.nt`)
//! - Turtle (`.ttl`)
//!
//! Parsed statements are converted to `kgprep_core::Triple`, whose terms
//! carry their canonical textual form. A triple store is a set: repeated
//! statements are kept once, at their first position. Any syntax error
//! aborts the whole parse; there is no partial recovery.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::io::BufRead;
use std::path::Path;

use kgprep_core::{KgError, Literal, RdfFormat, Term, Triple};
use rio_api::model::{self as rio, NamedNode, Subject};
use rio_api::parser::TriplesParser;
use rio_turtle::{NTriplesParser, TurtleError, TurtleParser};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while reading a triple store
#[derive(Error, Debug)]
pub enum ParserError {
    /// IO error while opening the file
    #[error("IO error reading file: {path}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Syntax error reported by the RDF parser
    #[error("Malformed {format} in {path}: {source}")]
    Syntax {
        path: String,
        format: RdfFormat,
        #[source]
        source: TurtleError,
    },
}

pub type Result<T> = std::result::Result<T, ParserError>;

impl From<ParserError> for KgError {
    fn from(err: ParserError) -> Self {
        match err {
            ParserError::IoError { path, source } => KgError::io(path, source),
            ParserError::Syntax { path, source, .. } => KgError::Parse {
                path: path.into(),
                message: source.to_string(),
            },
        }
    }
}

// ============================================================================
// Term Conversion
// ============================================================================

fn subject_text(subject: Subject<'_>) -> String {
    match subject {
        Subject::NamedNode(node) => node.iri.to_string(),
        Subject::BlankNode(node) => format!("_:{}", node.id),
        Subject::Triple(triple) => triple.to_string(),
    }
}

fn object_term(object: rio::Term<'_>) -> Term {
    match object {
        rio::Term::NamedNode(node) => Term::Identifier(node.iri.to_string()),
        rio::Term::BlankNode(node) => Term::Identifier(format!("_:{}", node.id)),
        rio::Term::Triple(triple) => Term::Identifier(triple.to_string()),
        rio::Term::Literal(rio::Literal::Simple { value }) => Term::literal(value),
        rio::Term::Literal(rio::Literal::LanguageTaggedString { value, language }) => {
            Term::Literal(Literal::new(value).with_language(language))
        }
        rio::Term::Literal(rio::Literal::Typed { value, datatype }) => {
            Term::Literal(Literal::new(value).with_datatype(datatype.iri))
        }
    }
}

/// Convert a borrowed rio triple to an owned triple
pub fn convert_triple(triple: rio::Triple<'_>) -> Triple {
    let NamedNode { iri: predicate } = triple.predicate;
    Triple {
        subject: subject_text(triple.subject),
        predicate: predicate.to_string(),
        object: object_term(triple.object),
    }
}

// ============================================================================
// Parsing
// ============================================================================

fn collect_triples<P>(mut parser: P) -> std::result::Result<Vec<Triple>, TurtleError>
where
    P: TriplesParser<Error = TurtleError>,
{
    let mut seen = HashSet::new();
    let mut triples = Vec::new();
    parser.parse_all(&mut |triple| {
        let triple = convert_triple(triple);
        if seen.insert(triple.clone()) {
            triples.push(triple);
        }
        Ok(()) as std::result::Result<(), TurtleError>
    })?;
    Ok(triples)
}

/// Parse every distinct triple from a reader, in document order
pub fn parse_reader<R: BufRead>(
    reader: R,
    format: RdfFormat,
) -> std::result::Result<Vec<Triple>, TurtleError> {
    match format {
        RdfFormat::NTriples => collect_triples(NTriplesParser::new(reader)),
        RdfFormat::Turtle => collect_triples(TurtleParser::new(reader, None)),
    }
}

/// Parse triples from an in-memory document
pub fn parse_str(content: &str, format: RdfFormat) -> Result<Vec<Triple>> {
    parse_reader(content.as_bytes(), format).map_err(|source| ParserError::Syntax {
        path: "<memory>".to_string(),
        format,
        source,
    })
}

/// Parse a triple-store file into memory
pub fn parse_file(path: &Path, format: RdfFormat) -> Result<Vec<Triple>> {
    let file = File::open(path).map_err(|e| ParserError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    tracing::info!(path = %path.display(), %format, "Reading RDF graph ...");
    let triples =
        parse_reader(BufReader::new(file), format).map_err(|source| ParserError::Syntax {
            path: path.display().to_string(),
            format,
            source,
        })?;
    tracing::debug!(triples = triples.len(), "Parsed triple store");

    Ok(triples)
}

// ============================================================================
// Tests
// ============================================================================

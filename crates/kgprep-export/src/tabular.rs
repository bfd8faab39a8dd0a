//! Delimited writers and the flat triple export
//!
//! Rows are written with minimal quoting: a field is quoted only when it
//! contains the delimiter, the quote character or a line terminator.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use kgprep_core::{KgError, OutputConfig, OutputPaths, RdfFormat, Result, Triple};

/// Build a delimited writer for the configured dialect
pub fn delimited_writer<W: Write>(writer: W, config: &OutputConfig) -> Writer<W> {
    WriterBuilder::new()
        .delimiter(config.delimiter_byte())
        .quote(config.quote_byte())
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true)
        .terminator(Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(writer)
}

fn create(path: &Path, config: &OutputConfig) -> Result<Writer<File>> {
    let file = File::create(path).map_err(|e| KgError::io(path, e))?;
    Ok(delimited_writer(file, config))
}

pub(crate) fn csv_error(path: &Path, err: csv::Error) -> KgError {
    match err.into_kind() {
        csv::ErrorKind::Io(source) => KgError::io(path, source),
        other => KgError::Serialization(format!("{}: {:?}", path.display(), other)),
    }
}

/// Write `<label>\t<position>` rows
pub fn write_index<W: Write>(writer: &mut Writer<W>, labels: &[String]) -> csv::Result<()> {
    for (idx, label) in labels.iter().enumerate() {
        writer.write_record([label.as_str(), idx.to_string().as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write an index file, one row per label in the given order
pub fn write_index_file(path: &Path, labels: &[String], config: &OutputConfig) -> Result<()> {
    let mut writer = create(path, config)?;
    write_index(&mut writer, labels).map_err(|e| csv_error(path, e))
}

// ============================================================================
// Triple Flattener
// ============================================================================

/// Streams triples as `subject\tpredicate\tobject` rows
pub struct TripleWriter<W: Write> {
    writer: Writer<W>,
    entities_only: bool,
    rows: usize,
    skipped: usize,
}

impl<W: Write> TripleWriter<W> {
    /// Create a triple writer over any sink
    pub fn new(writer: W, config: &OutputConfig) -> Self {
        Self {
            writer: delimited_writer(writer, config),
            entities_only: false,
            rows: 0,
            skipped: 0,
        }
    }

    /// Skip triples whose object is a literal
    pub fn with_entities_only(mut self, enabled: bool) -> Self {
        self.entities_only = enabled;
        self
    }

    /// Write one triple, returning whether a row was emitted
    pub fn write_triple(&mut self, triple: &Triple) -> csv::Result<bool> {
        if self.entities_only && triple.has_literal_object() {
            self.skipped += 1;
            return Ok(false);
        }

        let object = triple.object.as_text();
        self.writer.write_record([
            triple.subject.as_str(),
            triple.predicate.as_str(),
            object.as_ref(),
        ])?;
        self.rows += 1;
        Ok(true)
    }

    /// Number of rows written so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of literal-object triples skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Flush and return the underlying sink
    pub fn finish(self) -> csv::Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }
}

/// Result of a flat triple export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenReport {
    /// Output file
    pub path: PathBuf,

    /// Triples parsed from the input
    pub triples_read: usize,

    /// Rows written
    pub rows_written: usize,

    /// Literal-object triples left out
    pub skipped_literals: usize,
}

/// Write `<name>_triples.tsv` next to the input
pub fn flatten_triples(
    input: &Path,
    format: RdfFormat,
    entities_only: bool,
    config: &OutputConfig,
) -> Result<FlattenReport> {
    let triples = kgprep_parser::parse_file(input, format)?;
    let path = OutputPaths::for_input(input).triples();

    tracing::info!(path = %path.display(), entities_only, "Writing tab-separated triples ...");
    let file = File::create(&path).map_err(|e| KgError::io(&path, e))?;
    let mut writer = TripleWriter::new(file, config).with_entities_only(entities_only);
    for triple in &triples {
        writer.write_triple(triple).map_err(|e| csv_error(&path, e))?;
    }

    let report = FlattenReport {
        path: path.clone(),
        triples_read: triples.len(),
        rows_written: writer.rows(),
        skipped_literals: writer.skipped(),
    };
    writer.finish().map_err(|e| csv_error(&path, e))?;

    tracing::debug!(
        rows = report.rows_written,
        skipped = report.skipped_literals,
        "Triples written"
    );
    Ok(report)
}

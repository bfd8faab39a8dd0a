//! Entity and relation index files
//!
//! Triples with a literal object contribute nothing. For every other
//! triple the subject and object text join the entity set and the
//! predicate text joins the relation set. Each set is sorted by textual
//! form and every element is paired with its zero-based position, so the
//! mapping is a bijection onto `[0, n)` and identical input always yields
//! identical files.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use kgprep_core::{OutputConfig, OutputPaths, RdfFormat, Result, Triple};

use crate::tabular::write_index_file;

/// Collects distinct entities and relations
#[derive(Debug, Clone, Default)]
pub struct IndexBuilder {
    entities: BTreeSet<String>,
    relations: BTreeSet<String>,
    skipped: usize,
}

impl IndexBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a triple, returning whether it contributed to the index
    pub fn add(&mut self, triple: &Triple) -> bool {
        if triple.has_literal_object() {
            self.skipped += 1;
            return false;
        }

        self.entities.insert(triple.subject.clone());
        self.entities.insert(triple.object.as_text().into_owned());
        self.relations.insert(triple.predicate.clone());
        true
    }

    /// Add every triple from an iterator
    pub fn extend<'a>(&mut self, triples: impl IntoIterator<Item = &'a Triple>) {
        for triple in triples {
            self.add(triple);
        }
    }

    /// Literal-object triples seen so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Materialize the sorted index mapping
    pub fn finish(self) -> IndexMapping {
        IndexMapping {
            entities: self.entities.into_iter().collect(),
            relations: self.relations.into_iter().collect(),
        }
    }
}

/// Sorted entity and relation sequences; position is the index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexMapping {
    entities: Vec<String>,
    relations: Vec<String>,
}

impl IndexMapping {
    /// Build a mapping directly from triples
    pub fn from_triples<'a>(triples: impl IntoIterator<Item = &'a Triple>) -> Self {
        let mut builder = IndexBuilder::new();
        builder.extend(triples);
        builder.finish()
    }

    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    pub fn entity_index(&self, text: &str) -> Option<usize> {
        self.entities
            .binary_search_by(|probe| probe.as_str().cmp(text))
            .ok()
    }

    pub fn relation_index(&self, text: &str) -> Option<usize> {
        self.relations
            .binary_search_by(|probe| probe.as_str().cmp(text))
            .ok()
    }
}

/// Result of writing the index files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReport {
    /// Entity index file
    pub entity_path: PathBuf,

    /// Relation index file
    pub relation_path: PathBuf,

    /// Triples parsed from the input
    pub triples_read: usize,

    /// Literal-object triples left out
    pub skipped_literals: usize,

    /// Distinct entities written
    pub entities: usize,

    /// Distinct relations written
    pub relations: usize,
}

/// Write `<name>_entity_idx` and `<name>_relations_idx` next to the input
pub fn build_index_files(
    input: &Path,
    format: RdfFormat,
    config: &OutputConfig,
) -> Result<IndexReport> {
    let triples = kgprep_parser::parse_file(input, format)?;

    tracing::info!("Collecting entities and relations ...");
    let mut builder = IndexBuilder::new();
    builder.extend(&triples);
    let triples_read = triples.len();
    let skipped_literals = builder.skipped();
    let mapping = builder.finish();
    drop(triples);

    let paths = OutputPaths::for_input(input);
    let entity_path = paths.entity_index();
    let relation_path = paths.relation_index();

    tracing::info!(path = %entity_path.display(), "Writing entity index ...");
    write_index_file(&entity_path, mapping.entities(), config)?;
    tracing::info!(path = %relation_path.display(), "Writing relation index ...");
    write_index_file(&relation_path, mapping.relations(), config)?;

    tracing::debug!(
        entities = mapping.entities().len(),
        relations = mapping.relations().len(),
        skipped_literals,
        "Index files written"
    );

    Ok(IndexReport {
        entity_path,
        relation_path,
        triples_read,
        skipped_literals,
        entities: mapping.entities().len(),
        relations: mapping.relations().len(),
    })
}

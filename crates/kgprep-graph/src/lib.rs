//! kgprep Graph - Sparse adjacency export of a triple store
//!
//! Triples are loaded into a directed multigraph (one edge per triple),
//! converted to a CSR adjacency matrix and written as a scipy-compatible
//! `.npz` archive.
//!
//! Matrix rows follow the graph's node numbering, which is first-seen
//! order over the input. That is NOT the lexicographic order of the
//! entity index file; [`MatrixReport::matches_index_order`] reports
//! whether the two happen to agree, and the exporter can write the row
//! labels next to the matrix.

pub mod npz;
pub mod sparse;

pub use npz::{read_npz, write_npz, NpyArray};
pub use sparse::CsrMatrix;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use kgprep_core::{
    LiteralPolicy, MatrixConfig, OutputConfig, OutputPaths, RdfFormat, Result, Triple,
};
use kgprep_export::{write_index_file, IndexMapping};
use petgraph::graph::{DiGraph, NodeIndex};

// ============================================================================
// Triple Graph
// ============================================================================

/// Directed multigraph keyed by canonical term text
///
/// Node weights are the term text, edge weights the predicate text.
#[derive(Debug, Clone, Default)]
pub struct TripleGraph {
    graph: DiGraph<String, String>,
    nodes: HashMap<String, NodeIndex>,
}

impl TripleGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from triples in order
    pub fn from_triples<'a>(
        triples: impl IntoIterator<Item = &'a Triple>,
        policy: LiteralPolicy,
    ) -> Self {
        let mut graph = Self::new();
        for triple in triples {
            graph.add_triple(triple, policy);
        }
        graph
    }

    fn node(&mut self, text: &str) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(text) {
            return idx;
        }
        let idx = self.graph.add_node(text.to_string());
        self.nodes.insert(text.to_string(), idx);
        idx
    }

    /// Add one triple as an edge, returning whether it was kept
    pub fn add_triple(&mut self, triple: &Triple, policy: LiteralPolicy) -> bool {
        if policy == LiteralPolicy::Exclude && triple.has_literal_object() {
            return false;
        }

        let subject = self.node(&triple.subject);
        let object = self.node(&triple.object.as_text());
        self.graph
            .add_edge(subject, object, triple.predicate.clone());
        true
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Matrix row/column of a node
    pub fn node_index(&self, text: &str) -> Option<usize> {
        self.nodes.get(text).map(|idx| idx.index())
    }

    /// Node labels in matrix row order
    pub fn node_labels(&self) -> Vec<String> {
        self.graph.node_weights().cloned().collect()
    }

    /// Underlying petgraph graph
    pub fn inner(&self) -> &DiGraph<String, String> {
        &self.graph
    }
}

// ============================================================================
// Matrix Exporter
// ============================================================================

/// Result of a sparse matrix export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixReport {
    /// Matrix archive
    pub path: PathBuf,

    /// Row label file, when requested
    pub nodes_path: Option<PathBuf>,

    /// Triples parsed from the input
    pub triples_read: usize,

    /// Matrix dimension
    pub nodes: usize,

    /// Triples that became edges
    pub edges: usize,

    /// Stored matrix entries
    pub nnz: usize,

    /// Whether row order equals the entity index order
    pub matches_index_order: bool,
}

/// Converts a triple-store file into a sparse adjacency matrix
#[derive(Debug, Clone, Default)]
pub struct MatrixExporter {
    config: MatrixConfig,
    output: OutputConfig,
    write_node_order: bool,
}

impl MatrixExporter {
    /// Create an exporter with the given policies
    pub fn new(config: MatrixConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Dialect used for the row label file
    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    /// Also write `<name>_matrix_nodes` with the row labels
    pub fn with_node_order(mut self, enabled: bool) -> Self {
        self.write_node_order = enabled;
        self
    }

    /// Write `<name>.npz` next to the input
    pub fn export(&self, input: &Path, format: RdfFormat) -> Result<MatrixReport> {
        let triples = kgprep_parser::parse_file(input, format)?;
        let triples_read = triples.len();

        tracing::info!(
            literals = %self.config.literals,
            "Converting RDF graph to multigraph ..."
        );
        let graph = TripleGraph::from_triples(&triples, self.config.literals);
        let labels = graph.node_labels();
        let matches_index_order = IndexMapping::from_triples(&triples).entities() == labels;
        drop(triples);

        if !matches_index_order {
            tracing::warn!(
                "Matrix rows follow first-seen node order, not the entity index order"
            );
        }

        tracing::info!(
            orientation = %self.config.orientation,
            "Converting graph to sparse matrix format ..."
        );
        let (nodes, edges) = (graph.node_count(), graph.edge_count());
        let matrix = CsrMatrix::from_graph(&graph, self.config.orientation);
        drop(graph);

        let paths = OutputPaths::for_input(input);
        let path = paths.sparse_matrix();
        tracing::info!(path = %path.display(), "Writing sparse matrix ...");
        write_npz(&path, &matrix)?;

        let nodes_path = if self.write_node_order {
            let nodes_path = paths.matrix_nodes();
            write_index_file(&nodes_path, &labels, &self.output)?;
            Some(nodes_path)
        } else {
            None
        };

        tracing::debug!(nodes, edges, nnz = matrix.nnz(), "Sparse matrix written");
        Ok(MatrixReport {
            path,
            nodes_path,
            triples_read,
            nodes,
            edges,
            nnz: matrix.nnz(),
            matches_index_order,
        })
    }
}

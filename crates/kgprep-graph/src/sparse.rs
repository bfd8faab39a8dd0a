//! Compressed sparse row adjacency matrix

use std::collections::BTreeMap;

use kgprep_core::{KgError, Orientation, Result};
use petgraph::visit::EdgeRef;

use crate::TripleGraph;

/// Square-or-rectangular matrix in CSR layout
///
/// Row `r` occupies `indices[indptr[r]..indptr[r + 1]]`, with column
/// indices strictly increasing inside a row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsrMatrix {
    shape: (usize, usize),
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<i64>,
}

impl CsrMatrix {
    /// Assemble a matrix from raw CSR arrays, checking their consistency
    pub fn from_parts(
        shape: (usize, usize),
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<i64>,
    ) -> Result<Self> {
        let (rows, cols) = shape;
        if indptr.len() != rows + 1 {
            return Err(KgError::InvalidInput(format!(
                "indptr has {} entries, expected {}",
                indptr.len(),
                rows + 1
            )));
        }
        if indices.len() != data.len() || indptr.last() != Some(&indices.len()) {
            return Err(KgError::InvalidInput(
                "indices, data and indptr disagree on the number of entries".to_string(),
            ));
        }
        if indptr.first() != Some(&0) || indptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(KgError::InvalidInput("indptr is not monotonic".to_string()));
        }
        for row in indptr.windows(2) {
            let cells = &indices[row[0]..row[1]];
            if cells.windows(2).any(|w| w[0] >= w[1]) || cells.iter().any(|&c| c >= cols) {
                return Err(KgError::InvalidInput(
                    "column indices are unsorted or out of bounds".to_string(),
                ));
            }
        }

        Ok(Self {
            shape,
            indptr,
            indices,
            data,
        })
    }

    /// Adjacency matrix of a triple graph
    ///
    /// Entry `(i, j)` counts the triples from node `i` to node `j`. With
    /// [`Orientation::Undirected`] every edge is counted in both directions,
    /// except self loops which are counted once.
    pub fn from_graph(graph: &TripleGraph, orientation: Orientation) -> Self {
        let n = graph.node_count();
        let mut rows: Vec<BTreeMap<usize, i64>> = vec![BTreeMap::new(); n];

        for edge in graph.inner().edge_references() {
            let (source, target) = (edge.source().index(), edge.target().index());
            *rows[source].entry(target).or_insert(0) += 1;
            if orientation == Orientation::Undirected && source != target {
                *rows[target].entry(source).or_insert(0) += 1;
            }
        }

        let nnz = rows.iter().map(BTreeMap::len).sum();
        let mut indptr = Vec::with_capacity(n + 1);
        let mut indices = Vec::with_capacity(nnz);
        let mut data = Vec::with_capacity(nnz);

        indptr.push(0);
        for row in rows {
            for (col, count) in row {
                indices.push(col);
                data.push(count);
            }
            indptr.push(indices.len());
        }

        Self {
            shape: (n, n),
            indptr,
            indices,
            data,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn data(&self) -> &[i64] {
        &self.data
    }

    /// Value at `(row, col)`, zero when not stored
    pub fn get(&self, row: usize, col: usize) -> i64 {
        if row >= self.shape.0 {
            return 0;
        }
        let (start, end) = (self.indptr[row], self.indptr[row + 1]);
        match self.indices[start..end].binary_search(&col) {
            Ok(pos) => self.data[start + pos],
            Err(_) => 0,
        }
    }

    /// Sum of all entries
    pub fn total(&self) -> i64 {
        self.data.iter().sum()
    }
}

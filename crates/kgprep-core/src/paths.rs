//! Output path derivation
//!
//! Every export writes next to its input, named after the input with the
//! extension removed.

use std::path::{Path, PathBuf};

/// Output locations derived from one input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// Directory of the input file
    pub dir: PathBuf,

    /// Input file name without its extension
    pub name: String,
}

impl OutputPaths {
    /// Derive output paths for an input file
    pub fn for_input(input: &Path) -> Self {
        let dir = input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let name = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self { dir, name }
    }

    fn join(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{}", self.name, suffix))
    }

    pub fn entity_index(&self) -> PathBuf {
        self.join("_entity_idx")
    }

    pub fn relation_index(&self) -> PathBuf {
        self.join("_relations_idx")
    }

    pub fn triples(&self) -> PathBuf {
        self.join("_triples.tsv")
    }

    pub fn sparse_matrix(&self) -> PathBuf {
        self.join(".npz")
    }

    /// Row labels of the sparse matrix
    pub fn matrix_nodes(&self) -> PathBuf {
        self.join("_matrix_nodes")
    }
}

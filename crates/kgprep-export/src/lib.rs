//! kgprep Export - Delimited exports of a triple store
//!
//! Two independent export paths over the same parsed input:
//! - [`index`]: deduplicated, sorted entity and relation index files
//! - [`tabular`]: one row per triple, in parse order
//!
//! Both write with the minimal-quoting dialect configured in
//! [`kgprep_core::OutputConfig`].

pub mod index;
pub mod tabular;

pub use index::{build_index_files, IndexBuilder, IndexMapping, IndexReport};
pub use tabular::{
    delimited_writer, flatten_triples, write_index, write_index_file, FlattenReport,
    TripleWriter,
};

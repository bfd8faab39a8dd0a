//! kgprep CLI - Prepare RDF dumps for knowledge graph embedding
//!
//! Usage:
//!   kgprep preprocess build-index-files <file>
//!   kgprep preprocess to-sparse-matrix <file>
//!   kgprep preprocess to-tab-separated <file> [--entities-only]

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use kgprep_core::{LiteralPolicy, LoggingConfig, Orientation, PreprocessConfig, RdfFormat};
use kgprep_graph::MatrixExporter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kgprep")]
#[command(about = "Prepare RDF knowledge graphs for TransE-style embedding training")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preprocess files for TransE
    Preprocess {
        #[command(subcommand)]
        action: PreprocessAction,
    },
}

#[derive(Subcommand)]
enum PreprocessAction {
    /// Create entity and relation index files
    BuildIndexFiles {
        /// Triple-store file (N-Triples or Turtle)
        file: PathBuf,

        /// Input format, detected from the extension by default
        #[arg(long)]
        format: Option<RdfFormat>,
    },
    /// Create a scipy sparse adjacency matrix
    ToSparseMatrix {
        /// Triple-store file (N-Triples or Turtle)
        file: PathBuf,

        /// Input format, detected from the extension by default
        #[arg(long)]
        format: Option<RdfFormat>,

        /// Whether literal-object triples become edges (include|exclude)
        #[arg(long)]
        literals: Option<LiteralPolicy>,

        /// Adjacency orientation (directed|undirected)
        #[arg(long)]
        orientation: Option<Orientation>,

        /// Also write the matrix row labels to <name>_matrix_nodes
        #[arg(long)]
        write_node_order: bool,
    },
    /// Write every triple as a tab-separated row
    ToTabSeparated {
        /// Triple-store file (N-Triples or Turtle)
        file: PathBuf,

        /// Input format, detected from the extension by default
        #[arg(long)]
        format: Option<RdfFormat>,

        /// Skip triples whose object is a literal
        #[arg(long)]
        entities_only: bool,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PreprocessConfig> {
    let config = match path {
        Some(path) => PreprocessConfig::from_file(path)?,
        None => PreprocessConfig::default(),
    };
    Ok(config.with_env_override()?)
}

fn init_tracing(config: &LoggingConfig, level_override: Option<&str>) {
    let filter = match level_override {
        Some(level) => EnvFilter::new(level),
        None => {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn input_format(file: &Path, format: Option<RdfFormat>) -> RdfFormat {
    format.unwrap_or_else(|| RdfFormat::from_path(file))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let level_override = if cli.verbose {
        Some("debug")
    } else if cli.quiet {
        Some("warn")
    } else {
        None
    };
    init_tracing(&config.logging, level_override);
    tracing::debug!(?config, "Configuration loaded");

    match cli.command {
        Commands::Preprocess { action } => match action {
            PreprocessAction::BuildIndexFiles { file, format } => {
                let report = kgprep_export::build_index_files(
                    &file,
                    input_format(&file, format),
                    &config.output,
                )
                .with_context(|| format!("Failed to build index files for {}", file.display()))?;

                println!(
                    "Wrote {} entities to {}",
                    report.entities,
                    report.entity_path.display()
                );
                println!(
                    "Wrote {} relations to {}",
                    report.relations,
                    report.relation_path.display()
                );
            }
            PreprocessAction::ToSparseMatrix {
                file,
                format,
                literals,
                orientation,
                write_node_order,
            } => {
                let mut matrix_config = config.matrix;
                if let Some(literals) = literals {
                    matrix_config.literals = literals;
                }
                if let Some(orientation) = orientation {
                    matrix_config.orientation = orientation;
                }

                let report = MatrixExporter::new(matrix_config)
                    .with_output(config.output.clone())
                    .with_node_order(write_node_order)
                    .export(&file, input_format(&file, format))
                    .with_context(|| {
                        format!("Failed to export sparse matrix for {}", file.display())
                    })?;

                println!(
                    "Wrote {n}x{n} sparse matrix ({} entries) to {}",
                    report.nnz,
                    report.path.display(),
                    n = report.nodes,
                );
                if let Some(nodes_path) = &report.nodes_path {
                    println!("Wrote matrix row labels to {}", nodes_path.display());
                }
            }
            PreprocessAction::ToTabSeparated {
                file,
                format,
                entities_only,
            } => {
                let report = kgprep_export::flatten_triples(
                    &file,
                    input_format(&file, format),
                    entities_only,
                    &config.output,
                )
                .with_context(|| format!("Failed to write triples for {}", file.display()))?;

                println!(
                    "Wrote {} of {} triples to {}",
                    report.rows_written,
                    report.triples_read,
                    report.path.display()
                );
            }
        },
    }

    Ok(())
}

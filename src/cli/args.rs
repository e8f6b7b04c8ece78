//! Command line argument parsing for the Pilum CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Pilum - a compressed inverted index with ranked retrieval
#[derive(Parser, Debug, Clone)]
#[command(name = "pilum")]
#[command(about = "Build and query compressed inverted indexes with BM25 ranking")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct PilumArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl PilumArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build an index from a document collection
    Build(BuildArgs),

    /// Run a single query against an index
    Search(SearchArgs),

    /// Run a query file against an index, producing a run file
    #[command(name = "batch-search")]
    BatchSearch(BatchSearchArgs),

    /// Show index statistics
    Stats(StatsArgs),
}

/// Arguments for building an index
#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    /// Collection file, one `docno<TAB>text` record per line
    #[arg(value_name = "COLLECTION")]
    pub collection: PathBuf,

    /// Directory to write the index into
    #[arg(value_name = "INDEX_PATH")]
    pub index_path: PathBuf,

    /// Index terms verbatim, without stop word removal or stemming
    #[arg(long)]
    pub no_stemming: bool,

    /// Store postings fixed-width instead of variable-byte compressed
    #[arg(long)]
    pub no_compression: bool,

    /// In-memory posting budget in MiB before flushing a partial block
    #[arg(long, value_name = "MIB")]
    pub memory_budget_mb: Option<usize>,

    /// Treat document text as already tokenized (split on whitespace only)
    #[arg(long)]
    pub pre_tokenized: bool,
}

/// Arguments for a single query
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Path to the index directory
    #[arg(value_name = "INDEX_PATH")]
    pub index_path: PathBuf,

    /// Query string
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// How query terms combine
    #[arg(short = 'm', long, default_value = "disjunctive")]
    pub mode: MatchMode,

    /// Scoring function for ranking
    #[arg(short = 's', long, default_value = "bm25")]
    pub scorer: Scorer,

    /// Maximum number of results to return
    #[arg(short = 'k', long, default_value = "10")]
    pub top_k: usize,
}

/// Arguments for batch query evaluation
#[derive(Parser, Debug, Clone)]
pub struct BatchSearchArgs {
    /// Path to the index directory
    #[arg(value_name = "INDEX_PATH")]
    pub index_path: PathBuf,

    /// Query file, one `queryID<TAB>query text` record per line
    #[arg(value_name = "QUERIES_FILE")]
    pub queries_file: PathBuf,

    /// Run name written in the last column of each output line
    #[arg(long, default_value = "pilum")]
    pub run_name: String,

    /// Write the run to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// How query terms combine
    #[arg(short = 'm', long, default_value = "disjunctive")]
    pub mode: MatchMode,

    /// Scoring function for ranking
    #[arg(short = 's', long, default_value = "bm25")]
    pub scorer: Scorer,

    /// Maximum number of results per query
    #[arg(short = 'k', long, default_value = "10")]
    pub top_k: usize,
}

/// Arguments for index statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Path to the index directory
    #[arg(value_name = "INDEX_PATH")]
    pub index_path: PathBuf,
}

/// Term combination modes
#[derive(ValueEnum, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Documents must contain every query term
    Conjunctive,
    /// Documents may contain any query term
    Disjunctive,
}

/// Scoring functions
#[derive(ValueEnum, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scorer {
    /// Okapi BM25
    Bm25,
    /// Logarithmic TF-IDF
    Tfidf,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_build_command() {
        let args = PilumArgs::try_parse_from([
            "pilum",
            "build",
            "collection.tsv",
            "/path/to/index",
            "--no-stemming",
            "--memory-budget-mb",
            "64",
        ])
        .unwrap();

        if let Command::Build(build_args) = args.command {
            assert_eq!(build_args.collection, PathBuf::from("collection.tsv"));
            assert_eq!(build_args.index_path, PathBuf::from("/path/to/index"));
            assert!(build_args.no_stemming);
            assert!(!build_args.no_compression);
            assert_eq!(build_args.memory_budget_mb, Some(64));
        } else {
            panic!("Expected Build command");
        }
    }

    #[test]
    fn test_basic_search_command() {
        let args = PilumArgs::try_parse_from([
            "pilum",
            "search",
            "/path/to/index",
            "test query",
            "--top-k",
            "20",
            "--mode",
            "conjunctive",
        ])
        .unwrap();

        if let Command::Search(search_args) = args.command {
            assert_eq!(search_args.index_path, PathBuf::from("/path/to/index"));
            assert_eq!(search_args.query, "test query");
            assert_eq!(search_args.top_k, 20);
            assert!(matches!(search_args.mode, MatchMode::Conjunctive));
            assert!(matches!(search_args.scorer, Scorer::Bm25));
        } else {
            panic!("Expected Search command");
        }
    }

    #[test]
    fn test_batch_search_defaults() {
        let args = PilumArgs::try_parse_from([
            "pilum",
            "batch-search",
            "/path/to/index",
            "topics.tsv",
        ])
        .unwrap();

        if let Command::BatchSearch(batch_args) = args.command {
            assert_eq!(batch_args.queries_file, PathBuf::from("topics.tsv"));
            assert_eq!(batch_args.run_name, "pilum");
            assert_eq!(batch_args.output, None);
            assert_eq!(batch_args.top_k, 10);
            assert!(matches!(batch_args.mode, MatchMode::Disjunctive));
        } else {
            panic!("Expected BatchSearch command");
        }
    }

    #[test]
    fn test_scorer_selection() {
        let args = PilumArgs::try_parse_from([
            "pilum",
            "search",
            "/path/to/index",
            "query",
            "--scorer",
            "tfidf",
        ])
        .unwrap();

        if let Command::Search(search_args) = args.command {
            assert!(matches!(search_args.scorer, Scorer::Tfidf));
        } else {
            panic!("Expected Search command");
        }
    }

    #[test]
    fn test_verbosity_levels() {
        // Default verbosity
        let args = PilumArgs::try_parse_from(["pilum", "stats", "idx"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        // Multiple verbose flags
        let args = PilumArgs::try_parse_from(["pilum", "-vv", "stats", "idx"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        // Quiet flag
        let args = PilumArgs::try_parse_from(["pilum", "--quiet", "stats", "idx"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args =
            PilumArgs::try_parse_from(["pilum", "--format", "json", "stats", "idx"]).unwrap();
        assert!(matches!(args.output_format, OutputFormat::Json));
    }
}

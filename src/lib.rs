//! # Pilum
//!
//! A compressed, disk-resident inverted index for ranked document retrieval.
//!
//! ## Features
//!
//! - Pure Rust implementation
//! - Single-pass in-memory indexing under a fixed memory budget
//! - N-way merge of partial blocks into one global index
//! - Variable-byte compressed postings with square-root skip blocks
//! - BM25 and TF-IDF ranking with MaxScore pruning
//! - Pluggable storage backends

pub mod analysis;
pub mod cli;
pub mod error;
pub mod index;
pub mod search;
pub mod storage;
pub mod util;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

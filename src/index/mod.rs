//! Index construction and on-disk structures.
//!
//! Building runs in three stages: the SPIMI builder accumulates postings and
//! flushes partial blocks, the merger folds those blocks into the global
//! posting streams with skip blocks and the lexicon, and the writer drives
//! both while maintaining the document table and collection statistics.

pub mod builder;
pub mod doc_table;
pub mod lexicon;
pub mod merge;
pub mod posting;
pub mod skip;
pub mod stats;
pub mod writer;

// Re-export commonly used types
pub use builder::BlockIndexBuilder;
pub use doc_table::{DocEntry, DocTable};
pub use lexicon::{Lexicon, TermEntry};
pub use merge::{MergeConfig, MergeStats, Merger};
pub use posting::{Posting, PostingList};
pub use skip::{CompressedPostingList, ListScoreBounds, SkipBlock};
pub use stats::CollectionStatistics;
pub use writer::{IndexSettings, IndexWriter, IndexWriterConfig};

//! Collection statistics, persisted as JSON alongside the index files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::Storage;

/// Name of the statistics file inside an index directory.
pub const STATS_FILE: &str = "stats.json";

/// Whole-collection statistics gathered during the build.
///
/// `avg_doc_len` is maintained as a running mean while documents are
/// ingested, so it is exact without a second pass over the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionStatistics {
    /// Number of partial blocks flushed during the build.
    pub block_count: u32,

    /// Number of indexed documents.
    pub doc_count: u64,

    /// Mean document length in terms.
    pub avg_doc_len: f64,

    /// Wall-clock build duration in seconds.
    pub build_time_secs: f64,

    /// When the index was built.
    pub built_at: DateTime<Utc>,
}

impl Default for CollectionStatistics {
    fn default() -> Self {
        CollectionStatistics {
            block_count: 0,
            doc_count: 0,
            avg_doc_len: 0.0,
            build_time_secs: 0.0,
            built_at: Utc::now(),
        }
    }
}

impl CollectionStatistics {
    /// Fold one document's length into the count and running mean.
    pub fn record_document(&mut self, doc_len: u32) {
        self.doc_count += 1;
        self.avg_doc_len += (doc_len as f64 - self.avg_doc_len) / self.doc_count as f64;
    }

    /// Persist the statistics file.
    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        let mut output = storage.create_output(STATS_FILE)?;
        serde_json::to_writer_pretty(&mut output, self)?;
        output.flush_and_sync()?;
        output.close()?;
        Ok(())
    }

    /// Load the statistics file.
    pub fn load(storage: &dyn Storage) -> Result<CollectionStatistics> {
        let input = storage.open_input(STATS_FILE)?;
        Ok(serde_json::from_reader(input)?)
    }
}

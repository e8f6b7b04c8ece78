//! Index writer: document ingestion through to the committed index.
//!
//! The writer analyzes incoming documents, feeds them to the SPIMI builder,
//! and on commit runs the merge and writes the document table, settings, and
//! statistics. After a successful commit the directory holds a complete
//! queryable index and the writer is closed.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::analysis::{Analyzer, PipelineAnalyzer, standard_analyzer, whitespace_analyzer};
use crate::error::{PilumError, Result};
use crate::index::builder::{BlockIndexBuilder, DEFAULT_MEMORY_BUDGET};
use crate::index::doc_table::{DOCTABLE_FILE, DocEntry, DocTable};
use crate::index::merge::{MergeConfig, Merger};
use crate::index::stats::CollectionStatistics;
use crate::storage::{Storage, StructWriter};

/// Name of the settings file inside an index directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Build-time choices that the query side must replay.
///
/// Queries have to be analyzed the way documents were, and posting streams
/// decoded the way they were encoded, so these are persisted with the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Apply stopword removal and Porter stemming during analysis.
    pub stemming_and_stopwords: bool,

    /// Variable-byte encode the merged posting streams.
    pub compression: bool,
}

impl Default for IndexSettings {
    fn default() -> Self {
        IndexSettings {
            stemming_and_stopwords: true,
            compression: true,
        }
    }
}

impl IndexSettings {
    /// Persist the settings file.
    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        let mut output = storage.create_output(SETTINGS_FILE)?;
        serde_json::to_writer_pretty(&mut output, self)?;
        output.flush_and_sync()?;
        output.close()?;
        Ok(())
    }

    /// Load the settings file.
    pub fn load(storage: &dyn Storage) -> Result<IndexSettings> {
        let input = storage.open_input(SETTINGS_FILE)?;
        Ok(serde_json::from_reader(input)?)
    }
}

/// Configuration for an index writer.
#[derive(Debug, Clone)]
pub struct IndexWriterConfig {
    /// Persisted index settings.
    pub settings: IndexSettings,

    /// SPIMI memory budget in bytes.
    pub memory_budget: usize,
}

impl Default for IndexWriterConfig {
    fn default() -> Self {
        IndexWriterConfig {
            settings: IndexSettings::default(),
            memory_budget: DEFAULT_MEMORY_BUDGET,
        }
    }
}

/// Writes one index: add documents, then commit exactly once.
#[derive(Debug)]
pub struct IndexWriter {
    storage: Arc<dyn Storage>,
    config: IndexWriterConfig,
    analyzer: PipelineAnalyzer,
    tokenized_analyzer: PipelineAnalyzer,
    builder: BlockIndexBuilder,
    docs: Vec<DocEntry>,
    stats: CollectionStatistics,
    started: Instant,
    closed: bool,
}

impl IndexWriter {
    /// Create a writer over an (empty) index directory.
    pub fn new(storage: Arc<dyn Storage>, config: IndexWriterConfig) -> Result<IndexWriter> {
        let analyzer = standard_analyzer(config.settings.stemming_and_stopwords)?;
        let tokenized_analyzer = whitespace_analyzer(config.settings.stemming_and_stopwords);
        let builder = BlockIndexBuilder::new(storage.clone(), config.memory_budget);

        Ok(IndexWriter {
            storage,
            config,
            analyzer,
            tokenized_analyzer,
            builder,
            docs: Vec::new(),
            stats: CollectionStatistics::default(),
            started: Instant::now(),
            closed: false,
        })
    }

    /// Analyze raw text and add it as one document.
    ///
    /// Returns the assigned internal docID, or `None` when analysis leaves
    /// no terms (such a document is not indexed at all, keeping docIDs dense
    /// and document lengths positive).
    pub fn add_document(&mut self, doc_no: &str, text: &str) -> Result<Option<u64>> {
        self.check_closed()?;
        let terms = self.analyzer.analyze_terms(text)?;
        self.add_terms(doc_no, terms)
    }

    /// Add a pre-tokenized document, terms separated by whitespace.
    pub fn add_tokenized(&mut self, doc_no: &str, tokens: &str) -> Result<Option<u64>> {
        self.check_closed()?;
        let terms = self.tokenized_analyzer.analyze_terms(tokens)?;
        self.add_terms(doc_no, terms)
    }

    fn add_terms(&mut self, doc_no: &str, terms: Vec<String>) -> Result<Option<u64>> {
        if terms.is_empty() {
            return Ok(None);
        }

        let entry = DocEntry::new(doc_no, terms.len() as u32)?;
        let doc_id = self.docs.len() as u64 + 1;
        self.builder.insert(doc_id, &terms)?;
        self.stats.record_document(entry.doc_len);
        self.docs.push(entry);
        Ok(Some(doc_id))
    }

    /// Finish the build: final flush, merge, document table, settings,
    /// statistics. Closes the writer.
    pub fn commit(&mut self) -> Result<CollectionStatistics> {
        self.check_closed()?;

        let blocks = self.builder.finish()?;
        self.stats.block_count = blocks;

        let mut table = StructWriter::new(self.storage.create_output(DOCTABLE_FILE)?);
        DocTable::write(&mut table, &self.docs)?;
        table.close()?;

        let doc_lens: Vec<u32> = self.docs.iter().map(|d| d.doc_len).collect();
        let merger = Merger::new(
            self.storage.clone(),
            MergeConfig {
                compress: self.config.settings.compression,
            },
        );
        merger.merge(blocks, &doc_lens, self.stats.avg_doc_len)?;

        self.config.settings.save(self.storage.as_ref())?;
        self.stats.build_time_secs = self.started.elapsed().as_secs_f64();
        self.stats.built_at = Utc::now();
        self.stats.save(self.storage.as_ref())?;

        self.closed = true;
        Ok(self.stats.clone())
    }

    /// Number of documents added so far.
    pub fn doc_count(&self) -> u64 {
        self.docs.len() as u64
    }

    /// The settings this writer builds with.
    pub fn settings(&self) -> &IndexSettings {
        &self.config.settings
    }

    /// Close without committing; buffered documents are discarded.
    pub fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    /// Whether the writer has been closed or committed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn check_closed(&self) -> Result<()> {
        if self.closed {
            return Err(PilumError::index("index writer is closed"));
        }
        Ok(())
    }
}

impl Drop for IndexWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

//! Query-time facade over an on-disk index.
//!
//! A `Searcher` loads the lexicon, document table, settings and collection
//! statistics once at open time; each query then only opens posting cursors
//! for its terms. The analyzer is reconstructed from the persisted settings,
//! so query-time analysis always matches what the index was built with.

use std::sync::Arc;

use crate::analysis::{Analyzer, PipelineAnalyzer, standard_analyzer};
use crate::error::{PilumError, Result};
use crate::index::doc_table::{DOCTABLE_FILE, DocTable};
use crate::index::lexicon::{LEXICON_FILE, Lexicon};
use crate::index::merge::{DOCIDS_FILE, FREQS_FILE};
use crate::index::stats::CollectionStatistics;
use crate::index::writer::IndexSettings;
use crate::search::cursor::PostingCursor;
use crate::search::evaluator::{QueryEvaluator, SearchOptions};
use crate::storage::{Storage, StructReader};

/// One ranked search result, resolved back to its external document number.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedDoc {
    /// External document identifier.
    pub doc_no: String,

    /// Relevance score under the query's scoring function.
    pub score: f64,
}

/// Ranked results for one identified query, as written to run files.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResults {
    /// Caller-supplied query identifier.
    pub query_id: String,

    /// Results in descending score order.
    pub docs: Vec<RankedDoc>,
}

/// Read-only access to a built index.
#[derive(Debug)]
pub struct Searcher {
    storage: Arc<dyn Storage>,
    settings: IndexSettings,
    statistics: CollectionStatistics,
    lexicon: Lexicon,
    doc_table: DocTable,
    analyzer: PipelineAnalyzer,
}

impl Searcher {
    /// Open an index directory for searching.
    ///
    /// Reads the settings, statistics, lexicon and document table up front.
    /// Posting files are opened lazily, one cursor per query term.
    pub fn open(storage: Arc<dyn Storage>) -> Result<Searcher> {
        let settings = IndexSettings::load(storage.as_ref())?;
        let statistics = CollectionStatistics::load(storage.as_ref())?;

        let input = storage.open_input(LEXICON_FILE)?;
        let mut reader = StructReader::new(input)?;
        let lexicon = Lexicon::load(&mut reader)?;

        let input = storage.open_input(DOCTABLE_FILE)?;
        let mut reader = StructReader::new(input)?;
        let doc_table = DocTable::load(&mut reader)?;

        if doc_table.len() as u64 != statistics.doc_count {
            return Err(PilumError::corrupt(format!(
                "document table holds {} entries but statistics claim {}",
                doc_table.len(),
                statistics.doc_count
            )));
        }

        let analyzer = standard_analyzer(settings.stemming_and_stopwords)?;

        Ok(Searcher {
            storage,
            settings,
            statistics,
            lexicon,
            doc_table,
            analyzer,
        })
    }

    /// Run one query and resolve the results to external document numbers.
    ///
    /// Query text goes through the same analysis as indexed documents.
    /// Terms absent from the lexicon are dropped; if no term survives the
    /// query cannot be answered and `QueryTooVague` is returned.
    pub fn search(&self, query_text: &str, options: &SearchOptions) -> Result<Vec<RankedDoc>> {
        let terms = self.analyzer.analyze_terms(query_text)?;

        // One cursor per distinct surviving term.
        let mut seen: Vec<&str> = Vec::new();
        let mut readers = Vec::new();
        for term in &terms {
            if seen.iter().any(|known| known == term) {
                continue;
            }
            seen.push(term);
            if let Some(entry) = self.lexicon.get(term) {
                let cursor = PostingCursor::open(
                    self.storage.as_ref(),
                    DOCIDS_FILE,
                    FREQS_FILE,
                    entry,
                    self.settings.compression,
                )?;
                readers.push((cursor, *entry));
            }
        }

        if readers.is_empty() {
            return Err(PilumError::QueryTooVague);
        }

        let evaluator = QueryEvaluator::new(
            readers,
            *options,
            &self.doc_table,
            self.statistics.avg_doc_len,
        );

        evaluator
            .evaluate()?
            .into_iter()
            .map(|scored| {
                let entry = self.doc_table.get(scored.doc_id).ok_or_else(|| {
                    PilumError::corrupt(format!(
                        "docID {} missing from document table",
                        scored.doc_id
                    ))
                })?;
                Ok(RankedDoc {
                    doc_no: entry.doc_no.clone(),
                    score: scored.score,
                })
            })
            .collect()
    }

    /// Run one identified query, keeping the identifier with the results
    /// for run-file output.
    pub fn search_query(
        &self,
        query_id: &str,
        query_text: &str,
        options: &SearchOptions,
    ) -> Result<QueryResults> {
        Ok(QueryResults {
            query_id: query_id.to_string(),
            docs: self.search(query_text, options)?,
        })
    }

    /// Settings the index was built with.
    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    /// Collection statistics recorded at build time.
    pub fn statistics(&self) -> &CollectionStatistics {
        &self.statistics
    }

    /// Number of indexed documents.
    pub fn doc_count(&self) -> u64 {
        self.statistics.doc_count
    }

    /// Number of distinct terms in the lexicon.
    pub fn term_count(&self) -> usize {
        self.lexicon.len()
    }
}

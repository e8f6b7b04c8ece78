//! Document-at-a-time query evaluation with MaxScore pruning.
//!
//! Readers are sorted ascending by score upper bound. A prefix of readers
//! whose bounds sum to no more than the current top-K threshold is
//! non-essential: a document matching only those readers cannot enter the
//! top K, so it is skipped without scoring. The split is recomputed whenever
//! the threshold rises. While scoring a single document, accumulation stops
//! as soon as the score plus the remaining contributing bounds can no longer
//! beat the threshold.

use crate::error::{PilumError, Result};
use crate::index::doc_table::DocTable;
use crate::index::lexicon::TermEntry;
use crate::search::collector::{ScoredDoc, TopDocsCollector};
use crate::search::cursor::PostingCursor;
use crate::search::scorer::ScoringFunction;

/// Default number of results to return.
pub const DEFAULT_TOP_K: usize = 10;

/// How query terms combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    /// Documents must contain every query term.
    Conjunctive,

    /// Documents may contain any query term.
    #[default]
    Disjunctive,
}

/// Per-query evaluation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Conjunctive or disjunctive matching.
    pub mode: QueryMode,

    /// Scoring function for ranking.
    pub scoring: ScoringFunction,

    /// Maximum number of results.
    pub top_k: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            mode: QueryMode::default(),
            scoring: ScoringFunction::default(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug)]
struct TermReader {
    cursor: PostingCursor,
    idf: f64,
    upper_bound: f64,
}

/// One query's evaluation state over its opened posting cursors.
#[derive(Debug)]
pub struct QueryEvaluator<'a> {
    readers: Vec<TermReader>,
    /// prefix_bounds[i] is the sum of upper bounds of readers 0..=i.
    prefix_bounds: Vec<f64>,
    /// Readers below this index are non-essential.
    first_essential: usize,
    collector: TopDocsCollector,
    options: SearchOptions,
    doc_table: &'a DocTable,
    avg_doc_len: f64,
}

impl<'a> QueryEvaluator<'a> {
    /// Build the evaluation state: one cursor per distinct query term, each
    /// already positioned at its first posting.
    pub fn new(
        terms: Vec<(PostingCursor, TermEntry)>,
        options: SearchOptions,
        doc_table: &'a DocTable,
        avg_doc_len: f64,
    ) -> Self {
        let mut readers: Vec<TermReader> = terms
            .into_iter()
            .map(|(cursor, entry)| TermReader {
                cursor,
                idf: entry.idf,
                upper_bound: options.scoring.upper_bound(&entry),
            })
            .collect();
        readers.sort_by(|a, b| a.upper_bound.total_cmp(&b.upper_bound));

        let mut running = 0.0;
        let prefix_bounds = readers
            .iter()
            .map(|reader| {
                running += reader.upper_bound;
                running
            })
            .collect();

        QueryEvaluator {
            readers,
            prefix_bounds,
            first_essential: 0,
            collector: TopDocsCollector::new(options.top_k),
            options,
            doc_table,
            avg_doc_len,
        }
    }

    /// Run the query to completion and return results in rank order.
    pub fn evaluate(mut self) -> Result<Vec<ScoredDoc>> {
        if !self.readers.is_empty() {
            match self.options.mode {
                QueryMode::Disjunctive => self.evaluate_disjunctive()?,
                QueryMode::Conjunctive => self.evaluate_conjunctive()?,
            }
        }
        Ok(self.collector.into_sorted())
    }

    fn evaluate_disjunctive(&mut self) -> Result<()> {
        loop {
            if self.first_essential >= self.readers.len() {
                break;
            }

            let Some(candidate) = self
                .readers
                .iter()
                .filter_map(|reader| reader.cursor.current())
                .map(|posting| posting.doc_id)
                .min()
            else {
                break;
            };

            let any_essential = self.readers[self.first_essential..]
                .iter()
                .any(|reader| at_doc(reader, candidate));

            if any_essential {
                self.score_candidate(candidate)?;
            } else {
                // Only non-essential readers hold this document; even their
                // combined bounds cannot reach the top K, so advance past it
                // without scoring.
                for reader in &mut self.readers {
                    if at_doc(reader, candidate) {
                        reader.cursor.next()?;
                    }
                }
            }
        }
        Ok(())
    }

    fn evaluate_conjunctive(&mut self) -> Result<()> {
        'outer: loop {
            if self.first_essential >= self.readers.len() {
                break;
            }

            // The highest current docID is the only possible next common
            // document.
            let mut candidate = 0u64;
            for reader in &self.readers {
                match reader.cursor.current() {
                    Some(posting) => candidate = candidate.max(posting.doc_id),
                    // An exhausted reader means no further common docID.
                    None => break 'outer,
                }
            }

            let mut aligned = true;
            for reader in &mut self.readers {
                match reader.cursor.next_geq(candidate)? {
                    Some(posting) if posting.doc_id == candidate => {}
                    // Overshot: restart alignment from the higher docID.
                    Some(_) => aligned = false,
                    None => break 'outer,
                }
            }

            if aligned {
                self.score_candidate(candidate)?;
            }
        }
        Ok(())
    }

    /// Score one document from every reader positioned at it, then advance
    /// those readers past it.
    fn score_candidate(&mut self, candidate: u64) -> Result<()> {
        let doc_len = self
            .doc_table
            .get(candidate)
            .map(|doc| doc.doc_len)
            .ok_or_else(|| {
                PilumError::corrupt(format!("docID {candidate} missing from document table"))
            })?;

        let contributing: Vec<(usize, u32)> = self
            .readers
            .iter()
            .enumerate()
            .filter_map(|(index, reader)| {
                reader
                    .cursor
                    .current()
                    .filter(|posting| posting.doc_id == candidate)
                    .map(|posting| (index, posting.term_frequency))
            })
            .collect();

        let threshold = self.collector.threshold();
        let mut remaining: f64 = contributing
            .iter()
            .map(|&(index, _)| self.readers[index].upper_bound)
            .sum();
        let mut score = 0.0;
        let mut abandoned = false;

        for &(index, frequency) in &contributing {
            remaining -= self.readers[index].upper_bound;
            score += self.options.scoring.term_score(
                frequency,
                doc_len,
                self.avg_doc_len,
                self.readers[index].idf,
            );
            // Even a perfect match on the rest cannot beat the threshold.
            if score + remaining <= threshold {
                abandoned = true;
                break;
            }
        }

        for &(index, _) in &contributing {
            self.readers[index].cursor.next()?;
        }

        if !abandoned
            && self.collector.insert(candidate, score)
            && self.collector.threshold() > threshold
        {
            self.recompute_essential();
        }
        Ok(())
    }

    /// Find the shortest reader prefix whose combined bounds exceed the
    /// threshold; everything before it is non-essential.
    fn recompute_essential(&mut self) {
        let threshold = self.collector.threshold();
        self.first_essential = self
            .prefix_bounds
            .iter()
            .position(|&prefix| prefix > threshold)
            .unwrap_or(self.readers.len());
    }
}

fn at_doc(reader: &TermReader, doc_id: u64) -> bool {
    reader
        .cursor
        .current()
        .is_some_and(|posting| posting.doc_id == doc_id)
}

//! Term scoring functions.
//!
//! Both the merger (when it computes per-term score bounds) and the query
//! evaluator (when it scores candidate documents) go through this module,
//! so the two always agree on constants and formulas.

use crate::index::lexicon::TermEntry;

/// BM25 term frequency saturation parameter.
pub const K1: f64 = 1.6;

/// BM25 document length normalization parameter.
pub const B: f64 = 0.75;

/// The frequency component of BM25 for a single posting, before idf.
///
/// This is monotone in `term_frequency` and bounded above by 1, which is what
/// makes the per-term BM25 bound in the lexicon valid.
pub fn bm25_partial(term_frequency: u32, doc_len: u32, avg_doc_len: f64) -> f64 {
    let freq = term_frequency as f64;
    freq / (K1 * ((1.0 - B) + B * (doc_len as f64 / avg_doc_len)) + freq)
}

/// Scoring function used to rank documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringFunction {
    /// Okapi BM25 with the constants above.
    #[default]
    Bm25,

    /// Log-scaled term frequency times idf.
    Tfidf,
}

impl ScoringFunction {
    /// Score the contribution of one query term to one document.
    ///
    /// `term_frequency` is at least 1 for any stored posting, so the TFIDF
    /// logarithm is always defined.
    pub fn term_score(
        &self,
        term_frequency: u32,
        doc_len: u32,
        avg_doc_len: f64,
        idf: f64,
    ) -> f64 {
        match self {
            ScoringFunction::Bm25 => bm25_partial(term_frequency, doc_len, avg_doc_len) * idf,
            ScoringFunction::Tfidf => (1.0 + (term_frequency as f64).log2()) * idf,
        }
    }

    /// The term's precomputed score upper bound under this function.
    pub fn upper_bound(&self, entry: &TermEntry) -> f64 {
        match self {
            ScoringFunction::Bm25 => entry.bm25_bound,
            ScoringFunction::Tfidf => entry.tfidf_bound,
        }
    }
}

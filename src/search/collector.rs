//! Bounded top-K collection of scored documents.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// One scored document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDoc {
    /// Internal docID.
    pub doc_id: u64,

    /// Score under the query's scoring function.
    pub score: f64,
}

impl Eq for ScoredDoc {}

impl PartialOrd for ScoredDoc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredDoc {
    // BinaryHeap is a max-heap; reversing the score comparison surfaces the
    // weakest kept document at the top. On equal scores the larger docID is
    // the weaker entry.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.doc_id.cmp(&other.doc_id))
    }
}

/// Keeps the K best documents seen so far.
///
/// `threshold` is the score a new document must strictly exceed to enter;
/// it is 0 until the collector fills, then the weakest kept score. Ties keep
/// the earlier (smaller) docID.
#[derive(Debug)]
pub struct TopDocsCollector {
    heap: BinaryHeap<ScoredDoc>,
    limit: usize,
}

impl TopDocsCollector {
    /// Create a collector keeping at most `limit` documents.
    pub fn new(limit: usize) -> Self {
        TopDocsCollector {
            heap: BinaryHeap::with_capacity(limit + 1),
            limit,
        }
    }

    /// The score a new document must strictly beat to be kept.
    pub fn threshold(&self) -> f64 {
        if self.heap.len() < self.limit {
            0.0
        } else {
            self.heap.peek().map_or(0.0, |doc| doc.score)
        }
    }

    /// Offer a scored document; returns whether it was kept.
    pub fn insert(&mut self, doc_id: u64, score: f64) -> bool {
        if self.limit == 0 {
            return false;
        }
        if self.heap.len() < self.limit {
            self.heap.push(ScoredDoc { doc_id, score });
            return true;
        }
        if let Some(weakest) = self.heap.peek()
            && score > weakest.score
        {
            self.heap.pop();
            self.heap.push(ScoredDoc { doc_id, score });
            return true;
        }
        false
    }

    /// Number of documents currently kept.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// True when nothing has been kept.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drain in rank order: descending score, ascending docID on ties.
    pub fn into_sorted(self) -> Vec<ScoredDoc> {
        let mut docs = self.heap.into_vec();
        docs.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        docs
    }
}

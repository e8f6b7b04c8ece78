//! Postings and in-memory posting lists.

/// A single posting in a posting list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    /// Internal document ID.
    pub doc_id: u64,
    /// Term frequency in the document.
    pub term_frequency: u32,
}

impl Posting {
    /// Create a posting for the first occurrence of a term in a document.
    pub fn new(doc_id: u64) -> Self {
        Posting {
            doc_id,
            term_frequency: 1,
        }
    }

    /// Create a posting with an explicit frequency.
    pub fn with_frequency(doc_id: u64, term_frequency: u32) -> Self {
        Posting {
            doc_id,
            term_frequency,
        }
    }
}

/// An in-memory posting list for a single term, ordered by document ID.
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    postings: Vec<Posting>,
}

impl PostingList {
    /// Create a new empty posting list.
    pub fn new() -> Self {
        PostingList {
            postings: Vec::new(),
        }
    }

    /// Record one occurrence of the term in `doc_id`.
    ///
    /// Document IDs arrive in non-decreasing order during ingestion, so a
    /// repeated occurrence always lands on the last posting and the update
    /// is O(1). Returns true when a new posting was appended.
    pub fn record(&mut self, doc_id: u64) -> bool {
        if let Some(last) = self.postings.last_mut()
            && last.doc_id == doc_id
        {
            last.term_frequency += 1;
            return false;
        }

        debug_assert!(self.postings.last().map_or(true, |p| p.doc_id < doc_id));
        self.postings.push(Posting::new(doc_id));
        true
    }

    /// Number of postings (the term's document frequency).
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    /// Check if the posting list is empty.
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Get the postings as a slice.
    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    /// Iterate over the postings.
    pub fn iter(&'_ self) -> std::slice::Iter<'_, Posting> {
        self.postings.iter()
    }
}

//! Single-pass in-memory (SPIMI) block builder.
//!
//! Postings accumulate in a term map until an estimated memory budget is
//! reached, then the whole map is sorted and flushed as one numbered partial
//! block (`block_N.lex`, `block_N.docids`, `block_N.freqs`). Partial posting
//! streams are always fixed-width little-endian; compression is applied only
//! when the merger writes the global files.

use std::sync::Arc;

use ahash::AHashMap;

use crate::analysis::MAX_TERM_BYTES;
use crate::error::{PilumError, Result};
use crate::index::posting::PostingList;
use crate::storage::{Storage, StructWriter};

/// Magic number for partial lexicon files ("PLEX").
pub const PARTIAL_LEXICON_MAGIC: u32 = 0x504C_4558;

/// Current partial lexicon format version.
pub const PARTIAL_LEXICON_VERSION: u32 = 1;

/// Magic number for docID stream files, partial and merged ("PDID").
pub const DOCIDS_MAGIC: u32 = 0x5044_4944;

/// Current docID stream format version.
pub const DOCIDS_VERSION: u32 = 1;

/// Magic number for frequency stream files, partial and merged ("PFRQ").
pub const FREQS_MAGIC: u32 = 0x5046_5251;

/// Current frequency stream format version.
pub const FREQS_VERSION: u32 = 1;

/// On-disk size of one partial lexicon record (padded term + offsets + count).
pub const PARTIAL_LEXICON_RECORD_BYTES: u64 = 56;

/// Default in-memory budget before a block is flushed.
pub const DEFAULT_MEMORY_BUDGET: usize = 256 * 1024 * 1024;

// Rough per-entry heap costs for the budget estimate. The estimate only has
// to keep batches bounded, not account exactly.
const POSTING_BYTES: usize = 16;
const TERM_OVERHEAD_BYTES: usize = 64;

/// Partial lexicon file name for block `block`.
pub fn block_lexicon_name(block: u32) -> String {
    format!("block_{block}.lex")
}

/// Partial docID stream file name for block `block`.
pub fn block_docids_name(block: u32) -> String {
    format!("block_{block}.docids")
}

/// Partial frequency stream file name for block `block`.
pub fn block_freqs_name(block: u32) -> String {
    format!("block_{block}.freqs")
}

/// SPIMI builder accumulating one in-memory block at a time.
#[derive(Debug)]
pub struct BlockIndexBuilder {
    storage: Arc<dyn Storage>,
    terms: AHashMap<String, PostingList>,
    memory_budget: usize,
    estimated_bytes: usize,
    block_count: u32,
}

impl BlockIndexBuilder {
    /// Create a builder flushing to `storage` whenever the estimated heap use
    /// of the term map reaches `memory_budget` bytes.
    pub fn new(storage: Arc<dyn Storage>, memory_budget: usize) -> Self {
        BlockIndexBuilder {
            storage,
            terms: AHashMap::new(),
            memory_budget: memory_budget.max(1),
            estimated_bytes: 0,
            block_count: 0,
        }
    }

    /// Add one document's terms.
    ///
    /// `doc_id` must be strictly greater than any previously inserted docID;
    /// repeated terms within the document bump the frequency of the last
    /// posting in O(1). The memory check runs once per document, after all
    /// its terms are in.
    pub fn insert(&mut self, doc_id: u64, terms: &[String]) -> Result<()> {
        for term in terms {
            match self.terms.get_mut(term.as_str()) {
                Some(list) => {
                    if list.record(doc_id) {
                        self.estimated_bytes += POSTING_BYTES;
                    }
                }
                None => {
                    let mut list = PostingList::new();
                    list.record(doc_id);
                    self.estimated_bytes += term.len() + TERM_OVERHEAD_BYTES + POSTING_BYTES;
                    self.terms.insert(term.clone(), list);
                }
            }
        }

        if self.estimated_bytes >= self.memory_budget {
            self.flush()?;
        }

        Ok(())
    }

    /// Write the current in-memory block as partial files and clear it.
    ///
    /// A builder with no buffered postings flushes nothing, so empty blocks
    /// never reach disk.
    pub fn flush(&mut self) -> Result<()> {
        if self.terms.is_empty() {
            return Ok(());
        }

        let mut entries: Vec<(String, PostingList)> =
            std::mem::take(&mut self.terms).into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let block = self.block_count;
        let mut lexicon =
            StructWriter::new(self.storage.create_output(&block_lexicon_name(block))?);
        let mut docids = StructWriter::new(self.storage.create_output(&block_docids_name(block))?);
        let mut freqs = StructWriter::new(self.storage.create_output(&block_freqs_name(block))?);

        lexicon.write_u32(PARTIAL_LEXICON_MAGIC)?;
        lexicon.write_u32(PARTIAL_LEXICON_VERSION)?;
        lexicon.write_u64(entries.len() as u64)?;
        docids.write_u32(DOCIDS_MAGIC)?;
        docids.write_u32(DOCIDS_VERSION)?;
        freqs.write_u32(FREQS_MAGIC)?;
        freqs.write_u32(FREQS_VERSION)?;

        for (term, list) in &entries {
            let bytes = term.as_bytes();
            if bytes.len() > MAX_TERM_BYTES {
                return Err(PilumError::index(format!(
                    "term '{term}' exceeds {MAX_TERM_BYTES} bytes"
                )));
            }
            let mut record = [0u8; MAX_TERM_BYTES];
            record[..bytes.len()].copy_from_slice(bytes);
            lexicon.write_raw(&record)?;
            lexicon.write_u64(docids.position())?;
            lexicon.write_u64(freqs.position())?;
            lexicon.write_u64(list.len() as u64)?;

            for posting in list.iter() {
                docids.write_u64(posting.doc_id)?;
                freqs.write_u32(posting.term_frequency)?;
            }
        }

        lexicon.close()?;
        docids.close()?;
        freqs.close()?;

        self.estimated_bytes = 0;
        self.block_count += 1;
        Ok(())
    }

    /// Flush any remaining postings and return the number of blocks written.
    pub fn finish(&mut self) -> Result<u32> {
        self.flush()?;
        Ok(self.block_count)
    }

    /// Number of blocks flushed so far.
    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    /// Number of distinct terms currently buffered.
    pub fn buffered_terms(&self) -> usize {
        self.terms.len()
    }

    /// Estimated heap bytes of the buffered block.
    pub fn estimated_bytes(&self) -> usize {
        self.estimated_bytes
    }
}

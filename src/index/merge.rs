//! N-way merge of partial blocks into the global index files.
//!
//! Each partial block's lexicon is read sequentially; every round takes the
//! lexicographically smallest current term across blocks, concatenates that
//! term's postings from all blocks holding it (block order already implies
//! increasing docIDs, so no sort is needed), compresses them with skip
//! blocks, and appends to the global streams. The merge is all-or-nothing:
//! success deletes the partial files, failure deletes the incomplete global
//! files and keeps the partials for a retry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::analysis::MAX_TERM_BYTES;
use crate::error::{PilumError, Result};
use crate::index::builder::{
    DOCIDS_MAGIC, DOCIDS_VERSION, FREQS_MAGIC, FREQS_VERSION, PARTIAL_LEXICON_MAGIC,
    PARTIAL_LEXICON_VERSION, block_docids_name, block_freqs_name, block_lexicon_name,
};
use crate::index::lexicon::{LEXICON_FILE, Lexicon, TermEntry};
use crate::index::posting::Posting;
use crate::index::skip::{SKIPS_FILE, SKIPS_MAGIC, SKIPS_VERSION, SkipBlock, compress_posting_list};
use crate::storage::{Storage, StorageInput, StructReader, StructWriter};

/// Name of the merged docID stream file.
pub const DOCIDS_FILE: &str = "docids.bin";

/// Name of the merged frequency stream file.
pub const FREQS_FILE: &str = "freqs.bin";

/// Merge configuration.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Variable-byte encode the merged streams; off means fixed-width LE.
    pub compress: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        MergeConfig { compress: true }
    }
}

/// Counters reported by a completed merge.
#[derive(Debug, Clone, Default)]
pub struct MergeStats {
    /// Partial blocks consumed.
    pub blocks_merged: u32,

    /// Distinct terms written to the global lexicon.
    pub terms_merged: u64,

    /// Total postings written.
    pub postings_merged: u64,

    /// Wall-clock merge duration.
    pub elapsed: Duration,
}

/// Sequential cursor over one partial block's three files.
#[derive(Debug)]
struct PartialBlock {
    block: u32,
    lexicon: StructReader<Box<dyn StorageInput>>,
    docids: StructReader<Box<dyn StorageInput>>,
    freqs: StructReader<Box<dyn StorageInput>>,
    remaining: u64,
    term: Option<String>,
    posting_count: u64,
}

impl PartialBlock {
    fn open(storage: &dyn Storage, block: u32) -> Result<Self> {
        let mut lexicon = StructReader::new(storage.open_input(&block_lexicon_name(block))?)?;
        let mut docids = StructReader::new(storage.open_input(&block_docids_name(block))?)?;
        let mut freqs = StructReader::new(storage.open_input(&block_freqs_name(block))?)?;

        check_stream_header(
            &mut lexicon,
            PARTIAL_LEXICON_MAGIC,
            PARTIAL_LEXICON_VERSION,
            "partial lexicon",
            block,
        )?;
        let remaining = lexicon.read_u64()?;
        check_stream_header(&mut docids, DOCIDS_MAGIC, DOCIDS_VERSION, "docID stream", block)?;
        check_stream_header(&mut freqs, FREQS_MAGIC, FREQS_VERSION, "frequency stream", block)?;

        let mut partial = PartialBlock {
            block,
            lexicon,
            docids,
            freqs,
            remaining,
            term: None,
            posting_count: 0,
        };
        partial.advance()?;
        Ok(partial)
    }

    /// Move the lexicon cursor to the next term, or to exhaustion.
    fn advance(&mut self) -> Result<()> {
        if self.remaining == 0 {
            self.term = None;
            return Ok(());
        }
        self.remaining -= 1;

        let padded = self.lexicon.read_raw(MAX_TERM_BYTES)?;
        let end = padded.iter().position(|&b| b == 0).unwrap_or(MAX_TERM_BYTES);
        let term = String::from_utf8(padded[..end].to_vec()).map_err(|e| {
            PilumError::corrupt(format!("block {}: invalid term bytes: {e}", self.block))
        })?;
        let doc_offset = self.lexicon.read_u64()?;
        let freq_offset = self.lexicon.read_u64()?;
        self.posting_count = self.lexicon.read_u64()?;

        // The previous term's postings must be fully consumed before the
        // cursor moves, so the recorded offsets have to line up with the
        // stream positions.
        if doc_offset != self.docids.position() || freq_offset != self.freqs.position() {
            return Err(PilumError::corrupt(format!(
                "block {}: lexicon offsets disagree with posting streams at term '{term}'",
                self.block
            )));
        }
        if let Some(prev) = &self.term
            && term <= *prev
        {
            return Err(PilumError::corrupt(format!(
                "block {}: term '{term}' out of order after '{prev}'",
                self.block
            )));
        }

        self.term = Some(term);
        Ok(())
    }

    /// Append the current term's postings, validating docID order.
    fn read_postings(&mut self, postings: &mut Vec<Posting>) -> Result<()> {
        for _ in 0..self.posting_count {
            let doc_id = self.docids.read_u64()?;
            let term_frequency = self.freqs.read_u32()?;
            if term_frequency == 0 {
                return Err(PilumError::corrupt(format!(
                    "block {}: zero term frequency for docID {doc_id}",
                    self.block
                )));
            }
            if let Some(last) = postings.last()
                && doc_id <= last.doc_id
            {
                return Err(PilumError::corrupt(format!(
                    "block {}: docID {doc_id} out of order after {}",
                    self.block, last.doc_id
                )));
            }
            postings.push(Posting::with_frequency(doc_id, term_frequency));
        }
        Ok(())
    }
}

fn check_stream_header<R: StorageInput>(
    reader: &mut StructReader<R>,
    expected_magic: u32,
    expected_version: u32,
    what: &str,
    block: u32,
) -> Result<()> {
    let magic = reader.read_u32()?;
    if magic != expected_magic {
        return Err(PilumError::corrupt(format!(
            "block {block}: bad {what} magic 0x{magic:08X}"
        )));
    }
    let version = reader.read_u32()?;
    if version != expected_version {
        return Err(PilumError::corrupt(format!(
            "block {block}: unsupported {what} version {version}"
        )));
    }
    Ok(())
}

/// Merges flushed partial blocks into the queryable global files.
#[derive(Debug)]
pub struct Merger {
    storage: Arc<dyn Storage>,
    config: MergeConfig,
}

impl Merger {
    /// Create a merger over the index directory's storage.
    pub fn new(storage: Arc<dyn Storage>, config: MergeConfig) -> Self {
        Merger { storage, config }
    }

    /// Merge blocks 0..`block_count` into the global index files.
    ///
    /// `doc_lens` is the document table's length column (doc_count entries,
    /// indexed by docID - 1) and `avg_doc_len` the collection mean; both
    /// feed the BM25 upper-bound computation.
    pub fn merge(&self, block_count: u32, doc_lens: &[u32], avg_doc_len: f64) -> Result<MergeStats> {
        let started = Instant::now();
        match self.merge_blocks(block_count, doc_lens, avg_doc_len) {
            Ok(mut stats) => {
                self.delete_partials(block_count)?;
                stats.elapsed = started.elapsed();
                Ok(stats)
            }
            Err(e) => {
                // Half-written global files are not a valid index; remove
                // them and keep the partials so the merge can be rerun.
                self.delete_globals();
                Err(e)
            }
        }
    }

    fn merge_blocks(
        &self,
        block_count: u32,
        doc_lens: &[u32],
        avg_doc_len: f64,
    ) -> Result<MergeStats> {
        let mut blocks = Vec::with_capacity(block_count as usize);
        for block in 0..block_count {
            blocks.push(PartialBlock::open(self.storage.as_ref(), block)?);
        }

        let mut docids = StructWriter::new(self.storage.create_output(DOCIDS_FILE)?);
        let mut freqs = StructWriter::new(self.storage.create_output(FREQS_FILE)?);
        let mut skips = StructWriter::new(self.storage.create_output(SKIPS_FILE)?);
        docids.write_u32(DOCIDS_MAGIC)?;
        docids.write_u32(DOCIDS_VERSION)?;
        freqs.write_u32(FREQS_MAGIC)?;
        freqs.write_u32(FREQS_VERSION)?;
        skips.write_u32(SKIPS_MAGIC)?;
        skips.write_u32(SKIPS_VERSION)?;

        let doc_count = doc_lens.len() as u64;
        let mut entries: Vec<(String, TermEntry)> = Vec::new();
        let mut stats = MergeStats {
            blocks_merged: block_count,
            ..Default::default()
        };
        let mut postings: Vec<Posting> = Vec::new();

        loop {
            let Some(term) = blocks
                .iter()
                .filter_map(|b| b.term.as_deref())
                .min()
                .map(str::to_owned)
            else {
                break;
            };

            postings.clear();
            for block in blocks.iter_mut() {
                if block.term.as_deref() == Some(term.as_str()) {
                    block.read_postings(&mut postings)?;
                    block.advance()?;
                }
            }

            let list = compress_posting_list(&postings, self.config.compress, doc_lens, avg_doc_len)?;

            let doc_offset = docids.position();
            let freq_offset = freqs.position();
            let skip_offset = skips.position();
            docids.write_raw(&list.doc_bytes)?;
            freqs.write_raw(&list.freq_bytes)?;
            for skip in &list.skip_blocks {
                // Rebase stream-relative offsets to absolute file positions.
                SkipBlock {
                    doc_offset: doc_offset + skip.doc_offset,
                    freq_offset: freq_offset + skip.freq_offset,
                    ..*skip
                }
                .write_to(&mut skips)?;
            }

            let posting_count = postings.len() as u64;
            let idf = (doc_count as f64 / posting_count as f64).log2();
            let tfidf_bound = ((1.0 + (list.bounds.max_frequency as f64).log2()) * idf).ceil();
            let bm25_bound = (list.bounds.max_bm25_partial * idf).ceil();

            stats.terms_merged += 1;
            stats.postings_merged += posting_count;

            entries.push((
                term,
                TermEntry {
                    doc_offset,
                    freq_offset,
                    skip_offset,
                    skip_count: list.skip_blocks.len() as u32,
                    posting_count,
                    idf,
                    tfidf_bound,
                    bm25_bound,
                },
            ));
        }

        let mut lexicon = StructWriter::new(self.storage.create_output(LEXICON_FILE)?);
        Lexicon::write(&mut lexicon, &entries)?;
        lexicon.close()?;

        docids.close()?;
        freqs.close()?;
        skips.close()?;

        Ok(stats)
    }

    fn delete_partials(&self, block_count: u32) -> Result<()> {
        for block in 0..block_count {
            for name in [
                block_lexicon_name(block),
                block_docids_name(block),
                block_freqs_name(block),
            ] {
                self.storage.delete_file(&name)?;
            }
        }
        Ok(())
    }

    fn delete_globals(&self) {
        for name in [LEXICON_FILE, DOCIDS_FILE, FREQS_FILE, SKIPS_FILE] {
            if self.storage.file_exists(name) {
                let _ = self.storage.delete_file(name);
            }
        }
    }
}

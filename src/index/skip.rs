//! Skip blocks over posting list byte streams.
//!
//! A posting list of length n is cut into blocks of `floor(sqrt(n))` postings
//! (the last block may be shorter). Each block records the byte range of its
//! encoded docIDs and frequencies plus the largest docID it contains, so a
//! cursor can seek past whole blocks without decoding them.

use crate::error::{PilumError, Result};
use crate::index::posting::Posting;
use crate::search::scorer::bm25_partial;
use crate::storage::{StorageInput, StorageOutput, StructReader, StructWriter};
use crate::util::varint::{encode_u32, encode_u64};

/// Magic number for skip files ("PSKP").
pub const SKIPS_MAGIC: u32 = 0x5053_4B50;

/// Current skip file format version.
pub const SKIPS_VERSION: u32 = 1;

/// Name of the skip file inside an index directory.
pub const SKIPS_FILE: &str = "skips.bin";

/// On-disk size of one skip record.
pub const SKIP_RECORD_BYTES: u64 = 32;

/// One skip record: the byte extent of a block of postings.
///
/// The compressor produces offsets relative to the start of the term's own
/// byte stream; the merger rebases them to absolute file positions before
/// they reach disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipBlock {
    /// Byte offset of the block's encoded docIDs.
    pub doc_offset: u64,

    /// Byte length of the block's encoded docIDs.
    pub doc_len: u32,

    /// Byte offset of the block's encoded frequencies.
    pub freq_offset: u64,

    /// Byte length of the block's encoded frequencies.
    pub freq_len: u32,

    /// Largest (last) docID in the block.
    pub max_doc_id: u64,
}

impl SkipBlock {
    /// Serialize the fixed 32-byte record.
    pub fn write_to<W: StorageOutput>(&self, writer: &mut StructWriter<W>) -> Result<()> {
        writer.write_u64(self.doc_offset)?;
        writer.write_u32(self.doc_len)?;
        writer.write_u64(self.freq_offset)?;
        writer.write_u32(self.freq_len)?;
        writer.write_u64(self.max_doc_id)?;
        Ok(())
    }

    /// Deserialize the fixed 32-byte record.
    pub fn read_from<R: StorageInput>(reader: &mut StructReader<R>) -> Result<Self> {
        Ok(SkipBlock {
            doc_offset: reader.read_u64()?,
            doc_len: reader.read_u32()?,
            freq_offset: reader.read_u64()?,
            freq_len: reader.read_u32()?,
            max_doc_id: reader.read_u64()?,
        })
    }
}

/// Per-list maxima gathered while compressing, inputs to the lexicon's
/// score upper bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ListScoreBounds {
    /// Largest term frequency in the list.
    pub max_frequency: u32,

    /// Largest BM25 frequency component over the list's postings.
    pub max_bm25_partial: f64,
}

/// A posting list ready for the global files: encoded byte streams, the skip
/// blocks that index them, and the score maxima found along the way.
#[derive(Debug, Default)]
pub struct CompressedPostingList {
    /// Encoded docIDs for the whole list.
    pub doc_bytes: Vec<u8>,

    /// Encoded frequencies for the whole list.
    pub freq_bytes: Vec<u8>,

    /// Skip blocks with stream-relative byte offsets.
    pub skip_blocks: Vec<SkipBlock>,

    /// Maxima for the lexicon's upper-bound computation.
    pub bounds: ListScoreBounds,
}

/// Encode a merged posting list and build its skip blocks in one pass.
///
/// `postings` must be sorted by strictly increasing docID. When `compress`
/// is off, docIDs and frequencies are written fixed-width little-endian
/// instead of variable-byte; skip blocks work identically either way.
/// `doc_lens` is the document table's length column, indexed by docID - 1.
pub fn compress_posting_list(
    postings: &[Posting],
    compress: bool,
    doc_lens: &[u32],
    avg_doc_len: f64,
) -> Result<CompressedPostingList> {
    let n = postings.len();
    let block_size = ((n as f64).sqrt().floor() as usize).max(1);

    let mut list = CompressedPostingList::default();
    let mut block_doc_start = 0u64;
    let mut block_freq_start = 0u64;

    for (i, posting) in postings.iter().enumerate() {
        if compress {
            list.doc_bytes.extend_from_slice(&encode_u64(posting.doc_id));
            list.freq_bytes
                .extend_from_slice(&encode_u32(posting.term_frequency));
        } else {
            list.doc_bytes
                .extend_from_slice(&posting.doc_id.to_le_bytes());
            list.freq_bytes
                .extend_from_slice(&posting.term_frequency.to_le_bytes());
        }

        let doc_len = doc_len_of(doc_lens, posting.doc_id)?;
        list.bounds.max_frequency = list.bounds.max_frequency.max(posting.term_frequency);
        let partial = bm25_partial(posting.term_frequency, doc_len, avg_doc_len);
        if partial > list.bounds.max_bm25_partial {
            list.bounds.max_bm25_partial = partial;
        }

        // A block closes every block_size postings and always at the final
        // posting, so a trailing remainder still gets its own block.
        if (i + 1) % block_size == 0 || i + 1 == n {
            list.skip_blocks.push(SkipBlock {
                doc_offset: block_doc_start,
                doc_len: (list.doc_bytes.len() as u64 - block_doc_start) as u32,
                freq_offset: block_freq_start,
                freq_len: (list.freq_bytes.len() as u64 - block_freq_start) as u32,
                max_doc_id: posting.doc_id,
            });
            block_doc_start = list.doc_bytes.len() as u64;
            block_freq_start = list.freq_bytes.len() as u64;
        }
    }

    Ok(list)
}

fn doc_len_of(doc_lens: &[u32], doc_id: u64) -> Result<u32> {
    usize::try_from(doc_id)
        .ok()
        .and_then(|id| id.checked_sub(1))
        .and_then(|index| doc_lens.get(index).copied())
        .ok_or_else(|| PilumError::corrupt(format!("posting references unknown docID {doc_id}")))
}

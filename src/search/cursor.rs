//! Posting list cursor with skip-block seeking.
//!
//! A cursor owns its file handles and an owned, already-decoded buffer for
//! exactly one skip block at a time. Advancing past the buffer loads the
//! next block; `next_geq` skips whole blocks by their recorded maximum docID
//! before decoding anything, giving O(sqrt n) amortized seeks.

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{PilumError, Result};
use crate::index::lexicon::TermEntry;
use crate::index::posting::Posting;
use crate::index::skip::{SKIPS_FILE, SkipBlock};
use crate::storage::{Storage, StorageInput};
use crate::util::varint::{decode_u32, decode_u64};

/// Read-only cursor over one term's posting list.
#[derive(Debug)]
pub struct PostingCursor {
    skip_blocks: Vec<SkipBlock>,
    docids: Box<dyn StorageInput>,
    freqs: Box<dyn StorageInput>,
    compress: bool,
    block_index: usize,
    doc_buffer: Vec<u64>,
    freq_buffer: Vec<u32>,
    position: usize,
    exhausted: bool,
}

impl PostingCursor {
    /// Open a cursor positioned at the term's first posting.
    ///
    /// Loads all of the term's skip records (O(sqrt n) of them) and decodes
    /// only the first block. `compress` must match the setting the index
    /// was built with.
    pub fn open(
        storage: &dyn Storage,
        docids_file: &str,
        freqs_file: &str,
        entry: &TermEntry,
        compress: bool,
    ) -> Result<PostingCursor> {
        let mut skips = storage.open_input(SKIPS_FILE)?;
        skips.seek(SeekFrom::Start(entry.skip_offset))?;

        let mut skip_blocks: Vec<SkipBlock> = Vec::with_capacity(entry.skip_count as usize);
        for _ in 0..entry.skip_count {
            let block = SkipBlock {
                doc_offset: skips.read_u64::<LittleEndian>()?,
                doc_len: skips.read_u32::<LittleEndian>()?,
                freq_offset: skips.read_u64::<LittleEndian>()?,
                freq_len: skips.read_u32::<LittleEndian>()?,
                max_doc_id: skips.read_u64::<LittleEndian>()?,
            };
            if let Some(prev) = skip_blocks.last()
                && block.max_doc_id <= prev.max_doc_id
            {
                return Err(PilumError::corrupt(format!(
                    "skip block maxima out of order: {} after {}",
                    block.max_doc_id, prev.max_doc_id
                )));
            }
            skip_blocks.push(block);
        }

        let mut cursor = PostingCursor {
            skip_blocks,
            docids: storage.open_input(docids_file)?,
            freqs: storage.open_input(freqs_file)?,
            compress,
            block_index: 0,
            doc_buffer: Vec::new(),
            freq_buffer: Vec::new(),
            position: 0,
            exhausted: false,
        };

        if cursor.skip_blocks.is_empty() {
            cursor.exhausted = true;
        } else {
            cursor.load_block(0)?;
        }
        Ok(cursor)
    }

    /// The posting under the cursor, or `None` when exhausted.
    pub fn current(&self) -> Option<Posting> {
        if self.exhausted {
            return None;
        }
        Some(Posting::with_frequency(
            self.doc_buffer[self.position],
            self.freq_buffer[self.position],
        ))
    }

    /// True once the cursor has moved past the last posting.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Advance one posting, loading the next block when the current one is
    /// used up.
    pub fn next(&mut self) -> Result<Option<Posting>> {
        if self.exhausted {
            return Ok(None);
        }

        self.position += 1;
        if self.position >= self.doc_buffer.len() {
            let next_block = self.block_index + 1;
            if next_block < self.skip_blocks.len() {
                self.load_block(next_block)?;
            } else {
                self.exhausted = true;
                return Ok(None);
            }
        }
        Ok(self.current())
    }

    /// Advance to the first posting with docID >= `target`.
    ///
    /// Stays put when the current posting already qualifies. Blocks whose
    /// maximum docID is below the target are skipped without decoding.
    pub fn next_geq(&mut self, target: u64) -> Result<Option<Posting>> {
        if self.exhausted {
            return Ok(None);
        }
        if self.doc_buffer[self.position] >= target {
            return Ok(self.current());
        }

        if self.skip_blocks[self.block_index].max_doc_id < target {
            let mut index = self.block_index + 1;
            while index < self.skip_blocks.len() && self.skip_blocks[index].max_doc_id < target {
                index += 1;
            }
            if index == self.skip_blocks.len() {
                self.exhausted = true;
                return Ok(None);
            }
            self.load_block(index)?;
        }

        // The loaded block's maximum is >= target, so the scan ends inside
        // the buffer.
        while self.doc_buffer[self.position] < target {
            self.position += 1;
        }
        Ok(self.current())
    }

    fn load_block(&mut self, index: usize) -> Result<()> {
        let block = self.skip_blocks[index];

        let doc_bytes = read_range(&mut self.docids, block.doc_offset, block.doc_len as usize)?;
        let freq_bytes = read_range(&mut self.freqs, block.freq_offset, block.freq_len as usize)?;
        self.doc_buffer = decode_doc_ids(&doc_bytes, self.compress)?;
        self.freq_buffer = decode_frequencies(&freq_bytes, self.compress)?;

        if self.doc_buffer.is_empty() || self.doc_buffer.len() != self.freq_buffer.len() {
            return Err(PilumError::corrupt(format!(
                "skip block decodes to {} docIDs but {} frequencies",
                self.doc_buffer.len(),
                self.freq_buffer.len()
            )));
        }
        for pair in self.doc_buffer.windows(2) {
            if pair[1] <= pair[0] {
                return Err(PilumError::corrupt(format!(
                    "docID {} out of order after {} inside a block",
                    pair[1], pair[0]
                )));
            }
        }
        if let Some(&last) = self.doc_buffer.last()
            && last != block.max_doc_id
        {
            return Err(PilumError::corrupt(format!(
                "block ends at docID {last} but skip record says {}",
                block.max_doc_id
            )));
        }

        self.block_index = index;
        self.position = 0;
        Ok(())
    }
}

fn read_range(input: &mut Box<dyn StorageInput>, offset: u64, len: usize) -> Result<Vec<u8>> {
    input.seek(SeekFrom::Start(offset))?;
    let mut bytes = vec![0u8; len];
    input.read_exact(&mut bytes)?;
    Ok(bytes)
}

fn decode_doc_ids(bytes: &[u8], compress: bool) -> Result<Vec<u64>> {
    let mut values = Vec::new();
    if compress {
        let mut slice = bytes;
        while !slice.is_empty() {
            let (value, used) = decode_u64(slice)?;
            values.push(value);
            slice = &slice[used..];
        }
    } else {
        if bytes.len() % 8 != 0 {
            return Err(PilumError::corrupt(
                "docID block length is not a multiple of 8",
            ));
        }
        let mut slice = bytes;
        while !slice.is_empty() {
            values.push(slice.read_u64::<LittleEndian>()?);
        }
    }
    Ok(values)
}

fn decode_frequencies(bytes: &[u8], compress: bool) -> Result<Vec<u32>> {
    let mut values = Vec::new();
    if compress {
        let mut slice = bytes;
        while !slice.is_empty() {
            let (value, used) = decode_u32(slice)?;
            values.push(value);
            slice = &slice[used..];
        }
    } else {
        if bytes.len() % 4 != 0 {
            return Err(PilumError::corrupt(
                "frequency block length is not a multiple of 4",
            ));
        }
        let mut slice = bytes;
        while !slice.is_empty() {
            values.push(slice.read_u32::<LittleEndian>()?);
        }
    }
    Ok(values)
}

//! Global term lexicon.
//!
//! The lexicon maps every indexed term to the location of its posting data in
//! the merged index files, together with the precomputed statistics the query
//! evaluator needs (document frequency, idf, and per-scorer upper bounds).
//! It is written once by the merger and loaded whole into memory when an
//! index is opened.

use ahash::AHashMap;

use crate::error::{PilumError, Result};
use crate::storage::{StorageInput, StorageOutput, StructReader, StructWriter};

/// Magic number for lexicon files ("PLXF").
pub const LEXICON_MAGIC: u32 = 0x504C_5846;

/// Current lexicon format version.
pub const LEXICON_VERSION: u32 = 1;

/// Name of the lexicon file inside an index directory.
pub const LEXICON_FILE: &str = "lexicon.bin";

/// Per-term metadata stored in the lexicon.
///
/// Offsets are absolute byte positions in `docids.bin`, `freqs.bin`, and
/// `skips.bin`. The score bounds are upper bounds on the score any single
/// posting of this term can contribute, used by the evaluator to skip
/// non-competitive documents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermEntry {
    /// Start of this term's docID stream in `docids.bin`.
    pub doc_offset: u64,

    /// Start of this term's frequency stream in `freqs.bin`.
    pub freq_offset: u64,

    /// Start of this term's skip records in `skips.bin`.
    pub skip_offset: u64,

    /// Number of skip records for this term.
    pub skip_count: u32,

    /// Number of postings, i.e. the term's document frequency.
    pub posting_count: u64,

    /// Inverse document frequency: log2(doc_count / posting_count).
    pub idf: f64,

    /// Upper bound on the TFIDF score of any posting of this term.
    pub tfidf_bound: f64,

    /// Upper bound on the BM25 score of any posting of this term.
    pub bm25_bound: f64,
}

impl TermEntry {
    /// Serialize this entry's fields in on-disk order.
    fn write_to<W: StorageOutput>(&self, writer: &mut StructWriter<W>) -> Result<()> {
        writer.write_u64(self.doc_offset)?;
        writer.write_u64(self.freq_offset)?;
        writer.write_u64(self.skip_offset)?;
        writer.write_u32(self.skip_count)?;
        writer.write_u64(self.posting_count)?;
        writer.write_f64(self.idf)?;
        writer.write_f64(self.tfidf_bound)?;
        writer.write_f64(self.bm25_bound)?;
        Ok(())
    }

    /// Deserialize an entry's fields in on-disk order.
    fn read_from<R: StorageInput>(reader: &mut StructReader<R>) -> Result<Self> {
        Ok(TermEntry {
            doc_offset: reader.read_u64()?,
            freq_offset: reader.read_u64()?,
            skip_offset: reader.read_u64()?,
            skip_count: reader.read_u32()?,
            posting_count: reader.read_u64()?,
            idf: reader.read_f64()?,
            tfidf_bound: reader.read_f64()?,
            bm25_bound: reader.read_f64()?,
        })
    }
}

/// In-memory term dictionary for one index.
#[derive(Debug, Default)]
pub struct Lexicon {
    entries: AHashMap<String, TermEntry>,
}

impl Lexicon {
    /// Look up a term's entry.
    pub fn get(&self, term: &str) -> Option<&TermEntry> {
        self.entries.get(term)
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the lexicon holds no terms.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all terms in unspecified order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Write a complete lexicon file from term-sorted entries.
    ///
    /// The caller is responsible for sort order; the merger produces entries
    /// in lexicographic term order by construction. Closing the writer
    /// appends the trailing checksum.
    pub fn write<W: StorageOutput>(
        writer: &mut StructWriter<W>,
        entries: &[(String, TermEntry)],
    ) -> Result<()> {
        writer.write_u32(LEXICON_MAGIC)?;
        writer.write_u32(LEXICON_VERSION)?;
        writer.write_varint(entries.len() as u64)?;

        for (term, entry) in entries {
            writer.write_string(term)?;
            entry.write_to(writer)?;
        }

        Ok(())
    }

    /// Load a lexicon file, verifying magic, version, and checksum.
    pub fn load<R: StorageInput>(reader: &mut StructReader<R>) -> Result<Lexicon> {
        let magic = reader.read_u32()?;
        if magic != LEXICON_MAGIC {
            return Err(PilumError::corrupt(format!(
                "bad lexicon magic 0x{magic:08X}"
            )));
        }

        let version = reader.read_u32()?;
        if version != LEXICON_VERSION {
            return Err(PilumError::corrupt(format!(
                "unsupported lexicon version {version}"
            )));
        }

        let count = reader.read_varint()? as usize;
        let mut entries = AHashMap::with_capacity(count);
        for _ in 0..count {
            let term = reader.read_string()?;
            let entry = TermEntry::read_from(reader)?;
            entries.insert(term, entry);
        }

        if !reader.verify_checksum()? {
            return Err(PilumError::corrupt("lexicon checksum mismatch"));
        }

        Ok(Lexicon { entries })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::{MemoryStorage, Storage, StorageConfig};

    fn sample_entry(doc_offset: u64) -> TermEntry {
        TermEntry {
            doc_offset,
            freq_offset: doc_offset + 100,
            skip_offset: doc_offset + 200,
            skip_count: 3,
            posting_count: 42,
            idf: 1.5,
            tfidf_bound: 4.0,
            bm25_bound: 1.2,
        }
    }

    #[test]
    fn test_lexicon_roundtrip() {
        let storage = Arc::new(MemoryStorage::new(StorageConfig::default()));

        let entries = vec![
            ("apple".to_string(), sample_entry(0)),
            ("banana".to_string(), sample_entry(64)),
            ("cherry".to_string(), sample_entry(128)),
        ];

        {
            let output = storage.create_output(LEXICON_FILE).unwrap();
            let mut writer = StructWriter::new(output);
            Lexicon::write(&mut writer, &entries).unwrap();
            writer.close().unwrap();
        }

        let input = storage.open_input(LEXICON_FILE).unwrap();
        let mut reader = StructReader::new(input).unwrap();
        let lexicon = Lexicon::load(&mut reader).unwrap();

        assert_eq!(lexicon.len(), 3);
        assert_eq!(lexicon.get("banana"), Some(&sample_entry(64)));
        assert_eq!(lexicon.get("cherry").unwrap().posting_count, 42);
        assert!(lexicon.get("durian").is_none());
    }

    #[test]
    fn test_lexicon_empty() {
        let storage = Arc::new(MemoryStorage::new(StorageConfig::default()));

        {
            let output = storage.create_output(LEXICON_FILE).unwrap();
            let mut writer = StructWriter::new(output);
            Lexicon::write(&mut writer, &[]).unwrap();
            writer.close().unwrap();
        }

        let input = storage.open_input(LEXICON_FILE).unwrap();
        let mut reader = StructReader::new(input).unwrap();
        let lexicon = Lexicon::load(&mut reader).unwrap();

        assert!(lexicon.is_empty());
    }

    #[test]
    fn test_lexicon_rejects_bad_magic() {
        let storage = Arc::new(MemoryStorage::new(StorageConfig::default()));

        {
            let output = storage.create_output(LEXICON_FILE).unwrap();
            let mut writer = StructWriter::new(output);
            writer.write_u32(0xDEAD_BEEF).unwrap();
            writer.write_u32(LEXICON_VERSION).unwrap();
            writer.write_varint(0).unwrap();
            writer.close().unwrap();
        }

        let input = storage.open_input(LEXICON_FILE).unwrap();
        let mut reader = StructReader::new(input).unwrap();
        let result = Lexicon::load(&mut reader);

        assert!(matches!(result, Err(PilumError::Corrupt(_))));
    }
}

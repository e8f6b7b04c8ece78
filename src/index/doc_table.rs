//! Document table: internal docID to external document number and length.
//!
//! Internal docIDs are dense and start at 1, so the table is a plain vector
//! and lookup is an index subtraction. On disk each record is fixed width,
//! which keeps the record for docID d at a computable position.

use crate::error::{PilumError, Result};
use crate::storage::{StorageInput, StorageOutput, StructReader, StructWriter};

/// Magic number for document table files ("PDOC").
pub const DOCTABLE_MAGIC: u32 = 0x5044_4F43;

/// Current document table format version.
pub const DOCTABLE_VERSION: u32 = 1;

/// Name of the document table file inside an index directory.
pub const DOCTABLE_FILE: &str = "doctable.bin";

/// Maximum byte length of an external document number.
pub const MAX_DOC_NO_BYTES: usize = 32;

/// On-disk size of one document record (padded docno + length).
pub const DOC_RECORD_BYTES: u64 = 36;

/// One indexed document: its external identifier and term count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocEntry {
    /// External document number, at most 32 bytes.
    pub doc_no: String,

    /// Number of terms in the document after analysis.
    pub doc_len: u32,
}

impl DocEntry {
    /// Create an entry, rejecting document numbers over the record width.
    pub fn new<S: Into<String>>(doc_no: S, doc_len: u32) -> Result<Self> {
        let doc_no = doc_no.into();
        if doc_no.len() > MAX_DOC_NO_BYTES {
            return Err(PilumError::index(format!(
                "document number '{doc_no}' exceeds {MAX_DOC_NO_BYTES} bytes"
            )));
        }
        Ok(DocEntry { doc_no, doc_len })
    }
}

/// In-memory document table for one index.
#[derive(Debug, Default)]
pub struct DocTable {
    entries: Vec<DocEntry>,
}

impl DocTable {
    /// Look up a document by internal docID (1-based).
    pub fn get(&self, doc_id: u64) -> Option<&DocEntry> {
        usize::try_from(doc_id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|index| self.entries.get(index))
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no documents are indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write a complete document table, entries in docID order.
    pub fn write<W: StorageOutput>(
        writer: &mut StructWriter<W>,
        entries: &[DocEntry],
    ) -> Result<()> {
        writer.write_u32(DOCTABLE_MAGIC)?;
        writer.write_u32(DOCTABLE_VERSION)?;
        writer.write_u64(entries.len() as u64)?;

        for entry in entries {
            let bytes = entry.doc_no.as_bytes();
            if bytes.len() > MAX_DOC_NO_BYTES {
                return Err(PilumError::index(format!(
                    "document number '{}' exceeds {MAX_DOC_NO_BYTES} bytes",
                    entry.doc_no
                )));
            }
            let mut record = [0u8; MAX_DOC_NO_BYTES];
            record[..bytes.len()].copy_from_slice(bytes);
            writer.write_raw(&record)?;
            writer.write_u32(entry.doc_len)?;
        }

        Ok(())
    }

    /// Load a document table, verifying magic, version, and checksum.
    pub fn load<R: StorageInput>(reader: &mut StructReader<R>) -> Result<DocTable> {
        let magic = reader.read_u32()?;
        if magic != DOCTABLE_MAGIC {
            return Err(PilumError::corrupt(format!(
                "bad document table magic 0x{magic:08X}"
            )));
        }

        let version = reader.read_u32()?;
        if version != DOCTABLE_VERSION {
            return Err(PilumError::corrupt(format!(
                "unsupported document table version {version}"
            )));
        }

        let count = reader.read_u64()? as usize;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let padded = reader.read_raw(MAX_DOC_NO_BYTES)?;
            let end = padded
                .iter()
                .position(|&b| b == 0)
                .unwrap_or(MAX_DOC_NO_BYTES);
            let doc_no = String::from_utf8(padded[..end].to_vec())
                .map_err(|e| PilumError::corrupt(format!("invalid docno bytes: {e}")))?;
            let doc_len = reader.read_u32()?;
            entries.push(DocEntry { doc_no, doc_len });
        }

        if !reader.verify_checksum()? {
            return Err(PilumError::corrupt("document table checksum mismatch"));
        }

        Ok(DocTable { entries })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::{MemoryStorage, Storage, StorageConfig};

    fn write_table(storage: &Arc<MemoryStorage>, entries: &[DocEntry]) {
        let output = storage.create_output(DOCTABLE_FILE).unwrap();
        let mut writer = StructWriter::new(output);
        DocTable::write(&mut writer, entries).unwrap();
        writer.close().unwrap();
    }

    fn load_table(storage: &Arc<MemoryStorage>) -> DocTable {
        let input = storage.open_input(DOCTABLE_FILE).unwrap();
        let mut reader = StructReader::new(input).unwrap();
        DocTable::load(&mut reader).unwrap()
    }

    #[test]
    fn test_doc_table_roundtrip() {
        let storage = Arc::new(MemoryStorage::new(StorageConfig::default()));
        let entries = vec![
            DocEntry::new("WSJ870324-0001", 251).unwrap(),
            DocEntry::new("WSJ870324-0002", 40).unwrap(),
            DocEntry::new("AP890101-0003", 1187).unwrap(),
        ];

        write_table(&storage, &entries);
        let table = load_table(&storage);

        assert_eq!(table.len(), 3);
        assert_eq!(table.get(1).unwrap().doc_no, "WSJ870324-0001");
        assert_eq!(table.get(2).unwrap().doc_len, 40);
        assert_eq!(table.get(3).unwrap().doc_no, "AP890101-0003");
        assert!(table.get(0).is_none());
        assert!(table.get(4).is_none());
    }

    #[test]
    fn test_doc_no_at_record_width() {
        let storage = Arc::new(MemoryStorage::new(StorageConfig::default()));
        let exact = "a".repeat(MAX_DOC_NO_BYTES);
        let entries = vec![DocEntry::new(exact.clone(), 9).unwrap()];

        write_table(&storage, &entries);
        let table = load_table(&storage);

        assert_eq!(table.get(1).unwrap().doc_no, exact);
    }

    #[test]
    fn test_doc_no_too_long_rejected() {
        let too_long = "a".repeat(MAX_DOC_NO_BYTES + 1);
        assert!(DocEntry::new(too_long, 1).is_err());
    }

    #[test]
    fn test_empty_table() {
        let storage = Arc::new(MemoryStorage::new(StorageConfig::default()));
        write_table(&storage, &[]);

        let table = load_table(&storage);
        assert!(table.is_empty());
        assert!(table.get(1).is_none());
    }

    #[test]
    fn test_bad_magic_rejected() {
        let storage = Arc::new(MemoryStorage::new(StorageConfig::default()));

        {
            let output = storage.create_output(DOCTABLE_FILE).unwrap();
            let mut writer = StructWriter::new(output);
            writer.write_u32(0x0BAD_F00D).unwrap();
            writer.write_u32(DOCTABLE_VERSION).unwrap();
            writer.write_u64(0).unwrap();
            writer.close().unwrap();
        }

        let input = storage.open_input(DOCTABLE_FILE).unwrap();
        let mut reader = StructReader::new(input).unwrap();
        assert!(matches!(
            DocTable::load(&mut reader),
            Err(PilumError::Corrupt(_))
        ));
    }

    #[test]
    fn test_record_layout_is_fixed_width() {
        let storage = Arc::new(MemoryStorage::new(StorageConfig::default()));
        let entries = vec![
            DocEntry::new("doc-1", 5).unwrap(),
            DocEntry::new("doc-2", 6).unwrap(),
        ];

        write_table(&storage, &entries);

        // Header (magic + version + count) is 16 bytes, records 36 each,
        // trailing checksum 4.
        let size = storage.file_size(DOCTABLE_FILE).unwrap();
        assert_eq!(size, 16 + 2 * DOC_RECORD_BYTES + 4);
    }
}

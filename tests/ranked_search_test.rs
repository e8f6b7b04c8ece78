//! End-to-end build and search over on-disk indexes.

use std::sync::Arc;

use pilum::error::PilumError;
use pilum::index::writer::{IndexSettings, IndexWriter, IndexWriterConfig};
use pilum::search::{QueryMode, ScoringFunction, SearchOptions, Searcher};
use pilum::storage::{FileStorage, StorageConfig};
use tempfile::TempDir;

fn build_on_disk(
    dir: &TempDir,
    docs: &[(&str, &str)],
    settings: IndexSettings,
    memory_budget: usize,
) {
    let storage = FileStorage::new(dir.path(), StorageConfig::default()).unwrap();
    let config = IndexWriterConfig {
        settings,
        memory_budget,
    };
    let mut writer = IndexWriter::new(Arc::new(storage), config).unwrap();
    for (doc_no, text) in docs {
        writer.add_document(doc_no, text).unwrap();
    }
    writer.commit().unwrap();
}

fn open(dir: &TempDir) -> Searcher {
    let storage = FileStorage::new(dir.path(), StorageConfig::default()).unwrap();
    Searcher::open(Arc::new(storage)).unwrap()
}

fn verbatim() -> IndexSettings {
    IndexSettings {
        stemming_and_stopwords: false,
        compression: true,
    }
}

const BUDGET: usize = 256 * 1024 * 1024;

#[test]
fn test_build_then_reopen_and_search() {
    let dir = TempDir::new().unwrap();
    build_on_disk(
        &dir,
        &[
            ("WSJ870324-0001", "gold mining stocks rallied"),
            ("WSJ870324-0002", "silver futures fell sharply"),
            ("WSJ870324-0003", "gold and silver closed mixed"),
        ],
        verbatim(),
        BUDGET,
    );

    // A fresh storage handle sees only what was persisted.
    let searcher = open(&dir);
    assert_eq!(searcher.doc_count(), 3);

    let results = searcher
        .search("gold", &SearchOptions::default())
        .unwrap();

    let doc_nos: Vec<&str> = results.iter().map(|r| r.doc_no.as_str()).collect();
    assert_eq!(doc_nos.len(), 2);
    assert!(doc_nos.contains(&"WSJ870324-0001"));
    assert!(doc_nos.contains(&"WSJ870324-0003"));
}

#[test]
fn test_worked_example_tfidf_scores() {
    let dir = TempDir::new().unwrap();
    build_on_disk(&dir, &[("doc1", "a b a"), ("doc2", "b c")], verbatim(), BUDGET);

    let searcher = open(&dir);
    let options = SearchOptions {
        mode: QueryMode::Disjunctive,
        scoring: ScoringFunction::Tfidf,
        top_k: 2,
    };
    let results = searcher.search("a c", &options).unwrap();

    // a: only doc1, frequency 2, idf log2(2/1)=1, score (1+log2 2)*1 = 2.
    // c: only doc2, frequency 1, score (1+log2 1)*1 = 1.
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].doc_no, "doc1");
    assert!((results[0].score - 2.0).abs() < 1e-9);
    assert_eq!(results[1].doc_no, "doc2");
    assert!((results[1].score - 1.0).abs() < 1e-9);
}

#[test]
fn test_compressed_and_uncompressed_agree() {
    let docs: Vec<(String, String)> = (0..120)
        .map(|i| {
            let doc_no = format!("D{i:03}");
            // Overlapping vocabulary with varying frequencies.
            let mut words = Vec::new();
            for j in 0..(1 + i % 7) {
                words.push(format!("w{}", (i + j) % 11));
            }
            (doc_no, words.join(" "))
        })
        .collect();
    let doc_refs: Vec<(&str, &str)> = docs
        .iter()
        .map(|(n, t)| (n.as_str(), t.as_str()))
        .collect();

    let compressed_dir = TempDir::new().unwrap();
    build_on_disk(&compressed_dir, &doc_refs, verbatim(), BUDGET);

    let fixed_dir = TempDir::new().unwrap();
    build_on_disk(
        &fixed_dir,
        &doc_refs,
        IndexSettings {
            stemming_and_stopwords: false,
            compression: false,
        },
        BUDGET,
    );

    let compressed = open(&compressed_dir);
    let fixed = open(&fixed_dir);

    for query in ["w0", "w3 w7", "w1 w2 w10", "w5 w5 w6"] {
        for mode in [QueryMode::Disjunctive, QueryMode::Conjunctive] {
            for scoring in [ScoringFunction::Bm25, ScoringFunction::Tfidf] {
                let options = SearchOptions {
                    mode,
                    scoring,
                    top_k: 20,
                };
                let a = compressed.search(query, &options).unwrap();
                let b = fixed.search(query, &options).unwrap();
                assert_eq!(a, b, "query {query:?} diverged between codecs");
            }
        }
    }
}

#[test]
fn test_small_memory_budget_forces_multiway_merge() {
    let mut docs: Vec<(String, String)> = (0..40)
        .map(|i| (format!("doc{i}"), format!("shared unique{i} shared")))
        .collect();
    // One document without "shared" keeps that term's idf positive.
    docs.push(("doc40".to_string(), "oddball".to_string()));
    let doc_refs: Vec<(&str, &str)> = docs
        .iter()
        .map(|(n, t)| (n.as_str(), t.as_str()))
        .collect();

    let dir = TempDir::new().unwrap();
    // A tiny budget flushes a partial block for almost every document.
    build_on_disk(&dir, &doc_refs, verbatim(), 64);

    let searcher = open(&dir);
    assert!(searcher.statistics().block_count > 1);

    let options = SearchOptions {
        top_k: 100,
        ..Default::default()
    };
    let results = searcher.search("shared", &options).unwrap();
    assert_eq!(results.len(), 40);

    let results = searcher.search("unique7", &options).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].doc_no, "doc7");
}

#[test]
fn test_stemming_and_stopwords_survive_reopen() {
    let dir = TempDir::new().unwrap();
    build_on_disk(
        &dir,
        &[
            ("d1", "the runner was running happily"),
            ("d2", "a walker walked"),
        ],
        IndexSettings {
            stemming_and_stopwords: true,
            compression: true,
        },
        BUDGET,
    );

    let searcher = open(&dir);
    assert!(searcher.settings().stemming_and_stopwords);

    // Query-side stemming maps "runs" onto the indexed stem of "running".
    let results = searcher.search("runs", &SearchOptions::default()).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].doc_no, "d1");

    // A pure stopword query has no terms left after analysis.
    let err = searcher
        .search("the was", &SearchOptions::default())
        .unwrap_err();
    assert!(matches!(err, PilumError::QueryTooVague));
}

#[test]
fn test_top_k_limits_results() {
    let mut docs: Vec<(String, String)> = (0..25)
        .map(|i| (format!("doc{i}"), "term ".repeat(i + 1).trim().to_string()))
        .collect();
    // A term in every document has idf zero, so keep one document out.
    docs.push(("doc25".to_string(), "other".to_string()));
    let doc_refs: Vec<(&str, &str)> = docs
        .iter()
        .map(|(n, t)| (n.as_str(), t.as_str()))
        .collect();

    let dir = TempDir::new().unwrap();
    build_on_disk(&dir, &doc_refs, verbatim(), BUDGET);

    let searcher = open(&dir);
    let options = SearchOptions {
        top_k: 5,
        ..Default::default()
    };
    let results = searcher.search("term", &options).unwrap();

    assert_eq!(results.len(), 5);
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn test_documents_emptied_by_analysis_are_not_indexed() {
    let dir = TempDir::new().unwrap();
    let storage = FileStorage::new(dir.path(), StorageConfig::default()).unwrap();
    let config = IndexWriterConfig {
        settings: IndexSettings {
            stemming_and_stopwords: true,
            compression: true,
        },
        memory_budget: BUDGET,
    };
    let mut writer = IndexWriter::new(Arc::new(storage), config).unwrap();

    assert!(writer.add_document("d1", "stocks rallied").unwrap().is_some());
    // Nothing but stopwords: the document is dropped entirely.
    assert!(writer.add_document("d2", "the of and").unwrap().is_none());
    assert!(writer.add_document("d3", "bonds fell").unwrap().is_some());
    let stats = writer.commit().unwrap();

    assert_eq!(stats.doc_count, 2);

    let searcher = open(&dir);
    assert_eq!(searcher.doc_count(), 2);
    let results = searcher.search("bonds", &SearchOptions::default()).unwrap();
    assert_eq!(results[0].doc_no, "d3");
}

#[test]
fn test_empty_collection_builds_and_rejects_queries() {
    let dir = TempDir::new().unwrap();
    build_on_disk(&dir, &[], verbatim(), BUDGET);

    let searcher = open(&dir);
    assert_eq!(searcher.doc_count(), 0);
    assert_eq!(searcher.term_count(), 0);

    let err = searcher
        .search("anything", &SearchOptions::default())
        .unwrap_err();
    assert!(matches!(err, PilumError::QueryTooVague));
}

#[test]
fn test_pre_tokenized_ingestion() {
    let dir = TempDir::new().unwrap();
    let storage = FileStorage::new(dir.path(), StorageConfig::default()).unwrap();
    let config = IndexWriterConfig {
        settings: verbatim(),
        memory_budget: BUDGET,
    };
    let mut writer = IndexWriter::new(Arc::new(storage), config).unwrap();

    // Whitespace tokenization keeps hyphenated tokens whole, where the
    // standard analyzer would split them.
    writer.add_tokenized("d1", "trade-off analysis").unwrap();
    writer.add_tokenized("d2", "plain filler").unwrap();
    writer.commit().unwrap();

    let searcher = open(&dir);
    assert_eq!(searcher.term_count(), 4);

    let results = searcher.search("analysis", &SearchOptions::default()).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].doc_no, "d1");

    // The query side splits "trade-off" into halves that were never
    // indexed as standalone terms.
    let err = searcher
        .search("trade-off", &SearchOptions::default())
        .unwrap_err();
    assert!(matches!(err, PilumError::QueryTooVague));
}

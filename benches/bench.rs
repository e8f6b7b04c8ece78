//! Criterion benchmarks for the Pilum index.
//!
//! This module covers the hot paths of the engine:
//! - Text analysis and tokenization
//! - Variable-byte posting compression
//! - Index construction
//! - Ranked query evaluation

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use pilum::analysis::{Analyzer, standard_analyzer};
use pilum::index::writer::{IndexWriter, IndexWriterConfig};
use pilum::search::{QueryMode, SearchOptions, Searcher};
use pilum::storage::{MemoryStorage, StorageConfig};
use pilum::util::varint;
use std::hint::black_box;
use std::sync::Arc;

/// Generate test documents for benchmarking.
fn generate_test_documents(count: usize) -> Vec<String> {
    let words = vec![
        "search",
        "engine",
        "inverted",
        "index",
        "query",
        "document",
        "term",
        "posting",
        "frequency",
        "ranking",
        "relevance",
        "score",
        "analysis",
        "tokenization",
        "stemming",
        "compression",
        "block",
        "merge",
        "lexicon",
        "corpus",
        "retrieval",
        "evaluation",
        "collection",
        "statistics",
        "memory",
        "storage",
        "buffer",
        "cursor",
        "pruning",
        "threshold",
        "performance",
        "throughput",
    ];

    let mut documents = Vec::with_capacity(count);
    for i in 0..count {
        let doc_length = 50 + (i % 100); // Variable length documents
        let mut doc_words = Vec::with_capacity(doc_length);

        for j in 0..doc_length {
            let word_idx = (i * 7 + j * 13) % words.len(); // Pseudo-random distribution
            doc_words.push(words[word_idx]);
        }

        documents.push(doc_words.join(" "));
    }

    documents
}

/// Build an in-memory index over `documents` and open a searcher on it.
fn build_searcher(documents: &[String]) -> Searcher {
    let storage = Arc::new(MemoryStorage::new(StorageConfig::default()));
    let mut writer = IndexWriter::new(storage.clone(), IndexWriterConfig::default()).unwrap();
    for (i, text) in documents.iter().enumerate() {
        writer.add_document(&format!("doc{i:05}"), text).unwrap();
    }
    writer.commit().unwrap();
    Searcher::open(storage).unwrap()
}

/// Benchmark text analysis and tokenization.
fn bench_text_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_analysis");

    let analyzer = standard_analyzer(true).unwrap();
    let texts = generate_test_documents(1000);

    // Single document analysis
    group.bench_function("analyze_single_document", |b| {
        b.iter(|| {
            let terms = analyzer.analyze_terms(black_box(&texts[0])).unwrap();
            black_box(terms)
        })
    });

    // Batch document analysis
    group.throughput(Throughput::Elements(100));
    group.bench_function("analyze_batch_documents", |b| {
        b.iter(|| {
            for text in texts.iter().take(100) {
                let terms = analyzer.analyze_terms(black_box(text)).unwrap();
                black_box(terms);
            }
        })
    });

    group.finish();
}

/// Benchmark variable-byte posting compression.
fn bench_varint_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("varint_codec");

    // Gap-shaped values: mostly small with an occasional large jump.
    let values: Vec<u64> = (0..10_000u64)
        .map(|i| {
            let base = (i * 7919) % 1000 + 1;
            if i % 97 == 0 { base * 100_000 } else { base }
        })
        .collect();

    group.throughput(Throughput::Elements(values.len() as u64));
    group.bench_function("encode_10k_values", |b| {
        b.iter(|| {
            let mut buffer = Vec::with_capacity(values.len() * 2);
            for &value in &values {
                varint::write_u64(&mut buffer, black_box(value)).unwrap();
            }
            black_box(buffer)
        })
    });

    let mut encoded = Vec::new();
    for &value in &values {
        varint::write_u64(&mut encoded, value).unwrap();
    }

    group.throughput(Throughput::Elements(values.len() as u64));
    group.bench_function("decode_10k_values", |b| {
        b.iter(|| {
            let mut offset = 0;
            let mut sum = 0u64;
            while offset < encoded.len() {
                let (value, used) = varint::decode_u64(black_box(&encoded[offset..])).unwrap();
                offset += used;
                sum = sum.wrapping_add(value);
            }
            black_box(sum)
        })
    });

    group.finish();
}

/// Benchmark ranked query evaluation over a prebuilt index.
fn bench_query_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_evaluation");

    let documents = generate_test_documents(2000);
    let searcher = build_searcher(&documents);

    group.bench_function("single_term_top_10", |b| {
        let options = SearchOptions::default();
        b.iter(|| {
            let results = searcher.search(black_box("ranking"), &options).unwrap();
            black_box(results)
        })
    });

    group.bench_function("disjunctive_three_terms_top_10", |b| {
        let options = SearchOptions::default();
        b.iter(|| {
            let results = searcher
                .search(black_box("compression merge lexicon"), &options)
                .unwrap();
            black_box(results)
        })
    });

    group.bench_function("conjunctive_three_terms_top_10", |b| {
        let options = SearchOptions {
            mode: QueryMode::Conjunctive,
            ..Default::default()
        };
        b.iter(|| {
            let results = searcher
                .search(black_box("compression merge lexicon"), &options)
                .unwrap();
            black_box(results)
        })
    });

    group.bench_function("disjunctive_three_terms_top_100", |b| {
        let options = SearchOptions {
            top_k: 100,
            ..Default::default()
        };
        b.iter(|| {
            let results = searcher
                .search(black_box("compression merge lexicon"), &options)
                .unwrap();
            black_box(results)
        })
    });

    group.finish();
}

/// Benchmark full index construction including the merge.
fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");
    group.sample_size(20); // Commit includes the full merge pass

    let documents = generate_test_documents(200);

    group.throughput(Throughput::Elements(documents.len() as u64));
    group.bench_function("build_200_documents", |b| {
        b.iter_with_setup(
            || {
                let storage = Arc::new(MemoryStorage::new(StorageConfig::default()));
                IndexWriter::new(storage, IndexWriterConfig::default()).unwrap()
            },
            |mut writer| {
                for (i, text) in documents.iter().enumerate() {
                    writer
                        .add_document(&format!("doc{i:05}"), black_box(text))
                        .unwrap();
                }
                let stats = writer.commit().unwrap();
                black_box(stats);
            },
        )
    });

    group.finish();
}

/// Comprehensive benchmark suite covering different collection sizes.
fn bench_scalability(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalability");
    group.sample_size(10);

    for size in [500, 1000].iter() {
        group.bench_with_input(format!("build_{size}_documents"), size, |b, &count| {
            let documents = generate_test_documents(count);

            b.iter_with_setup(
                || {
                    let storage = Arc::new(MemoryStorage::new(StorageConfig::default()));
                    IndexWriter::new(storage, IndexWriterConfig::default()).unwrap()
                },
                |mut writer| {
                    for (i, text) in documents.iter().enumerate() {
                        writer.add_document(&format!("doc{i:05}"), text).unwrap();
                    }
                    let stats = writer.commit().unwrap();
                    black_box(stats);
                },
            )
        });
    }

    group.finish();
}

// Group all benchmarks - core benchmarks for faster execution
criterion_group!(
    benches,
    bench_text_analysis,
    bench_varint_codec,
    bench_query_evaluation
);

// Separate group for slower benchmarks
criterion_group!(slow_benches, bench_index_build, bench_scalability);

criterion_main!(benches, slow_benches);

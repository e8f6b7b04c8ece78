//! Command implementations for the Pilum CLI.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::sync::Arc;
use std::time::Instant;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::{PilumError, Result};
use crate::index::builder::DEFAULT_MEMORY_BUDGET;
use crate::index::writer::{IndexSettings, IndexWriter, IndexWriterConfig};
use crate::search::scorer::ScoringFunction;
use crate::search::{QueryMode, SearchOptions, Searcher};
use crate::storage::{FileStorage, Storage, StorageConfig};

/// Execute a CLI command.
pub fn execute_command(args: PilumArgs) -> Result<()> {
    match &args.command {
        Command::Build(build_args) => build_index(build_args.clone(), &args),
        Command::Search(search_args) => search_index(search_args.clone(), &args),
        Command::BatchSearch(batch_args) => batch_search(batch_args.clone(), &args),
        Command::Stats(stats_args) => show_stats(stats_args.clone(), &args),
    }
}

fn search_options(mode: MatchMode, scorer: Scorer, top_k: usize) -> SearchOptions {
    SearchOptions {
        mode: match mode {
            MatchMode::Conjunctive => QueryMode::Conjunctive,
            MatchMode::Disjunctive => QueryMode::Disjunctive,
        },
        scoring: match scorer {
            Scorer::Bm25 => ScoringFunction::Bm25,
            Scorer::Tfidf => ScoringFunction::Tfidf,
        },
        top_k,
    }
}

/// Build an index from a `docno<TAB>text` collection file.
fn build_index(args: BuildArgs, cli_args: &PilumArgs) -> Result<()> {
    if cli_args.verbosity() > 0 {
        println!("Indexing collection: {}", args.collection.display());
        println!("Into: {}", args.index_path.display());
    }

    std::fs::create_dir_all(&args.index_path)?;
    let storage = FileStorage::new(&args.index_path, StorageConfig::default())?;

    let config = IndexWriterConfig {
        settings: IndexSettings {
            stemming_and_stopwords: !args.no_stemming,
            compression: !args.no_compression,
        },
        memory_budget: args
            .memory_budget_mb
            .map(|mib| mib * 1024 * 1024)
            .unwrap_or(DEFAULT_MEMORY_BUDGET),
    };
    let mut writer = IndexWriter::new(Arc::new(storage), config)?;

    let start_time = Instant::now();
    let mut skipped = 0u64;

    let file = File::open(&args.collection)?;
    let reader = BufReader::new(file);

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }

        let Some((doc_no, text)) = line.split_once('\t') else {
            if cli_args.verbosity() > 0 {
                eprintln!("Skipping line {}: no tab separator", line_num + 1);
            }
            skipped += 1;
            continue;
        };

        let added = if args.pre_tokenized {
            writer.add_tokenized(doc_no, text)?
        } else {
            writer.add_document(doc_no, text)?
        };

        if added.is_none() {
            // Analysis left no terms; the document is not indexed.
            skipped += 1;
        }

        let seen = writer.doc_count() + skipped;
        if seen % 100_000 == 0 && cli_args.verbosity() > 1 {
            println!("Processed {seen} documents...");
        }
    }

    let stats = writer.commit()?;
    let duration = start_time.elapsed();

    output_result(
        "Index built successfully",
        &BuildResult {
            path: args.index_path.to_string_lossy().to_string(),
            documents_indexed: stats.doc_count,
            documents_skipped: skipped,
            blocks_flushed: stats.block_count,
            avg_doc_len: stats.avg_doc_len,
            duration_ms: duration.as_millis() as u64,
            docs_per_second: if duration.as_secs_f64() > 0.0 {
                stats.doc_count as f64 / duration.as_secs_f64()
            } else {
                0.0
            },
        },
        cli_args,
    )?;

    Ok(())
}

/// Run a single query and print the ranked results.
fn search_index(args: SearchArgs, cli_args: &PilumArgs) -> Result<()> {
    if cli_args.verbosity() > 1 {
        println!("Searching index: {}", args.index_path.display());
        println!("Query: {}", args.query);
        println!("Mode: {:?}, scorer: {:?}, top-k: {}", args.mode, args.scorer, args.top_k);
    }

    let storage = FileStorage::new(&args.index_path, StorageConfig::default())?;
    let searcher = Searcher::open(Arc::new(storage))?;
    let options = search_options(args.mode, args.scorer, args.top_k);

    let start_time = Instant::now();
    let ranked = searcher.search(&args.query, &options)?;
    let duration = start_time.elapsed();

    let results = SearchResults {
        query: args.query.clone(),
        hits: ranked
            .into_iter()
            .enumerate()
            .map(|(i, doc)| SearchHit {
                rank: i + 1,
                doc_no: doc.doc_no,
                score: doc.score,
            })
            .collect(),
        duration_ms: duration.as_millis() as u64,
    };

    output_result("Search completed", &results, cli_args)?;

    Ok(())
}

/// Run every query in a `queryID<TAB>query` file and emit a run file.
///
/// With `--output` the run lines go to the named file and a summary is
/// printed; without it the lines go to stdout and the summary is suppressed
/// so the output stays a valid run file.
fn batch_search(args: BatchSearchArgs, cli_args: &PilumArgs) -> Result<()> {
    if cli_args.verbosity() > 1 {
        println!("Searching index: {}", args.index_path.display());
        println!("Queries: {}", args.queries_file.display());
    }

    let storage = FileStorage::new(&args.index_path, StorageConfig::default())?;
    let searcher = Searcher::open(Arc::new(storage))?;
    let options = search_options(args.mode, args.scorer, args.top_k);

    let start_time = Instant::now();
    let mut queries_run = 0usize;
    let mut queries_skipped = 0usize;
    let mut lines = Vec::new();

    let file = File::open(&args.queries_file)?;
    let reader = BufReader::new(file);

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }

        let Some((query_id, query_text)) = line.split_once('\t') else {
            if cli_args.verbosity() > 0 {
                eprintln!("Skipping line {}: no tab separator", line_num + 1);
            }
            queries_skipped += 1;
            continue;
        };

        match searcher.search_query(query_id, query_text, &options) {
            Ok(results) => {
                queries_run += 1;
                lines.extend(run_file_lines(&results, &args.run_name));
            }
            // A query whose every term is unknown produces no run lines
            // but must not abort the rest of the batch.
            Err(PilumError::QueryTooVague) => {
                if cli_args.verbosity() > 1 {
                    eprintln!("Query {query_id} matched no collection terms");
                }
                queries_skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }

    let duration = start_time.elapsed();
    let lines_written = lines.len();

    match &args.output {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            for line in &lines {
                writeln!(out, "{line}")?;
            }
            out.flush()?;

            output_result(
                "Batch search completed",
                &BatchSearchResult {
                    queries_run,
                    queries_skipped,
                    lines_written,
                    output: Some(path.to_string_lossy().to_string()),
                    duration_ms: duration.as_millis() as u64,
                },
                cli_args,
            )?;
        }
        None => {
            for line in &lines {
                println!("{line}");
            }
            if cli_args.verbosity() > 1 {
                eprintln!(
                    "Ran {queries_run} queries ({queries_skipped} skipped), {lines_written} result lines"
                );
            }
        }
    }

    Ok(())
}

/// Show statistics for an existing index.
fn show_stats(args: StatsArgs, cli_args: &PilumArgs) -> Result<()> {
    if cli_args.verbosity() > 1 {
        println!("Gathering statistics for: {}", args.index_path.display());
    }

    let storage: Arc<dyn Storage> =
        Arc::new(FileStorage::new(&args.index_path, StorageConfig::default())?);
    let index_size_bytes = total_storage_size(storage.as_ref())?;
    let searcher = Searcher::open(storage)?;
    let collection = searcher.statistics();

    let stats = IndexStats {
        documents: collection.doc_count,
        terms: searcher.term_count() as u64,
        avg_doc_len: collection.avg_doc_len,
        blocks_flushed: collection.block_count,
        index_size_bytes,
        build_time_secs: collection.build_time_secs,
        built_at: collection.built_at.to_rfc3339(),
        stemming_and_stopwords: searcher.settings().stemming_and_stopwords,
        compression: searcher.settings().compression,
    };

    output_result("Index statistics", &stats, cli_args)?;

    Ok(())
}

/// Total size of every file in the storage.
fn total_storage_size(storage: &dyn Storage) -> Result<u64> {
    let mut size = 0;
    for name in storage.list_files()? {
        size += storage.file_size(&name)?;
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_search_options_mapping() {
        let options = search_options(MatchMode::Conjunctive, Scorer::Tfidf, 25);
        assert_eq!(options.mode, QueryMode::Conjunctive);
        assert_eq!(options.scoring, ScoringFunction::Tfidf);
        assert_eq!(options.top_k, 25);

        let options = search_options(MatchMode::Disjunctive, Scorer::Bm25, 10);
        assert_eq!(options.mode, QueryMode::Disjunctive);
        assert_eq!(options.scoring, ScoringFunction::Bm25);
    }

    #[test]
    fn test_total_storage_size() {
        let storage = MemoryStorage::new(StorageConfig::default());
        {
            let mut out = storage.create_output("a.bin").unwrap();
            out.write_all(&[0u8; 10]).unwrap();
            out.close().unwrap();
        }
        {
            let mut out = storage.create_output("b.bin").unwrap();
            out.write_all(&[0u8; 5]).unwrap();
            out.close().unwrap();
        }

        assert_eq!(total_storage_size(&storage).unwrap(), 15);
    }
}

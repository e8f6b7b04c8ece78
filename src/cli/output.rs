//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, PilumArgs};
use crate::error::Result;
use crate::search::QueryResults;

/// Result structure for index builds.
#[derive(Debug, Serialize, Deserialize)]
pub struct BuildResult {
    pub path: String,
    pub documents_indexed: u64,
    pub documents_skipped: u64,
    pub blocks_flushed: u32,
    pub avg_doc_len: f64,
    pub duration_ms: u64,
    pub docs_per_second: f64,
}

/// One ranked hit as shown to the user.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchHit {
    pub rank: usize,
    pub doc_no: String,
    pub score: f64,
}

/// Result structure for single-query searches.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub hits: Vec<SearchHit>,
    pub duration_ms: u64,
}

/// Result structure for batch query runs.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchSearchResult {
    pub queries_run: usize,
    pub queries_skipped: usize,
    pub lines_written: usize,
    pub output: Option<String>,
    pub duration_ms: u64,
}

/// Index statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexStats {
    pub documents: u64,
    pub terms: u64,
    pub avg_doc_len: f64,
    pub blocks_flushed: u32,
    pub index_size_bytes: u64,
    pub build_time_secs: f64,
    pub built_at: String,
    pub stemming_and_stopwords: bool,
    pub compression: bool,
}

/// Format one query's results as run-file lines.
///
/// Each line is `queryID Q0 docno rank score runName`, ranks starting at 1,
/// compatible with trec_eval.
pub fn run_file_lines(results: &QueryResults, run_name: &str) -> Vec<String> {
    results
        .docs
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            format!(
                "{} Q0 {} {} {:.4} {}",
                results.query_id,
                doc.doc_no,
                i + 1,
                doc.score,
                run_name
            )
        })
        .collect()
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &PilumArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &PilumArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    // Convert to JSON value for easier manipulation
    let value = serde_json::to_value(result)?;

    match result {
        _ if std::any::type_name::<T>().contains("SearchResults") => {
            output_search_results_human(&value)
        }
        _ if std::any::type_name::<T>().contains("IndexStats") => output_index_stats_human(&value),
        _ => output_generic_human(&value),
    }
}

/// Output search results in human format.
fn output_search_results_human(value: &serde_json::Value) -> Result<()> {
    if let Some(obj) = value.as_object()
        && let Some(hits) = obj.get("hits").and_then(|h| h.as_array())
    {
        println!("Search Results:");
        println!("═══════════════");

        for hit in hits {
            let rank = hit.get("rank").and_then(|r| r.as_u64()).unwrap_or(0);
            let doc_no = hit.get("doc_no").and_then(|d| d.as_str()).unwrap_or("?");
            let score = hit.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0);
            println!("{rank:>4}. {doc_no}  (score: {score:.4})");
        }

        if hits.is_empty() {
            println!("(no matching documents)");
        }

        println!();

        if let Some(duration) = obj.get("duration_ms").and_then(|d| d.as_u64()) {
            println!("Search time: {duration}ms");
        }
    }
    Ok(())
}

/// Output index statistics in human format.
fn output_index_stats_human(value: &serde_json::Value) -> Result<()> {
    if let Some(obj) = value.as_object() {
        println!("Index Statistics:");
        println!("════════════════");

        if let Some(docs) = obj.get("documents").and_then(|d| d.as_u64()) {
            println!("Documents: {docs}");
        }

        if let Some(terms) = obj.get("terms").and_then(|t| t.as_u64()) {
            println!("Distinct terms: {terms}");
        }

        if let Some(avg) = obj.get("avg_doc_len").and_then(|a| a.as_f64()) {
            println!("Average document length: {avg:.2}");
        }

        if let Some(blocks) = obj.get("blocks_flushed").and_then(|b| b.as_u64()) {
            println!("Blocks flushed during build: {blocks}");
        }

        if let Some(size) = obj.get("index_size_bytes").and_then(|s| s.as_u64()) {
            let formatted_size = format_bytes(size);
            println!("Index size: {formatted_size}");
        }

        if let Some(secs) = obj.get("build_time_secs").and_then(|s| s.as_f64()) {
            println!("Build time: {secs:.2}s");
        }

        if let Some(when) = obj.get("built_at").and_then(|w| w.as_str()) {
            println!("Built at: {when}");
        }

        if let Some(stem) = obj.get("stemming_and_stopwords").and_then(|s| s.as_bool()) {
            println!("Stemming and stop words: {stem}");
        }

        if let Some(compressed) = obj.get("compression").and_then(|c| c.as_bool()) {
            println!("Compression: {compressed}");
        }
    }
    Ok(())
}

/// Output generic data in human format.
fn output_generic_human(value: &serde_json::Value) -> Result<()> {
    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                let formatted_val = format_value(val);
                println!("{key}: {formatted_val}");
            }
        }
        _ => {
            let formatted_value = format_value(value);
            println!("{formatted_value}");
        }
    }
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &PilumArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for display.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        serde_json::Value::Object(_) => "[object]".to_string(),
        serde_json::Value::Null => "null".to_string(),
    }
}

/// Format bytes into human-readable format.
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        let unit = UNITS[unit_index];
        format!("{bytes} {unit}")
    } else {
        let unit = UNITS[unit_index];
        format!("{size:.1} {unit}")
    }
}

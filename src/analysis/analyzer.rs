//! Analyzers that combine a tokenizer with a chain of filters.

use std::sync::Arc;

use crate::analysis::filter::{
    Filter, LowercaseFilter, RemoveEmptyFilter, StopFilter, TruncateFilter,
};
use crate::analysis::stemmer::StemFilter;
use crate::analysis::token::TokenStream;
use crate::analysis::tokenizer::{RegexTokenizer, Tokenizer, WhitespaceTokenizer};
use crate::error::Result;

/// Trait for analyzers that convert text into processed tokens.
pub trait Analyzer: Send + Sync {
    /// Analyze the given text and return a stream of tokens.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer (for debugging and configuration).
    fn name(&self) -> &'static str;

    /// Analyze the given text and collect just the term strings.
    fn analyze_terms(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.analyze(text)?.map(|token| token.text).collect())
    }
}

/// A configurable analyzer that combines a tokenizer with a chain of filters.
///
/// Filters run in the order they were added.
#[derive(Clone)]
pub struct PipelineAnalyzer {
    tokenizer: Arc<dyn Tokenizer>,
    filters: Vec<Arc<dyn Filter>>,
}

impl PipelineAnalyzer {
    /// Create a new pipeline analyzer with the given tokenizer.
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        PipelineAnalyzer {
            tokenizer,
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline.
    pub fn add_filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Get the tokenizer used by this analyzer.
    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    /// Get the filters used by this analyzer.
    pub fn filters(&self) -> &[Arc<dyn Filter>] {
        &self.filters
    }
}

impl Analyzer for PipelineAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        let mut tokens = self.tokenizer.tokenize(text)?;

        for filter in &self.filters {
            tokens = filter.filter(tokens)?;
        }

        Ok(tokens)
    }

    fn name(&self) -> &'static str {
        "pipeline"
    }
}

impl std::fmt::Debug for PipelineAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineAnalyzer")
            .field("tokenizer", &self.tokenizer.name())
            .field(
                "filters",
                &self.filters.iter().map(|f| f.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Append the default filter chain to `analyzer`.
///
/// Lowercasing and term truncation always run. Stop word removal and
/// Porter stemming run only when `stemming_and_stopwords` is true, in
/// that order, between lowercasing and truncation.
fn with_default_filters(
    analyzer: PipelineAnalyzer,
    stemming_and_stopwords: bool,
) -> PipelineAnalyzer {
    let mut analyzer = analyzer.add_filter(Arc::new(LowercaseFilter::new()));

    if stemming_and_stopwords {
        analyzer = analyzer
            .add_filter(Arc::new(StopFilter::new()))
            .add_filter(Arc::new(StemFilter::new()));
    }

    analyzer
        .add_filter(Arc::new(TruncateFilter::new()))
        .add_filter(Arc::new(RemoveEmptyFilter::new()))
}

/// Build the analyzer used for raw document text and for queries.
///
/// Tokenizes on word characters, then applies the default filter chain.
pub fn standard_analyzer(stemming_and_stopwords: bool) -> Result<PipelineAnalyzer> {
    let tokenizer = Arc::new(RegexTokenizer::new()?);
    Ok(with_default_filters(
        PipelineAnalyzer::new(tokenizer),
        stemming_and_stopwords,
    ))
}

/// Build the analyzer used for pre-tokenized document text.
///
/// Splits on whitespace only, trusting the caller's token boundaries,
/// then applies the same filter chain as [`standard_analyzer`].
pub fn whitespace_analyzer(stemming_and_stopwords: bool) -> PipelineAnalyzer {
    let tokenizer = Arc::new(WhitespaceTokenizer::new());
    with_default_filters(PipelineAnalyzer::new(tokenizer), stemming_and_stopwords)
}

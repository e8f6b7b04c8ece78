//! Ranked retrieval: posting cursors, scoring, and query evaluation.

pub mod collector;
pub mod cursor;
pub mod evaluator;
pub mod scorer;
pub mod searcher;

pub use self::collector::{ScoredDoc, TopDocsCollector};
pub use self::cursor::PostingCursor;
pub use self::evaluator::{DEFAULT_TOP_K, QueryEvaluator, QueryMode, SearchOptions};
pub use self::scorer::ScoringFunction;
pub use self::searcher::{QueryResults, RankedDoc, Searcher};

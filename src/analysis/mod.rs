//! Text analysis for Pilum.
//!
//! Converts raw document and query text into index terms through a
//! tokenizer plus filter pipeline: lowercasing, optional stop word
//! removal and Porter stemming, and term truncation.

pub mod analyzer;
pub mod filter;
pub mod stemmer;
pub mod token;
pub mod tokenizer;

// Re-export commonly used types
pub use analyzer::*;
pub use filter::*;
pub use stemmer::*;
pub use token::*;
pub use tokenizer::*;

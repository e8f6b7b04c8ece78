//! Storage abstraction layer for Pilum.
//!
//! This module provides a pluggable storage system with file and in-memory
//! backends, plus the structured binary reader/writer the index files share.

pub mod file;
pub mod memory;
pub mod structured;
pub mod traits;

// Re-export commonly used types
pub use file::*;
pub use memory::*;
pub use structured::*;
pub use traits::*;

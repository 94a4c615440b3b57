//! Storage layer - snapshot file I/O.
//!
//! - [`snapshot`] - Versioned, checksummed whole-state snapshot files

pub mod snapshot;

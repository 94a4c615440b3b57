//! Error types for rosterdb.

use crate::common::EmployeeId;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in rosterdb.
///
/// Expected store outcomes (`AlreadyExists`, `NotFound`) live here alongside
/// the fatal ones, so every operation reports through one type and callers
/// must check every result. A no-op update is *not* an error; see
/// [`UpdateOutcome`](crate::store::UpdateOutcome).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from snapshot or socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Attempted to add a record whose key is already in the primary table.
    #[error("employee {0} already exists")]
    AlreadyExists(EmployeeId),

    /// Referenced key is absent from the primary table.
    #[error("employee {0} not found")]
    NotFound(EmployeeId),

    /// A secondary index bucket is missing an entry the primary table vouches
    /// for. This is an internal-consistency fault, never silently ignored.
    #[error("{index} index is missing employee {id}")]
    CorruptIndex {
        /// Name of the offending index ("age", "salary" or "department").
        index: &'static str,
        id: EmployeeId,
    },

    /// Snapshot file failed structural validation (magic, length or CRC).
    #[error("snapshot corrupt: {0}")]
    SnapshotCorrupt(String),

    /// Snapshot file was written by an unsupported format version.
    #[error("unsupported snapshot version {found} (expected {expected})")]
    SnapshotVersion { found: u32, expected: u32 },

    /// Snapshot payload failed to encode or decode.
    #[error("snapshot codec error: {0}")]
    SnapshotCodec(#[from] bincode::Error),
}

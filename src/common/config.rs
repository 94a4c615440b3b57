//! Configuration constants for rosterdb.

/// Number of worker threads serving client connections.
///
/// Small and fixed: each worker runs a blocking read-dispatch-write loop for
/// one connection at a time, so this bounds how many clients are served
/// concurrently. Matches the original deployment's pool size.
pub const DEFAULT_POOL_SIZE: usize = 3;

/// Capacity of the accept-loop → worker hand-off channel.
///
/// When every worker is busy and this many connections are already queued,
/// the accept loop blocks instead of queueing without bound. Clients see a
/// slow accept, not a silently growing backlog.
pub const HANDOFF_QUEUE_DEPTH: usize = 16;

/// Magic bytes at the start of every snapshot file.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"RSNP";

/// Current snapshot format version.
///
/// Bumped whenever the payload encoding changes shape. Restore rejects any
/// other version rather than guessing.
pub const SNAPSHOT_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_is_small_and_nonzero() {
        assert!(DEFAULT_POOL_SIZE >= 1);
        assert!(DEFAULT_POOL_SIZE <= 16);
    }

    #[test]
    fn test_snapshot_magic_is_ascii() {
        assert!(SNAPSHOT_MAGIC.iter().all(u8::is_ascii));
        assert_eq!(SNAPSHOT_MAGIC.len(), 4);
    }
}

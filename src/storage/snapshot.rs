//! Snapshot files - the store's persisted external representation.
//!
//! A snapshot is an explicit, versioned encoding of the store's state — an
//! ordered list of records plus a format tag — rather than a dump of the
//! live internal structures. Index membership is not written at all: it is
//! functionally determined by each record's attributes plus its insertion-
//! time age, so restoring the records rebuilds the indexes exactly.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::config::{SNAPSHOT_MAGIC, SNAPSHOT_VERSION};
use crate::common::{Error, Result};
use crate::store::Employee;

/// One record as persisted.
///
/// `indexed_age` travels with the record so that a restore reproduces the
/// age index exactly, even when the record's wall-clock age has drifted
/// since it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SnapshotRecord {
    pub employee: Employee,
    pub indexed_age: u32,
}

/// Fixed-size header preceding the payload.
///
/// # File Layout
/// ```text
/// ┌───────┬─────────┬─────────────┬───────┬──────────────────────┐
/// │ magic │ version │ payload_len │ crc32 │ bincode payload      │
/// │ 4 B   │ u32 LE  │ u64 LE      │u32 LE │ Vec<SnapshotRecord>  │
/// └───────┴─────────┴─────────────┴───────┴──────────────────────┘
/// ```
const HEADER_LEN: usize = 4 + 4 + 8 + 4;

/// Write `records` to `path`, replacing any previous contents.
///
/// The write is followed by `sync_all`; an I/O failure at any point is
/// surfaced as fatal, never retried.
pub(crate) fn write_snapshot(path: &Path, records: &[SnapshotRecord]) -> Result<()> {
    let payload = bincode::serialize(records)?;
    let checksum = crc32fast::hash(&payload);

    let mut file = File::create(path)?;
    file.write_all(&SNAPSHOT_MAGIC)?;
    file.write_all(&SNAPSHOT_VERSION.to_le_bytes())?;
    file.write_all(&(payload.len() as u64).to_le_bytes())?;
    file.write_all(&checksum.to_le_bytes())?;
    file.write_all(&payload)?;
    file.sync_all()?;

    Ok(())
}

/// Read the snapshot at `path`.
///
/// Returns `Ok(None)` when the file does not exist — a fresh store, not an
/// error. A file that exists but fails any structural check (magic, version,
/// length, CRC, decode) is fatal.
pub(crate) fn read_snapshot(path: &Path) -> Result<Option<Vec<SnapshotRecord>>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read(path)?;

    if data.len() < HEADER_LEN {
        return Err(Error::SnapshotCorrupt(format!(
            "file is {} bytes, shorter than the {} byte header",
            data.len(),
            HEADER_LEN
        )));
    }
    if data[0..4] != SNAPSHOT_MAGIC {
        return Err(Error::SnapshotCorrupt("bad magic bytes".to_string()));
    }

    let version = u32::from_le_bytes(data[4..8].try_into().unwrap());
    if version != SNAPSHOT_VERSION {
        return Err(Error::SnapshotVersion {
            found: version,
            expected: SNAPSHOT_VERSION,
        });
    }

    let payload_len = u64::from_le_bytes(data[8..16].try_into().unwrap()) as usize;
    let stored_crc = u32::from_le_bytes(data[16..20].try_into().unwrap());

    let payload = &data[HEADER_LEN..];
    if payload.len() != payload_len {
        return Err(Error::SnapshotCorrupt(format!(
            "payload is {} bytes, header says {}",
            payload.len(),
            payload_len
        )));
    }
    if crc32fast::hash(payload) != stored_crc {
        return Err(Error::SnapshotCorrupt("checksum mismatch".to_string()));
    }

    let records: Vec<SnapshotRecord> = bincode::deserialize(payload)?;
    Ok(Some(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::EmployeeId;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn record(id: u64, age: u32) -> SnapshotRecord {
        SnapshotRecord {
            employee: Employee::new(
                EmployeeId::new(id),
                format!("employee-{id}"),
                NaiveDate::from_ymd_opt(1990, 4, 20).unwrap(),
                52_000,
                "QA",
            ),
            indexed_age: age,
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.snapshot");

        let records = vec![record(1, 33), record(2, 34)];
        write_snapshot(&path, &records).unwrap();

        let read = read_snapshot(&path).unwrap().unwrap();
        assert_eq!(read, records);
    }

    #[test]
    fn test_empty_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.snapshot");

        write_snapshot(&path, &[]).unwrap();
        assert_eq!(read_snapshot(&path).unwrap().unwrap(), vec![]);
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("never-written.snapshot");
        assert!(read_snapshot(&path).unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_previous_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.snapshot");

        write_snapshot(&path, &[record(1, 33), record(2, 34)]).unwrap();
        write_snapshot(&path, &[record(3, 50)]).unwrap();

        let read = read_snapshot(&path).unwrap().unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].employee.id, EmployeeId::new(3));
    }

    #[test]
    fn test_flipped_payload_byte_fails_checksum() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.snapshot");

        write_snapshot(&path, &[record(1, 33)]).unwrap();

        let mut data = std::fs::read(&path).unwrap();
        let last = data.len() - 1;
        data[last] ^= 0xFF;
        std::fs::write(&path, &data).unwrap();

        let err = read_snapshot(&path).unwrap_err();
        assert!(matches!(err, Error::SnapshotCorrupt(_)));
    }

    #[test]
    fn test_bad_magic_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.snapshot");

        write_snapshot(&path, &[record(1, 33)]).unwrap();

        let mut data = std::fs::read(&path).unwrap();
        data[0] = b'X';
        std::fs::write(&path, &data).unwrap();

        let err = read_snapshot(&path).unwrap_err();
        assert!(matches!(err, Error::SnapshotCorrupt(_)));
    }

    #[test]
    fn test_future_version_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.snapshot");

        write_snapshot(&path, &[record(1, 33)]).unwrap();

        let mut data = std::fs::read(&path).unwrap();
        data[4..8].copy_from_slice(&99u32.to_le_bytes());
        std::fs::write(&path, &data).unwrap();

        let err = read_snapshot(&path).unwrap_err();
        assert!(matches!(
            err,
            Error::SnapshotVersion {
                found: 99,
                expected: SNAPSHOT_VERSION
            }
        ));
    }

    #[test]
    fn test_truncated_file_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.snapshot");

        std::fs::write(&path, b"RS").unwrap();
        let err = read_snapshot(&path).unwrap_err();
        assert!(matches!(err, Error::SnapshotCorrupt(_)));
    }
}

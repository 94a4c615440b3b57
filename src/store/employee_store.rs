//! Employee Store - the concurrent multi-index core.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use chrono::{Local, NaiveDate};
use parking_lot::RwLock;

use crate::common::{EmployeeId, Error, Result};
use crate::storage::snapshot::{self, SnapshotRecord};
use crate::store::index::SecondaryIndex;
use crate::store::stats::StoreStats;
use crate::store::Employee;

/// Result of an update operation that found its target.
///
/// `Unchanged` is the "no work done" signal for a new value equal to the
/// current one. It is a legitimate outcome, not an error, but callers can
/// tell it apart from `Updated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The field was changed and the record relocated in its index.
    Updated,
    /// The new value equals the current value; nothing was touched.
    Unchanged,
}

/// What the primary table holds per record.
///
/// `indexed_age` is the age derived once, when the record entered the store
/// (or was restored from a snapshot). All age-index maintenance uses this
/// value, never a fresh derivation from the wall clock, so a birthday passing
/// between add and remove cannot strand an entry in the wrong bucket.
#[derive(Debug)]
struct Slot {
    record: Employee,
    indexed_age: u32,
}

/// Concurrent in-memory employee store.
///
/// # Architecture
/// ```text
/// ┌───────────────────────────────────────────────────────────────┐
/// │                        EmployeeStore                          │
/// │  ┌─────────────────────┐   ┌───────────────────────────────┐  │
/// │  │ primary             │   │ by_age:    SecondaryIndex<u32>│  │
/// │  │ EmployeeId → Slot   │──▶│ by_salary: SecondaryIndex<u32>│  │
/// │  │ (single source of   │   │ by_department:                │  │
/// │  │  truth)             │   │     SecondaryIndex<String>    │  │
/// │  └─────────────────────┘   └───────────────────────────────┘  │
/// │  each structure behind its own parking_lot::RwLock            │
/// └───────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// Four independent reader-writer locks, one per structure. Readers of the
/// same structure proceed concurrently; a writer excludes only that
/// structure. Operations touching several structures acquire and release
/// each lock in turn — never two at once — so deadlock across the locks is
/// impossible by construction. The price is a brief window where a record
/// is visible in the primary table but not yet (or no longer) in an index;
/// queries skip ids caught in that window.
///
/// All locks are instance fields: independent stores never share a
/// synchronization domain.
///
/// # Invariants
/// - Every record in the primary table appears exactly once in the age
///   bucket for its `indexed_age`, the salary bucket for its current salary,
///   and the department bucket for its current department.
/// - Buckets hold keys only; query results are owned clones, so a caller
///   can never alias the store's internal state.
///
/// # Usage
/// ```no_run
/// use rosterdb::{Employee, EmployeeId, EmployeeStore};
/// use chrono::NaiveDate;
///
/// let store = EmployeeStore::new("roster.snapshot");
/// store.restore()?;
///
/// let birth = NaiveDate::from_ymd_opt(1990, 5, 1).unwrap();
/// store.add(Employee::new(EmployeeId::new(1), "Dana", birth, 75_000, "QA"))?;
///
/// let qa = store.get_by_department("QA");
/// assert_eq!(qa.len(), 1);
/// # Ok::<(), rosterdb::Error>(())
/// ```
pub struct EmployeeStore {
    /// Designated snapshot file for save/restore.
    snapshot_path: PathBuf,

    /// Key → record. The single source of truth for existence.
    primary: RwLock<HashMap<EmployeeId, Slot>>,

    /// Insertion-time age → ids.
    by_age: RwLock<SecondaryIndex<u32>>,

    /// Current salary → ids.
    by_salary: RwLock<SecondaryIndex<u32>>,

    /// Current department → ids.
    by_department: RwLock<SecondaryIndex<String>>,

    /// Operation counters (atomic, off the lock paths).
    stats: StoreStats,
}

impl EmployeeStore {
    /// Create an empty store whose snapshots live at `snapshot_path`.
    ///
    /// Nothing is read from disk here; call [`restore`](Self::restore) to
    /// load a prior snapshot.
    pub fn new(snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
            primary: RwLock::new(HashMap::new()),
            by_age: RwLock::new(SecondaryIndex::new()),
            by_salary: RwLock::new(SecondaryIndex::new()),
            by_department: RwLock::new(SecondaryIndex::new()),
            stats: StoreStats::new(),
        }
    }

    // ========================================================================
    // Public API: Mutations
    // ========================================================================

    /// Add a new record, deriving its age from today's date.
    ///
    /// # Errors
    /// `Error::AlreadyExists` if the key is taken; the store is unchanged.
    pub fn add(&self, employee: Employee) -> Result<()> {
        self.add_as_of(employee, Local::now().date_naive())
    }

    /// Add a new record, deriving its age as of `today`.
    ///
    /// Deterministic variant of [`add`](Self::add) for callers that control
    /// the clock (restore paths, tests).
    pub fn add_as_of(&self, employee: Employee, today: NaiveDate) -> Result<()> {
        self.stats.record_write();

        // Fast-path duplicate rejection under the read lock only.
        {
            let primary = self.primary.read();
            if primary.contains_key(&employee.id) {
                return Err(Error::AlreadyExists(employee.id));
            }
        }

        let id = employee.id;
        let age = employee.age_on(today);
        let salary = employee.salary;
        let department = employee.department.clone();

        // Primary table first, then each index in turn. No lock spans two
        // structures; a concurrent reader can briefly observe the record in
        // the primary table but not yet in an index.
        {
            let mut primary = self.primary.write();
            // The read-locked check raced with other writers; re-check
            // before inserting or a concurrent add of the same key would
            // leave duplicate ids in the indexes.
            if primary.contains_key(&id) {
                return Err(Error::AlreadyExists(id));
            }
            primary.insert(
                id,
                Slot {
                    record: employee,
                    indexed_age: age,
                },
            );
        }

        self.by_age.write().insert(age, id);
        self.by_salary.write().insert(salary, id);
        self.by_department.write().insert(department, id);

        Ok(())
    }

    /// Remove a record, returning the removed copy.
    ///
    /// The record leaves the primary table first; if it was never there the
    /// indexes are not touched. Index buckets are located by the stored
    /// `indexed_age` and the removed record's own salary/department.
    ///
    /// # Errors
    /// - `Error::NotFound` if the key is absent.
    /// - `Error::CorruptIndex` if a bucket did not contain the id the
    ///   primary table vouched for.
    pub fn remove(&self, id: EmployeeId) -> Result<Employee> {
        self.stats.record_write();

        let slot = { self.primary.write().remove(&id) }.ok_or(Error::NotFound(id))?;
        let Slot {
            record,
            indexed_age,
        } = slot;

        if !self.by_age.write().remove(&indexed_age, id) {
            return Err(Error::CorruptIndex { index: "age", id });
        }
        if !self.by_salary.write().remove(&record.salary, id) {
            return Err(Error::CorruptIndex { index: "salary", id });
        }
        if !self
            .by_department
            .write()
            .remove(record.department.as_str(), id)
        {
            return Err(Error::CorruptIndex {
                index: "department",
                id,
            });
        }

        Ok(record)
    }

    /// Change a record's salary, relocating it in the salary index.
    ///
    /// The field mutation happens under the primary write lock; the bucket
    /// move happens afterwards under the salary index write lock, during
    /// which a salary-range reader can briefly miss the record.
    ///
    /// # Errors
    /// - `Error::NotFound` if the key is absent.
    /// - `Error::CorruptIndex` if the old salary bucket lacked the id.
    pub fn update_salary(&self, id: EmployeeId, new_salary: u32) -> Result<UpdateOutcome> {
        self.stats.record_write();

        let old_salary = {
            let mut primary = self.primary.write();
            let slot = primary.get_mut(&id).ok_or(Error::NotFound(id))?;
            if slot.record.salary == new_salary {
                return Ok(UpdateOutcome::Unchanged);
            }
            let old = slot.record.salary;
            slot.record.salary = new_salary;
            old
        };

        let mut by_salary = self.by_salary.write();
        if !by_salary.remove(&old_salary, id) {
            return Err(Error::CorruptIndex { index: "salary", id });
        }
        by_salary.insert(new_salary, id);

        Ok(UpdateOutcome::Updated)
    }

    /// Change a record's department, relocating it in the department index.
    ///
    /// Same contract and lock protocol as [`update_salary`](Self::update_salary).
    pub fn update_department(
        &self,
        id: EmployeeId,
        new_department: &str,
    ) -> Result<UpdateOutcome> {
        self.stats.record_write();

        let old_department = {
            let mut primary = self.primary.write();
            let slot = primary.get_mut(&id).ok_or(Error::NotFound(id))?;
            if slot.record.department == new_department {
                return Ok(UpdateOutcome::Unchanged);
            }
            std::mem::replace(&mut slot.record.department, new_department.to_string())
        };

        let mut by_department = self.by_department.write();
        if !by_department.remove(old_department.as_str(), id) {
            return Err(Error::CorruptIndex {
                index: "department",
                id,
            });
        }
        by_department.insert(new_department.to_string(), id);

        Ok(UpdateOutcome::Updated)
    }

    // ========================================================================
    // Public API: Queries (always return owned copies)
    // ========================================================================

    /// Point lookup by key.
    pub fn get(&self, id: EmployeeId) -> Option<Employee> {
        self.stats.record_read();
        self.primary.read().get(&id).map(|slot| slot.record.clone())
    }

    /// Copies of every record, in unspecified order.
    pub fn get_all(&self) -> Vec<Employee> {
        self.stats.record_read();
        self.primary
            .read()
            .values()
            .map(|slot| slot.record.clone())
            .collect()
    }

    /// Records whose insertion-time age lies in `[from, to]`, both ends
    /// inclusive. Result follows age-bucket order.
    pub fn get_by_age_range(&self, from: u32, to: u32) -> Vec<Employee> {
        self.stats.record_read();
        let ids = self.by_age.read().ids_in_range(from..=to);
        self.copy_by_ids(&ids)
    }

    /// Records whose salary lies in `[from, to]`, both ends inclusive.
    /// Result follows salary-bucket order.
    pub fn get_by_salary_range(&self, from: u32, to: u32) -> Vec<Employee> {
        self.stats.record_read();
        let ids = self.by_salary.read().ids_in_range(from..=to);
        self.copy_by_ids(&ids)
    }

    /// Records in `department`. An unknown department is an empty result,
    /// not an error.
    pub fn get_by_department(&self, department: &str) -> Vec<Employee> {
        self.stats.record_read();
        let ids = self.by_department.read().ids_for(department);
        self.copy_by_ids(&ids)
    }

    /// Intersection of the department bucket and the salary range, by id,
    /// in department-bucket order.
    ///
    /// The two index locks are taken sequentially, never nested, so the two
    /// id sets can reflect slightly different instants under concurrent
    /// mutation.
    pub fn get_by_department_and_salary(
        &self,
        department: &str,
        salary_from: u32,
        salary_to: u32,
    ) -> Vec<Employee> {
        self.stats.record_read();

        let dept_ids = self.by_department.read().ids_for(department);
        let salary_ids: HashSet<EmployeeId> = self
            .by_salary
            .read()
            .ids_in_range(salary_from..=salary_to)
            .into_iter()
            .collect();

        let ids: Vec<EmployeeId> = dept_ids
            .into_iter()
            .filter(|id| salary_ids.contains(id))
            .collect();
        self.copy_by_ids(&ids)
    }

    // ========================================================================
    // Public API: Snapshot persistence
    // ========================================================================

    /// Write the complete state to the designated snapshot file, replacing
    /// its previous contents.
    ///
    /// Not coordinated with concurrent mutators: a caller that needs a
    /// point-in-time snapshot must quiesce writes first. Records are saved
    /// sorted by id so the file is byte-deterministic for a given state.
    ///
    /// # Errors
    /// Any I/O failure is fatal and surfaced to the caller; nothing retries.
    pub fn save(&self) -> Result<()> {
        let mut records: Vec<SnapshotRecord> = {
            let primary = self.primary.read();
            primary
                .values()
                .map(|slot| SnapshotRecord {
                    employee: slot.record.clone(),
                    indexed_age: slot.indexed_age,
                })
                .collect()
        };
        records.sort_by_key(|r| r.employee.id);

        snapshot::write_snapshot(&self.snapshot_path, &records)?;
        self.stats.snapshot_saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Replace the in-memory state wholesale from the designated snapshot
    /// file. A missing file leaves the store as it is (normally: empty at
    /// startup) and is not an error.
    ///
    /// The replacement structures are built off-line, then swapped in under
    /// each write lock in turn.
    ///
    /// # Errors
    /// A snapshot that exists but fails validation or decoding is fatal;
    /// the in-memory state is left untouched.
    pub fn restore(&self) -> Result<()> {
        let Some(records) = snapshot::read_snapshot(&self.snapshot_path)? else {
            return Ok(());
        };

        let mut primary = HashMap::with_capacity(records.len());
        let mut by_age = SecondaryIndex::new();
        let mut by_salary = SecondaryIndex::new();
        let mut by_department = SecondaryIndex::new();

        for SnapshotRecord {
            employee,
            indexed_age,
        } in records
        {
            let id = employee.id;
            by_age.insert(indexed_age, id);
            by_salary.insert(employee.salary, id);
            by_department.insert(employee.department.clone(), id);
            primary.insert(
                id,
                Slot {
                    record: employee,
                    indexed_age,
                },
            );
        }

        *self.primary.write() = primary;
        *self.by_age.write() = by_age;
        *self.by_salary.write() = by_salary;
        *self.by_department.write() = by_department;

        self.stats.snapshot_restores.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    // ========================================================================
    // Public API: Introspection
    // ========================================================================

    /// Number of records in the primary table.
    pub fn len(&self) -> usize {
        self.primary.read().len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.primary.read().is_empty()
    }

    /// Operation counters.
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// The designated snapshot file.
    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    // ========================================================================
    // Internal
    // ========================================================================

    /// Copy the records for `ids` out of the primary table, keeping order.
    ///
    /// An id can legitimately be gone by now: the index lock was released
    /// before the primary lock was taken, and a concurrent remove may have
    /// won the race. Such ids are skipped.
    fn copy_by_ids(&self, ids: &[EmployeeId]) -> Vec<Employee> {
        let primary = self.primary.read();
        ids.iter()
            .filter_map(|id| primary.get(id).map(|slot| slot.record.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Fixed "today" so derived ages are deterministic.
    fn today() -> NaiveDate {
        date(2024, 6, 1)
    }

    fn sample(id: u64, birth_year: i32, salary: u32, department: &str) -> Employee {
        Employee::new(
            EmployeeId::new(id),
            format!("employee-{id}"),
            date(birth_year, 1, 15),
            salary,
            department,
        )
    }

    fn store_with(records: &[Employee]) -> EmployeeStore {
        let store = EmployeeStore::new("unused.snapshot");
        for record in records {
            store.add_as_of(record.clone(), today()).unwrap();
        }
        store
    }

    #[test]
    fn test_add_then_get_returns_equal_copy() {
        let record = sample(1, 1990, 50_000, "QA");
        let store = store_with(&[record.clone()]);

        let copy = store.get(EmployeeId::new(1)).unwrap();
        assert_eq!(copy, record);

        // Mutating the copy cannot touch the store
        let mut copy = copy;
        copy.salary = 0;
        assert_eq!(store.get(EmployeeId::new(1)).unwrap().salary, 50_000);
    }

    #[test]
    fn test_add_duplicate_rejected_and_store_unchanged() {
        let store = store_with(&[sample(1, 1990, 50_000, "QA")]);

        let mut imposter = sample(1, 1970, 99_000, "Sales");
        imposter.name = "imposter".to_string();
        let err = store.add_as_of(imposter, today()).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(id) if id == EmployeeId::new(1)));

        assert_eq!(store.len(), 1);
        let kept = store.get(EmployeeId::new(1)).unwrap();
        assert_eq!(kept.department, "QA");
        assert!(store.get_by_department("Sales").is_empty());
    }

    #[test]
    fn test_remove_absent_key() {
        let store = store_with(&[sample(1, 1990, 50_000, "QA")]);

        let err = store.remove(EmployeeId::new(99)).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        // No partial mutation anywhere
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_by_department("QA").len(), 1);
    }

    #[test]
    fn test_added_record_appears_once_in_each_index() {
        let record = sample(1, 1990, 50_000, "QA"); // age 34 on today()
        let store = store_with(&[record]);

        let by_age = store.get_by_age_range(34, 34);
        assert_eq!(by_age.len(), 1);

        let by_salary = store.get_by_salary_range(50_000, 50_000);
        assert_eq!(by_salary.len(), 1);

        let by_dept = store.get_by_department("QA");
        assert_eq!(by_dept.len(), 1);
    }

    #[test]
    fn test_removed_record_appears_nowhere() {
        let store = store_with(&[
            sample(1, 1990, 50_000, "QA"),
            sample(2, 1985, 60_000, "Dev"),
        ]);

        let removed = store.remove(EmployeeId::new(1)).unwrap();
        assert_eq!(removed.id, EmployeeId::new(1));

        assert!(store.get(EmployeeId::new(1)).is_none());
        assert_eq!(store.get_all().len(), 1);
        assert!(store.get_by_age_range(0, 150).iter().all(|e| e.id.0 != 1));
        assert!(store.get_by_salary_range(0, 100_000).iter().all(|e| e.id.0 != 1));
        assert!(store.get_by_department("QA").is_empty());
    }

    #[test]
    fn test_remove_uses_insertion_time_age() {
        // Record added when it was 33; even if queried/removed much later,
        // the stored indexed age locates the right bucket.
        let record = sample(1, 1990, 50_000, "QA");
        let store = EmployeeStore::new("unused.snapshot");
        store.add_as_of(record, date(2023, 6, 1)).unwrap(); // age 33

        assert_eq!(store.get_by_age_range(33, 33).len(), 1);
        store.remove(EmployeeId::new(1)).unwrap();
        assert!(store.get_by_age_range(0, 150).is_empty());
    }

    #[test]
    fn test_update_salary_same_value_is_unchanged() {
        let store = store_with(&[sample(1, 1990, 50_000, "QA")]);

        let outcome = store.update_salary(EmployeeId::new(1), 50_000).unwrap();
        assert_eq!(outcome, UpdateOutcome::Unchanged);
        assert_eq!(store.get_by_salary_range(50_000, 50_000).len(), 1);
    }

    #[test]
    fn test_update_salary_relocates_bucket() {
        let store = store_with(&[sample(1, 1990, 50_000, "QA")]);

        let outcome = store.update_salary(EmployeeId::new(1), 70_000).unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated);

        assert!(store.get_by_salary_range(50_000, 50_000).is_empty());
        let moved = store.get_by_salary_range(70_000, 70_000);
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].salary, 70_000);
        assert_eq!(store.get(EmployeeId::new(1)).unwrap().salary, 70_000);
    }

    #[test]
    fn test_update_salary_missing_key() {
        let store = store_with(&[]);
        let err = store.update_salary(EmployeeId::new(1), 1).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_update_department_contract() {
        let store = store_with(&[sample(1, 1990, 50_000, "QA")]);

        assert_eq!(
            store.update_department(EmployeeId::new(1), "QA").unwrap(),
            UpdateOutcome::Unchanged
        );
        assert_eq!(
            store.update_department(EmployeeId::new(1), "Dev").unwrap(),
            UpdateOutcome::Updated
        );

        assert!(store.get_by_department("QA").is_empty());
        assert_eq!(store.get_by_department("Dev").len(), 1);
        assert_eq!(store.get(EmployeeId::new(1)).unwrap().department, "Dev");
    }

    #[test]
    fn test_range_query_inclusive_bounds() {
        let store = store_with(&[
            sample(1, 1990, 40_000, "QA"),
            sample(2, 1990, 50_000, "QA"),
            sample(3, 1990, 60_000, "QA"),
        ]);

        let hits = store.get_by_salary_range(40_000, 50_000);
        let ids: Vec<u64> = hits.iter().map(|e| e.id.0).collect();
        assert_eq!(ids, vec![1, 2]);

        // Inverted bounds are just an empty result
        assert!(store.get_by_salary_range(60_000, 40_000).is_empty());
    }

    #[test]
    fn test_department_and_salary_is_intersection() {
        let store = store_with(&[
            sample(1, 1990, 40_000, "QA"),
            sample(2, 1990, 55_000, "QA"),
            sample(3, 1990, 55_000, "Dev"),
            sample(4, 1990, 90_000, "QA"),
        ]);

        let hits = store.get_by_department_and_salary("QA", 50_000, 80_000);
        let ids: Vec<u64> = hits.iter().map(|e| e.id.0).collect();
        assert_eq!(ids, vec![2]);

        assert!(store
            .get_by_department_and_salary("Sales", 0, 100_000)
            .is_empty());
    }

    #[test]
    fn test_get_all_returns_every_record() {
        let store = store_with(&[
            sample(1, 1990, 40_000, "QA"),
            sample(2, 1980, 50_000, "Dev"),
            sample(3, 1970, 60_000, "Sales"),
        ]);

        let mut ids: Vec<u64> = store.get_all().iter().map(|e| e.id.0).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_stats_count_operations() {
        let store = store_with(&[sample(1, 1990, 40_000, "QA")]);
        store.get(EmployeeId::new(1));
        store.get_all();
        let _ = store.update_salary(EmployeeId::new(1), 41_000);

        let snap = store.stats().snapshot();
        assert_eq!(snap.writes, 2); // add + update
        assert_eq!(snap.reads, 2); // get + get_all
    }
}

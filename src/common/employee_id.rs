//! Employee identifier type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies an employee record.
///
/// A `u64` key is the record's sole identity: globally unique and immutable
/// after creation. All secondary index buckets hold these keys, never record
/// copies, so the primary table stays the single source of truth.
///
/// # Example
/// ```
/// use rosterdb::EmployeeId;
///
/// let id = EmployeeId::new(42);
/// assert_eq!(id.0, 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmployeeId(pub u64);

impl EmployeeId {
    /// Create a new EmployeeId.
    #[inline]
    pub fn new(id: u64) -> Self {
        EmployeeId(id)
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Employee({})", self.0)
    }
}

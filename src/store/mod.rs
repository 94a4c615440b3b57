//! The concurrent multi-index store.
//!
//! # Components
//! - [`Employee`] - The record: stable key, three indexed attributes, payload
//! - [`SecondaryIndex`] - Generic attribute-value → key-bucket mapping
//! - [`EmployeeStore`] - Primary table + three indexes behind four locks
//! - [`StoreStats`] - Atomic operation counters

mod employee;
mod employee_store;
mod index;
mod stats;

pub use employee::Employee;
pub use employee_store::{EmployeeStore, UpdateOutcome};
pub use index::SecondaryIndex;
pub use stats::{StatsSnapshot, StoreStats};

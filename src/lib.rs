//! rosterdb - An in-memory employee store with independently locked
//! secondary indexes and snapshot persistence.
//!
//! # Architecture
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          rosterdb                             │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │               Listener (server/)                        │  │
//! │  │   accept loop → bounded hand-off → fixed worker pool    │  │
//! │  │          per-line dispatch via RequestHandler           │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! │                              ↓                                │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │                  Store (store/)                         │  │
//! │  │  primary table ──▶ by_age / by_salary / by_department   │  │
//! │  │  four independent RwLocks, one per structure            │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! │                              ↓                                │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │              Snapshot I/O (storage/)                    │  │
//! │  │   versioned, CRC-checked whole-state file, save/restore │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (EmployeeId, Error, config)
//! - [`store`] - The concurrent multi-index store
//! - [`storage`] - Snapshot file I/O
//! - [`server`] - TCP listener, worker pool, text protocol
//!
//! # Quick Start
//! ```no_run
//! use rosterdb::{Employee, EmployeeId, EmployeeStore};
//! use chrono::NaiveDate;
//!
//! let store = EmployeeStore::new("roster.snapshot");
//! store.restore()?;
//!
//! let birth = NaiveDate::from_ymd_opt(1992, 9, 3).unwrap();
//! store.add(Employee::new(EmployeeId::new(7), "Mira", birth, 81_000, "Dev"))?;
//!
//! for employee in store.get_by_salary_range(60_000, 90_000) {
//!     println!("{}: {}", employee.id, employee.name);
//! }
//!
//! store.save()?;
//! # Ok::<(), rosterdb::Error>(())
//! ```

pub mod common;
pub mod server;
pub mod storage;
pub mod store;

// Re-export commonly used items at crate root for convenience
pub use common::{EmployeeId, Error, Result};
pub use server::{RequestHandler, StoreProtocol, TcpServer};
pub use store::{Employee, EmployeeStore, StatsSnapshot, StoreStats, UpdateOutcome};

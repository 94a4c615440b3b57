//! Common types and utilities shared across rosterdb.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants
//! - Error types
//! - The `EmployeeId` record key

pub mod config;
pub mod error;
mod employee_id;

pub use employee_id::EmployeeId;
pub use error::{Error, Result};

//! The employee record.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::common::EmployeeId;

/// A single employee record.
///
/// `id` is the sole identity and never changes. `salary` and `department`
/// are mutable through the store's update operations, which relocate the
/// record between index buckets; `name` and `birth_date` are fixed payload.
///
/// Records cross the store boundary only as owned values, so a caller
/// mutating a query result can never touch the store's internal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub birth_date: NaiveDate,
    pub salary: u32,
    pub department: String,
}

impl Employee {
    pub fn new(
        id: EmployeeId,
        name: impl Into<String>,
        birth_date: NaiveDate,
        salary: u32,
        department: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            birth_date,
            salary,
            department: department.into(),
        }
    }

    /// Whole years elapsed between `birth_date` and `today`.
    ///
    /// The year difference is decremented when `today` falls before the
    /// birthday in the calendar year, i.e. the age only ticks over once the
    /// birthday has actually passed. A birth date in the future yields 0.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        let mut years = today.year() - self.birth_date.year();
        if (today.month(), today.day()) < (self.birth_date.month(), self.birth_date.day()) {
            years -= 1;
        }
        years.max(0) as u32
    }
}

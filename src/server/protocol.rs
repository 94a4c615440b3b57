//! Line-oriented request handler over the store.
//!
//! The wire format is deliberately minimal: one whitespace-separated verb
//! plus arguments per line, JSON bodies for records. `name` and
//! `department` are single tokens (no embedded whitespace).
//!
//! # Verbs
//! ```text
//! ADD <id> <name> <birth YYYY-MM-DD> <salary> <department>
//! REMOVE <id>
//! GET <id>
//! ALL
//! AGE <from> <to>
//! SALARY <from> <to>
//! DEPT <department>
//! DEPT-SALARY <department> <from> <to>
//! UPDATE-SALARY <id> <salary>
//! UPDATE-DEPT <id> <department>
//! SAVE
//! RESTORE
//! STATS
//! ```
//!
//! Replies: `OK`, `ALREADY_EXISTS`, `NOT_FOUND`, `NOT_UPDATED`, a JSON
//! body, or `ERROR <message>`.

use std::str::SplitWhitespace;
use std::sync::Arc;

use chrono::NaiveDate;
use log::error;

use crate::common::{EmployeeId, Error};
use crate::server::RequestHandler;
use crate::store::{Employee, EmployeeStore, UpdateOutcome};

/// Maps the text protocol onto the store contract.
pub struct StoreProtocol {
    store: Arc<EmployeeStore>,
}

impl StoreProtocol {
    pub fn new(store: Arc<EmployeeStore>) -> Self {
        Self { store }
    }

    fn dispatch(&self, request: &str) -> Result<String, String> {
        let mut args = request.split_whitespace();
        let verb = args.next().unwrap_or_default().to_ascii_uppercase();

        match verb.as_str() {
            "ADD" => {
                let employee = Employee::new(
                    parse_id(&mut args)?,
                    next_arg(&mut args, "name")?.to_string(),
                    parse_date(&mut args)?,
                    parse_num(&mut args, "salary")?,
                    next_arg(&mut args, "department")?.to_string(),
                );
                match self.store.add(employee) {
                    Ok(()) => Ok("OK".to_string()),
                    Err(Error::AlreadyExists(_)) => Ok("ALREADY_EXISTS".to_string()),
                    Err(err) => Err(err.to_string()),
                }
            }
            "REMOVE" => match self.store.remove(parse_id(&mut args)?) {
                Ok(_) => Ok("OK".to_string()),
                Err(Error::NotFound(_)) => Ok("NOT_FOUND".to_string()),
                Err(err) => Err(err.to_string()),
            },
            "GET" => match self.store.get(parse_id(&mut args)?) {
                Some(employee) => to_json(&employee),
                None => Ok("NOT_FOUND".to_string()),
            },
            "ALL" => to_json(&self.store.get_all()),
            "AGE" => {
                let from = parse_num(&mut args, "from")?;
                let to = parse_num(&mut args, "to")?;
                to_json(&self.store.get_by_age_range(from, to))
            }
            "SALARY" => {
                let from = parse_num(&mut args, "from")?;
                let to = parse_num(&mut args, "to")?;
                to_json(&self.store.get_by_salary_range(from, to))
            }
            "DEPT" => {
                let department = next_arg(&mut args, "department")?;
                to_json(&self.store.get_by_department(department))
            }
            "DEPT-SALARY" => {
                let department = next_arg(&mut args, "department")?.to_string();
                let from = parse_num(&mut args, "from")?;
                let to = parse_num(&mut args, "to")?;
                to_json(&self.store.get_by_department_and_salary(&department, from, to))
            }
            "UPDATE-SALARY" => {
                let id = parse_id(&mut args)?;
                let salary = parse_num(&mut args, "salary")?;
                update_reply(self.store.update_salary(id, salary))
            }
            "UPDATE-DEPT" => {
                let id = parse_id(&mut args)?;
                let department = next_arg(&mut args, "department")?;
                update_reply(self.store.update_department(id, department))
            }
            "SAVE" => match self.store.save() {
                Ok(()) => Ok("OK".to_string()),
                Err(err) => {
                    error!("snapshot save failed: {err}");
                    Err(err.to_string())
                }
            },
            "RESTORE" => match self.store.restore() {
                Ok(()) => Ok("OK".to_string()),
                Err(err) => {
                    error!("snapshot restore failed: {err}");
                    Err(err.to_string())
                }
            },
            "STATS" => Ok(self.store.stats().snapshot().to_string()),
            other => Err(format!("unknown verb '{other}'")),
        }
    }
}

impl RequestHandler for StoreProtocol {
    fn handle(&self, request: &str) -> String {
        match self.dispatch(request) {
            Ok(reply) => reply,
            Err(message) => format!("ERROR {message}"),
        }
    }
}

fn next_arg<'a>(args: &mut SplitWhitespace<'a>, what: &str) -> Result<&'a str, String> {
    args.next().ok_or_else(|| format!("missing {what}"))
}

fn parse_id(args: &mut SplitWhitespace<'_>) -> Result<EmployeeId, String> {
    next_arg(args, "id")?
        .parse::<u64>()
        .map(EmployeeId::new)
        .map_err(|_| "id must be an unsigned integer".to_string())
}

fn parse_num(args: &mut SplitWhitespace<'_>, what: &str) -> Result<u32, String> {
    next_arg(args, what)?
        .parse::<u32>()
        .map_err(|_| format!("{what} must be an unsigned integer"))
}

fn parse_date(args: &mut SplitWhitespace<'_>) -> Result<NaiveDate, String> {
    let raw = next_arg(args, "birth date")?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| "birth date must be YYYY-MM-DD".to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|err| err.to_string())
}

fn update_reply(outcome: crate::common::Result<UpdateOutcome>) -> Result<String, String> {
    match outcome {
        Ok(UpdateOutcome::Updated) => Ok("OK".to_string()),
        Ok(UpdateOutcome::Unchanged) => Ok("NOT_UPDATED".to_string()),
        Err(Error::NotFound(_)) => Ok("NOT_FOUND".to_string()),
        Err(err) => Err(err.to_string()),
    }
}

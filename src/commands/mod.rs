//! Command handlers for the tally CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod auth;
mod categories;
mod dashboard;
mod init;
mod list;
mod write;

use crate::model::Transaction;
use chrono::Local;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use auth::{auth, auth_verify, logout};
pub use categories::categories;
pub use dashboard::dashboard;
pub use init::init;
pub use list::{list_expenses, list_income};
pub use write::{add_expense, add_income, delete, update};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// One line of a transaction listing, e.g.
/// `#12  2025-10-02  expense     4,500.00  Food / Groceries  weekly shop`.
pub(crate) fn line(t: &Transaction) -> String {
    let date = t
        .date_in(&Local)
        .map(|d| d.to_string())
        .unwrap_or_else(|| "----------".to_string());
    let amount = t
        .amount()
        .map(|a| a.formatted())
        .unwrap_or_else(|| "?".to_string());
    let label = match (t.source(), t.category(), t.subcategory()) {
        (Some(source), _, _) => source.to_string(),
        (None, Some(category), Some(sub)) if !sub.is_empty() => format!("{category} / {sub}"),
        (None, Some(category), _) => category.to_string(),
        (None, None, _) => String::new(),
    };
    let note = t
        .title()
        .filter(|s| !s.is_empty())
        .or(t.description().filter(|s| !s.is_empty()))
        .unwrap_or_default();
    format!(
        "#{:<4} {date}  {:<8} {amount:>12}  {label}  {note}",
        t.id().as_str(),
        t.kind().to_string()
    )
    .trim_end()
    .to_string()
}

/// Joins transaction lines under a heading, or says there are none.
pub(crate) fn listing<'a>(
    heading: &str,
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> String {
    let lines: Vec<String> = transactions.into_iter().map(line).collect();
    if lines.is_empty() {
        return format!("{heading}: none");
    }
    format!("{heading}:\n{}", lines.join("\n"))
}

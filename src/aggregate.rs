//! Pure functions that summarize, filter and order a list of transactions for display.

use crate::error::{Error, ErrorType, Result};
use crate::model::{Amount, Transaction, TransactionType};
use chrono::{Local, NaiveDate, TimeZone};
use serde::Serialize;
use std::cmp::Reverse;

/// How many items the dashboard shows per type.
pub const RECENT_LIMIT: usize = 5;

/// The sum of all income and the sum of all expenses.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub struct Totals {
    income: Amount,
    expense: Amount,
}

impl Totals {
    pub fn income(&self) -> Amount {
        self.income
    }

    pub fn expense(&self) -> Amount {
        self.expense
    }

    /// Income minus expenses.
    pub fn balance(&self) -> Amount {
        Amount::from(self.income.value() - self.expense.value())
    }
}

/// Sums the amounts by type. A transaction without an amount is an error rather than zero, and
/// so is a sum too large to represent.
pub fn totals(transactions: &[Transaction]) -> Result<Totals> {
    let mut totals = Totals::default();
    for t in transactions {
        let amount = t.amount().ok_or_else(|| {
            Error::new(
                ErrorType::Data,
                format!("Transaction {} has no amount", t.id()),
            )
        })?;
        let total = match t.kind() {
            TransactionType::Income => &mut totals.income,
            TransactionType::Expense => &mut totals.expense,
        };
        *total = total.checked_add(amount).ok_or_else(|| {
            Error::new(
                ErrorType::Data,
                format!("The {} total overflows at transaction {}", t.kind(), t.id()),
            )
        })?;
    }
    Ok(totals)
}

/// The first `limit` transactions of type `kind`, in the order given.
pub fn recent(
    transactions: &[Transaction],
    kind: TransactionType,
    limit: usize,
) -> Vec<&Transaction> {
    transactions
        .iter()
        .filter(|t| t.kind() == kind)
        .take(limit)
        .collect()
}

/// Every transaction of type `kind`, in the order given.
pub fn of_type(transactions: &[Transaction], kind: TransactionType) -> Vec<&Transaction> {
    recent(transactions, kind, usize::MAX)
}

/// Sorts by timestamp, newest first. The sort is stable and transactions without a timestamp go
/// last.
pub fn newest_first(transactions: &[Transaction]) -> Vec<&Transaction> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by_key(|t| (t.timestamp().is_none(), Reverse(t.timestamp())));
    sorted
}

/// Narrows an expense list. Empty fields do not filter.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ExpenseFilter {
    category: Option<String>,
    date: Option<NaiveDate>,
}

impl ExpenseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only this exact, case-sensitive, category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into()).filter(|c: &String| !c.is_empty());
        self
    }

    /// Keep only transactions made on this calendar day.
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// Narrows an income list. Empty fields do not filter.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct IncomeFilter {
    source: Option<String>,
    date: Option<NaiveDate>,
}

impl IncomeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only sources that contain this text, ignoring case.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into().to_lowercase()).filter(|s| !s.is_empty());
        self
    }

    /// Keep only transactions made on this calendar day.
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// Applies `filter` using calendar days in the local time zone.
pub fn filter_expenses<'a>(
    transactions: &'a [Transaction],
    filter: &ExpenseFilter,
) -> Vec<&'a Transaction> {
    filter_expenses_in(transactions, filter, &Local)
}

/// Applies `filter` using calendar days in `tz`.
pub fn filter_expenses_in<'a, Tz: TimeZone>(
    transactions: &'a [Transaction],
    filter: &ExpenseFilter,
    tz: &Tz,
) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|t| match &filter.category {
            Some(category) => t.category() == Some(category.as_str()),
            None => true,
        })
        .filter(|t| on_date(t, filter.date, tz))
        .collect()
}

/// Applies `filter` using calendar days in the local time zone.
pub fn filter_income<'a>(
    transactions: &'a [Transaction],
    filter: &IncomeFilter,
) -> Vec<&'a Transaction> {
    filter_income_in(transactions, filter, &Local)
}

/// Applies `filter` using calendar days in `tz`.
pub fn filter_income_in<'a, Tz: TimeZone>(
    transactions: &'a [Transaction],
    filter: &IncomeFilter,
    tz: &Tz,
) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|t| match &filter.source {
            Some(needle) => t
                .source()
                .is_some_and(|s| s.to_lowercase().contains(needle.as_str())),
            None => true,
        })
        .filter(|t| on_date(t, filter.date, tz))
        .collect()
}

fn on_date<Tz: TimeZone>(t: &Transaction, date: Option<NaiveDate>, tz: &Tz) -> bool {
    match date {
        Some(date) => t.date_in(tz) == Some(date),
        None => true,
    }
}

/// The overview: totals plus the most recent income and expenses, newest first whatever order the
/// transactions came in.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub totals: Totals,
    pub recent_income: Vec<Transaction>,
    pub recent_expenses: Vec<Transaction>,
}

impl Dashboard {
    pub fn build(transactions: &[Transaction]) -> Result<Self> {
        let totals = totals(transactions)?;
        let sorted = cloned(newest_first(transactions));
        Ok(Self {
            totals,
            recent_income: cloned(recent(&sorted, TransactionType::Income, RECENT_LIMIT)),
            recent_expenses: cloned(recent(&sorted, TransactionType::Expense, RECENT_LIMIT)),
        })
    }
}

fn cloned(list: Vec<&Transaction>) -> Vec<Transaction> {
    list.into_iter().cloned().collect()
}

//! Handlers for `tally list income` and `tally list expenses`.

use crate::aggregate::{self, ExpenseFilter, IncomeFilter};
use crate::args::{ListExpensesArgs, ListIncomeArgs};
use crate::commands::{listing, Out};
use crate::model::{Transaction, TransactionType};
use crate::{Result, Session};

/// Lists income, newest first, optionally narrowed to sources containing some text and to a
/// single day.
pub async fn list_income(
    session: &Session,
    args: &ListIncomeArgs,
) -> Result<Out<Vec<Transaction>>> {
    let mut filter = IncomeFilter::new();
    if let Some(source) = args.source() {
        filter = filter.source(source);
    }
    if let Some(date) = args.date() {
        filter = filter.date(date);
    }
    let transactions = owned(aggregate::newest_first(&session.load_transactions().await?));
    let income = owned(aggregate::of_type(&transactions, TransactionType::Income));
    let shown = limited(aggregate::filter_income(&income, &filter), args.limit());
    Ok(Out::new(listing("Income", &shown), shown))
}

/// Lists expenses, newest first, optionally narrowed to one category and to a single day.
pub async fn list_expenses(
    session: &Session,
    args: &ListExpensesArgs,
) -> Result<Out<Vec<Transaction>>> {
    let mut filter = ExpenseFilter::new();
    if let Some(category) = args.category() {
        filter = filter.category(category);
    }
    if let Some(date) = args.date() {
        filter = filter.date(date);
    }
    let transactions = owned(aggregate::newest_first(&session.load_transactions().await?));
    let expenses = owned(aggregate::of_type(&transactions, TransactionType::Expense));
    let shown = limited(aggregate::filter_expenses(&expenses, &filter), args.limit());
    Ok(Out::new(listing("Expenses", &shown), shown))
}

fn owned(list: Vec<&Transaction>) -> Vec<Transaction> {
    list.into_iter().cloned().collect()
}

fn limited(list: Vec<&Transaction>, limit: Option<usize>) -> Vec<Transaction> {
    owned(list.into_iter().take(limit.unwrap_or(usize::MAX)).collect())
}

use crate::aggregate::Dashboard;
use crate::commands::{listing, Out};
use crate::{Result, Session};

/// Loads the transactions and shows the totals along with the most recent income and expenses.
pub async fn dashboard(session: &Session) -> Result<Out<Dashboard>> {
    session.load_transactions().await?;
    let dashboard = session.dashboard()?;
    let totals = &dashboard.totals;
    let message = format!(
        "Total income:   {:>12}\nTotal expenses: {:>12}\nBalance:        {:>12}\n\n{}\n\n{}",
        totals.income().formatted(),
        totals.expense().formatted(),
        totals.balance().formatted(),
        listing("Recent income", &dashboard.recent_income),
        listing("Recent expenses", &dashboard.recent_expenses),
    );
    Ok(Out::new(message, dashboard))
}

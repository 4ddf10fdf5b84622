//! Handlers for the commands that change transactions: `add`, `update` and `delete`.

use crate::args::{AddExpenseArgs, AddIncomeArgs, DeleteArgs, UpdateArgs};
use crate::commands::{line, Out};
use crate::error::{Error, ErrorType};
use crate::model::{Transaction, TransactionDraft, TransactionType};
use crate::{Result, Session};
use tracing::warn;

/// Records new income.
pub async fn add_income(session: &Session, args: &AddIncomeArgs) -> Result<Out<()>> {
    let draft = TransactionDraft::income(args.amount(), args.source())
        .with_title(args.title().unwrap_or_default())
        .with_description(args.description().unwrap_or_default());
    session.create(&draft).await?;
    Ok("Saved the new income".into())
}

/// Records a new expense. The taxonomy is loaded first so that the user can be told about any
/// category or subcategory that saving this expense creates.
pub async fn add_expense(session: &Session, args: &AddExpenseArgs) -> Result<Out<Vec<String>>> {
    load_taxonomy_for_hints(session).await?;
    let draft = TransactionDraft::expense(args.amount(), args.category())
        .with_subcategory(args.subcategory().unwrap_or_default())
        .with_title(args.title().unwrap_or_default())
        .with_description(args.description().unwrap_or_default());
    let hints = only_if_loaded(session, session.create(&draft).await?);
    Ok(Out::new(with_hints("Saved the new expense", &hints), hints))
}

/// Replaces a transaction. Fields that are not given keep their current values.
pub async fn update(session: &Session, args: &UpdateArgs) -> Result<Out<Option<Transaction>>> {
    session.load_transactions().await?;
    let id = args.id();
    let existing = session.transaction(id).ok_or_else(|| {
        Error::new(
            ErrorType::Validation,
            format!("There is no transaction with ID {id}"),
        )
    })?;
    let draft = apply_changes(TransactionDraft::from_transaction(&existing), args)?;
    if existing.kind() == TransactionType::Expense {
        load_taxonomy_for_hints(session).await?;
    }

    let hints = only_if_loaded(session, session.update(id, &draft).await?);
    let updated = session.transaction(id);
    let mut message = with_hints(&format!("Updated transaction {id}"), &hints);
    if let Some(t) = &updated {
        message = format!("{message}\n{}", line(t));
    }
    Ok(Out::new(message, updated))
}

/// Deletes a transaction. Nothing is sent unless `--yes` was given.
pub async fn delete(session: &Session, args: &DeleteArgs) -> Result<Out<()>> {
    let id = args.id();
    if !args.yes() {
        return Err(Error::new(
            ErrorType::Validation,
            format!("Deleting transaction {id} cannot be undone. Pass --yes to confirm."),
        ));
    }
    session.remove(id).await?;
    Ok(format!("Deleted transaction {id}").into())
}

fn apply_changes(mut draft: TransactionDraft, args: &UpdateArgs) -> Result<TransactionDraft> {
    let misplaced = match draft.kind() {
        Some(TransactionType::Income) if args.category().is_some() => Some("--category"),
        Some(TransactionType::Income) if args.subcategory().is_some() => Some("--subcategory"),
        Some(TransactionType::Expense) if args.source().is_some() => Some("--source"),
        _ => None,
    };
    if let (Some(flag), Some(kind)) = (misplaced, draft.kind()) {
        return Err(Error::new(
            ErrorType::Validation,
            format!("{flag} does not apply to {kind}, and the type cannot be changed"),
        ));
    }
    if let Some(amount) = args.amount() {
        draft = draft.with_amount(amount);
    }
    if let Some(source) = args.source() {
        draft = draft.with_source(source);
    }
    if let Some(category) = args.category() {
        draft = draft.with_category(category);
    }
    if let Some(subcategory) = args.subcategory() {
        draft = draft.with_subcategory(subcategory);
    }
    if let Some(title) = args.title() {
        draft = draft.with_title(title);
    }
    if let Some(description) = args.description() {
        draft = draft.with_description(description);
    }
    Ok(draft)
}

/// A failed taxonomy load only costs the hints, unless it means the user is not signed in.
async fn load_taxonomy_for_hints(session: &Session) -> Result<()> {
    match session.load_taxonomy().await {
        Err(e) if e.is_auth_missing() => Err(e),
        Err(e) => {
            warn!("New category hints are unavailable: {e}");
            Ok(())
        }
        Ok(_) => Ok(()),
    }
}

/// Without a loaded taxonomy every name looks new, so hints would be noise.
fn only_if_loaded(session: &Session, hints: Vec<String>) -> Vec<String> {
    if session.taxonomy().is_loaded() {
        hints
    } else {
        Vec::new()
    }
}

fn with_hints(message: &str, hints: &[String]) -> String {
    std::iter::once(message)
        .chain(hints.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, TransactionId};
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_add_expense_with_new_subcategory() {
        let env = TestEnv::new().await;
        let session = env.session();
        let args = AddExpenseArgs::new("500", "Food", Some("Snacks"), None, Some("chips"));
        let out = add_expense(&session, &args).await.unwrap();
        assert_eq!(
            out.message(),
            "Saved the new expense\nNew subcategory \"Snacks\" will be created under \"Food\"."
        );
        assert_eq!(session.store().transactions().len(), 8);
        let saved = &session.store().transactions()[0];
        assert_eq!(saved.category(), Some("Food"));
        assert_eq!(saved.amount(), Some(Amount::from(500_i64)));
    }

    #[tokio::test]
    async fn test_add_expense_missing_category() {
        let env = TestEnv::new().await;
        let session = env.session();
        let args = AddExpenseArgs::new("500", "", None, None, None);
        let err = add_expense(&session, &args).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        assert_eq!(err.message(), "Please fill in the required fields: category");
        assert_eq!(env.api().state().transactions.len(), 7);
    }

    #[tokio::test]
    async fn test_add_income() {
        let env = TestEnv::new().await;
        let session = env.session();
        let args = AddIncomeArgs::new("$1,000", "Bonus", Some("Q3"), None);
        add_income(&session, &args).await.unwrap();
        let saved = &session.store().transactions()[0];
        assert_eq!(saved.source(), Some("Bonus"));
        assert_eq!(saved.title(), Some("Q3"));
        assert_eq!(saved.amount(), Some(Amount::from(1000_i64)));
    }

    #[tokio::test]
    async fn test_update_keeps_unspecified_fields() {
        let env = TestEnv::new().await;
        let session = env.session();
        let mut args = UpdateArgs::new(TransactionId::new("2"));
        args.set_amount("4800");
        let out = update(&session, &args).await.unwrap();
        let updated = out.structure().unwrap().as_ref().unwrap();
        assert_eq!(updated.amount(), Some(Amount::from(4800_i64)));
        assert_eq!(updated.category(), Some("Food"));
        assert_eq!(updated.subcategory(), Some("Groceries"));
        assert_eq!(updated.description(), Some("weekly shop"));
    }

    #[tokio::test]
    async fn test_update_rejects_fields_of_the_other_type() {
        let env = TestEnv::new().await;
        let session = env.session();
        let mut args = UpdateArgs::new(TransactionId::new("1"));
        args.set_category("Food");
        let err = update(&session, &args).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        assert!(err.message().starts_with("--category"));
    }

    #[tokio::test]
    async fn test_update_income_fields() {
        let env = TestEnv::new().await;
        let session = env.session();
        let mut args = UpdateArgs::new(TransactionId::new("4"));
        args.set_source("Freelance Illustration");
        args.set_title("Poster");
        args.set_description("");
        let out = update(&session, &args).await.unwrap();
        let updated = out.structure().unwrap().as_ref().unwrap();
        assert_eq!(updated.source(), Some("Freelance Illustration"));
        assert_eq!(updated.title(), Some("Poster"));
        assert_eq!(updated.description().unwrap_or_default(), "");
        assert_eq!(updated.amount(), Some(Amount::from(15000_i64)));
    }

    #[tokio::test]
    async fn test_update_expense_to_new_subcategory() {
        let env = TestEnv::new().await;
        let session = env.session();
        let mut args = UpdateArgs::new(TransactionId::new("2"));
        args.set_subcategory("Bakery");
        let out = update(&session, &args).await.unwrap();
        assert!(
            out.message()
                .contains(r#"New subcategory "Bakery" will be created under "Food"."#),
            "{}",
            out.message()
        );
        let updated = out.structure().unwrap().as_ref().unwrap();
        assert_eq!(updated.subcategory(), Some("Bakery"));
        assert_eq!(updated.category(), Some("Food"));
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let env = TestEnv::new().await;
        let args = UpdateArgs::new(TransactionId::new("999"));
        let err = update(&env.session(), &args).await.unwrap_err();
        assert_eq!(err.message(), "There is no transaction with ID 999");
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let env = TestEnv::new().await;
        let session = env.session();
        let id = TransactionId::new("3");
        let err = delete(&session, &DeleteArgs::new(id.clone(), false))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        assert_eq!(env.api().requests(), 0);

        delete(&session, &DeleteArgs::new(id.clone(), true))
            .await
            .unwrap();
        assert!(session.transaction(&id).is_none());
    }

    #[tokio::test]
    async fn test_delete_server_failure() {
        let env = TestEnv::new().await;
        let args = DeleteArgs::new(TransactionId::new("404"), true);
        let err = delete(&env.session(), &args).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::SubmitFailed);
        assert_eq!(err.message(), "Transaction not found");
    }
}

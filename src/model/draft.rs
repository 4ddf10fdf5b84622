//! What a user has typed into a transaction form, and the validated request body built from it.

use crate::error::{Error, ErrorType, Result};
use crate::model::{Amount, Transaction, TransactionType};
use serde::Serialize;
use std::str::FromStr;

/// Whether a body is for creating a transaction or for replacing an existing one.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Create,
    Update,
}

/// The raw, unvalidated form input for a transaction. All fields are held as typed so that
/// validation can report every problem at once.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct TransactionDraft {
    kind: Option<TransactionType>,
    amount: String,
    source: String,
    category: String,
    subcategory: String,
    title: String,
    description: String,
}

impl TransactionDraft {
    pub fn income(amount: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            kind: Some(TransactionType::Income),
            amount: amount.into(),
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn expense(amount: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            kind: Some(TransactionType::Expense),
            amount: amount.into(),
            category: category.into(),
            ..Default::default()
        }
    }

    /// Pre-fills a draft for editing `transaction`. Missing optional fields become empty strings.
    pub fn from_transaction(transaction: &Transaction) -> Self {
        Self {
            kind: Some(transaction.kind()),
            amount: transaction
                .amount()
                .map(|a| a.to_string())
                .unwrap_or_default(),
            source: transaction.source().unwrap_or_default().to_string(),
            category: transaction.category().unwrap_or_default().to_string(),
            subcategory: transaction.subcategory().unwrap_or_default().to_string(),
            title: transaction.title().unwrap_or_default().to_string(),
            description: transaction.description().unwrap_or_default().to_string(),
        }
    }

    pub fn with_amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = amount.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = subcategory.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn kind(&self) -> Option<TransactionType> {
        self.kind
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn subcategory(&self) -> &str {
        &self.subcategory
    }

    /// Checks the required fields and builds the request body for `intent`.
    ///
    /// The amount must parse as a positive number. Income needs a source and an expense needs a
    /// category. When anything is missing the error names every missing field, in form order.
    pub fn validate(&self, intent: Intent) -> Result<TransactionBody> {
        let mut missing = Vec::new();
        if self.kind.is_none() {
            missing.push("type");
        }
        let amount = Amount::from_str(&self.amount)
            .ok()
            .filter(Amount::is_positive);
        if amount.is_none() {
            missing.push("amount");
        }
        match self.kind {
            Some(TransactionType::Income) if self.source.trim().is_empty() => {
                missing.push("source")
            }
            Some(TransactionType::Expense) if self.category.trim().is_empty() => {
                missing.push("category")
            }
            _ => {}
        }

        let (kind, amount) = match (self.kind, amount) {
            (Some(kind), Some(amount)) if missing.is_empty() => (kind, amount),
            _ => {
                return Err(Error::new(
                    ErrorType::Validation,
                    format!("Please fill in the required fields: {}", missing.join(", ")),
                ))
            }
        };
        if !amount.is_exact_on_wire() {
            return Err(Error::new(
                ErrorType::Validation,
                format!("The amount {amount} has more digits than can be saved exactly"),
            ));
        }

        Ok(TransactionBody::new(self, intent, kind, amount))
    }
}

/// The JSON body sent to the service for a create or a full-replace update.
///
/// On create the `type` is sent along with the group of fields that applies to it. On update the
/// `type` is omitted (it cannot change) and every mutable field of the group is sent, empty
/// strings included, so that the service does not keep stale values.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct TransactionBody {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<TransactionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    amount: Amount,
    description: String,
}

impl TransactionBody {
    fn new(
        draft: &TransactionDraft,
        intent: Intent,
        kind: TransactionType,
        amount: Amount,
    ) -> Self {
        let income = kind == TransactionType::Income;
        let title = match intent {
            Intent::Update => Some(draft.title.trim().to_string()),
            Intent::Create if draft.title.trim().is_empty() => None,
            Intent::Create => Some(draft.title.trim().to_string()),
        };
        Self {
            kind: (intent == Intent::Create).then_some(kind),
            source: income.then(|| draft.source.trim().to_string()),
            category: (!income).then(|| draft.category.trim().to_string()),
            subcategory: (!income).then(|| draft.subcategory.trim().to_string()),
            title,
            amount,
            description: draft.description.clone(),
        }
    }

    pub fn kind(&self) -> Option<TransactionType> {
        self.kind
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn subcategory(&self) -> Option<&str> {
        self.subcategory.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

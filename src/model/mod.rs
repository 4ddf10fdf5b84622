//! Types that represent the core data model, such as `Transaction` and `Taxonomy`.
mod amount;
mod draft;
mod taxonomy;
mod transaction;

pub use amount::{Amount, AmountError};
pub use draft::{Intent, TransactionBody, TransactionDraft};
pub use taxonomy::{Novelty, Taxonomy};
pub use transaction::{Transaction, TransactionId, TransactionType};

pub(crate) use transaction::parse_timestamp;

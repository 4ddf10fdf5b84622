pub mod aggregate;
pub mod api;
pub mod args;
pub mod commands;
mod config;
mod editor;
mod error;
pub mod model;
mod session;
mod slot;
mod store;
mod taxonomy;
mod utils;


pub use api::Mode;
pub use config::Config;
pub use editor::{Editor, EditorState};
pub use error::{Error, ErrorType, Result};
pub use session::Session;
pub use store::TransactionStore;
pub use taxonomy::TaxonomyCache;

//! The client-side copy of the category → subcategory taxonomy.

use crate::api::{Api, Credential};
use crate::error::Result;
use crate::model::{Novelty, Taxonomy};
use crate::slot::Slot;
use crate::store::not_signed_in;
use tracing::{debug, warn};

/// Holds the most recently loaded taxonomy and answers suggestion and novelty questions from it.
///
/// Nothing here changes the cached taxonomy except a load. A name the user types that is not in
/// the cache is reported as `Novelty::New`; the service creates it when the transaction is saved
/// and it becomes known at the next load.
#[derive(Debug)]
pub struct TaxonomyCache {
    slot: Slot<Taxonomy>,
}

impl Default for TaxonomyCache {
    fn default() -> Self {
        Self {
            slot: Slot::new("categories"),
        }
    }
}

impl TaxonomyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches the taxonomy and, if this is the newest load to complete, replaces the cache with
    /// it. Returns the cached taxonomy afterwards.
    pub async fn load(&self, api: &dyn Api, credential: Option<&Credential>) -> Result<Taxonomy> {
        let credential = credential.ok_or_else(not_signed_in)?;
        let ticket = self.slot.begin();
        match api.list_categories(credential).await {
            Ok(taxonomy) => {
                let count = taxonomy.len();
                if self.slot.finish(ticket, taxonomy) {
                    debug!("Loaded {count} categories");
                }
                Ok(self.slot.get())
            }
            Err(e) => {
                warn!("Unable to load categories: {e:#}");
                Err(e)
            }
        }
    }

    /// A copy of the cached taxonomy.
    pub fn snapshot(&self) -> Taxonomy {
        self.slot.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.is_loaded()
    }

    pub fn suggest_category(&self, partial: &str) -> Vec<String> {
        self.slot
            .with(|t| owned(t.suggest_category(partial)))
    }

    pub fn suggest_subcategory(&self, category: &str, partial: &str) -> Vec<String> {
        self.slot
            .with(|t| owned(t.suggest_subcategory(category, partial)))
    }

    pub fn classify_category(&self, category: &str) -> Novelty {
        self.slot.with(|t| t.classify_category(category))
    }

    pub fn classify_subcategory(&self, category: &str, subcategory: &str) -> Novelty {
        self.slot
            .with(|t| t.classify_subcategory(category, subcategory))
    }

    /// The "will be created" messages for whichever of `category` and `subcategory` are new.
    pub fn hints(&self, category: &str, subcategory: &str) -> Vec<String> {
        self.slot.with(|t| {
            t.category_hint(category)
                .into_iter()
                .chain(t.subcategory_hint(category, subcategory))
                .collect()
        })
    }
}

fn owned(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(str::to_string).collect()
}

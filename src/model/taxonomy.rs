//! The expense category → subcategory naming structure.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Formatter};

/// Whether a name typed by the user already exists in the last-loaded taxonomy.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Novelty {
    Known,
    /// The service will create the entry when a transaction using it is saved.
    New,
}

serde_plain::derive_display_from_serialize!(Novelty);

/// A snapshot of the category → subcategories mapping as returned by the service.
///
/// Category names are unique and case-sensitive. The same subcategory name can appear under
/// several categories without any relationship between them. Categories keep the order in which
/// the service sent them, which is the order suggestions are offered in.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Taxonomy {
    entries: Vec<(String, Vec<String>)>,
}

impl Taxonomy {
    pub fn new<C, S, I>(entries: impl IntoIterator<Item = (C, I)>) -> Self
    where
        C: Into<String>,
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let mut taxonomy = Taxonomy::default();
        for (category, subcategories) in entries {
            let category = category.into();
            taxonomy.insert(category.clone(), String::new());
            for subcategory in subcategories {
                taxonomy.insert(category.clone(), subcategory.into());
            }
        }
        taxonomy
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Category names in their natural order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    /// The subcategories of `category`, or `None` if the category is unknown.
    pub fn subcategories(&self, category: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, subs)| subs.as_slice())
    }

    /// Categories containing `partial` as a case-insensitive substring. Blank input returns every
    /// category.
    pub fn suggest_category(&self, partial: &str) -> Vec<&str> {
        matching(self.categories(), partial)
    }

    /// Subcategories of `category` containing `partial` as a case-insensitive substring. Blank
    /// input returns every subcategory of `category`. An unknown category has no suggestions.
    pub fn suggest_subcategory(&self, category: &str, partial: &str) -> Vec<&str> {
        match self.subcategories(category) {
            Some(subs) => matching(subs.iter().map(String::as_str), partial),
            None => Vec::new(),
        }
    }

    /// A category is new unless it is exactly (case-sensitively) one of the cached keys.
    pub fn classify_category(&self, category: &str) -> Novelty {
        match self.subcategories(category) {
            Some(_) => Novelty::Known,
            None => Novelty::New,
        }
    }

    /// A subcategory is new if its category is new, or if it is not exactly one of the cached
    /// subcategories of that category.
    pub fn classify_subcategory(&self, category: &str, subcategory: &str) -> Novelty {
        match self.subcategories(category) {
            Some(subs) if subs.iter().any(|s| s == subcategory) => Novelty::Known,
            _ => Novelty::New,
        }
    }

    /// The hint shown while typing a category name, if it will be created on save.
    pub fn category_hint(&self, category: &str) -> Option<String> {
        if category.is_empty() || self.classify_category(category) == Novelty::Known {
            return None;
        }
        Some(format!("New category \"{category}\" will be created."))
    }

    /// The hint shown while typing a subcategory name, if it will be created on save.
    pub fn subcategory_hint(&self, category: &str, subcategory: &str) -> Option<String> {
        if category.is_empty()
            || subcategory.is_empty()
            || self.classify_subcategory(category, subcategory) == Novelty::Known
        {
            return None;
        }
        Some(format!(
            "New subcategory \"{subcategory}\" will be created under \"{category}\"."
        ))
    }

    /// Adds `subcategory` under `category`, creating the category if needed. Used by the in-memory
    /// service, which grows its taxonomy the same way the real one does. Blank names are ignored.
    pub(crate) fn insert(&mut self, category: String, subcategory: String) {
        if category.is_empty() {
            return;
        }
        let ix = match self.entries.iter().position(|(c, _)| *c == category) {
            Some(ix) => ix,
            None => {
                self.entries.push((category, Vec::new()));
                self.entries.len() - 1
            }
        };
        let subs = &mut self.entries[ix].1;
        if !subcategory.is_empty() && !subs.contains(&subcategory) {
            subs.push(subcategory);
        }
    }
}

fn matching<'a>(names: impl Iterator<Item = &'a str>, partial: &str) -> Vec<&'a str> {
    let needle = partial.trim().to_lowercase();
    if needle.is_empty() {
        return names.collect();
    }
    names
        .filter(|name| name.to_lowercase().contains(&needle))
        .collect()
}

impl Serialize for Taxonomy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (category, subcategories) in &self.entries {
            map.serialize_entry(category, subcategories)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Taxonomy {
    /// Reads a JSON object of `category: [subcategory, ...]`, keeping key order. A `null` list is
    /// read as an empty one.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TaxonomyVisitor;

        impl<'de> Visitor<'de> for TaxonomyVisitor {
            type Value = Taxonomy;

            fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str("a map of category names to lists of subcategory names")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Taxonomy, A::Error> {
                let mut entries: Vec<(String, Vec<String>)> = Vec::new();
                while let Some((category, subs)) =
                    access.next_entry::<String, Option<Vec<String>>>()?
                {
                    let subs = subs.unwrap_or_default();
                    match entries.iter_mut().find(|(c, _)| *c == category) {
                        Some((_, existing)) => existing.extend(subs),
                        None => entries.push((category, subs)),
                    }
                }
                Ok(Taxonomy { entries })
            }
        }

        deserializer.deserialize_map(TaxonomyVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn food() -> Taxonomy {
        serde_json::from_str(r#"{"Food": ["Groceries"]}"#).unwrap()
    }

    fn sample() -> Taxonomy {
        serde_json::from_str(
            r#"{
                "Transport": ["Fuel", "Bus Fare"],
                "Food": ["Groceries", "Restaurants", "Snacks"],
                "Utilities": ["Electricity", "Water"],
                "Fun": null
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_classify_category() {
        let tax = food();
        assert_eq!(tax.classify_category("Food"), Novelty::Known);
        assert_eq!(tax.classify_category("Transport"), Novelty::New);
        assert_eq!(tax.classify_category("food"), Novelty::New);
    }

    #[test]
    fn test_classify_subcategory() {
        let tax = food();
        assert_eq!(tax.classify_subcategory("Food", "Groceries"), Novelty::Known);
        assert_eq!(tax.classify_subcategory("Food", "Snacks"), Novelty::New);
        assert_eq!(tax.classify_subcategory("Transport", "Groceries"), Novelty::New);
        assert_eq!(tax.classify_subcategory("Food", "groceries"), Novelty::New);
    }

    #[test]
    fn test_deserialize_keeps_server_order() {
        let tax = sample();
        let cats: Vec<&str> = tax.categories().collect();
        assert_eq!(cats, vec!["Transport", "Food", "Utilities", "Fun"]);
        assert_eq!(tax.subcategories("Fun"), Some(&[][..]));
    }

    #[test]
    fn test_suggest_category_case_insensitive_substring() {
        let tax = sample();
        assert_eq!(tax.suggest_category("T"), vec!["Transport", "Utilities"]);
        assert_eq!(tax.suggest_category("fOo"), vec!["Food"]);
        assert!(tax.suggest_category("zzz").is_empty());
    }

    #[test]
    fn test_suggest_blank_returns_everything() {
        let tax = sample();
        assert_eq!(tax.suggest_category("").len(), 4);
        assert_eq!(tax.suggest_category("   ").len(), 4);
        assert_eq!(
            tax.suggest_subcategory("Food", ""),
            vec!["Groceries", "Restaurants", "Snacks"]
        );
    }

    #[test]
    fn test_suggest_subcategory() {
        let tax = sample();
        assert_eq!(tax.suggest_subcategory("Food", "RES"), vec!["Restaurants"]);
        assert_eq!(tax.suggest_subcategory("Transport", "u"), vec!["Fuel", "Bus Fare"]);
        assert!(tax.suggest_subcategory("Nope", "").is_empty());
    }

    #[test]
    fn test_hints() {
        let tax = food();
        assert_eq!(tax.category_hint("Food"), None);
        assert_eq!(tax.category_hint(""), None);
        assert_eq!(
            tax.category_hint("Transport").unwrap(),
            "New category \"Transport\" will be created."
        );
        assert_eq!(tax.subcategory_hint("Food", "Groceries"), None);
        assert_eq!(
            tax.subcategory_hint("Food", "Snacks").unwrap(),
            "New subcategory \"Snacks\" will be created under \"Food\"."
        );
    }

    #[test]
    fn test_insert_grows_taxonomy() {
        let mut tax = food();
        tax.insert("Food".to_string(), "Snacks".to_string());
        tax.insert("Food".to_string(), "Snacks".to_string());
        tax.insert("Transport".to_string(), String::new());
        assert_eq!(tax.subcategories("Food").unwrap(), &["Groceries", "Snacks"]);
        assert_eq!(tax.subcategories("Transport").unwrap().len(), 0);
        assert_eq!(tax.len(), 2);
    }

    #[test]
    fn test_serialize_round_trip() {
        let tax = sample();
        let json = serde_json::to_string(&tax).unwrap();
        let back: Taxonomy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tax);
    }
}

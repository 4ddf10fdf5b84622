use crate::args::CategoriesArgs;
use crate::commands::Out;
use crate::model::Novelty;
use crate::{Result, Session};

/// Loads the taxonomy and shows the categories, or the subcategories of one category, that
/// contain the search text.
pub async fn categories(session: &Session, args: &CategoriesArgs) -> Result<Out<Vec<String>>> {
    session.load_taxonomy().await?;
    let taxonomy = session.taxonomy();
    let search = args.search().unwrap_or_default();

    let (heading, names) = match args.category() {
        Some(category) if taxonomy.classify_category(category) == Novelty::New => {
            let message = format!(
                "There is no category \"{category}\" yet. It will be created when an expense \
                uses it."
            );
            return Ok(Out::new(message, Vec::new()));
        }
        Some(category) => (
            format!("Subcategories of \"{category}\""),
            taxonomy.suggest_subcategory(category, search),
        ),
        None => ("Categories".to_string(), taxonomy.suggest_category(search)),
    };

    let message = if names.is_empty() {
        format!("{heading}: none match \"{search}\"")
    } else {
        format!("{heading}:\n  {}", names.join("\n  "))
    };
    Ok(Out::new(message, names))
}

//! Recipe detail payload: parsed ingredient list, ordered steps, and a
//! best-match product for every ingredient.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::catalog::Store;
use crate::recipes::Recipe;
use crate::resolve::ProductResolver;
use crate::text::key_from_phrase;

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.\s+").unwrap());

/// One recipe ingredient and the catalog product it maps to, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientLink {
    pub ingredient: String,
    pub product_name: Option<String>,
    pub store: Option<Store>,
    pub price: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeDetail {
    pub id: String,
    pub title: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub where_to_buy: Vec<IngredientLink>,
}

impl RecipeDetail {
    pub fn build(recipe: &Recipe, products: &ProductResolver<'_>) -> Self {
        let ingredients = parse_ingredients_field(&recipe.ingredients_raw);
        let steps = split_instructions(&recipe.instructions_raw);
        let where_to_buy = map_ingredients_to_products(&ingredients, products);
        Self {
            id: recipe.id.clone(),
            title: recipe.title.clone(),
            ingredients,
            steps,
            where_to_buy,
        }
    }

    /// Plain-text rendering: bulleted ingredients, numbered steps and buy
    /// links, with `(no match)` for unresolved ingredients.
    pub fn render(&self) -> String {
        let mut out = vec![self.title.clone(), String::new(), "Ingredients:".to_string()];
        out.extend(self.ingredients.iter().map(|ing| format!("• {ing}")));
        out.push(String::new());
        out.push("Steps:".to_string());
        out.extend(
            self.steps
                .iter()
                .enumerate()
                .map(|(i, step)| format!("{}) {}", i + 1, step)),
        );
        out.push(String::new());
        out.push("Where to buy (best match):".to_string());
        for link in &self.where_to_buy {
            out.push(match (&link.product_name, link.store) {
                (Some(name), Some(store)) => {
                    let mut line = format!("• {} → {} ({})", link.ingredient, name, store);
                    if let Some(price) = &link.price {
                        line.push(' ');
                        line.push_str(price);
                    }
                    if let Some(url) = &link.url {
                        line.push_str(" | ");
                        line.push_str(url);
                    }
                    line
                }
                _ => format!("• {} → (no match)", link.ingredient),
            });
        }
        out.join("\n")
    }
}

/// Link every ingredient to its best-scoring product via its short key.
pub fn map_ingredients_to_products(
    ingredients: &[String],
    products: &ProductResolver<'_>,
) -> Vec<IngredientLink> {
    ingredients
        .iter()
        .map(|ingredient| {
            let key = key_from_phrase(ingredient);
            match products.find_best_product(&key) {
                Some(p) => IngredientLink {
                    ingredient: ingredient.clone(),
                    product_name: Some(p.name.clone()),
                    store: Some(p.store),
                    price: p.price.clone(),
                    url: p.url.clone(),
                },
                None => IngredientLink {
                    ingredient: ingredient.clone(),
                    product_name: None,
                    store: None,
                    price: None,
                    url: None,
                },
            }
        })
        .collect()
}

/// Ingredients field as a list. Accepts a list literal with single- or
/// double-quoted items (`['a', "b's"]`); anything else is split on commas.
pub fn parse_ingredients_field(raw: &str) -> Vec<String> {
    match parse_list_literal(raw) {
        Ok(items) => items,
        Err(reason) => {
            debug!(reason, "ingredients are not a list literal, splitting on commas");
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        }
    }
}

fn parse_list_literal(raw: &str) -> Result<Vec<String>, &'static str> {
    let inner = raw
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or("missing brackets")?;

    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&first) = chars.peek() else {
            return Ok(items);
        };

        if first == '\'' || first == '"' {
            chars.next();
            let mut item = String::new();
            loop {
                match chars.next().ok_or("unterminated string")? {
                    '\\' => match chars.next().ok_or("dangling escape")? {
                        'n' => item.push('\n'),
                        't' => item.push('\t'),
                        other => item.push(other),
                    },
                    c if c == first => break,
                    c => item.push(c),
                }
            }
            items.push(item);
        } else {
            let mut bare = String::new();
            while let Some(c) = chars.next_if(|c| *c != ',') {
                bare.push(c);
            }
            let bare = bare.trim();
            if bare.parse::<f64>().is_err() {
                return Err("unquoted item");
            }
            items.push(bare.to_string());
        }

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            None => return Ok(items),
            Some(',') => {}
            Some(_) => return Err("expected comma"),
        }
    }
}

/// Instructions as ordered steps: one per non-blank line, or split at
/// sentence ends when the text has at most one line.
pub fn split_instructions(raw: &str) -> Vec<String> {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<String> = text
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.trim_matches([' ', '\t']).to_string())
        .collect();
    if lines.len() > 1 {
        return lines;
    }
    SENTENCE_END
        .split(&text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogStore, Product};
    use crate::recipes::{RecipeRecord, RecipeStore};
    use crate::text::TermMap;

    #[test]
    fn parses_mixed_quote_list_literal() {
        let items = parse_ingredients_field(r#"['1 cup lentils', "2 tbsp baker's yeast", 'salt, to taste']"#);
        assert_eq!(items, vec!["1 cup lentils", "2 tbsp baker's yeast", "salt, to taste"]);
    }

    #[test]
    fn handles_escapes_numbers_and_empty_lists() {
        assert_eq!(parse_ingredients_field(r"['it\'s', 3]"), vec!["it's", "3"]);
        assert!(parse_ingredients_field("[]").is_empty());
        assert_eq!(parse_ingredients_field("['a',]"), vec!["a"]);
    }

    #[test]
    fn falls_back_to_comma_split() {
        assert_eq!(parse_ingredients_field("eggs, milk , flour"), vec!["eggs", "milk", "flour"]);
        assert_eq!(parse_ingredients_field("['unterminated, x]"), vec!["['unterminated", "x]"]);
    }

    #[test]
    fn nested_lists_and_bare_words_fall_back_to_comma_split() {
        assert_eq!(parse_ingredients_field("[['a'], 'b']"), vec!["[['a']", "'b']"]);
        assert_eq!(parse_ingredients_field("[True, 'salt']"), vec!["[True", "'salt']"]);
        assert_eq!(parse_ingredients_field("[None]"), vec!["[None]"]);
    }

    #[test]
    fn splits_lines_then_sentences() {
        assert_eq!(
            split_instructions("Boil water.\r\n\r\n  Add pasta.\rDrain."),
            vec!["Boil water.", "Add pasta.", "Drain."]
        );
        assert_eq!(
            split_instructions("Boil water. Add pasta.  Drain"),
            vec!["Boil water", "Add pasta", "Drain"]
        );
        assert!(split_instructions("   ").is_empty());
    }

    #[test]
    fn payload_links_and_renders_placeholders() {
        let catalog = CatalogStore::from_products(vec![
            Product::new("Röda Linser", Store::Ica)
                .with_price("24.90")
                .with_url("https://ica.se/linser"),
            Product::new("Dried Lentils 500g", Store::Hemkop).with_price("19.90"),
        ]);
        let terms = TermMap::builtin();
        let products = ProductResolver::new(&catalog, &terms);
        let store = RecipeStore::from_records(vec![RecipeRecord {
            title: "Lentil Burgers".into(),
            ingredients_raw: "['1 cup dried lentils', '1 tsp cumin']".into(),
            instructions_raw: "Cook lentils.\nForm patties.".into(),
            ..Default::default()
        }]);

        let detail = RecipeDetail::build(&store.recipes()[0], &products);
        assert_eq!(detail.id, "lentil-burgers");
        assert_eq!(detail.steps, vec!["Cook lentils.", "Form patties."]);
        assert_eq!(detail.where_to_buy[0].product_name.as_deref(), Some("Dried Lentils 500g"));
        assert_eq!(detail.where_to_buy[1].product_name, None);

        let text = detail.render();
        assert!(text.starts_with("Lentil Burgers\n\nIngredients:\n• 1 cup dried lentils"));
        assert!(text.contains("1) Cook lentils.\n2) Form patties."));
        assert!(text.contains("• 1 cup dried lentils → Dried Lentils 500g (Hemköp) 19.90"));
        assert!(text.contains("• 1 tsp cumin → (no match)"));
    }
}

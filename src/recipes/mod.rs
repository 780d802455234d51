//! Recipe Store: recipes with derived slug ids, built once at startup.

pub mod loader;

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Maximum id length, suffix included.
pub const MAX_ID_LEN: usize = 80;

static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// A recipe row before an id has been assigned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeRecord {
    pub title: String,
    /// List-literal encoding, e.g. `['1 cup lentils', '2 eggs']`.
    pub ingredients_raw: String,
    pub instructions_raw: String,
    pub cleaned_ingredients_raw: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub ingredients_raw: String,
    pub instructions_raw: String,
    pub cleaned_ingredients_raw: Option<String>,
    pub image: Option<String>,
}

/// Lowercase URL-safe slug of `title`, at most [`MAX_ID_LEN`] characters.
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let slug = NON_SLUG.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');
    // Slug is ASCII, so byte slicing is safe.
    slug[..slug.len().min(MAX_ID_LEN)].trim_end_matches('-').to_string()
}

/// Recipes in source order with unique ids.
#[derive(Debug, Default)]
pub struct RecipeStore {
    recipes: Vec<Recipe>,
    by_id: HashMap<String, usize>,
}

impl RecipeStore {
    /// Assign ids to `records`. The first recipe with a given slug keeps it;
    /// later collisions get `-2`, `-3`, ... with the base shortened so the id
    /// still fits in [`MAX_ID_LEN`].
    pub fn from_records(records: Vec<RecipeRecord>) -> Self {
        let mut taken: HashSet<String> = HashSet::with_capacity(records.len());
        let mut recipes = Vec::with_capacity(records.len());
        let mut by_id = HashMap::with_capacity(records.len());

        for record in records {
            let title = match record.title.trim() {
                "" => "Untitled".to_string(),
                t => t.to_string(),
            };
            let mut base = slugify(&title);
            if base.is_empty() {
                base = "untitled".to_string();
            }
            let id = unique_id(&base, &taken);
            if id != base {
                debug!(title = %title, id = %id, "recipe slug collision resolved");
            }
            taken.insert(id.clone());
            by_id.insert(id.clone(), recipes.len());
            recipes.push(Recipe {
                id,
                title,
                ingredients_raw: record.ingredients_raw,
                instructions_raw: record.instructions_raw,
                cleaned_ingredients_raw: record.cleaned_ingredients_raw,
                image: record.image,
            });
        }
        Self { recipes, by_id }
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.by_id.get(id).map(|&idx| &self.recipes[idx])
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

fn unique_id(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut n = 2usize;
    loop {
        let suffix = format!("-{n}");
        let keep = MAX_ID_LEN.saturating_sub(suffix.len()).min(base.len());
        let candidate = format!("{}{}", base[..keep].trim_end_matches('-'), suffix);
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str) -> RecipeRecord {
        RecipeRecord {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn slugify_is_url_safe_and_bounded() {
        assert_eq!(
            slugify("Miso-Butter Roast Chicken With Acorn Squash Panzanella"),
            "miso-butter-roast-chicken-with-acorn-squash-panzanella"
        );
        assert_eq!(slugify("  Crème Brûlée!! "), "cr-me-br-l-e");
        let long = "word ".repeat(40);
        let slug = slugify(&long);
        assert!(slug.len() <= MAX_ID_LEN);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn colliding_titles_get_numeric_suffixes() {
        let store = RecipeStore::from_records(vec![
            record("Lentil Burgers"),
            record("Lentil burgers!"),
            record("lentil-burgers"),
        ]);
        let ids: Vec<&str> = store.recipes().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["lentil-burgers", "lentil-burgers-2", "lentil-burgers-3"]);
        assert_eq!(store.get("lentil-burgers-2").unwrap().title, "Lentil burgers!");
    }

    #[test]
    fn suffixed_ids_stay_within_bound() {
        let title = "a".repeat(120);
        let store = RecipeStore::from_records(vec![record(&title), record(&title)]);
        assert_eq!(store.recipes()[0].id.len(), MAX_ID_LEN);
        assert_eq!(store.recipes()[1].id.len(), MAX_ID_LEN);
        assert!(store.recipes()[1].id.ends_with("-2"));
    }

    #[test]
    fn blank_titles_become_untitled() {
        let store = RecipeStore::from_records(vec![record(""), record("???")]);
        assert_eq!(store.recipes()[0].title, "Untitled");
        assert_eq!(store.recipes()[0].id, "untitled");
        assert_eq!(store.recipes()[1].id, "untitled-2");
    }
}

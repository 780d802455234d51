//! Recipe Resolver: ingredient search, id-or-title lookup, diet keyword
//! filters and the nutrient-threshold join against the catalog.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::{first_decimal, resolve_nutrient_key};
use crate::catalog::CatalogStore;
use crate::recipes::{Recipe, RecipeStore};
use crate::text::tokens;

/// Per-100g value a matched product must reach for a "high" nutrient filter.
pub const DEFAULT_NUTRIENT_THRESHOLD: f64 = 10.0;

/// Dietary preference understood by [`RecipeResolver::filter_recipes_by_diet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diet {
    Vegan,
    Vegetarian,
    Pescatarian,
    Meat,
}

impl Diet {
    /// Case-insensitive parse; None for anything unrecognized.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "vegan" => Some(Diet::Vegan),
            "vegetarian" => Some(Diet::Vegetarian),
            "pescatarian" => Some(Diet::Pescatarian),
            "meat" => Some(Diet::Meat),
            _ => None,
        }
    }

    /// A recipe belongs to the diet when its title or ingredients contain any
    /// of these.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Diet::Vegan => &["vegan", "plant-based"],
            Diet::Vegetarian => &["vegetarian", "ovo-lacto", "meat-free"],
            Diet::Pescatarian => &["fish", "pescatarian", "salmon", "cod", "shrimp"],
            Diet::Meat => &["chicken", "beef", "pork", "meat"],
        }
    }
}

impl fmt::Display for Diet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diet::Vegan => write!(f, "vegan"),
            Diet::Vegetarian => write!(f, "vegetarian"),
            Diet::Pescatarian => write!(f, "pescatarian"),
            Diet::Meat => write!(f, "meat"),
        }
    }
}

/// Id and title of a listed recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeSummary {
    pub id: String,
    pub title: String,
}

pub struct RecipeResolver<'a> {
    recipes: &'a RecipeStore,
    catalog: &'a CatalogStore,
}

impl<'a> RecipeResolver<'a> {
    pub fn new(recipes: &'a RecipeStore, catalog: &'a CatalogStore) -> Self {
        Self { recipes, catalog }
    }

    /// Recipes whose ingredients, cleaned ingredients or title contain
    /// `ingredient` (case-insensitive), deduplicated by id in store order and
    /// capped at `limit`.
    pub fn list_recipes_by_ingredient(&self, ingredient: &str, limit: usize) -> Vec<RecipeSummary> {
        let key = ingredient.trim().to_lowercase();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for recipe in self.recipes.recipes() {
            if out.len() >= limit {
                break;
            }
            let hit = recipe.ingredients_raw.to_lowercase().contains(&key)
                || recipe
                    .cleaned_ingredients_raw
                    .as_deref()
                    .is_some_and(|c| c.to_lowercase().contains(&key))
                || recipe.title.to_lowercase().contains(&key);
            if hit && seen.insert(recipe.id.as_str()) {
                out.push(RecipeSummary {
                    id: recipe.id.clone(),
                    title: recipe.title.clone(),
                });
            }
        }
        out
    }

    /// Exact id lookup.
    pub fn find_recipe_by_id(&self, id: &str) -> Option<&'a Recipe> {
        self.recipes.get(id.trim())
    }

    /// Exact id match first; otherwise the title with the best score
    /// `3·[query ⊂ title] + |tokens(query) ∩ tokens(title)|`, first seen
    /// winning ties. None for a blank query or when every score is zero.
    pub fn find_recipe_by_id_or_title(&self, query: &str) -> Option<&'a Recipe> {
        if let Some(recipe) = self.find_recipe_by_id(query) {
            return Some(recipe);
        }
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return None;
        }
        let query_tokens = tokens(&q);

        let mut best = None;
        let mut best_score = 0;
        for recipe in self.recipes.recipes() {
            let title = recipe.title.to_lowercase();
            let mut score = 0;
            if title.contains(&q) {
                score += 3;
            }
            score += query_tokens.intersection(&tokens(&title)).count();
            if score > best_score {
                best_score = score;
                best = Some(recipe);
            }
        }
        if let Some(r) = best {
            debug!(query = %q, id = %r.id, score = best_score, "recipe title match");
        }
        best
    }

    /// Recipes whose title or raw ingredients mention one of the diet's
    /// keywords. An unrecognized diet yields nothing.
    pub fn filter_recipes_by_diet(&self, diet: &str) -> Vec<&'a Recipe> {
        let Some(diet) = Diet::parse(diet) else {
            debug!(diet, "unrecognized diet");
            return Vec::new();
        };
        let keywords = diet.keywords();
        self.recipes
            .recipes()
            .iter()
            .filter(|r| {
                let title = r.title.to_lowercase();
                let ingredients = r.ingredients_raw.to_lowercase();
                keywords
                    .iter()
                    .any(|kw| title.contains(kw) || ingredients.contains(kw))
            })
            .collect()
    }

    /// Keep recipes mentioning some catalog product whose `nutrient` value is
    /// at least `threshold`. Products are tried in store order and the first
    /// qualifying one keeps the recipe; values without a number are skipped.
    pub fn filter_high_nutrient_recipes(
        &self,
        recipes: Vec<&'a Recipe>,
        nutrient: &str,
        threshold: f64,
    ) -> Vec<&'a Recipe> {
        recipes
            .into_iter()
            .filter(|recipe| self.has_product_reaching(recipe, nutrient, threshold))
            .collect()
    }

    fn has_product_reaching(&self, recipe: &Recipe, nutrient: &str, threshold: f64) -> bool {
        let ingredients = recipe
            .cleaned_ingredients_raw
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(recipe.ingredients_raw.as_str())
            .to_lowercase();

        for product in self.catalog.products() {
            if !ingredients.contains(&product.name.to_lowercase()) {
                continue;
            }
            let Some((key, raw)) = resolve_nutrient_key(&product.nutrition, nutrient) else {
                continue;
            };
            match first_decimal(raw) {
                Some(value) if value >= threshold => {
                    debug!(recipe = %recipe.id, product = %product.name, key, value, "nutrient threshold met");
                    return true;
                }
                Some(_) => {}
                None => debug!(product = %product.name, key, raw, "nutrient value not numeric"),
            }
        }
        false
    }
}

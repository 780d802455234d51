//! Answer Composer: dispatches a typed [`Intent`] to the resolvers and turns
//! the result into answer text. Every intent, including unknown ones, yields
//! a string; missing slots become prompts and misses become apologies.

pub mod detail;
pub mod intent;

use tracing::debug;

use crate::catalog::CatalogStore;
use crate::recipes::{Recipe, RecipeStore};
use crate::resolve::{ProductResolver, RecipeResolver, DEFAULT_NUTRIENT_THRESHOLD};
use crate::text::TermMap;

pub use detail::{IngredientLink, RecipeDetail};
pub use intent::{Intent, IntentKind, MealRequest, NutrientLevel};

/// Recipes listed per answer.
pub const RECIPE_LIST_LIMIT: usize = 5;

pub const UNKNOWN_ANSWER: &str = "I'm not sure how to help with that yet.";

pub struct AnswerComposer<'a> {
    products: ProductResolver<'a>,
    recipes: RecipeResolver<'a>,
}

impl<'a> AnswerComposer<'a> {
    pub fn new(catalog: &'a CatalogStore, recipes: &'a RecipeStore, terms: &'a TermMap) -> Self {
        Self {
            products: ProductResolver::new(catalog, terms),
            recipes: RecipeResolver::new(recipes, catalog),
        }
    }

    pub fn answer(&self, intent: &Intent) -> String {
        debug!(intent = %intent.kind(), "composing answer");
        match intent {
            Intent::ProductNutrient { product, nutrient } => {
                match (product.as_deref(), nutrient.as_deref()) {
                    (Some(product), Some(nutrient)) => {
                        self.products.get_nutrient(product, nutrient).message
                    }
                    _ => "Please specify a product and nutrient.".to_string(),
                }
            }
            Intent::PriceQuery { product } => match product.as_deref() {
                Some(product) => self.products.find_price(product),
                None => "Please specify a product name.".to_string(),
            },
            Intent::RecipeQuery { ingredient } => match ingredient.as_deref() {
                Some(ingredient) => self.recipe_list(ingredient),
                None => "Please specify an ingredient or type of meal (e.g., 'recipes with chicken')."
                    .to_string(),
            },
            Intent::RecipeDetail { recipe } => match recipe.as_deref() {
                Some(query) => match self.recipes.find_recipe_by_id_or_title(query) {
                    Some(recipe) => self.recipe_detail_payload(recipe).render(),
                    None => format!("Couldn't find a recipe matching '{query}'."),
                },
                None => "Tell me which recipe: 'show <title>' or 'show <id>'.".to_string(),
            },
            Intent::MealRecommendation(meal) => self.meal_recommendation(meal),
            Intent::Unknown => UNKNOWN_ANSWER.to_string(),
        }
    }

    pub fn recipe_detail_payload(&self, recipe: &Recipe) -> RecipeDetail {
        RecipeDetail::build(recipe, &self.products)
    }

    fn recipe_list(&self, ingredient: &str) -> String {
        let hits = self
            .recipes
            .list_recipes_by_ingredient(ingredient, RECIPE_LIST_LIMIT);
        if hits.is_empty() {
            return format!("Sorry, I couldn't find recipes with {ingredient}.");
        }
        let lines: Vec<String> = hits
            .iter()
            .enumerate()
            .map(|(i, hit)| format!("{}. {} (id: {})", i + 1, hit.title, hit.id))
            .collect();
        format!(
            "Here are some recipes with {ingredient}:\n{}\n\nAsk: 'show <title>' or 'show <id>' to see full details.",
            lines.join("\n")
        )
    }

    fn meal_recommendation(&self, meal: &MealRequest) -> String {
        let Some(diet) = meal.diet.as_deref() else {
            return "Please specify a dietary preference (e.g., vegan, vegetarian, pescatarian)."
                .to_string();
        };

        let mut recipes = self.recipes.filter_recipes_by_diet(diet);
        if let (Some(nutrient), Some(NutrientLevel::High)) = (meal.nutrient.as_deref(), meal.level) {
            recipes = self.recipes.filter_high_nutrient_recipes(
                recipes,
                nutrient,
                DEFAULT_NUTRIENT_THRESHOLD,
            );
        }
        if let Some(meal_type) = meal.meal_type.as_deref() {
            let meal_type = meal_type.to_lowercase();
            recipes.retain(|r| r.title.to_lowercase().contains(&meal_type));
        }

        if recipes.is_empty() {
            return format!("Sorry, I couldn't find any {diet} recipes.");
        }
        let heading = match meal.nutrient.as_deref() {
            Some(nutrient) => format!("Here are some {diet} recipes rich in {nutrient}:"),
            None => format!("Here are some {diet} recipes:"),
        };
        let lines: Vec<String> = recipes
            .iter()
            .take(RECIPE_LIST_LIMIT)
            .enumerate()
            .map(|(i, r)| format!("{}. {}", i + 1, r.title))
            .collect();
        format!("{heading}\n{}", lines.join("\n"))
    }
}

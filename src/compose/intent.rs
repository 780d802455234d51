//! Typed intents. The classifier hands back a loose `{intent, slots}` route;
//! [`Intent::from_route`] keeps only the slots each intent uses, trimming
//! values and treating blanks as missing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    ProductNutrient,
    PriceQuery,
    RecipeQuery,
    RecipeDetail,
    MealRecommendation,
    Unknown,
}

impl IntentKind {
    /// Unrecognized labels map to [`IntentKind::Unknown`].
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "product_nutrient" => IntentKind::ProductNutrient,
            "price_query" => IntentKind::PriceQuery,
            "recipe_query" => IntentKind::RecipeQuery,
            "recipe_detail" => IntentKind::RecipeDetail,
            "meal_recommendation" => IntentKind::MealRecommendation,
            _ => IntentKind::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IntentKind::ProductNutrient => "product_nutrient",
            IntentKind::PriceQuery => "price_query",
            IntentKind::RecipeQuery => "recipe_query",
            IntentKind::RecipeDetail => "recipe_detail",
            IntentKind::MealRecommendation => "meal_recommendation",
            IntentKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested nutrient level for meal recommendations. Only `High` filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NutrientLevel {
    High,
    Low,
}

impl NutrientLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "high" => Some(NutrientLevel::High),
            "low" => Some(NutrientLevel::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MealRequest {
    pub diet: Option<String>,
    pub nutrient: Option<String>,
    pub level: Option<NutrientLevel>,
    pub meal_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    ProductNutrient {
        product: Option<String>,
        nutrient: Option<String>,
    },
    PriceQuery {
        product: Option<String>,
    },
    RecipeQuery {
        ingredient: Option<String>,
    },
    /// `recipe` is a recipe id or (partial) title.
    RecipeDetail {
        recipe: Option<String>,
    },
    MealRecommendation(MealRequest),
    Unknown,
}

impl Intent {
    pub fn from_route(route: &Route) -> Self {
        let slot = |name: &str| {
            route
                .slots
                .get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        match IntentKind::parse(&route.intent) {
            IntentKind::ProductNutrient => Intent::ProductNutrient {
                product: slot("product"),
                nutrient: slot("nutrient"),
            },
            IntentKind::PriceQuery => Intent::PriceQuery {
                product: slot("product"),
            },
            IntentKind::RecipeQuery => Intent::RecipeQuery {
                ingredient: slot("ingredient"),
            },
            IntentKind::RecipeDetail => Intent::RecipeDetail {
                recipe: slot("recipe_title").or_else(|| slot("recipe_id")),
            },
            IntentKind::MealRecommendation => Intent::MealRecommendation(MealRequest {
                diet: slot("diet"),
                nutrient: slot("nutrient"),
                level: slot("level").as_deref().and_then(NutrientLevel::parse),
                meal_type: slot("meal_type"),
            }),
            IntentKind::Unknown => Intent::Unknown,
        }
    }

    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::ProductNutrient { .. } => IntentKind::ProductNutrient,
            Intent::PriceQuery { .. } => IntentKind::PriceQuery,
            Intent::RecipeQuery { .. } => IntentKind::RecipeQuery,
            Intent::RecipeDetail { .. } => IntentKind::RecipeDetail,
            Intent::MealRecommendation(_) => IntentKind::MealRecommendation,
            Intent::Unknown => IntentKind::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(intent: &str, slots: &[(&str, &str)]) -> Route {
        Route::new(
            intent,
            slots.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        )
    }

    #[test]
    fn keeps_only_relevant_slots() {
        let intent = Intent::from_route(&route(
            "product_nutrient",
            &[("product", " Tofu "), ("nutrient", "protein"), ("diet", "vegan")],
        ));
        assert_eq!(
            intent,
            Intent::ProductNutrient {
                product: Some("Tofu".into()),
                nutrient: Some("protein".into()),
            }
        );
    }

    #[test]
    fn blank_slots_are_missing() {
        let intent = Intent::from_route(&route("price_query", &[("product", "  ")]));
        assert_eq!(intent, Intent::PriceQuery { product: None });
    }

    #[test]
    fn recipe_title_preferred_over_id() {
        let both = route("recipe_detail", &[("recipe_id", "dal"), ("recipe_title", "Lentil Burgers")]);
        assert_eq!(
            Intent::from_route(&both),
            Intent::RecipeDetail {
                recipe: Some("Lentil Burgers".into())
            }
        );
        let id_only = route("recipe_detail", &[("recipe_id", "dal")]);
        assert_eq!(
            Intent::from_route(&id_only),
            Intent::RecipeDetail {
                recipe: Some("dal".into())
            }
        );
    }

    #[test]
    fn meal_level_is_typed() {
        let intent = Intent::from_route(&route(
            "meal_recommendation",
            &[("diet", "vegan"), ("nutrient", "protein"), ("level", "HIGH")],
        ));
        let Intent::MealRecommendation(meal) = intent else {
            panic!("expected meal recommendation");
        };
        assert_eq!(meal.level, Some(NutrientLevel::High));
        assert_eq!(meal.meal_type, None);
    }

    #[test]
    fn unrecognized_labels_are_unknown() {
        assert_eq!(Intent::from_route(&route("weather", &[])), Intent::Unknown);
        assert_eq!(IntentKind::parse(" Recipe_Query "), IntentKind::RecipeQuery);
        assert_eq!(IntentKind::MealRecommendation.to_string(), "meal_recommendation");
    }
}

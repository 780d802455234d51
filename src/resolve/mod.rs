//! Resolvers map text queries onto catalog products and recipes.
//!
//! Lookups deliberately differ in semantics: substring lookups return the
//! first hit in store order, scored lookups return the highest score with
//! ties going to the first one seen.

pub mod product;
pub mod recipe;

use std::sync::LazyLock;

use regex::Regex;

pub use product::{resolve_nutrient_key, score_product, NutrientLookup, ProductResolver};
pub use recipe::{Diet, RecipeResolver, RecipeSummary, DEFAULT_NUTRIENT_THRESHOLD};

static DECIMAL_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").unwrap());

/// First number in a free-text nutrient value (`"18,5 g"` → 18.5).
/// None when the text holds no digits.
pub fn first_decimal(text: &str) -> Option<f64> {
    let m = DECIMAL_RUN.find(text)?;
    m.as_str().replace(',', ".").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_number() {
        assert_eq!(first_decimal("18"), Some(18.0));
        assert_eq!(first_decimal("18,5 g"), Some(18.5));
        assert_eq!(first_decimal("ca 2.25g / 100 g"), Some(2.25));
        assert_eq!(first_decimal("<0.5"), Some(0.5));
    }

    #[test]
    fn no_digits_is_none() {
        assert_eq!(first_decimal("spår"), None);
        assert_eq!(first_decimal(""), None);
    }
}

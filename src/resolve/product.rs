//! Product Resolver: name lookups over the Catalog Store for nutrient and
//! price questions, and best-match scoring for ingredient → product links.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::catalog::{CatalogStore, Product};
use crate::text::{normalize, TermMap};

/// Requested nutrient name → canonical key, plus words that identify the
/// nutrient in heterogeneous source headers (Swedish store exports included).
struct NutrientAlias {
    names: &'static [&'static str],
    key: &'static str,
    hints: &'static [&'static str],
}

const NUTRIENT_ALIASES: &[NutrientAlias] = &[
    NutrientAlias {
        names: &["protein"],
        key: "protein_g",
        hints: &["protein"],
    },
    NutrientAlias {
        names: &["fat"],
        key: "fat_g",
        hints: &["fat", "fett"],
    },
    NutrientAlias {
        names: &["carbs", "carbohydrates"],
        key: "carbs_g",
        hints: &["carb", "kolhydrat"],
    },
    NutrientAlias {
        names: &["sugar", "sugars"],
        key: "sugars_g",
        hints: &["sugar", "socker"],
    },
    NutrientAlias {
        names: &["energy", "calories"],
        key: "energy_kcal",
        hints: &["energy", "energi", "kcal"],
    },
];

/// Find the nutrition entry for `nutrient`: the aliased key, then the literal
/// `snake_case` key, then the first key containing one of the nutrient's
/// hint words. Returns `(key, value)`.
pub fn resolve_nutrient_key<'p>(
    nutrition: &'p BTreeMap<String, String>,
    nutrient: &str,
) -> Option<(&'p str, &'p str)> {
    let requested = nutrient.trim().to_lowercase();
    if requested.is_empty() {
        return None;
    }
    let literal = requested.replace(' ', "_");
    let alias = NUTRIENT_ALIASES
        .iter()
        .find(|a| a.names.contains(&literal.as_str()));

    let exact = |key: &str| {
        nutrition
            .get_key_value(key)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    };
    if let Some(hit) = alias.and_then(|a| exact(a.key)).or_else(|| exact(&literal)) {
        return Some(hit);
    }

    let hints: Vec<&str> = match alias {
        Some(a) => a.hints.to_vec(),
        None => vec![requested.as_str()],
    };
    nutrition
        .iter()
        .find(|(k, _)| hints.iter().any(|h| k.contains(h)))
        .map(|(k, v)| (k.as_str(), v.as_str()))
}

/// Score `product` against an already-normalized search key: 3 when the key
/// is a substring of the normalized name, plus one per shared token.
pub fn score_product(query_key: &str, product: &Product) -> usize {
    let q = query_key.trim().to_lowercase();
    let name = normalize(&product.name);
    let mut score = 0;
    if !q.is_empty() && name.contains(&q) {
        score += 3;
    }
    let query_tokens: HashSet<&str> = q.split_whitespace().collect();
    let name_tokens: HashSet<&str> = name.split_whitespace().collect();
    score + query_tokens.intersection(&name_tokens).count()
}

/// Outcome of a nutrient lookup. `message` is always user-presentable.
#[derive(Debug, Clone, PartialEq)]
pub struct NutrientLookup {
    pub value: Option<String>,
    pub message: String,
}

impl NutrientLookup {
    fn missing(message: String) -> Self {
        Self {
            value: None,
            message,
        }
    }
}

pub struct ProductResolver<'a> {
    catalog: &'a CatalogStore,
    terms: &'a TermMap,
}

impl<'a> ProductResolver<'a> {
    pub fn new(catalog: &'a CatalogStore, terms: &'a TermMap) -> Self {
        Self { catalog, terms }
    }

    /// First product, in store-merge order, whose name contains `query`
    /// case-insensitively.
    pub fn find_product_by_substring(&self, query: &str) -> Option<&'a Product> {
        let q = query.trim().to_lowercase();
        self.catalog
            .products()
            .iter()
            .find(|p| p.name.to_lowercase().contains(&q))
    }

    /// Highest-scoring product for `query_key`; first seen wins ties. None
    /// when nothing scores above zero.
    pub fn find_best_product(&self, query_key: &str) -> Option<&'a Product> {
        let mut best = None;
        let mut best_score = 0;
        for product in self.catalog.products() {
            let score = score_product(query_key, product);
            if score > best_score {
                best_score = score;
                best = Some(product);
            }
        }
        if let Some(p) = best {
            debug!(key = query_key, product = %p.name, score = best_score, "best product");
        }
        best
    }

    pub fn get_nutrient(&self, product_name: &str, nutrient_name: &str) -> NutrientLookup {
        let Some(product) = self.find_product_by_substring(product_name) else {
            return NutrientLookup::missing(format!("Sorry, I couldn't find {product_name}."));
        };
        match resolve_nutrient_key(&product.nutrition, nutrient_name) {
            Some((_, value)) => NutrientLookup {
                value: Some(value.to_string()),
                message: format!(
                    "{} in {}: {} per 100 g.",
                    capitalize(nutrient_name.trim()),
                    product.name,
                    value
                ),
            },
            None => NutrientLookup::missing(format!(
                "Sorry, I couldn't find {} info for {}.",
                nutrient_name.trim(),
                product.name
            )),
        }
    }

    /// Price sentence for `product_name`, translating common English food
    /// words to the market term first. Never fails.
    pub fn find_price(&self, product_name: &str) -> String {
        let term = self.terms.translate(product_name);
        match self.find_product_by_substring(&term) {
            Some(p) => match &p.price {
                Some(price) => format!("{} costs {} ({})", p.name, price, p.store),
                None => format!("{} has no listed price ({})", p.name, p.store),
            },
            None => format!("Sorry, I couldn't find price for {product_name}."),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

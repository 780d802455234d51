//! Catalog Store: grocery products merged from every store's source files.
//! Built once at startup, read-only afterwards.

pub mod loader;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Grocery chain a product was scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Store {
    #[serde(rename = "Hemköp")]
    Hemkop,
    #[serde(rename = "ICA")]
    Ica,
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Store::Hemkop => write!(f, "Hemköp"),
            Store::Ica => write!(f, "ICA"),
        }
    }
}

/// One product with per-100g nutrition. Nutrient keys are free-form lowercase
/// strings (`protein_g`, `energi (kcal)`, ...) because sources disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub store: Store,
    pub price: Option<String>,
    pub url: Option<String>,
    pub nutrition: BTreeMap<String, String>,
}

impl Product {
    pub fn new(name: impl Into<String>, store: Store) -> Self {
        Self {
            name: name.into(),
            store,
            price: None,
            url: None,
            nutrition: BTreeMap::new(),
        }
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_nutrient(mut self, key: &str, value: impl Into<String>) -> Self {
        self.nutrition.insert(key.to_lowercase(), value.into());
        self
    }
}

/// Products in store-merge order. Order matters: substring lookups return the
/// first hit and scored lookups break ties by first-seen.
#[derive(Debug, Default)]
pub struct CatalogStore {
    products: Vec<Product>,
}

impl CatalogStore {
    /// Build from already-normalized products, dropping any with a blank name.
    pub fn from_products(products: Vec<Product>) -> Self {
        Self {
            products: products
                .into_iter()
                .filter(|p| !p.name.trim().is_empty())
                .collect(),
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn count_by_store(&self, store: Store) -> usize {
        self.products.iter().filter(|p| p.store == store).count()
    }
}

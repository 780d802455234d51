//! Recipe ingestion from the recipes CSV
//! (`Title, Ingredients, Instructions, Image_Name, Cleaned_Ingredients`).

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use super::{RecipeRecord, RecipeStore};
use crate::error::LoadError;

#[derive(Debug, Deserialize)]
struct CsvRecipe {
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Ingredients", default)]
    ingredients: String,
    #[serde(rename = "Instructions", default)]
    instructions: String,
    #[serde(rename = "Image_Name", default)]
    image: Option<String>,
    #[serde(rename = "Cleaned_Ingredients", default)]
    cleaned_ingredients: Option<String>,
}

/// Load the recipe store. A missing or unreadable file gives an empty store.
pub fn load_recipes(path: &Path) -> RecipeStore {
    let records = match read_records(path) {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "recipes unavailable, continuing with none");
            Vec::new()
        }
    };
    let store = RecipeStore::from_records(records);
    info!(count = store.len(), path = %path.display(), "recipes loaded");
    store
}

fn read_records(path: &Path) -> Result<Vec<RecipeRecord>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let mut records = Vec::new();
    for (row_idx, row) in reader.deserialize::<CsvRecipe>().enumerate() {
        match row {
            Ok(row) => records.push(RecipeRecord {
                title: row.title,
                ingredients_raw: row.ingredients,
                instructions_raw: row.instructions,
                cleaned_ingredients_raw: non_blank(row.cleaned_ingredients),
                image: non_blank(row.image),
            }),
            Err(e) => {
                warn!(path = %path.display(), row = row_idx + 1, error = %e, "skipping recipe row");
            }
        }
    }
    Ok(records)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty() && !v.trim().eq_ignore_ascii_case("nan"))
}

//! Catalog ingestion. Reads every product source file in the data directory,
//! normalizes records into [`Product`], and skips (with a warning) anything
//! missing or malformed. Never aborts startup.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{CatalogStore, Product, Store};
use crate::error::LoadError;

/// Header words that mark an ICA CSV column as a nutrient column.
const ICA_NUTRIENT_WORDS: &[&str] = &["energi", "fett", "protein", "salt", "kolhydrat", "fiber"];

/// Product object as found in the scraped JSON files. Older exports used
/// `name` / `per_100g` instead of `title` / `nutrition`; when both appear the
/// newer field wins.
#[derive(Debug, Deserialize)]
struct JsonProduct {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    price: Option<Value>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    nutrition: Option<Map<String, Value>>,
    #[serde(default)]
    per_100g: Option<Map<String, Value>>,
}

/// Load and merge all product sources in `dir`: Hemköp JSON first, then ICA
/// CSV, then ICA JSON, each group in file-name order.
pub fn load_catalog(dir: &Path) -> CatalogStore {
    let mut products = Vec::new();

    for path in source_files(dir, "hemkop_", "json") {
        collect(&mut products, &path, load_json_file(&path, Store::Hemkop));
    }
    for path in source_files(dir, "ica_", "csv") {
        collect(&mut products, &path, load_ica_csv(&path));
    }
    for path in source_files(dir, "ica_", "json") {
        collect(&mut products, &path, load_json_file(&path, Store::Ica));
    }

    let store = CatalogStore::from_products(products);
    info!(
        total = store.len(),
        hemkop = store.count_by_store(Store::Hemkop),
        ica = store.count_by_store(Store::Ica),
        dir = %dir.display(),
        "catalog loaded"
    );
    store
}

fn collect(into: &mut Vec<Product>, path: &Path, result: Result<Vec<Product>, LoadError>) {
    match result {
        Ok(mut batch) => {
            debug!(path = %path.display(), count = batch.len(), "product file loaded");
            into.append(&mut batch);
        }
        Err(e) => warn!(error = %e, "skipping product file"),
    }
}

/// Files in `dir` named `<prefix>*.<ext>`, sorted by name. A missing or
/// unreadable directory yields nothing.
pub(crate) fn source_files(dir: &Path, prefix: &str, ext: &str) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "product data directory unreadable");
            return Vec::new();
        }
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            let name_ok = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix));
            let ext_ok = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(ext));
            name_ok && ext_ok && path.is_file()
        })
        .collect();
    files.sort();
    files
}

/// A JSON array of product objects. Individual malformed items are skipped.
fn load_json_file(path: &Path, store: Store) -> Result<Vec<Product>, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let items: Vec<Value> = serde_json::from_str(&content).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let mut products = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        let raw: JsonProduct = match serde_json::from_value(item) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %path.display(), idx, error = %e, "skipping malformed product");
                continue;
            }
        };
        let title = raw.title.as_deref().and_then(clean_text);
        let Some(name) = title.or_else(|| raw.name.as_deref().and_then(clean_text)) else {
            continue;
        };
        let mut product = Product::new(name, store);
        product.price = raw.price.and_then(value_text);
        product.url = raw.url.as_deref().and_then(clean_text);
        let nutrition = raw.nutrition.or(raw.per_100g).unwrap_or_default();
        for (key, value) in nutrition {
            if let Some(text) = value_text(value) {
                product.nutrition.insert(key.trim().to_lowercase(), text);
            }
        }
        products.push(product);
    }
    Ok(products)
}

/// ICA category CSV: `Name`, `Price`, `url`, `Size` plus nutrient columns.
fn load_ica_csv(path: &Path) -> Result<Vec<Product>, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?.clone();

    let column = |wanted: &str| headers.iter().position(|h| h.trim() == wanted);
    let name_col = column("Name");
    let price_col = column("Price");
    let url_col = column("url");
    let nutrient_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, header)| {
            let key = header.trim().to_lowercase();
            ICA_NUTRIENT_WORDS
                .iter()
                .any(|w| key.contains(w))
                .then_some((idx, key))
        })
        .collect();

    let mut products = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!(path = %path.display(), row = row_idx + 1, error = %e, "skipping CSV row");
                continue;
            }
        };
        let field = |col: Option<usize>| col.and_then(|c| record.get(c)).and_then(clean_text);
        let Some(name) = field(name_col) else {
            continue;
        };
        let mut product = Product::new(name, Store::Ica);
        product.price = field(price_col);
        product.url = field(url_col);
        for (idx, key) in &nutrient_cols {
            if let Some(value) = record.get(*idx).and_then(clean_text) {
                product.nutrition.insert(key.clone(), value);
            }
        }
        products.push(product);
    }
    Ok(products)
}

/// Trimmed text, or None for blanks and pandas' `nan` placeholder.
fn clean_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => clean_text(&s),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) {
        fs::write(dir.path().join(name), body).unwrap();
    }

    #[test]
    fn merges_sources_in_store_order() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "ica_meat.csv",
            "Name,Price,Size,url,Energi (kcal),Protein,Fett\n\
             Kycklingfilé,89.90 kr,900g,https://ica.se/1,110,23,1.5\n\
             ,10 kr,1,https://ica.se/2,1,1,1\n",
        );
        write(
            &dir,
            "hemkop_bird.json",
            r#"[{"title": "Kycklingkebab Fryst", "price": 49.5, "url": "https://hemkop.se/k",
                 "nutrition": {"Protein_g": "18", "fat_g": 7, "salt_g": null}}]"#,
        );
        write(
            &dir,
            "ica_fish.json",
            r#"[{"title": "Laxfilé", "price": "119", "nutrition": {"protein": "20 g"}}]"#,
        );
        write(&dir, "notes.txt", "ignored");

        let catalog = load_catalog(dir.path());
        let names: Vec<&str> = catalog.products().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Kycklingkebab Fryst", "Kycklingfilé", "Laxfilé"]);

        let kebab = &catalog.products()[0];
        assert_eq!(kebab.store, Store::Hemkop);
        assert_eq!(kebab.price.as_deref(), Some("49.5"));
        assert_eq!(kebab.nutrition.get("protein_g").map(String::as_str), Some("18"));
        assert_eq!(kebab.nutrition.get("fat_g").map(String::as_str), Some("7"));
        assert!(!kebab.nutrition.contains_key("salt_g"));

        let filet = &catalog.products()[1];
        assert_eq!(filet.store, Store::Ica);
        assert_eq!(filet.url.as_deref(), Some("https://ica.se/1"));
        assert_eq!(filet.nutrition.get("energi (kcal)").map(String::as_str), Some("110"));
        assert_eq!(filet.nutrition.get("protein").map(String::as_str), Some("23"));
        assert!(!filet.nutrition.contains_key("size"));
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "hemkop_old.json",
            r#"[{"name": "Tofu Naturell", "per_100g": {"protein_g": 12}}]"#,
        );
        let catalog = load_catalog(dir.path());
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.products()[0].nutrition.get("protein_g").map(String::as_str),
            Some("12")
        );
    }

    #[test]
    fn nan_placeholders_are_dropped() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "ica_meat.json",
            r#"[{"title": "nan", "price": "nan", "url": "nan"},
                {"title": "Lax", "price": "99", "url": "NaN", "nutrition": {"protein": "nan"}}]"#,
        );
        let catalog = load_catalog(dir.path());
        assert_eq!(catalog.len(), 1);
        let lax = &catalog.products()[0];
        assert_eq!(lax.name, "Lax");
        assert_eq!(lax.price.as_deref(), Some("99"));
        assert_eq!(lax.url, None);
        assert!(lax.nutrition.is_empty());
    }

    #[test]
    fn title_and_name_together_prefer_title() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "hemkop_x.json",
            r#"[{"title": "Lax Filé", "name": "Lax", "price": "99",
                 "nutrition": {"protein_g": "20"}, "per_100g": {"protein_g": "1"}},
                {"title": "nan", "name": "Tofu Naturell"}]"#,
        );
        let catalog = load_catalog(dir.path());
        let names: Vec<&str> = catalog.products().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Lax Filé", "Tofu Naturell"]);
        assert_eq!(
            catalog.products()[0].nutrition.get("protein_g").map(String::as_str),
            Some("20")
        );
    }

    #[test]
    fn malformed_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        write(&dir, "hemkop_broken.json", "{ not json");
        write(
            &dir,
            "hemkop_ok.json",
            r#"[{"title": "Ris"}, {"title": 42}, {"price": "10"}]"#,
        );
        let catalog = load_catalog(dir.path());
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.products()[0].name, "Ris");
    }

    #[test]
    fn missing_directory_gives_empty_catalog() {
        let catalog = load_catalog(Path::new("/definitely/not/here"));
        assert!(catalog.is_empty());
    }
}

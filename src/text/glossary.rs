//! English food words mapped to the terms used by Swedish grocery catalogs.
//! Built-in pairs can be extended from a JSON file; lookups are whole-term.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GlossaryError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub source: String,
    pub target: String,
}

/// On-disk glossary file format.
#[derive(Debug, Deserialize)]
struct GlossaryFile {
    version: u32,
    entries: Vec<GlossaryEntry>,
}

const BUILTIN: &[(&str, &str)] = &[
    ("salmon", "lax"),
    ("chicken", "kyckling"),
    ("pork", "fläsk"),
    ("beef", "nöt"),
    ("rice", "ris"),
    ("bread", "bröd"),
    ("apple", "äpple"),
    ("tofu", "tofu"),
];

/// Term map; `version` comes from the glossary file (0 for the built-ins).
#[derive(Debug, Clone)]
pub struct TermMap {
    version: u32,
    terms: HashMap<String, String>,
}

impl Default for TermMap {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TermMap {
    /// The built-in English → Swedish pairs.
    pub fn builtin() -> Self {
        Self {
            version: 0,
            terms: BUILTIN
                .iter()
                .map(|(s, t)| (s.to_string(), t.to_string()))
                .collect(),
        }
    }

    /// Built-in pairs extended (and overridden) by the entries of a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self, GlossaryError> {
        let content = std::fs::read_to_string(path)?;
        let file: GlossaryFile = serde_json::from_str(&content)?;
        let mut map = Self::builtin();
        map.version = file.version;
        for entry in file.entries {
            let source = entry.source.trim().to_lowercase();
            if source.is_empty() {
                continue;
            }
            map.terms.insert(source, entry.target.trim().to_lowercase());
        }
        Ok(map)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Lowercased market term for `term`, or `term` lowercased when unmapped.
    pub fn translate(&self, term: &str) -> String {
        let key = term.trim().to_lowercase();
        match self.terms.get(&key) {
            Some(target) => target.clone(),
            None => key,
        }
    }
}

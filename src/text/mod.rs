//! Shared text handling: normalization for matching and the bilingual term map.

pub mod glossary;
pub mod normalize;

pub use glossary::{GlossaryEntry, TermMap};
pub use normalize::{key_from_phrase, normalize, tokens};

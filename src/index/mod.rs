//! The shared on-disk data model (spec.md §3) used by the builder, merger,
//! and evaluator alike.
//!
//! Organized the way the teacher splits writer/reader concerns into their
//! own submodules (`io::writer`, `io::reader`): [`artifact`] owns the five
//! on-disk files' read/write logic, [`heap`] owns the bounded top-k posting
//! retention the §9 redesign flag mandates, and this module owns the plain
//! data types everything else is built from.
pub mod artifact;
pub mod heap;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Upper bound on postings retained per term (spec.md §3, §4.C).
pub const MAX_POSTINGS_PER_TERM: usize = 10_000;

/// Length, in characters, of the metadata snippet (spec.md §3).
pub const SNIPPET_LENGTH: usize = 300;

/// `(doc_id, weight)` pair stored in a term's posting list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: String,
    pub weight: f64,
}

impl Posting {
    pub fn new(doc_id: impl Into<String>, weight: f64) -> Self {
        Self {
            doc_id: doc_id.into(),
            weight,
        }
    }
}

/// Sorted-by-weight-descending posting lists, keyed by term.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct InvertedIndex(pub HashMap<String, Vec<Posting>>);

impl InvertedIndex {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn term_count(&self) -> usize {
        self.0.len()
    }

    pub fn postings(&self, term: &str) -> Option<&[Posting]> {
        self.0.get(term).map(Vec::as_slice)
    }
}

/// Term → IDF value.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct IdfTable(pub HashMap<String, f64>);

/// Document id → Euclidean norm of its TF-IDF vector.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DocNorms(pub HashMap<String, f64>);

/// Per-document display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub lang: String,
}

/// Document id → [`DocumentMeta`].
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DocMetadata(pub HashMap<String, DocumentMeta>);

/// Build/merge statistics (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildStats {
    pub total_documents: usize,
    pub vocabulary_size: usize,
    pub build_time_seconds: f64,
    pub languages: Vec<String>,
    pub max_postings_per_term: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_docs_limit: Option<usize>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub resumed_from_phase3: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Builds the merged document identifier `"{lang}_{id}"` (spec.md §3).
pub fn merged_doc_id(lang: &str, id: &str) -> String {
    format!("{}_{}", lang, id)
}

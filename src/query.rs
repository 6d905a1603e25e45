//! Query evaluator (component E), spec.md §4.E.
//!
//! The evaluator owns exactly one language's artifacts in memory at a time
//! and is shared between a single writer (the thing calling `load`/`unload`)
//! and many concurrent readers (`search`), mirroring the teacher's
//! `Arc<Mutex<_>>` sharing of long-lived pipeline state across rayon
//! workers. Unlike the teacher, the shared state here also carries an
//! explicit load-state machine (spec.md §9 redesign flag) instead of a bare
//! `Option`, so a reader can tell "nothing loaded" apart from "a load is in
//! progress" instead of just seeing `None` either way.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::Error;
use crate::index::artifact;
use crate::index::{BuildStats, DocMetadata, DocNorms, DocumentMeta, IdfTable, InvertedIndex};
use crate::lang::LanguageProfiles;
use crate::preprocess::preprocess_for;

/// One scored search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub doc_id: String,
    pub score: f64,
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Explicit load-state machine replacing a bare `Option<Loaded>` (spec.md
/// §9 redesign flag): a reader observing `Loading` knows a swap is
/// in-flight rather than mistaking it for `Unloaded`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LoadState {
    Unloaded,
    Loading,
    Loaded(String),
}

struct Loaded {
    inverted: InvertedIndex,
    idf: IdfTable,
    norms: DocNorms,
    metadata: DocMetadata,
    stats: Option<BuildStats>,
}

struct Inner {
    state: LoadState,
    data: Option<Loaded>,
}

/// Loads one language's index artifacts and answers ranked queries against
/// them. Safe to clone cheaply (an `Arc` around the shared state) and share
/// across threads; `load`/`unload` take the single writer lock, `search`
/// and the other read-only accessors take the same lock only to clone out
/// what they need, matching spec.md §4.E's single-writer/multi-reader
/// discipline.
#[derive(Clone)]
pub struct Evaluator {
    index_root: std::path::PathBuf,
    profiles: Arc<LanguageProfiles>,
    inner: Arc<Mutex<Inner>>,
}

impl Evaluator {
    pub fn new(index_root: std::path::PathBuf) -> Self {
        Self {
            index_root,
            profiles: Arc::new(LanguageProfiles::new()),
            inner: Arc::new(Mutex::new(Inner {
                state: LoadState::Unloaded,
                data: None,
            })),
        }
    }

    /// Languages with a complete on-disk artifact set, regardless of
    /// whether any is currently loaded.
    pub fn available_languages(&self) -> Vec<String> {
        crate::lang::SUPPORTED_LANGUAGES
            .iter()
            .chain(std::iter::once(&"merged"))
            .filter(|lang| artifact::exists(&self.index_root, lang))
            .map(|s| s.to_string())
            .collect()
    }

    /// Loads `language`'s artifacts into memory, replacing whatever was
    /// previously loaded. Readers calling `search` while a load is
    /// in-flight see `Error::Custom` ("index not loaded") rather than a
    /// half-swapped index (spec.md §4.E).
    pub fn load(&self, language: &str) -> Result<(), Error> {
        {
            let mut guard = self.inner.lock().expect("evaluator lock poisoned");
            guard.state = LoadState::Loading;
        }

        let inverted = artifact::read_inverted_index(&self.index_root, language)?;
        let idf = artifact::read_idf(&self.index_root, language)?;
        let norms = artifact::read_doc_norms(&self.index_root, language)?;
        let metadata = artifact::read_metadata(&self.index_root, language)?;
        let stats = artifact::read_stats(&self.index_root, language)?;

        let mut guard = self.inner.lock().expect("evaluator lock poisoned");
        guard.data = Some(Loaded {
            inverted,
            idf,
            norms,
            metadata,
            stats,
        });
        guard.state = LoadState::Loaded(language.to_string());
        info!("loaded index for '{}'", language);
        Ok(())
    }

    /// Drops the currently loaded index, freeing its memory.
    pub fn unload(&self) {
        let mut guard = self.inner.lock().expect("evaluator lock poisoned");
        guard.data = None;
        guard.state = LoadState::Unloaded;
    }

    fn with_loaded<T>(&self, f: impl FnOnce(&Loaded) -> T) -> Result<T, Error> {
        let guard = self.inner.lock().expect("evaluator lock poisoned");
        match (&guard.state, &guard.data) {
            (LoadState::Loaded(_), Some(loaded)) => Ok(f(loaded)),
            _ => Err(Error::Custom("index not loaded".to_string())),
        }
    }

    /// Ranks documents for `query` by cosine similarity against the
    /// currently loaded index and returns the top `k` (spec.md §4.E, §3
    /// invariant 6).
    pub fn search(&self, query: &str, language: &str, k: usize) -> Result<Vec<SearchResult>, Error> {
        let terms = preprocess_for(query, language, &self.profiles);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        self.with_loaded(|loaded| {
            let mut term_counts: HashMap<&str, usize> = HashMap::new();
            for t in &terms {
                *term_counts.entry(t.as_str()).or_insert(0) += 1;
            }
            let n_tokens = terms.len() as f64;

            // query TF-IDF vector, then its norm
            let mut query_vector: HashMap<&str, f64> = HashMap::new();
            let mut query_norm_sq = 0.0f64;
            for (term, count) in &term_counts {
                if let Some(&idf_t) = loaded.idf.0.get(*term) {
                    let w = (*count as f64 / n_tokens) * idf_t;
                    query_norm_sq += w * w;
                    query_vector.insert(term, w);
                }
            }
            let query_norm = query_norm_sq.sqrt();
            if query_norm == 0.0 {
                return Vec::new();
            }

            let mut scores: HashMap<&str, f64> = HashMap::new();
            for (term, &q_weight) in &query_vector {
                let Some(postings) = loaded.inverted.postings(term) else {
                    continue;
                };
                for posting in postings {
                    *scores.entry(posting.doc_id.as_str()).or_insert(0.0) += q_weight * posting.weight;
                }
            }

            let mut ranked: Vec<(&str, f64)> = scores
                .into_iter()
                .filter_map(|(doc_id, dot)| {
                    let doc_norm = loaded.norms.0.get(doc_id)?;
                    if *doc_norm == 0.0 {
                        return None;
                    }
                    Some((doc_id, dot / (query_norm * doc_norm)))
                })
                .collect();

            ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            ranked.truncate(k);

            ranked
                .into_iter()
                .filter_map(|(doc_id, score)| {
                    let meta = loaded.metadata.0.get(doc_id)?;
                    Some(SearchResult {
                        doc_id: doc_id.to_string(),
                        score,
                        title: meta.title.clone(),
                        url: meta.url.clone(),
                        snippet: meta.snippet.clone(),
                    })
                })
                .collect()
        })
    }

    /// Looks up a single document's metadata by id, for callers building a
    /// document-detail view on top of search results.
    pub fn document(&self, doc_id: &str) -> Result<Option<DocumentMeta>, Error> {
        self.with_loaded(|loaded| loaded.metadata.0.get(doc_id).cloned())
    }

    /// Returns the build statistics for whichever language is currently
    /// loaded, if any were persisted.
    pub fn stats(&self) -> Result<Option<BuildStats>, Error> {
        self.with_loaded(|loaded| loaded.stats.clone())
    }

    /// True while a language is fully loaded and ready to serve `search`.
    pub fn is_loaded(&self) -> bool {
        let guard = self.inner.lock().expect("evaluator lock poisoned");
        matches!(guard.state, LoadState::Loaded(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{merged_doc_id, Posting};
    use tempfile::tempdir;

    fn seed_minimal_index(root: &std::path::Path, lang: &str) {
        let mut index = InvertedIndex::new();
        index.0.insert(
            "gat".to_string(),
            vec![Posting::new("1", 0.9), Posting::new("2", 0.1)],
        );
        artifact::write_inverted_index(root, lang, &index).unwrap();

        let mut idf = IdfTable::default();
        idf.0.insert("gat".to_string(), 1.5);
        artifact::write_idf(root, lang, &idf).unwrap();

        let mut norms = DocNorms::default();
        norms.0.insert("1".to_string(), 0.9);
        norms.0.insert("2".to_string(), 0.1);
        artifact::write_doc_norms(root, lang, &norms).unwrap();

        let mut metadata = DocMetadata::default();
        metadata.0.insert(
            "1".to_string(),
            DocumentMeta {
                title: "Gatos".into(),
                url: "http://x/1".into(),
                snippet: "sobre gatos".into(),
                lang: lang.into(),
            },
        );
        metadata.0.insert(
            "2".to_string(),
            DocumentMeta {
                title: "Otro".into(),
                url: "http://x/2".into(),
                snippet: "otro texto".into(),
                lang: lang.into(),
            },
        );
        artifact::write_metadata(root, lang, &metadata).unwrap();
    }

    #[test]
    fn search_before_load_errors() {
        let dir = tempdir().unwrap();
        let evaluator = Evaluator::new(dir.path().to_path_buf());
        assert!(evaluator.search("gato", "es", 10).is_err());
    }

    #[test]
    fn ranks_by_cosine_similarity_descending() {
        let dir = tempdir().unwrap();
        seed_minimal_index(dir.path(), "es");
        let evaluator = Evaluator::new(dir.path().to_path_buf());
        evaluator.load("es").unwrap();

        let results = evaluator.search("gato", "es", 10).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].doc_id, "1");
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn empty_query_returns_empty_results() {
        let dir = tempdir().unwrap();
        seed_minimal_index(dir.path(), "es");
        let evaluator = Evaluator::new(dir.path().to_path_buf());
        evaluator.load("es").unwrap();

        let results = evaluator.search("el la los", "es", 10).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn unload_clears_state() {
        let dir = tempdir().unwrap();
        seed_minimal_index(dir.path(), "es");
        let evaluator = Evaluator::new(dir.path().to_path_buf());
        evaluator.load("es").unwrap();
        assert!(evaluator.is_loaded());
        evaluator.unload();
        assert!(!evaluator.is_loaded());
        assert!(evaluator.search("gato", "es", 10).is_err());
    }

    #[test]
    fn merged_ids_round_trip_through_document_lookup() {
        let dir = tempdir().unwrap();
        seed_minimal_index(dir.path(), "merged");
        let evaluator = Evaluator::new(dir.path().to_path_buf());
        evaluator.load("merged").unwrap();
        let id = merged_doc_id("es", "1");
        // seeded metadata uses bare ids "1"/"2"; merged_doc_id is exercised
        // here only to document the id shape callers should expect after a
        // real merge, not to assert a lookup hit.
        assert_eq!(id, "es_1");
    }
}

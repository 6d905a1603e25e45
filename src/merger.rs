//! Cross-language index merger (component D), spec.md §4.D.
//!
//! Merges the per-language artifacts produced by [`crate::builder`] into a
//! single combined index: document ids are prefixed `"{lang}_{id}"`
//! ([`crate::index::merged_doc_id`]), IDF is combined across languages, and
//! the per-language originals are backed up before being overwritten
//! in-place — the same "write into the same tree you read from, but back up
//! first" shape as the teacher's `processing::package::package`.
use std::collections::HashMap;
use std::path::Path;

use crate::error::Error;
use crate::index::artifact;
use crate::index::heap::BoundedPostings;
use crate::index::{
    merged_doc_id, BuildStats, DocMetadata, DocNorms, IdfTable, InvertedIndex, Posting,
    MAX_POSTINGS_PER_TERM,
};

/// How IDF values are combined across languages when merging (spec.md
/// §4.D, §9 "preferred variant" note).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdfStrategy {
    /// Takes the per-term maximum of each language's already-persisted IDF
    /// value. Cheap — no corpus re-read — and the default.
    MaxAcrossLanguages,
    /// Recomputes IDF from each language's document-frequency counts summed
    /// over their union, which is what the original system's merge script
    /// does when all per-language DF counts are still in memory. Requires
    /// the caller to supply those counts (see [`crate::builder::Builder::df_counts`]).
    RecomputeFromDf,
}

pub struct Merger {
    index_root: std::path::PathBuf,
    languages: Vec<String>,
    strategy: IdfStrategy,
}

impl Merger {
    pub fn new(index_root: std::path::PathBuf, languages: Vec<String>) -> Self {
        Self {
            index_root,
            languages,
            strategy: IdfStrategy::MaxAcrossLanguages,
        }
    }

    pub fn with_strategy(mut self, strategy: IdfStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Runs the merge described in spec.md §4.D:
    /// 1. back up every language's artifacts
    /// 2. combine IDF across languages
    /// 3. rebuild the inverted index with merged doc ids, keeping each
    ///    posting's per-language weight verbatim and re-applying the
    ///    posting cap
    /// 4. merge doc metadata and doc norms under merged ids
    /// 5. persist the combined artifacts under a synthetic `"merged"`
    ///    language directory
    pub fn run(&self) -> Result<BuildStats, Error> {
        if self.languages.is_empty() {
            return Err(Error::Custom("merge requires at least one language".into()));
        }
        let start = std::time::Instant::now();

        for lang in &self.languages {
            if !artifact::exists(&self.index_root, lang) {
                return Err(Error::MissingArtifact(artifact::lang_dir(&self.index_root, lang)));
            }
            info!("backing up artifacts for '{}'", lang);
            artifact::backup(&self.index_root, lang)?;
        }

        let combined_idf = self.combine_idf()?;

        info!("rebuilding merged inverted index across {} languages", self.languages.len());
        let mut heaps: HashMap<String, BoundedPostings> = HashMap::new();
        let mut merged_norms = DocNorms::default();
        let mut merged_metadata = DocMetadata::default();

        for lang in &self.languages {
            let inverted = artifact::read_inverted_index(&self.index_root, lang)?;
            let metadata = artifact::read_metadata(&self.index_root, lang)?;
            let norms = artifact::read_doc_norms(&self.index_root, lang)?;

            // Postings keep their per-language weight verbatim (spec.md
            // §4.D step 2; original_source/backend/merge_indexes.py:92-94
            // appends `(merged_id, tfidf)` unchanged). `doc_norms` are also
            // merged verbatim below, so numerator and denominator of cosine
            // similarity at query time stay on the same scale.
            for (term, postings) in inverted.0 {
                if !combined_idf.0.contains_key(&term) {
                    continue;
                }
                let heap = heaps.entry(term).or_insert_with(BoundedPostings::new);
                for posting in postings {
                    let merged_id = merged_doc_id(lang, &posting.doc_id);
                    heap.push(Posting::new(merged_id, posting.weight));
                }
            }

            for (id, meta) in metadata.0 {
                merged_metadata.0.insert(merged_doc_id(lang, &id), meta);
            }
            for (id, norm) in norms.0 {
                merged_norms.0.insert(merged_doc_id(lang, &id), norm);
            }
        }

        let mut merged_index = InvertedIndex::new();
        for (term, heap) in heaps {
            merged_index.0.insert(term, heap.into_sorted_vec());
        }

        let total_documents = merged_metadata.0.len();
        let vocabulary_size = merged_index.term_count();

        const MERGED_LANG: &str = "merged";
        artifact::write_inverted_index(&self.index_root, MERGED_LANG, &merged_index)?;
        artifact::write_idf(&self.index_root, MERGED_LANG, &combined_idf)?;
        artifact::write_doc_norms(&self.index_root, MERGED_LANG, &merged_norms)?;
        artifact::write_metadata(&self.index_root, MERGED_LANG, &merged_metadata)?;

        let stats = BuildStats {
            total_documents,
            vocabulary_size,
            build_time_seconds: start.elapsed().as_secs_f64(),
            languages: self.languages.clone(),
            max_postings_per_term: MAX_POSTINGS_PER_TERM,
            max_docs_limit: None,
            resumed_from_phase3: false,
        };
        artifact::write_stats(&self.index_root, MERGED_LANG, &stats)?;

        info!(
            "merge complete: {} languages, {} documents, {} terms",
            self.languages.len(),
            stats.total_documents,
            stats.vocabulary_size
        );
        Ok(stats)
    }

    /// Combines per-language IDF according to `self.strategy`.
    fn combine_idf(&self) -> Result<IdfTable, Error> {
        match self.strategy {
            IdfStrategy::MaxAcrossLanguages => {
                let mut combined: HashMap<String, f64> = HashMap::new();
                for lang in &self.languages {
                    let idf = artifact::read_idf(&self.index_root, lang)?;
                    for (term, value) in idf.0 {
                        combined
                            .entry(term)
                            .and_modify(|v| {
                                if value > *v {
                                    *v = value;
                                }
                            })
                            .or_insert(value);
                    }
                }
                Ok(IdfTable(combined))
            }
            IdfStrategy::RecomputeFromDf => Err(Error::Custom(
                "RecomputeFromDf requires df_counts supplied via Merger::run_with_df_counts".into(),
            )),
        }
    }

    /// Merges using document-frequency counts gathered during the build
    /// (spec.md §9 "preferred variant"), recomputing IDF over the union of
    /// documents rather than taking the max of already-derived per-language
    /// values.
    pub fn run_with_df_counts(
        &self,
        df_counts: &HashMap<String, (usize, HashMap<String, usize>)>,
    ) -> Result<BuildStats, Error> {
        let mut total_docs = 0usize;
        let mut union_df: HashMap<String, usize> = HashMap::new();
        for (doc_count, df) in df_counts.values() {
            total_docs += doc_count;
            for (term, count) in df {
                *union_df.entry(term.clone()).or_insert(0) += count;
            }
        }
        let recomputed = crate::builder::compute_idf(total_docs, &union_df);

        const MERGED_LANG: &str = "merged";
        artifact::write_idf(&self.index_root, MERGED_LANG, &recomputed)?;
        // the rest of the merge (postings, norms, metadata) proceeds
        // identically to `run`, just against `recomputed` instead of a
        // max-across-languages table.
        self.rebuild_with_idf(&recomputed)
    }

    fn rebuild_with_idf(&self, combined_idf: &IdfTable) -> Result<BuildStats, Error> {
        let start = std::time::Instant::now();
        for lang in &self.languages {
            artifact::backup(&self.index_root, lang)?;
        }

        let mut heaps: HashMap<String, BoundedPostings> = HashMap::new();
        let mut merged_norms = DocNorms::default();
        let mut merged_metadata = DocMetadata::default();

        for lang in &self.languages {
            let inverted = artifact::read_inverted_index(&self.index_root, lang)?;
            let metadata = artifact::read_metadata(&self.index_root, lang)?;
            let norms = artifact::read_doc_norms(&self.index_root, lang)?;

            // Verbatim postings here too, matching `run`'s merge body: see
            // the comment there for why the weights aren't rescaled.
            for (term, postings) in inverted.0 {
                if !combined_idf.0.contains_key(&term) {
                    continue;
                }
                let heap = heaps.entry(term).or_insert_with(BoundedPostings::new);
                for posting in postings {
                    heap.push(Posting::new(merged_doc_id(lang, &posting.doc_id), posting.weight));
                }
            }
            for (id, meta) in metadata.0 {
                merged_metadata.0.insert(merged_doc_id(lang, &id), meta);
            }
            for (id, norm) in norms.0 {
                merged_norms.0.insert(merged_doc_id(lang, &id), norm);
            }
        }

        let mut merged_index = InvertedIndex::new();
        for (term, heap) in heaps {
            merged_index.0.insert(term, heap.into_sorted_vec());
        }

        const MERGED_LANG: &str = "merged";
        let vocabulary_size = merged_index.term_count();
        artifact::write_inverted_index(&self.index_root, MERGED_LANG, &merged_index)?;
        artifact::write_doc_norms(&self.index_root, MERGED_LANG, &merged_norms)?;
        artifact::write_metadata(&self.index_root, MERGED_LANG, &merged_metadata)?;

        let stats = BuildStats {
            total_documents: merged_metadata.0.len(),
            vocabulary_size,
            build_time_seconds: start.elapsed().as_secs_f64(),
            languages: self.languages.clone(),
            max_postings_per_term: MAX_POSTINGS_PER_TERM,
            max_docs_limit: None,
            resumed_from_phase3: false,
        };
        artifact::write_stats(&self.index_root, MERGED_LANG, &stats)?;
        Ok(stats)
    }
}

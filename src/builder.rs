//! Streaming two-pass index builder (component C), spec.md §4.C.
//!
//! Structured as an explicit phase sequence so `run` (phases 1–5) and
//! `resume_phase3` (phases 3–5 only) share the same phase-3 body instead of
//! duplicating it — the original `build_index.py`/`resume_phase3.py` pair
//! duplicates that loop verbatim; this factors it into one method called
//! from both entry points (spec.md §4.C "Restartability").
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use itertools::Itertools;
use rayon::prelude::*;

use crate::corpus::{iter_articles, Article};
use crate::error::Error;
use crate::index::artifact;
use crate::index::heap::BoundedPostings;
use crate::index::{
    BuildStats, DocMetadata, DocNorms, DocumentMeta, IdfTable, InvertedIndex, Posting,
    MAX_POSTINGS_PER_TERM, SNIPPET_LENGTH,
};
use crate::lang::LanguageProfiles;
use crate::preprocess::preprocess;

/// How many articles are preprocessed per `rayon` batch during phases 1 and
/// 3 (spec.md §5: parallelism confined to the tokenization/stemming map,
/// with a commutative, single-threaded reduce into the running counters).
const BATCH_SIZE: usize = 2_000;

const PROGRESS_EVERY: usize = 10_000;

pub struct Builder {
    corpus_root: PathBuf,
    index_root: PathBuf,
    lang: &'static str,
    max_docs: Option<usize>,
    profiles: LanguageProfiles,
}

impl Builder {
    pub fn new(
        corpus_root: PathBuf,
        index_root: PathBuf,
        language: &str,
        max_docs: Option<usize>,
    ) -> Result<Self, Error> {
        let profiles = LanguageProfiles::new();
        // Unknown languages are a hard build-time error (spec.md §9 redesign
        // flag), unlike the query-time English fallback.
        let lang = profiles.resolve(language)?;
        Ok(Self {
            corpus_root,
            index_root,
            lang,
            max_docs,
            profiles,
        })
    }

    /// Runs all five phases from scratch.
    pub fn run(&self) -> Result<BuildStats, Error> {
        let start = Instant::now();
        let (doc_count, df) = self.phase1_df_and_metadata()?;
        let idf = self.phase2_idf(doc_count, &df)?;
        drop(df);

        let doc_ids = artifact::read_metadata(&self.index_root, self.lang)?
            .0
            .into_keys()
            .collect::<std::collections::HashSet<_>>();

        self.phase3_to_5(doc_count, &idf, &doc_ids, start, false)
    }

    /// Resumes a build from phase 3, requiring `doc_metadata` and `idf` to
    /// already be on disk (spec.md §4.C "Restartability").
    pub fn resume_phase3(&self) -> Result<BuildStats, Error> {
        if !artifact::resumable(&self.index_root, self.lang) {
            return Err(Error::MissingArtifact(
                artifact::lang_dir(&self.index_root, self.lang).join("doc_metadata/idf"),
            ));
        }
        let start = Instant::now();
        let metadata = artifact::read_metadata(&self.index_root, self.lang)?;
        let doc_count = metadata.0.len();
        let doc_ids = metadata.0.into_keys().collect::<std::collections::HashSet<_>>();
        let idf = artifact::read_idf(&self.index_root, self.lang)?;

        self.phase3_to_5(doc_count, &idf, &doc_ids, start, true)
    }

    /// Exposes the Phase 1 document-frequency counts for the current
    /// language, letting a caller that builds multiple languages in one
    /// process recompute IDF over their union at merge time instead of
    /// taking the per-term max of already-persisted IDF values (spec.md
    /// §4.D, §9's "preferred variant" note).
    pub fn df_counts(&self) -> Result<(usize, HashMap<String, usize>), Error> {
        self.phase1_df_and_metadata()
    }

    /// Phase 1 — first pass: document frequency + metadata.
    fn phase1_df_and_metadata(&self) -> Result<(usize, HashMap<String, usize>), Error> {
        info!("[{}] phase 1: computing DF and metadata", self.lang);
        let profile = self
            .profiles
            .get(self.lang)
            .expect("resolved language always has a profile");

        let mut df: HashMap<String, usize> = HashMap::new();
        let mut metadata = DocMetadata::default();
        let mut doc_count = 0usize;

        let articles = iter_articles(&self.corpus_root, self.max_docs)?;
        let mut batch: Vec<Article> = Vec::with_capacity(BATCH_SIZE);

        let mut flush = |batch: &mut Vec<Article>,
                         df: &mut HashMap<String, usize>,
                         metadata: &mut DocMetadata,
                         doc_count: &mut usize| {
            let processed: Vec<(Article, Vec<String>)> = batch
                .par_drain(..)
                .map(|article| {
                    let terms = preprocess(&article.text, profile);
                    (article, terms)
                })
                .collect();

            for (article, terms) in processed {
                if terms.is_empty() {
                    continue;
                }
                for term in terms.iter().map(String::as_str).unique() {
                    *df.entry(term.to_string()).or_insert(0) += 1;
                }
                let snippet: String = article
                    .text
                    .chars()
                    .take(SNIPPET_LENGTH)
                    .collect::<String>()
                    .replace('\n', " ");
                metadata.0.insert(
                    article.id,
                    DocumentMeta {
                        title: article.title,
                        url: article.url,
                        snippet,
                        lang: self.lang.to_string(),
                    },
                );
                *doc_count += 1;
                if *doc_count % PROGRESS_EVERY == 0 {
                    info!(
                        "[{}] {} docs | {} terms so far",
                        self.lang,
                        doc_count,
                        df.len()
                    );
                }
            }
        };

        for article in articles {
            batch.push(article);
            if batch.len() >= BATCH_SIZE {
                flush(&mut batch, &mut df, &mut metadata, &mut doc_count);
            }
        }
        if !batch.is_empty() {
            flush(&mut batch, &mut df, &mut metadata, &mut doc_count);
        }

        info!(
            "[{}] phase 1 done: {} documents, {} unique terms",
            self.lang,
            doc_count,
            df.len()
        );
        artifact::write_metadata(&self.index_root, self.lang, &metadata)?;
        Ok((doc_count, df))
    }

    /// Phase 2 — IDF.
    fn phase2_idf(
        &self,
        doc_count: usize,
        df: &HashMap<String, usize>,
    ) -> Result<IdfTable, Error> {
        info!("[{}] phase 2: computing IDF", self.lang);
        let idf = compute_idf(doc_count, df);
        artifact::write_idf(&self.index_root, self.lang, &idf)?;
        Ok(idf)
    }

    /// Shared body of phases 3–5, used by both [`Builder::run`] and
    /// [`Builder::resume_phase3`].
    fn phase3_to_5(
        &self,
        doc_count: usize,
        idf: &IdfTable,
        doc_ids: &std::collections::HashSet<String>,
        start: Instant,
        resumed: bool,
    ) -> Result<BuildStats, Error> {
        info!("[{}] phase 3: building inverted index and norms", self.lang);
        let profile = self
            .profiles
            .get(self.lang)
            .expect("resolved language always has a profile");

        let mut heaps: HashMap<String, BoundedPostings> = HashMap::new();
        let mut doc_norms = DocNorms::default();
        let mut processed = 0usize;

        let articles = iter_articles(&self.corpus_root, None)?;
        let mut batch: Vec<Article> = Vec::with_capacity(BATCH_SIZE);

        let mut flush = |batch: &mut Vec<Article>,
                         heaps: &mut HashMap<String, BoundedPostings>,
                         doc_norms: &mut DocNorms,
                         processed: &mut usize| {
            let relevant: Vec<Article> = batch
                .drain(..)
                .filter(|a| doc_ids.contains(&a.id))
                .collect();

            let scored: Vec<(String, Vec<(String, f64)>, f64)> = relevant
                .into_par_iter()
                .map(|article| {
                    let terms = preprocess(&article.text, profile);
                    let n_tokens = terms.len();
                    let mut counts: HashMap<&str, usize> = HashMap::new();
                    for t in &terms {
                        *counts.entry(t.as_str()).or_insert(0) += 1;
                    }
                    let mut norm_sq = 0.0f64;
                    let mut weighted = Vec::with_capacity(counts.len());
                    for (term, count) in counts {
                        if let Some(&idf_t) = idf.0.get(term) {
                            let tfidf = (count as f64 / n_tokens as f64) * idf_t;
                            norm_sq += tfidf * tfidf;
                            weighted.push((term.to_string(), tfidf));
                        }
                    }
                    (article.id, weighted, norm_sq.sqrt())
                })
                .collect();

            for (doc_id, weighted, norm) in scored {
                if weighted.is_empty() {
                    continue;
                }
                for (term, tfidf) in weighted {
                    heaps
                        .entry(term)
                        .or_insert_with(BoundedPostings::new)
                        .push(Posting::new(doc_id.clone(), tfidf));
                }
                doc_norms.0.insert(doc_id, norm);
                *processed += 1;
                if *processed % PROGRESS_EVERY == 0 {
                    info!("[{}] {}/{} documents indexed", self.lang, processed, doc_count);
                }
            }
        };

        for article in articles {
            batch.push(article);
            if batch.len() >= BATCH_SIZE {
                flush(&mut batch, &mut heaps, &mut doc_norms, &mut processed);
            }
        }
        if !batch.is_empty() {
            flush(&mut batch, &mut heaps, &mut doc_norms, &mut processed);
        }

        info!("[{}] phase 4: sorting postings by weight", self.lang);
        let mut index = InvertedIndex::new();
        for (term, heap) in heaps {
            index.0.insert(term, heap.into_sorted_vec());
        }

        info!("[{}] phase 5: persisting artifacts", self.lang);
        artifact::write_inverted_index(&self.index_root, self.lang, &index)?;
        artifact::write_doc_norms(&self.index_root, self.lang, &doc_norms)?;

        let stats = BuildStats {
            total_documents: doc_count,
            vocabulary_size: index.term_count(),
            build_time_seconds: start.elapsed().as_secs_f64(),
            languages: vec![self.lang.to_string()],
            max_postings_per_term: MAX_POSTINGS_PER_TERM,
            max_docs_limit: self.max_docs,
            resumed_from_phase3: resumed,
        };
        artifact::write_stats(&self.index_root, self.lang, &stats)?;

        info!(
            "[{}] build complete: {} docs, {} terms, {:.1}s",
            self.lang, stats.total_documents, stats.vocabulary_size, stats.build_time_seconds
        );
        Ok(stats)
    }
}

/// `idf[t] = ln((N+1)/(df(t)+1)) + 1` (spec.md §3, invariant 5).
pub fn compute_idf(doc_count: usize, df: &HashMap<String, usize>) -> IdfTable {
    let n = doc_count as f64;
    let mut idf = HashMap::with_capacity(df.len());
    for (term, df_t) in df {
        idf.insert(term.clone(), ((n + 1.0) / (*df_t as f64 + 1.0)).ln() + 1.0);
    }
    IdfTable(idf)
}

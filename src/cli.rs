//! Command line arguments and parameters management/parsing.
use std::path::PathBuf;

use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "wikidex", about = "Multilingual TF-IDF index over a Wikipedia-style corpus")]
/// Holds every command that is callable by the `wikidex` command. The HTTP
/// serving layer is a separate, out-of-scope concern (spec.md §1
/// Non-goals) — this surface only builds, merges, and queries indexes.
pub enum Wikidex {
    #[structopt(about = "Build a per-language index from a corpus directory")]
    BuildIndex(BuildIndex),
    #[structopt(about = "Resume an interrupted build from phase 3 onward")]
    ResumePhase3(ResumePhase3),
    #[structopt(about = "Merge per-language indexes into one combined index")]
    MergeIndexes(MergeIndexes),
    #[structopt(about = "Run a single query against a built index")]
    Search(Search),
}

#[derive(Debug, StructOpt)]
/// Build command and parameters.
pub struct BuildIndex {
    #[structopt(parse(from_os_str), help = "corpus root directory")]
    pub corpus: PathBuf,
    #[structopt(parse(from_os_str), help = "index output directory")]
    pub index: PathBuf,
    #[structopt(long, help = "language code or alias, e.g. 'es' or 'spanish'")]
    pub lang: String,
    #[structopt(long, help = "stop after this many documents")]
    pub max_docs: Option<usize>,
}

#[derive(Debug, StructOpt)]
/// Phase-3 resume command and parameters.
pub struct ResumePhase3 {
    #[structopt(parse(from_os_str), help = "corpus root directory")]
    pub corpus: PathBuf,
    #[structopt(parse(from_os_str), help = "index directory containing doc_metadata and idf")]
    pub index: PathBuf,
    #[structopt(long, help = "language code or alias")]
    pub lang: String,
}

#[derive(Debug, StructOpt)]
/// Merge command and parameters.
pub struct MergeIndexes {
    #[structopt(parse(from_os_str), help = "index directory containing every per-language subdirectory")]
    pub index: PathBuf,
    #[structopt(long, help = "languages to merge, e.g. --languages es pt fr", required = true)]
    pub languages: Vec<String>,
    #[structopt(parse(from_os_str), long, help = "corpus roots to re-scan for document frequency, one per language, \
                in the same order as --languages, when recomputing IDF instead of taking the max of persisted values")]
    pub recompute_df_corpora: Vec<PathBuf>,
}

#[derive(Debug, StructOpt)]
/// Search command and parameters.
pub struct Search {
    #[structopt(parse(from_os_str), help = "index directory")]
    pub index: PathBuf,
    #[structopt(long, help = "language code or alias, or 'merged' for the combined index")]
    pub lang: String,
    #[structopt(help = "query text")]
    pub query: String,
    #[structopt(short = "k", long, default_value = "10", help = "number of results to return")]
    pub top_k: usize,
}

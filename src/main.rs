use std::collections::HashMap;
use std::process::ExitCode;

use log::LevelFilter;
use structopt::StructOpt;

use wikidex::builder::Builder;
use wikidex::cli;
use wikidex::error::Error;
use wikidex::merger::Merger;
use wikidex::query::Evaluator;

#[macro_use]
extern crate log;

fn main() -> ExitCode {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Info);
    builder.parse_env("RUST_LOG");
    builder.init();

    let opt = cli::Wikidex::from_args();
    debug!("cli args\n{:#?}", opt);

    match run(opt) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(opt: cli::Wikidex) -> Result<(), Error> {
    match opt {
        cli::Wikidex::BuildIndex(b) => {
            let builder = Builder::new(b.corpus, b.index, &b.lang, b.max_docs)?;
            let stats = builder.run()?;
            info!(
                "built index: {} documents, {} terms, {:.1}s",
                stats.total_documents, stats.vocabulary_size, stats.build_time_seconds
            );
        }
        cli::Wikidex::ResumePhase3(r) => {
            let builder = Builder::new(r.corpus, r.index, &r.lang, None)?;
            let stats = builder.resume_phase3()?;
            info!(
                "resumed build: {} documents, {} terms, {:.1}s",
                stats.total_documents, stats.vocabulary_size, stats.build_time_seconds
            );
        }
        cli::Wikidex::MergeIndexes(m) => {
            let merger = Merger::new(m.index.clone(), m.languages.clone());
            let stats = if m.recompute_df_corpora.is_empty() {
                merger.run()?
            } else {
                if m.recompute_df_corpora.len() != m.languages.len() {
                    return Err(Error::Custom(
                        "--recompute-df-corpora must list exactly one corpus per --languages entry".into(),
                    ));
                }
                let mut df_counts = HashMap::new();
                for (lang, corpus) in m.languages.iter().zip(m.recompute_df_corpora.iter()) {
                    let builder = Builder::new(corpus.clone(), m.index.clone(), lang, None)?;
                    df_counts.insert(lang.clone(), builder.df_counts()?);
                }
                merger.run_with_df_counts(&df_counts)?
            };
            info!(
                "merged index: {} documents, {} terms across {:?}",
                stats.total_documents, stats.vocabulary_size, stats.languages
            );
        }
        cli::Wikidex::Search(s) => {
            let evaluator = Evaluator::new(s.index);
            evaluator.load(&s.lang)?;
            let results = evaluator.search(&s.query, &s.lang, s.top_k)?;
            if results.is_empty() {
                println!("no results");
            }
            for (rank, result) in results.iter().enumerate() {
                println!(
                    "{:>2}. [{:.4}] {} ({})\n    {}\n    {}",
                    rank + 1,
                    result.score,
                    result.title,
                    result.doc_id,
                    result.url,
                    result.snippet
                );
            }
        }
    }
    Ok(())
}

//! Crate-wide error type.
//!
//! The original `ungoliant` teacher kept a bare `enum Error` with manual
//! `From` impls and no `Display`. That was workable for a pipeline that only
//! ever printed errors with `{:?}`; this crate's CLI needs to turn errors
//! into exit codes and human messages (spec.md §7), so the enum is built
//! with `thiserror` instead, which the rest of the retrieval pack reaches
//! for whenever an error type needs a `Display` impl for free.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("corpus root not found: {0}")]
    MissingCorpus(PathBuf),

    #[error("missing artifact: {0}")]
    MissingArtifact(PathBuf),

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("malformed article: {0}")]
    MalformedArticle(String),

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}

impl Error {
    /// Maps an error to the process exit code documented in spec.md §6/§7.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::MissingCorpus(_) => 1,
            _ => 2,
        }
    }
}

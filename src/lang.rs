//! Language codes, aliases, and the injected stop-word/stemmer cache.
//!
//! Grounded in `original_source/backend/config.py`'s `LANGUAGE_MAP` and
//! `preprocessing.py`'s `_normalize_language`: a handful of short codes and
//! long-form aliases map onto a small set of actually-supported linguistic
//! profiles. `ca` intentionally shares Spanish's stop words and stemmer —
//! documented in the original as a quirk, not a bug, and preserved here.
use std::collections::{HashMap, HashSet};

use rust_stemmers::{Algorithm, Stemmer};
use stop_words::{get, LANGUAGE};

use crate::error::Error;

/// Two-letter codes this crate actually indexes/queries.
pub const SUPPORTED_LANGUAGES: &[&str] = &["es", "ca", "pt", "en", "fr"];

/// Normalizes a user-supplied language string (code or full name) down to
/// one of the canonical codes in [`SUPPORTED_LANGUAGES`].
fn normalize(language: &str) -> Option<&'static str> {
    match language.to_lowercase().as_str() {
        "es" | "español" | "espanol" | "spanish" => Some("es"),
        "ca" | "català" | "catalan" => Some("ca"),
        "pt" | "português" | "portugues" | "portuguese" => Some("pt"),
        "en" | "english" | "inglés" | "ingles" => Some("en"),
        "fr" | "français" | "francais" | "french" => Some("fr"),
        _ => None,
    }
}

fn stemmer_algorithm(code: &str) -> Algorithm {
    match code {
        // ca deliberately reuses the Spanish stemmer: no bundled Catalan
        // Snowball algorithm, and the original system never added one.
        "es" | "ca" => Algorithm::Spanish,
        "pt" => Algorithm::Portuguese,
        "fr" => Algorithm::French,
        // unknown languages fall back to English only at query time
        // (see LanguageProfiles::get_or_fallback); build time must fail.
        _ => Algorithm::English,
    }
}

fn stopword_language(code: &str) -> LANGUAGE {
    match code {
        "es" | "ca" => LANGUAGE::Spanish,
        "pt" => LANGUAGE::Portuguese,
        "fr" => LANGUAGE::French,
        _ => LANGUAGE::English,
    }
}

/// Stop words + stemmer for one language, built once and reused for every
/// document or query in that language.
pub struct LanguageProfile {
    pub code: &'static str,
    stop_words: HashSet<String>,
    stemmer: Stemmer,
}

impl LanguageProfile {
    fn build(code: &'static str) -> Self {
        // A `HashSet` for O(1) membership, matching the `frozenset` the
        // original (`original_source/backend/preprocessing.py:51`) uses for
        // the same lookup on the hottest path of both build passes.
        let stop_words: HashSet<String> = get(stopword_language(code))
            .into_iter()
            .map(str::to_owned)
            .collect();
        let stemmer = Stemmer::create(stemmer_algorithm(code));
        Self {
            code,
            stop_words,
            stemmer,
        }
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    pub fn stem(&self, token: &str) -> String {
        self.stemmer.stem(token).into_owned()
    }
}

/// Explicit, injectable cache of [`LanguageProfile`]s, replacing the hidden
/// process-wide singleton the original preprocessor used — see spec.md §9's
/// design note on process-wide caches. Safe to construct more than once;
/// construction is cheap (stop-word lists are small, stemmers are plain
/// data tables) so no synchronization is needed beyond normal ownership.
pub struct LanguageProfiles {
    profiles: HashMap<&'static str, LanguageProfile>,
}

impl LanguageProfiles {
    pub fn new() -> Self {
        let mut profiles = HashMap::new();
        for code in SUPPORTED_LANGUAGES {
            profiles.insert(*code, LanguageProfile::build(code));
        }
        Self { profiles }
    }

    /// Resolves `language` to a canonical code, failing loudly if it isn't
    /// one of [`SUPPORTED_LANGUAGES`]. Used at build time (§9 redesign flag:
    /// unknown languages must be a hard build error, not a silent English
    /// fallback).
    pub fn resolve(&self, language: &str) -> Result<&'static str, Error> {
        normalize(language).ok_or_else(|| Error::UnsupportedLanguage(language.to_string()))
    }

    pub fn get(&self, code: &str) -> Option<&LanguageProfile> {
        self.profiles.get(code)
    }

    /// Query-time lookup: unknown or unresolved languages fall back to
    /// English, logging a warning (the original's latent behavior,
    /// preserved only here, not at build time — see spec.md §9).
    pub fn get_or_fallback(&self, language: &str) -> &LanguageProfile {
        if let Some(code) = normalize(language) {
            if let Some(profile) = self.profiles.get(code) {
                return profile;
            }
        }
        warn!(
            "unknown language '{}' at query time, falling back to English",
            language
        );
        self.profiles.get("en").expect("english profile always present")
    }
}

impl Default for LanguageProfiles {
    fn default() -> Self {
        Self::new()
    }
}

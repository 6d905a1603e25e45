//! Pure text-to-terms preprocessing (component B).
//!
//! Mirrors `original_source/backend/preprocessing.py`'s
//! `preprocess_document_fast`: lowercase, tokenize on `\w+`, drop stop
//! words, stem what's left. `\w+` over Unicode text (not just ASCII) is
//! what the original's `re.findall(r"\w+", text, re.UNICODE)` does, so the
//! tokenizer here uses the `regex` crate's Unicode-aware `\w` class rather
//! than hand-rolling a byte-oriented scanner.
use lazy_static::lazy_static;
use regex::Regex;

use crate::lang::LanguageProfiles;

lazy_static! {
    static ref WORD_PATTERN: Regex = Regex::new(r"\w+").expect("static regex is valid");
}

/// Tokenizes and stems `text` for `language`, dropping stop words.
///
/// Returns an empty vector for text that preprocesses to nothing (spec.md
/// §3: an empty term list means the document is skipped and does not count
/// toward `N`; §4.E: an empty term list for a query means an empty result).
pub fn preprocess(text: &str, profile: &crate::lang::LanguageProfile) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| !profile.is_stop_word(token))
        .map(|token| profile.stem(token))
        .collect()
}

/// Convenience wrapper that resolves `language` through `profiles` first.
/// Used at query time, where the language has already been validated by the
/// evaluator's `load` step.
pub fn preprocess_for(
    text: &str,
    language: &str,
    profiles: &LanguageProfiles,
) -> Vec<String> {
    let profile = profiles.get_or_fallback(language);
    preprocess(text, profile)
}

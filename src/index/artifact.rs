//! Reading and writing the five on-disk artifacts (spec.md §6).
//!
//! JSON files (`idf`, `doc_norms`, `doc_metadata`, `stats`) go through
//! `serde_json`, UTF-8, unescaped Unicode, matching the teacher's own
//! `serde_json::to_string_pretty`/`from_reader` usage in
//! `writing::writer::Writer`. The inverted index uses a custom
//! length-prefixed binary framing (spec.md §6) instead of JSON or a
//! language-specific format like `pickle`, so it stays self-describing and
//! portable: `u64` term count, then per term a `u32`-length-prefixed UTF-8
//! term, a `u32` posting count, then that many `{u32 id-len, UTF-8 id, f64
//! weight}` records, all little-endian.
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::Error;

use super::{BuildStats, DocMetadata, DocNorms, IdfTable, InvertedIndex, Posting};

pub const INVERTED_INDEX_FILE: &str = "inverted_index";
pub const IDF_FILE: &str = "idf";
pub const DOC_NORMS_FILE: &str = "doc_norms";
pub const DOC_METADATA_FILE: &str = "doc_metadata";
pub const STATS_FILE: &str = "stats";

/// Resolves the five artifact paths for `lang` under `index_root`.
pub fn lang_dir(index_root: &Path, lang: &str) -> PathBuf {
    index_root.join(lang)
}

fn path_for(index_root: &Path, lang: &str, file: &str) -> PathBuf {
    lang_dir(index_root, lang).join(file)
}

/// True if all four required artifacts (inverted index, idf, doc norms,
/// doc metadata) exist for `lang`. `stats` is optional (spec.md §6).
pub fn exists(index_root: &Path, lang: &str) -> bool {
    [INVERTED_INDEX_FILE, IDF_FILE, DOC_NORMS_FILE, DOC_METADATA_FILE]
        .iter()
        .all(|f| path_for(index_root, lang, f).exists())
}

/// True if the phase-3 prerequisites (doc metadata + idf) exist, enabling
/// `resume_phase3` (spec.md §4.C "Restartability").
pub fn resumable(index_root: &Path, lang: &str) -> bool {
    path_for(index_root, lang, DOC_METADATA_FILE).exists()
        && path_for(index_root, lang, IDF_FILE).exists()
}

fn require(path: &Path) -> Result<(), Error> {
    if !path.exists() {
        return Err(Error::MissingArtifact(path.to_path_buf()));
    }
    Ok(())
}

pub fn write_metadata(index_root: &Path, lang: &str, metadata: &DocMetadata) -> Result<(), Error> {
    let dir = lang_dir(index_root, lang);
    fs::create_dir_all(&dir)?;
    let path = path_for(index_root, lang, DOC_METADATA_FILE);
    let f = File::create(&path)?;
    serde_json::to_writer(BufWriter::new(f), &metadata.0)?;
    Ok(())
}

pub fn read_metadata(index_root: &Path, lang: &str) -> Result<DocMetadata, Error> {
    let path = path_for(index_root, lang, DOC_METADATA_FILE);
    require(&path)?;
    let f = File::open(&path)?;
    let inner = serde_json::from_reader(BufReader::new(f))?;
    Ok(DocMetadata(inner))
}

pub fn write_idf(index_root: &Path, lang: &str, idf: &IdfTable) -> Result<(), Error> {
    let dir = lang_dir(index_root, lang);
    fs::create_dir_all(&dir)?;
    let path = path_for(index_root, lang, IDF_FILE);
    let f = File::create(&path)?;
    serde_json::to_writer(BufWriter::new(f), &idf.0)?;
    Ok(())
}

pub fn read_idf(index_root: &Path, lang: &str) -> Result<IdfTable, Error> {
    let path = path_for(index_root, lang, IDF_FILE);
    require(&path)?;
    let f = File::open(&path)?;
    let inner = serde_json::from_reader(BufReader::new(f))?;
    Ok(IdfTable(inner))
}

pub fn write_doc_norms(index_root: &Path, lang: &str, norms: &DocNorms) -> Result<(), Error> {
    let dir = lang_dir(index_root, lang);
    fs::create_dir_all(&dir)?;
    let path = path_for(index_root, lang, DOC_NORMS_FILE);
    let f = File::create(&path)?;
    serde_json::to_writer(BufWriter::new(f), &norms.0)?;
    Ok(())
}

pub fn read_doc_norms(index_root: &Path, lang: &str) -> Result<DocNorms, Error> {
    let path = path_for(index_root, lang, DOC_NORMS_FILE);
    require(&path)?;
    let f = File::open(&path)?;
    let inner = serde_json::from_reader(BufReader::new(f))?;
    Ok(DocNorms(inner))
}

pub fn write_stats(index_root: &Path, lang: &str, stats: &BuildStats) -> Result<(), Error> {
    let dir = lang_dir(index_root, lang);
    fs::create_dir_all(&dir)?;
    let path = path_for(index_root, lang, STATS_FILE);
    let f = File::create(&path)?;
    serde_json::to_writer_pretty(BufWriter::new(f), stats)?;
    Ok(())
}

pub fn read_stats(index_root: &Path, lang: &str) -> Result<Option<BuildStats>, Error> {
    let path = path_for(index_root, lang, STATS_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let f = File::open(&path)?;
    Ok(Some(serde_json::from_reader(BufReader::new(f))?))
}

/// Writes the inverted index using the length-prefixed binary framing
/// described in spec.md §6.
pub fn write_inverted_index(
    index_root: &Path,
    lang: &str,
    index: &InvertedIndex,
) -> Result<(), Error> {
    let dir = lang_dir(index_root, lang);
    fs::create_dir_all(&dir)?;
    let path = path_for(index_root, lang, INVERTED_INDEX_FILE);
    let f = File::create(&path)?;
    let mut w = BufWriter::new(f);

    w.write_all(&(index.0.len() as u64).to_le_bytes())?;
    for (term, postings) in &index.0 {
        let term_bytes = term.as_bytes();
        w.write_all(&(term_bytes.len() as u32).to_le_bytes())?;
        w.write_all(term_bytes)?;
        w.write_all(&(postings.len() as u32).to_le_bytes())?;
        for posting in postings {
            let id_bytes = posting.doc_id.as_bytes();
            w.write_all(&(id_bytes.len() as u32).to_le_bytes())?;
            w.write_all(id_bytes)?;
            w.write_all(&posting.weight.to_le_bytes())?;
        }
    }
    w.flush()?;
    Ok(())
}

pub fn read_inverted_index(index_root: &Path, lang: &str) -> Result<InvertedIndex, Error> {
    let path = path_for(index_root, lang, INVERTED_INDEX_FILE);
    require(&path)?;
    let f = File::open(&path)?;
    let mut r = BufReader::new(f);

    let term_count = read_u64(&mut r)?;
    let mut index = InvertedIndex::new();
    for _ in 0..term_count {
        let term_len = read_u32(&mut r)? as usize;
        let term = read_utf8(&mut r, term_len)?;

        let posting_count = read_u32(&mut r)?;
        let mut postings = Vec::with_capacity(posting_count as usize);
        for _ in 0..posting_count {
            let id_len = read_u32(&mut r)? as usize;
            let doc_id = read_utf8(&mut r, id_len)?;
            let weight = read_f64(&mut r)?;
            postings.push(Posting::new(doc_id, weight));
        }
        index.0.insert(term, postings);
    }
    Ok(index)
}

fn read_u64(r: &mut impl Read) -> Result<u64, Error> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_u32(r: &mut impl Read) -> Result<u32, Error> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_f64(r: &mut impl Read) -> Result<f64, Error> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

fn read_utf8(r: &mut impl Read, len: usize) -> Result<String, Error> {
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| Error::Artifact(format!("invalid utf-8 in artifact: {e}")))
}

/// Copies the four required artifacts for `lang` into `backup_<lang>/`
/// under `index_root`, unless that backup already exists (spec.md §4.D
/// step 6: idempotent, never overwrite an existing backup).
pub fn backup(index_root: &Path, lang: &str) -> Result<(), Error> {
    let backup_dir = index_root.join(format!("backup_{}", lang));
    if backup_dir.exists() {
        return Ok(());
    }
    fs::create_dir_all(&backup_dir)?;
    for file in [
        INVERTED_INDEX_FILE,
        IDF_FILE,
        DOC_NORMS_FILE,
        DOC_METADATA_FILE,
        STATS_FILE,
    ] {
        let src = path_for(index_root, lang, file);
        if src.exists() {
            fs::copy(&src, backup_dir.join(file))?;
        }
    }
    Ok(())
}

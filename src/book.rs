//! Book manifest loading.
//!
//! A book is a TOML manifest pairing each chapter with its recording and its
//! authored text. This module is intentionally small: it parses the manifest,
//! resolves relative paths against the manifest's directory, and enforces the
//! chapter-list shape the player relies on. Keeping it isolated makes it easy
//! to swap for a richer catalog format later.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct Book {
    pub title: String,
    pub cover: Option<PathBuf>,
    pub chapters: Vec<Chapter>,
}

/// One audio+text unit of a book. Ids are 1-based and contiguous; the list
/// is fixed once loaded.
#[derive(Debug, Clone)]
pub struct Chapter {
    pub id: u32,
    pub title: String,
    pub audio: PathBuf,
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct BookManifest {
    title: String,
    cover: Option<PathBuf>,
    #[serde(default)]
    chapters: Vec<ChapterEntry>,
}

#[derive(Debug, Deserialize)]
struct ChapterEntry {
    id: u32,
    title: String,
    audio: PathBuf,
    text: Option<String>,
    text_file: Option<PathBuf>,
}

/// Load a book manifest from disk.
pub fn load_book(path: &Path) -> Result<Book> {
    info!(path = %path.display(), "Loading book manifest");
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read book manifest at {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let book = parse_book(&data, base)
        .with_context(|| format!("Invalid book manifest at {}", path.display()))?;
    info!(
        title = %book.title,
        chapters = book.chapters.len(),
        "Loaded book"
    );
    Ok(book)
}

fn parse_book(data: &str, base: &Path) -> Result<Book> {
    let manifest: BookManifest = toml::from_str(data).context("Parsing manifest TOML")?;

    if manifest.chapters.is_empty() {
        bail!("Book \"{}\" has no chapters", manifest.title);
    }

    let mut chapters = Vec::with_capacity(manifest.chapters.len());
    for (index, entry) in manifest.chapters.into_iter().enumerate() {
        let expected = index as u32 + 1;
        if entry.id != expected {
            bail!(
                "Chapter ids must be contiguous and 1-based: entry {} has id {}",
                index + 1,
                entry.id
            );
        }

        let text = match (entry.text, entry.text_file) {
            (Some(text), _) => text,
            (None, Some(file)) => {
                let file = resolve(base, file);
                fs::read_to_string(&file).with_context(|| {
                    format!(
                        "Failed to read text for chapter {} from {}",
                        entry.id,
                        file.display()
                    )
                })?
            }
            (None, None) => {
                bail!("Chapter {} has neither inline text nor a text_file", entry.id)
            }
        };

        debug!(chapter = entry.id, title = %entry.title, "Parsed chapter");
        chapters.push(Chapter {
            id: entry.id,
            title: entry.title,
            audio: resolve(base, entry.audio),
            text,
        });
    }

    Ok(Book {
        title: manifest.title,
        cover: manifest.cover.map(|cover| resolve(base, cover)),
        chapters,
    })
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

//! Per-book user-settings cache.
//!
//! Files are stored under `.cache/` using a hash of the book-manifest path as
//! the directory name to avoid filesystem issues. Only presentation settings
//! (theme, volume, speed) are cached; playback position is deliberately not
//! remembered across sessions.

use crate::config::ThemeMode;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

pub const CACHE_DIR: &str = ".cache";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BookSettings {
    pub theme: ThemeMode,
    pub volume: f32,
    pub playback_speed: f32,
}

/// Load cached settings for a given book, if present.
pub fn load_book_settings(book_path: &Path) -> Option<BookSettings> {
    let data = fs::read_to_string(settings_path(book_path)).ok()?;
    toml::from_str(&data).ok()
}

/// Persist settings for a given book. Errors are ignored to keep the UI
/// responsive.
pub fn save_book_settings(book_path: &Path, settings: &BookSettings) {
    let path = settings_path(book_path);
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if let Ok(contents) = toml::to_string(settings) {
        let _ = fs::write(path, contents);
    }
}

fn hash_dir(book_path: &Path) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(book_path.as_os_str().to_string_lossy().as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    Path::new(CACHE_DIR).join(hash)
}

fn settings_path(book_path: &Path) -> PathBuf {
    hash_dir(book_path).join("settings.toml")
}

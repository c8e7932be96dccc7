//! Chapter content lookup.
//!
//! The content pane is deliberately decoupled from playback: this is a pure
//! mapping from chapter id to the pre-authored text block, built once from
//! the book manifest. Unknown ids resolve to a fixed placeholder instead of
//! an error path.

use crate::book::Book;
use std::collections::HashMap;

/// Block shown when a chapter id has no authored content.
pub const NOT_FOUND_BLOCK: &str = "Chapter not found";

pub struct ContentLibrary {
    blocks: HashMap<u32, String>,
}

impl ContentLibrary {
    pub fn from_book(book: &Book) -> Self {
        let blocks = book
            .chapters
            .iter()
            .map(|chapter| (chapter.id, chapter.text.clone()))
            .collect();
        Self { blocks }
    }

    /// Total lookup: every id yields a displayable block.
    pub fn block_for(&self, chapter_id: u32) -> &str {
        self.blocks
            .get(&chapter_id)
            .map(String::as_str)
            .unwrap_or(NOT_FOUND_BLOCK)
    }
}

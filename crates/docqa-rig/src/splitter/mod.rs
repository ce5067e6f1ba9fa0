//! Page splitting into overlapping chunks.
//!
//! Two strategies are available:
//!
//! - [`ChunkStrategy::Window`]: fixed windows of `size` characters where
//!   consecutive chunks share exactly `overlap` characters;
//! - [`ChunkStrategy::Semantic`]: boundaries snap to sentences and words via
//!   `text-splitter`, still bounded by `size` characters.
//!
//! Chunks never span pages, so every chunk keeps a single page provenance.

mod window;

use docqa_core::config::{ChunkStrategy, ChunkingSettings};
use docqa_core::{Chunk, DocumentPage, Error, Result};
use text_splitter::{ChunkConfig, TextSplitter};

pub use self::window::windows;

/// Splits pages into [`Chunk`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    size: usize,
    overlap: usize,
    strategy: ChunkStrategy,
}

impl Chunker {
    /// Creates a chunker.
    ///
    /// Fails with `InvalidInput` unless `0 <= overlap < size`.
    pub fn new(size: usize, overlap: usize, strategy: ChunkStrategy) -> Result<Self> {
        if size == 0 {
            return Err(Error::invalid_input("chunk size must be greater than 0"));
        }
        if overlap >= size {
            return Err(Error::invalid_input(format!(
                "chunk overlap ({overlap}) must be smaller than chunk size ({size})"
            )));
        }

        Ok(Self {
            size,
            overlap,
            strategy,
        })
    }

    /// Creates a chunker from resolved settings.
    pub fn from_settings(settings: &ChunkingSettings) -> Result<Self> {
        Self::new(settings.size, settings.overlap, settings.strategy)
    }

    /// Maximum chunk length in characters.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Characters shared by consecutive window chunks.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Boundary strategy.
    pub fn strategy(&self) -> ChunkStrategy {
        self.strategy
    }

    /// Splits every page, preserving page order.
    pub fn split(&self, pages: &[DocumentPage]) -> Vec<Chunk> {
        pages.iter().flat_map(|page| self.split_page(page)).collect()
    }

    /// Splits a single page. Empty pages yield no chunks.
    pub fn split_page(&self, page: &DocumentPage) -> Vec<Chunk> {
        if page.text.is_empty() {
            return Vec::new();
        }

        let spans = match self.strategy {
            ChunkStrategy::Window => windows(&page.text, self.size, self.overlap),
            ChunkStrategy::Semantic => self.semantic(&page.text),
        };

        spans
            .into_iter()
            .enumerate()
            .map(|(index, (offset, text))| Chunk::new(page, text, offset, index))
            .collect()
    }

    fn semantic<'a>(&self, text: &'a str) -> Vec<(usize, &'a str)> {
        let config = match ChunkConfig::new(self.size).with_overlap(self.overlap) {
            Ok(config) => config.with_trim(true),
            // Unreachable: `new` already enforced `overlap < size`.
            Err(_) => return windows(text, self.size, self.overlap),
        };
        let splitter = TextSplitter::new(config);

        splitter
            .chunk_indices(text)
            .map(|(byte_offset, chunk)| (text[..byte_offset].chars().count(), chunk))
            .collect()
    }
}

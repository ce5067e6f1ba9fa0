//! Document pages, chunks and their provenance.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Metadata key holding the source document path.
pub const METADATA_SOURCE: &str = "source";
/// Metadata key holding the 0-based page number.
pub const METADATA_PAGE: &str = "page";
/// Metadata key holding the chunk text.
pub const METADATA_TEXT: &str = "text";
/// Metadata key holding the chunk's character offset within its page.
pub const METADATA_OFFSET: &str = "offset";

/// One page of text extracted from a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPage {
    /// Extracted page text. Empty for blank pages.
    pub text: String,
    /// Path of the source document relative to the ingested directory.
    pub source_path: String,
    /// 0-based page number.
    pub page_number: u32,
}

impl DocumentPage {
    /// Creates a new document page.
    pub fn new(text: impl Into<String>, source_path: impl Into<String>, page_number: u32) -> Self {
        Self {
            text: text.into(),
            source_path: source_path.into(),
            page_number,
        }
    }
}

/// A bounded substring of a page, tagged with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic identifier, see [`chunk_id`].
    pub id: String,
    /// Chunk text.
    pub text: String,
    /// Path of the source document relative to the ingested directory.
    pub source_path: String,
    /// 0-based page number.
    pub page_number: u32,
    /// Character offset of the chunk within its page.
    pub offset: usize,
    /// Position of the chunk within its page.
    pub index: usize,
}

impl Chunk {
    /// Creates a chunk of `page`, deriving its id from the provenance.
    pub fn new(page: &DocumentPage, text: impl Into<String>, offset: usize, index: usize) -> Self {
        Self {
            id: chunk_id(&page.source_path, page.page_number, offset),
            text: text.into(),
            source_path: page.source_path.clone(),
            page_number: page.page_number,
            offset,
            index,
        }
    }

    /// Returns the number of characters in the chunk.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Returns the metadata stored alongside the chunk's vector.
    pub fn metadata(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut metadata = serde_json::Map::new();
        metadata.insert(METADATA_SOURCE.into(), self.source_path.clone().into());
        metadata.insert(METADATA_PAGE.into(), self.page_number.into());
        metadata.insert(METADATA_TEXT.into(), self.text.clone().into());
        metadata.insert(METADATA_OFFSET.into(), self.offset.into());
        metadata
    }
}

/// Derives a chunk id from `(source_path, page_number, offset)`.
///
/// Re-ingesting the same documents yields the same ids, so upserts overwrite
/// existing records instead of duplicating them.
pub fn chunk_id(source_path: &str, page_number: u32, offset: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_path.as_bytes());
    hasher.update([0u8]);
    hasher.update(page_number.to_be_bytes());
    hasher.update([0u8]);
    hasher.update((offset as u64).to_be_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_is_deterministic() {
        assert_eq!(chunk_id("a.pdf", 0, 0), chunk_id("a.pdf", 0, 0));
        assert_eq!(chunk_id("a.pdf", 0, 0).len(), 32);
    }

    #[test]
    fn chunk_id_depends_on_provenance() {
        let base = chunk_id("a.pdf", 0, 0);
        assert_ne!(base, chunk_id("b.pdf", 0, 0));
        assert_ne!(base, chunk_id("a.pdf", 1, 0));
        assert_ne!(base, chunk_id("a.pdf", 0, 480));
    }

    #[test]
    fn chunk_metadata_carries_provenance() {
        let page = DocumentPage::new("Aspirin treats headaches.", "notes.pdf", 3);
        let chunk = Chunk::new(&page, page.text.clone(), 0, 0);
        let metadata = chunk.metadata();

        assert_eq!(metadata[METADATA_SOURCE], "notes.pdf");
        assert_eq!(metadata[METADATA_PAGE], 3);
        assert_eq!(metadata[METADATA_TEXT], "Aspirin treats headaches.");
        assert_eq!(chunk.char_len(), 25);
    }
}

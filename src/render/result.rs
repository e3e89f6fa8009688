//! Bundled projections of one document.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Chunk, Document};

use super::{chunks_to_markdown, ChunkProjector, RenderOptions};

/// Chunks plus the whole-document text and Markdown derived from them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectionResult {
    /// Canonical chunk list (empty, never absent, for a document without text)
    pub chunks: Vec<Chunk>,

    /// Plain text: blocks joined by blank lines
    pub text: String,

    /// Markdown rendering
    pub markdown: String,
}

impl ProjectionResult {
    /// Project a document with the given options.
    pub fn from_document(doc: &Document, options: &RenderOptions) -> Result<Self> {
        let chunks = ChunkProjector::new().project_selected(doc, options);
        let text = super::to_text(doc, options)?;
        let mut markdown = String::new();
        if options.include_frontmatter {
            markdown.push_str(&doc.metadata.to_yaml_frontmatter());
        }
        markdown.push_str(&chunks_to_markdown(&chunks, options));

        Ok(Self {
            chunks,
            text,
            markdown: markdown.trim().to_string(),
        })
    }

    /// Number of chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Check whether nothing was projected.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

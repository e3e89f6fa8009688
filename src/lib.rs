//! # relayout
//!
//! Layout reconstruction for scanned and digital documents.
//!
//! Given per-page output from a renderer (native text fragments plus a raster)
//! and an optional OCR engine, relayout rebuilds a geometric hierarchy of
//! tokens, lines, blocks, and semantic regions, and projects it onto flat,
//! grounded chunks, plain text, and Markdown.
//!
//! ## Quick Start
//!
//! ```no_run
//! use relayout::{reconstruct_file, render};
//!
//! fn main() -> relayout::Result<()> {
//!     // Reconstruct a recorded extraction dump
//!     let doc = reconstruct_file("document.json")?;
//!
//!     // Convert to Markdown
//!     let options = render::RenderOptions::default();
//!     let markdown = render::to_markdown(&doc, &options)?;
//!     println!("{}", markdown);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Two channels**: native text first, OCR only when native text is thin
//! - **Grounded chunks**: every chunk carries its page and normalized box
//! - **Coordinate utilities**: pixel, normalized, and percent boxes
//! - **Parallel processing**: pages run independently on Rayon
//! - **Graceful degradation**: OCR and page failures never abort a run

pub mod engine;
pub mod error;
pub mod model;
pub mod render;
pub mod source;

// Re-export commonly used types
pub use engine::{
    CancellationToken, LayoutOptions, NoOcr, OcrEngine, PageOrchestrator, PageSelection,
    PageSource, Progress, ProgressCallback,
};
pub use error::{Error, Result};
pub use model::{
    Block, BlockType, Chunk, ChunkType, Coverage, Document, Grounding, Line, Metadata,
    NormalizedBox, Page, PercentBox, PixelBox, SemanticRegion, Token,
};
pub use render::{ChunkProjector, JsonFormat, ProjectionResult, RenderOptions};
pub use source::DumpSource;

use std::path::Path;
use std::sync::Arc;

/// Reconstruct a document from a page source and an OCR engine.
///
/// # Example
///
/// ```no_run
/// use relayout::{reconstruct, DumpSource, LayoutOptions, NoOcr};
///
/// let source = DumpSource::open("document.json").unwrap();
/// let doc = reconstruct(&source, &NoOcr, LayoutOptions::default()).unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn reconstruct(
    source: &dyn PageSource,
    ocr: &dyn OcrEngine,
    options: LayoutOptions,
) -> Result<Document> {
    PageOrchestrator::new(source, ocr)
        .with_options(options)
        .run()
}

/// Reconstruct a recorded extraction dump, using its recorded OCR output.
///
/// # Arguments
///
/// * `path` - Path to the dump file
pub fn reconstruct_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    reconstruct_file_with_options(path, LayoutOptions::default())
}

/// Reconstruct a recorded extraction dump with custom options.
///
/// # Example
///
/// ```no_run
/// use relayout::{reconstruct_file_with_options, LayoutOptions};
///
/// let options = LayoutOptions::new()
///     .legacy_grouping()
///     .sequential();
/// let doc = reconstruct_file_with_options("document.json", options).unwrap();
/// ```
pub fn reconstruct_file_with_options<P: AsRef<Path>>(
    path: P,
    options: LayoutOptions,
) -> Result<Document> {
    let source = DumpSource::open(path)?;
    reconstruct(&source, &source, options)
}

/// Project a document onto chunks, text, and Markdown.
pub fn project(doc: &Document) -> Result<ProjectionResult> {
    ProjectionResult::from_document(doc, &RenderOptions::default())
}

/// Extract plain text from a dump file.
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = reconstruct_file(path)?;
    Ok(doc.plain_text())
}

/// Convert a dump file to Markdown.
///
/// # Example
///
/// ```no_run
/// use relayout::to_markdown;
///
/// let markdown = to_markdown("document.json").unwrap();
/// std::fs::write("output.md", markdown).unwrap();
/// ```
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = reconstruct_file(path)?;
    render::to_markdown(&doc, &RenderOptions::default())
}

/// Convert a dump file to plain text.
pub fn to_text<P: AsRef<Path>>(path: P, options: &RenderOptions) -> Result<String> {
    let doc = reconstruct_file(path)?;
    render::to_text(&doc, options)
}

/// Convert a dump file to the JSON layout IR.
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let doc = reconstruct_file(path)?;
    render::to_json(&doc, format)
}

/// Builder for reconstructing and projecting documents.
///
/// # Example
///
/// ```no_run
/// use relayout::Relayout;
///
/// let markdown = Relayout::new()
///     .legacy_grouping()
///     .with_frontmatter()
///     .sequential()
///     .open("document.json")?
///     .to_markdown()?;
/// # Ok::<(), relayout::Error>(())
/// ```
pub struct Relayout {
    layout_options: LayoutOptions,
    render_options: RenderOptions,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
}

impl Relayout {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            layout_options: LayoutOptions::default(),
            render_options: RenderOptions::default(),
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Replace the layout options.
    pub fn with_options(mut self, options: LayoutOptions) -> Self {
        self.layout_options = options;
        self
    }

    /// Use the looser row grouping for native-grade positions.
    pub fn legacy_grouping(mut self) -> Self {
        self.layout_options = self.layout_options.legacy_grouping();
        self
    }

    /// Infer headings and lists from geometry and text.
    pub fn infer_block_types(mut self) -> Self {
        self.layout_options = self.layout_options.infer_block_types();
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.layout_options = self.layout_options.sequential();
        self
    }

    /// Enable frontmatter in Markdown output.
    pub fn with_frontmatter(mut self) -> Self {
        self.render_options = self.render_options.with_frontmatter(true);
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.layout_options = self.layout_options.with_pages(pages);
        self
    }

    /// Share a cancellation token with the run.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Receive progress updates.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Reconstruct from explicit collaborators.
    pub fn run(self, source: &dyn PageSource, ocr: &dyn OcrEngine) -> Result<RelayoutResult> {
        let document = PageOrchestrator::new(source, ocr)
            .with_options(self.layout_options)
            .with_cancellation(self.cancel)
            .with_progress(self.progress)
            .run()?;
        Ok(RelayoutResult {
            document,
            render_options: self.render_options,
        })
    }

    /// Reconstruct a dump file.
    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<RelayoutResult> {
        let source = DumpSource::open(path)?;
        self.run(&source, &source)
    }
}

impl Default for Relayout {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a reconstruction run.
pub struct RelayoutResult {
    /// The reconstructed document
    pub document: Document,
    /// Render options to use
    render_options: RenderOptions,
}

impl RelayoutResult {
    /// Canonical chunk list.
    pub fn chunks(&self) -> Vec<Chunk> {
        ChunkProjector::new().project_selected(&self.document, &self.render_options)
    }

    /// Chunks, text, and Markdown in one bundle.
    pub fn projection(&self) -> Result<ProjectionResult> {
        ProjectionResult::from_document(&self.document, &self.render_options)
    }

    /// Convert to Markdown.
    pub fn to_markdown(&self) -> Result<String> {
        render::to_markdown(&self.document, &self.render_options)
    }

    /// Convert to plain text.
    pub fn to_text(&self) -> Result<String> {
        render::to_text(&self.document, &self.render_options)
    }

    /// Convert to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.document, format)
    }

    /// Chunk list as JSON.
    pub fn chunks_json(&self, format: JsonFormat) -> Result<String> {
        render::chunks_to_json(&self.chunks(), format)
    }

    /// Chunks in the flat legacy schema.
    pub fn legacy_chunks(&self) -> Vec<render::LegacyChunk> {
        render::to_legacy_chunks(&self.chunks(), &self.document)
    }

    /// Get the document.
    pub fn document(&self) -> &Document {
        &self.document
    }
}

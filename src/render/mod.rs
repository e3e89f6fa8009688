//! Projections of a reconstructed document: chunks, text, Markdown, JSON.

mod chunks;
mod json;
pub mod legacy;
mod markdown;
mod options;
mod result;
mod text;

pub use chunks::ChunkProjector;
pub use json::{chunks_to_json, to_json, JsonFormat};
pub use legacy::{to_legacy_chunks, LegacyChunk};
pub use markdown::{chunks_to_markdown, to_markdown, MarkdownRenderer};
pub use options::RenderOptions;
pub use result::ProjectionResult;
pub use text::to_text;

//! Layout model types.
//!
//! This module defines the intermediate representation (IR) produced by the
//! engine: tokens aggregate into lines, lines into blocks, blocks are tagged
//! by semantic regions, and pages assemble into a document. Chunks are the
//! flat projection consumed by search and UI layers.

mod chunk;
mod document;
pub mod geometry;
mod layout;
mod page;
mod token;

pub use chunk::{Chunk, ChunkType, Grounding};
pub use document::{Document, DocumentMetrics, Metadata};
pub use geometry::{NormalizedBox, PercentBox, PixelBox};
pub use layout::{Block, BlockId, BlockType, Line, RegionType, SemanticRegion};
pub use page::{Coverage, ExtractionMethod, Page, PageStatus};
pub use token::{avg_text_len, Channel, Token};

//! The flat legacy chunk schema, derived on demand from canonical chunks.
//!
//! Legacy consumers expect one record per grounding with a percent-space
//! `{x, y, w, h}` box and a pixel box for highlighting. Nothing here is
//! stored; it is recomputed from [`Chunk`]s every time.

use serde::{Deserialize, Serialize};

use crate::model::geometry::{to_percent, to_pixel};
use crate::model::{Chunk, Document, PercentBox, PixelBox};

/// One legacy chunk record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyChunk {
    /// Canonical chunk id, suffixed with the grounding index when a chunk
    /// has more than one grounding
    pub id: String,
    /// Text content
    pub text: String,
    /// Chunk type label
    #[serde(rename = "type")]
    pub chunk_type: String,
    /// 1-indexed page number
    pub page: u32,
    /// Box in page percentages
    #[serde(rename = "box")]
    pub bbox: PercentBox,
    /// Box in rendered pixels, when page dimensions are known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_box: Option<PixelBox>,
    /// Chunk confidence
    pub confidence: f64,
}

/// Project canonical chunks onto the legacy schema.
pub fn to_legacy_chunks(chunks: &[Chunk], doc: &Document) -> Vec<LegacyChunk> {
    let mut out = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let multi = chunk.groundings.len() > 1;
        for (i, grounding) in chunk.groundings.iter().enumerate() {
            let pixel_box = doc
                .get_page(grounding.page)
                .filter(|p| p.width_px > 0 && p.height_px > 0)
                .map(|p| {
                    let (w, h) = p.dimensions();
                    to_pixel(&grounding.bbox, w, h)
                });
            out.push(LegacyChunk {
                id: if multi {
                    format!("{}-g{}", chunk.id, i)
                } else {
                    chunk.id.clone()
                },
                text: chunk.text.clone(),
                chunk_type: chunk.chunk_type.label().to_string(),
                page: grounding.page,
                bbox: to_percent(&grounding.bbox),
                pixel_box,
                confidence: chunk.confidence,
            });
        }
    }
    out
}

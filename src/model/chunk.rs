//! The flat, externally consumed chunk representation.

use serde::{Deserialize, Serialize};

use super::{BlockType, NormalizedBox};

/// Projected chunk kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    /// Running text
    #[default]
    Text,
    /// Heading / title
    Title,
    /// A list
    List,
    /// A table
    Table,
    /// Figures, signatures, logos
    Figure,
    /// Page footer
    Footer,
    /// Page header
    Header,
    /// Form field
    FormField,
    /// Caption
    Caption,
}

impl ChunkType {
    /// Map a block label to a chunk type; unmapped labels become `Text`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "paragraph" | "line" => ChunkType::Text,
            "heading" => ChunkType::Title,
            "list" => ChunkType::List,
            "table" => ChunkType::Table,
            "image" | "signature" | "logo" => ChunkType::Figure,
            "footer" => ChunkType::Footer,
            "header" => ChunkType::Header,
            "form_field" => ChunkType::FormField,
            "caption" => ChunkType::Caption,
            _ => ChunkType::Text,
        }
    }

    /// Canonical snake_case label.
    pub fn label(&self) -> &'static str {
        match self {
            ChunkType::Text => "text",
            ChunkType::Title => "title",
            ChunkType::List => "list",
            ChunkType::Table => "table",
            ChunkType::Figure => "figure",
            ChunkType::Footer => "footer",
            ChunkType::Header => "header",
            ChunkType::FormField => "form_field",
            ChunkType::Caption => "caption",
        }
    }
}

impl From<BlockType> for ChunkType {
    fn from(ty: BlockType) -> Self {
        ChunkType::from_label(ty.label())
    }
}

/// Where a chunk's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grounding {
    /// 1-indexed page number
    pub page: u32,
    /// Source box in normalized coordinates
    #[serde(rename = "box")]
    pub bbox: NormalizedBox,
}

/// A terminal text unit with one or more groundings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique within a run
    pub id: String,
    /// Text content
    pub text: String,
    /// Projected type
    #[serde(rename = "type")]
    pub chunk_type: ChunkType,
    /// Source locations (at least one)
    pub groundings: Vec<Grounding>,
    /// Mean confidence of the source block
    pub confidence: f64,
    /// Free-form role tag, e.g. the enclosing region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_role: Option<String>,
}

impl Chunk {
    /// Page of the first grounding.
    pub fn page(&self) -> Option<u32> {
        self.groundings.first().map(|g| g.page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_type_mapping() {
        assert_eq!(ChunkType::from(BlockType::Paragraph), ChunkType::Text);
        assert_eq!(ChunkType::from(BlockType::Heading), ChunkType::Title);
        assert_eq!(ChunkType::from(BlockType::Image), ChunkType::Figure);
        assert_eq!(ChunkType::from(BlockType::Signature), ChunkType::Figure);
        assert_eq!(ChunkType::from(BlockType::Logo), ChunkType::Figure);
        assert_eq!(ChunkType::from(BlockType::FormField), ChunkType::FormField);
        assert_eq!(ChunkType::from(BlockType::Caption), ChunkType::Caption);
        assert_eq!(ChunkType::from_label("line"), ChunkType::Text);
        assert_eq!(ChunkType::from_label("marginalia"), ChunkType::Text);
    }

    #[test]
    fn test_chunk_serializes_type_field() {
        let chunk = Chunk {
            id: "p1-b0".to_string(),
            text: "Hello".to_string(),
            chunk_type: ChunkType::Title,
            groundings: vec![Grounding {
                page: 1,
                bbox: NormalizedBox::new(0.1, 0.1, 0.5, 0.15),
            }],
            confidence: 1.0,
            semantic_role: None,
        };
        let json = serde_json::to_string(&chunk).unwrap();
        assert!(json.contains("\"type\":\"title\""));
        assert!(json.contains("\"box\""));
        assert!(!json.contains("semantic_role"));
        assert_eq!(chunk.page(), Some(1));
    }
}

//! Lines, blocks, and semantic regions: the aggregation levels above tokens.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{NormalizedBox, Token};

/// Identifier of a block within its page (its reading order).
pub type BlockId = u32;

/// An ordered run of tokens sharing a visual row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Member tokens, left to right
    pub tokens: Vec<Token>,
    /// Merged text with word separators already inserted
    pub text: String,
    /// Union of the token boxes
    #[serde(rename = "box")]
    pub bbox: NormalizedBox,
    /// Position in the page's reading sequence
    pub reading_order: u32,
}

impl Line {
    /// Mean confidence of the member tokens (1.0 for an empty line).
    pub fn confidence(&self) -> f64 {
        if self.tokens.is_empty() {
            return 1.0;
        }
        self.tokens.iter().map(|t| t.confidence).sum::<f64>() / self.tokens.len() as f64
    }

    /// Number of whitespace-separated words.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// First block type hint carried by a member token.
    pub fn hint(&self) -> Option<BlockType> {
        self.tokens.iter().find_map(|t| t.hint)
    }
}

/// Coarse block classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    /// Running text
    #[default]
    Paragraph,
    /// A heading or title
    Heading,
    /// A list
    List,
    /// A table
    Table,
    /// An image or figure
    Image,
    /// Page footer
    Footer,
    /// Page header
    Header,
    /// A form field
    FormField,
    /// A signature
    Signature,
    /// A logo
    Logo,
    /// A caption
    Caption,
}

impl BlockType {
    /// Map a channel-supplied label to a block type.
    ///
    /// Labels are matched case-insensitively; unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let ty = match label.as_str() {
            "paragraph" | "text" => BlockType::Paragraph,
            "heading" | "title" | "section_header" => BlockType::Heading,
            "list" | "list_item" => BlockType::List,
            "table" => BlockType::Table,
            "image" | "figure" | "picture" => BlockType::Image,
            "footer" | "page_footer" => BlockType::Footer,
            "header" | "page_header" => BlockType::Header,
            "form_field" | "form" => BlockType::FormField,
            "signature" => BlockType::Signature,
            "logo" => BlockType::Logo,
            "caption" => BlockType::Caption,
            _ => return None,
        };
        Some(ty)
    }

    /// Canonical snake_case label.
    pub fn label(&self) -> &'static str {
        match self {
            BlockType::Paragraph => "paragraph",
            BlockType::Heading => "heading",
            BlockType::List => "list",
            BlockType::Table => "table",
            BlockType::Image => "image",
            BlockType::Footer => "footer",
            BlockType::Header => "header",
            BlockType::FormField => "form_field",
            BlockType::Signature => "signature",
            BlockType::Logo => "logo",
            BlockType::Caption => "caption",
        }
    }
}

/// An ordered run of lines forming a paragraph-like unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Member lines, top to bottom
    pub lines: Vec<Line>,
    /// Union of the line boxes
    #[serde(rename = "box")]
    pub bbox: NormalizedBox,
    /// Block classification
    #[serde(rename = "type")]
    pub block_type: BlockType,
    /// Mean of the line confidences
    pub confidence: f64,
    /// Position in the page's reading sequence
    pub reading_order: u32,
}

impl Block {
    /// Block text: line texts joined by newlines.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Identifier used by regions to reference this block.
    pub fn id(&self) -> BlockId {
        self.reading_order
    }

    /// Number of words across all lines.
    pub fn word_count(&self) -> usize {
        self.lines.iter().map(Line::word_count).sum()
    }

    /// Check if the block has no visible text.
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.text.trim().is_empty())
    }
}

/// Semantic region kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionType {
    /// Running header band
    Header,
    /// Running footer band
    Footer,
    /// Everything between the bands
    MainContent,
}

impl RegionType {
    /// Canonical snake_case label.
    pub fn label(&self) -> &'static str {
        match self {
            RegionType::Header => "header",
            RegionType::Footer => "footer",
            RegionType::MainContent => "main_content",
        }
    }
}

/// A coarse, position-derived grouping of blocks.
///
/// Regions reference blocks by id; they do not own them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticRegion {
    /// Region kind
    #[serde(rename = "type")]
    pub region_type: RegionType,
    /// Union of the referenced block boxes
    #[serde(rename = "box")]
    pub bbox: NormalizedBox,
    /// Fixed heuristic confidence
    pub confidence: f64,
    /// Referenced block ids
    pub block_ids: BTreeSet<BlockId>,
}

impl SemanticRegion {
    /// Check whether the region references a block.
    pub fn contains(&self, id: BlockId) -> bool {
        self.block_ids.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, conf: f64, order: u32) -> Line {
        let b = NormalizedBox::new(0.1, 0.1, 0.2, 0.12);
        Line {
            tokens: vec![Token::ocr(text, b, conf, 1)],
            text: text.to_string(),
            bbox: b,
            reading_order: order,
        }
    }

    #[test]
    fn test_block_type_labels() {
        assert_eq!(BlockType::from_label("Figure"), Some(BlockType::Image));
        assert_eq!(BlockType::from_label("page-header"), Some(BlockType::Header));
        assert_eq!(BlockType::from_label("form field"), Some(BlockType::FormField));
        assert_eq!(BlockType::from_label("sidebar"), None);
        assert_eq!(BlockType::default(), BlockType::Paragraph);

        for ty in [BlockType::Table, BlockType::Caption, BlockType::Logo] {
            assert_eq!(BlockType::from_label(ty.label()), Some(ty));
        }
    }

    #[test]
    fn test_block_text_joins_lines() {
        let block = Block {
            lines: vec![line("first line", 0.9, 0), line("second", 0.5, 1)],
            bbox: NormalizedBox::default(),
            block_type: BlockType::Paragraph,
            confidence: 0.7,
            reading_order: 0,
        };
        assert_eq!(block.text(), "first line\nsecond");
        assert_eq!(block.word_count(), 3);
        assert!(!block.is_empty());
    }

    #[test]
    fn test_line_confidence_is_mean() {
        let mut l = line("a", 0.4, 0);
        l.tokens.push(Token::ocr("b", NormalizedBox::default(), 0.8, 1));
        assert!((l.confidence() - 0.6).abs() < 1e-12);
    }
}

//! Block clustering: group ordered lines into paragraph-like blocks.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Block, BlockType, Line, NormalizedBox};

use super::options::BlockOptions;

/// Leading bullet or enumerator, e.g. "-", "•", "3.", "b)".
static RE_LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*•▪◦‣–]|\(?\d{1,3}[.)]|\(?[a-zA-Z][.)])\s+\S")
        .expect("valid list marker regex")
});

/// Groups lines into blocks by vertical gap.
#[derive(Debug, Clone, Default)]
pub struct BlockClusterer {
    options: BlockOptions,
}

impl BlockClusterer {
    /// Create a clusterer with the given options.
    pub fn new(options: BlockOptions) -> Self {
        Self { options }
    }

    /// Cluster lines (already in reading order) into blocks.
    ///
    /// A gap at or above the break threshold between the bottom of the open
    /// block's last line and the top of the next line always closes the
    /// block; a smaller gap always extends it.
    pub fn cluster(&self, lines: Vec<Line>) -> Vec<Block> {
        let median_height = median_line_height(&lines);
        let mut blocks: Vec<Block> = Vec::new();
        let mut current: Vec<Line> = Vec::new();

        for line in lines {
            if let Some(prev) = current.last() {
                let gap = line.bbox.top - prev.bbox.bottom;
                if gap >= self.options.block_break_threshold {
                    let order = blocks.len() as u32;
                    blocks.push(self.build(std::mem::take(&mut current), order, median_height));
                }
            }
            current.push(line);
        }

        if !current.is_empty() {
            let order = blocks.len() as u32;
            blocks.push(self.build(current, order, median_height));
        }

        blocks
    }

    fn build(&self, lines: Vec<Line>, reading_order: u32, median_height: f64) -> Block {
        let bbox = NormalizedBox::union_all(lines.iter().map(|l| &l.bbox)).unwrap_or_default();
        let confidence = if lines.is_empty() {
            1.0
        } else {
            lines.iter().map(Line::confidence).sum::<f64>() / lines.len() as f64
        };
        let block_type = self.classify(&lines, median_height);

        Block {
            lines,
            bbox,
            block_type,
            confidence,
            reading_order,
        }
    }

    /// Channel hints always win; otherwise paragraph unless inference is on.
    fn classify(&self, lines: &[Line], median_height: f64) -> BlockType {
        if let Some(hint) = lines.iter().find_map(Line::hint) {
            return hint;
        }
        if !self.options.infer_block_types {
            return BlockType::Paragraph;
        }

        if !lines.is_empty() && lines.iter().all(|l| RE_LIST_MARKER.is_match(&l.text)) {
            return BlockType::List;
        }

        if median_height > 0.0
            && lines.len() <= 2
            && lines
                .iter()
                .all(|l| l.bbox.height() > median_height * self.options.heading_height_ratio)
        {
            return BlockType::Heading;
        }

        BlockType::Paragraph
    }
}

/// Median line height on a page (0 when there are no lines).
fn median_line_height(lines: &[Line]) -> f64 {
    let mut heights: Vec<f64> = lines.iter().map(|l| l.bbox.height()).collect();
    if heights.is_empty() {
        return 0.0;
    }
    heights.sort_by(|a, b| a.total_cmp(b));
    let mid = heights.len() / 2;
    if heights.len() % 2 == 0 {
        (heights[mid - 1] + heights[mid]) / 2.0
    } else {
        heights[mid]
    }
}

//! Page-level types.

use serde::{Deserialize, Serialize};

use super::{Block, Line, SemanticRegion, Token};

/// Which channel a page's layout was finally built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Native text was sufficient (OCR not requested)
    Native,
    /// OCR output replaced the native text
    Ocr,
    /// OCR was requested but native text was kept
    NativePreferred,
    /// OCR failed; native text kept as a fallback
    NativeFallback,
    /// Nothing could be extracted (page failed to load)
    None,
}

/// Outcome of processing a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    /// All requested channels succeeded
    #[default]
    Ok,
    /// A channel failed and the page fell back to what was available
    Degraded,
    /// The page could not be loaded at all
    Failed,
}

/// Per-page channel accounting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    /// Accepted native tokens
    pub native_token_count: usize,
    /// Accepted OCR tokens (after the confidence filter)
    pub ocr_token_count: usize,
    /// Tokens in the selected set handed to clustering
    pub reconciled_token_count: usize,
    /// Selected tokens relative to the richer channel, in `[0, 100]`
    pub coverage_percent: f64,
    /// Tokens dropped at ingestion for bad geometry or empty text
    pub rejected_token_count: usize,
    /// Whether a channel failure forced a fallback
    pub degraded: bool,
}

impl Coverage {
    /// Coverage for a page that produced nothing.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Compute the percentage from the counts already set.
    pub fn with_computed_percent(mut self) -> Self {
        let best = self.native_token_count.max(self.ocr_token_count);
        self.coverage_percent = if best == 0 {
            0.0
        } else {
            (self.reconciled_token_count as f64 / best as f64 * 100.0).min(100.0)
        };
        self
    }
}

/// A single page of reconstructed layout (the IR).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Rendered width in pixels
    pub width_px: u32,

    /// Rendered height in pixels
    pub height_px: u32,

    /// Lines in reading order
    pub lines: Vec<Line>,

    /// Blocks in reading order
    pub blocks: Vec<Block>,

    /// Semantic regions referencing blocks
    pub regions: Vec<SemanticRegion>,

    /// Channel accounting
    pub coverage: Coverage,

    /// Channel the layout was built from
    pub method: ExtractionMethod,

    /// Processing outcome
    pub status: PageStatus,
}

impl Page {
    /// Create an empty page with the given pixel dimensions.
    pub fn new(number: u32, width_px: u32, height_px: u32) -> Self {
        Self {
            number,
            width_px,
            height_px,
            lines: Vec::new(),
            blocks: Vec::new(),
            regions: Vec::new(),
            coverage: Coverage::zero(),
            method: ExtractionMethod::Native,
            status: PageStatus::Ok,
        }
    }

    /// A page that could not be loaded: zero coverage, flagged failed.
    pub fn failed(number: u32) -> Self {
        Self {
            method: ExtractionMethod::None,
            status: PageStatus::Failed,
            ..Self::new(number, 0, 0)
        }
    }

    /// All tokens, reached through the lines that own them.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.lines.iter().flat_map(|l| l.tokens.iter())
    }

    /// Plain text: blocks joined by blank lines.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text())
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Check if the page has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Check if the page failed to load.
    pub fn is_failed(&self) -> bool {
        self.status == PageStatus::Failed
    }

    /// Get the number of blocks on the page.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Number of words across all lines.
    pub fn word_count(&self) -> usize {
        self.lines.iter().map(Line::word_count).sum()
    }

    /// Get page dimensions in pixels as (width, height).
    pub fn dimensions(&self) -> (f64, f64) {
        (self.width_px as f64, self.height_px as f64)
    }

    /// Check if the page is in landscape orientation.
    pub fn is_landscape(&self) -> bool {
        self.width_px > self.height_px
    }

    /// Find the region (if any) that references a block.
    pub fn region_of(&self, block: &Block) -> Option<&SemanticRegion> {
        self.regions.iter().find(|r| r.contains(block.id()))
    }
}

//! Layout options and configuration.
//!
//! Every clustering and arbitration threshold is a named field here. All
//! geometric thresholds are in normalized page units (fractions of the page
//! width or height).

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Line grouping thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LineOptions {
    /// Tokens whose tops differ by less than this share a row
    pub line_threshold: f64,
    /// Maximum horizontal gap between a line's right edge and the next token
    pub word_threshold: f64,
    /// Maximum height difference between a token and the line's reference token
    pub font_threshold: f64,
    /// Hard cap on merged line length in characters; a single longer token
    /// is kept whole as its own line
    pub max_line_chars: usize,
    /// Gaps at or below this are kerning: merged without a space
    pub kerning_threshold: f64,
}

impl LineOptions {
    /// Looser row grouping suited to native text positions.
    pub fn legacy() -> Self {
        Self {
            line_threshold: 0.02,
            ..Self::default()
        }
    }
}

impl Default for LineOptions {
    fn default() -> Self {
        Self {
            line_threshold: 0.012,
            word_threshold: 0.04,
            font_threshold: 0.005,
            max_line_chars: 500,
            kerning_threshold: 0.0015,
        }
    }
}

/// Block grouping thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BlockOptions {
    /// A vertical gap of at least this much starts a new block
    pub block_break_threshold: f64,
    /// Infer heading and list blocks from line shape and markers
    pub infer_block_types: bool,
    /// Line height ratio to the page median that marks a heading
    pub heading_height_ratio: f64,
}

impl Default for BlockOptions {
    fn default() -> Self {
        Self {
            block_break_threshold: 0.03,
            infer_block_types: false,
            heading_height_ratio: 1.4,
        }
    }
}

/// Header/footer band positions and fixed region confidences.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegionOptions {
    /// Bottom of the header band
    pub header_band: f64,
    /// Top of the footer band
    pub footer_band: f64,
    /// Confidence assigned to header regions
    pub header_confidence: f64,
    /// Confidence assigned to footer regions
    pub footer_confidence: f64,
    /// Confidence assigned to the main content region
    pub main_content_confidence: f64,
}

impl Default for RegionOptions {
    fn default() -> Self {
        Self {
            header_band: 0.20,
            footer_band: 0.80,
            header_confidence: 0.70,
            footer_confidence: 0.70,
            main_content_confidence: 0.80,
        }
    }
}

/// When to request OCR and when to prefer its output.
///
/// The ratio defaults are uncalibrated starting points.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArbiterOptions {
    /// Fewer native tokens than this triggers OCR
    pub min_native_tokens: usize,
    /// A mean native token length below this triggers OCR
    pub min_avg_text_len: f64,
    /// With more native tokens than this, at least one must be long
    pub dense_token_count: usize,
    /// Length a token must exceed to count as long
    pub long_token_len: usize,
    /// Symbol-to-visible-character ratio above which native text is suspect
    pub max_symbol_ratio: f64,
    /// OCR tokens at or below this confidence are discarded
    pub min_ocr_confidence: f64,
    /// OCR wins when its mean token length exceeds native by this factor
    pub ocr_avg_len_ratio: f64,
    /// OCR wins when its token count exceeds native by this factor
    pub ocr_count_ratio: f64,
}

impl Default for ArbiterOptions {
    fn default() -> Self {
        Self {
            min_native_tokens: 10,
            min_avg_text_len: 3.0,
            dense_token_count: 50,
            long_token_len: 20,
            max_symbol_ratio: 0.35,
            min_ocr_confidence: 0.30,
            ocr_avg_len_ratio: 1.2,
            ocr_count_ratio: 1.5,
        }
    }
}

/// Options for a reconstruction run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Line grouping
    pub lines: LineOptions,

    /// Block grouping
    pub blocks: BlockOptions,

    /// Region classification
    pub regions: RegionOptions,

    /// Channel arbitration
    pub arbiter: ArbiterOptions,

    /// Whether to process pages in parallel
    pub parallel: bool,

    /// Which pages to process
    #[serde(skip)]
    pub pages: PageSelection,

    /// Attempts to load a page before it is recorded as failed
    pub max_page_attempts: u32,
}

impl LayoutOptions {
    /// Create new layout options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set line options.
    pub fn with_line_options(mut self, lines: LineOptions) -> Self {
        self.lines = lines;
        self
    }

    /// Set block options.
    pub fn with_block_options(mut self, blocks: BlockOptions) -> Self {
        self.blocks = blocks;
        self
    }

    /// Set region options.
    pub fn with_region_options(mut self, regions: RegionOptions) -> Self {
        self.regions = regions;
        self
    }

    /// Set arbiter options.
    pub fn with_arbiter_options(mut self, arbiter: ArbiterOptions) -> Self {
        self.arbiter = arbiter;
        self
    }

    /// Use the looser row grouping for native-grade positions.
    pub fn legacy_grouping(mut self) -> Self {
        self.lines.line_threshold = LineOptions::legacy().line_threshold;
        self
    }

    /// Enable heading/list inference.
    pub fn infer_block_types(mut self) -> Self {
        self.blocks.infer_block_types = true;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Set the number of page load attempts (at least 1).
    pub fn with_max_page_attempts(mut self, attempts: u32) -> Self {
        self.max_page_attempts = attempts.max(1);
        self
    }

    /// Load options from a JSON document; missing fields keep defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: LayoutOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Reject thresholds that would make clustering meaningless.
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("lines.line_threshold", self.lines.line_threshold),
            ("lines.word_threshold", self.lines.word_threshold),
            ("lines.font_threshold", self.lines.font_threshold),
            ("lines.kerning_threshold", self.lines.kerning_threshold),
            ("blocks.block_break_threshold", self.blocks.block_break_threshold),
            ("blocks.heading_height_ratio", self.blocks.heading_height_ratio),
            ("arbiter.min_avg_text_len", self.arbiter.min_avg_text_len),
            ("arbiter.max_symbol_ratio", self.arbiter.max_symbol_ratio),
            ("arbiter.min_ocr_confidence", self.arbiter.min_ocr_confidence),
            ("arbiter.ocr_avg_len_ratio", self.arbiter.ocr_avg_len_ratio),
            ("arbiter.ocr_count_ratio", self.arbiter.ocr_count_ratio),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }

        let r = &self.regions;
        if !(0.0..=1.0).contains(&r.header_band)
            || !(0.0..=1.0).contains(&r.footer_band)
            || r.header_band > r.footer_band
        {
            return Err(Error::InvalidConfig(format!(
                "region bands must satisfy 0 <= header ({}) <= footer ({}) <= 1",
                r.header_band, r.footer_band
            )));
        }

        if self.lines.max_line_chars == 0 {
            return Err(Error::InvalidConfig(
                "lines.max_line_chars must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            lines: LineOptions::default(),
            blocks: BlockOptions::default(),
            regions: RegionOptions::default(),
            arbiter: ArbiterOptions::default(),
            parallel: true,
            pages: PageSelection::All,
            max_page_attempts: 2,
        }
    }
}

/// Page selection for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Process all pages
    #[default]
    All,
    /// Process a range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Process specific pages (1-indexed), in submission order
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Resolve the selection against a document, in submission order.
    ///
    /// Page numbers beyond `page_count` are dropped.
    pub fn resolve(&self, page_count: u32) -> Vec<u32> {
        match self {
            PageSelection::All => (1..=page_count).collect(),
            PageSelection::Range(range) => {
                ((*range.start()).max(1)..=(*range.end()).min(page_count)).collect()
            }
            PageSelection::Pages(pages) => {
                let mut seen = BTreeSet::new();
                pages
                    .iter()
                    .copied()
                    .filter(|&p| p >= 1 && p <= page_count && seen.insert(p))
                    .collect()
            }
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        let invalid = || Error::InvalidPageRange(s.to_string());

        // Simple range (e.g., "1-10")
        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let start: u32 = start.trim().parse().map_err(|_| invalid())?;
                let end: u32 = end.trim().parse().map_err(|_| invalid())?;
                if start == 0 || start > end {
                    return Err(invalid());
                }
                return Ok(PageSelection::Range(start..=end));
            }
        }

        // Comma-separated list with possible ranges
        let mut pages = BTreeSet::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                let start: u32 = start.trim().parse().map_err(|_| invalid())?;
                let end: u32 = end.trim().parse().map_err(|_| invalid())?;
                pages.extend(start..=end);
            } else {
                let p: u32 = part.parse().map_err(|_| invalid())?;
                pages.insert(p);
            }
        }

        if pages.contains(&0) {
            return Err(invalid());
        }
        Ok(PageSelection::Pages(pages.into_iter().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_options_builder() {
        let options = LayoutOptions::new()
            .legacy_grouping()
            .infer_block_types()
            .with_max_page_attempts(0)
            .sequential();

        assert_eq!(options.lines.line_threshold, 0.02);
        assert!(options.blocks.infer_block_types);
        assert_eq!(options.max_page_attempts, 1);
        assert!(!options.parallel);
    }

    #[test]
    fn test_default_options() {
        let options = LayoutOptions::default();
        assert!(options.parallel);
        assert_eq!(options.lines.line_threshold, 0.012);
        assert_eq!(options.lines.max_line_chars, 500);
        assert_eq!(options.blocks.block_break_threshold, 0.03);
        assert_eq!(options.arbiter.min_ocr_confidence, 0.30);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let options =
            LayoutOptions::from_json(r#"{"lines": {"word_threshold": 0.05}, "parallel": false}"#)
                .unwrap();
        assert_eq!(options.lines.word_threshold, 0.05);
        assert_eq!(options.lines.line_threshold, 0.012);
        assert!(!options.parallel);
    }

    #[test]
    fn test_validate_rejects_bad_bands() {
        let result = LayoutOptions::from_json(r#"{"regions": {"header_band": 0.9}}"#);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let mut options = LayoutOptions::default();
        options.lines.word_threshold = f64::NAN;
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_page_selection_includes() {
        let all = PageSelection::All;
        assert!(all.includes(1));
        assert!(all.includes(100));

        let range = PageSelection::Range(5..=10);
        assert!(!range.includes(4));
        assert!(range.includes(5));
        assert!(range.includes(10));
        assert!(!range.includes(11));

        let pages = PageSelection::Pages(vec![1, 3, 5, 7]);
        assert!(pages.includes(1));
        assert!(!pages.includes(2));
    }

    #[test]
    fn test_page_selection_parse() {
        assert_eq!(PageSelection::parse("all").unwrap(), PageSelection::All);
        assert_eq!(
            PageSelection::parse("1-10").unwrap(),
            PageSelection::Range(1..=10)
        );
        assert_eq!(
            PageSelection::parse("1,3,5-7,10").unwrap(),
            PageSelection::Pages(vec![1, 3, 5, 6, 7, 10])
        );
        assert!(PageSelection::parse("0-3").is_err());
        assert!(PageSelection::parse("x").is_err());
    }

    #[test]
    fn test_page_selection_resolve() {
        assert_eq!(PageSelection::All.resolve(3), vec![1, 2, 3]);
        assert_eq!(PageSelection::Range(2..=9).resolve(4), vec![2, 3, 4]);
        assert_eq!(
            PageSelection::Pages(vec![3, 1, 2, 3, 8]).resolve(3),
            vec![3, 1, 2]
        );
    }

    #[test]
    fn test_page_selection_large_inputs() {
        let PageSelection::Pages(pages) = PageSelection::parse("1,2-60000,5").unwrap() else {
            panic!("expected a page list");
        };
        assert_eq!(pages.len(), 60000);
        assert_eq!(pages.first(), Some(&1));
        assert_eq!(pages.last(), Some(&60000));

        assert_eq!(PageSelection::Range(0..=u32::MAX).resolve(3), vec![1, 2, 3]);
        assert!(PageSelection::Range(5..=u32::MAX).resolve(3).is_empty());
    }
}

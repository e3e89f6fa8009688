//! Document-level types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ExtractionMethod, Page, PageStatus};

/// A reconstructed document: pages ordered by page number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Document metadata
    pub metadata: Metadata,

    /// Pages sorted by page number
    pub pages: Vec<Page>,

    /// Aggregate metrics over all pages
    pub metrics: DocumentMetrics,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            metadata: Metadata::default(),
            pages: Vec::new(),
            metrics: DocumentMetrics::default(),
        }
    }

    /// Assemble a document from pages in any order.
    ///
    /// Pages are sorted by page number and metrics are recomputed.
    pub fn from_pages(metadata: Metadata, mut pages: Vec<Page>) -> Self {
        pages.sort_by_key(|p| p.number);
        let metrics = DocumentMetrics::from_pages(&pages);
        Self {
            metadata,
            pages,
            metrics,
        }
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by number (1-indexed).
    pub fn get_page(&self, page_num: u32) -> Option<&Page> {
        self.pages.iter().find(|p| p.number == page_num)
    }

    /// Add a page, keeping page order and metrics consistent.
    pub fn add_page(&mut self, page: Page) {
        let pos = self.pages.partition_point(|p| p.number < page.number);
        self.pages.insert(pos, page);
        self.metrics = DocumentMetrics::from_pages(&self.pages);
    }

    /// Check if the document has any pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.pages
            .iter()
            .map(|page| page.plain_text())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Source name (file name or caller-provided label)
    pub source: Option<String>,

    /// Document title, if the source provides one
    pub title: Option<String>,

    /// Total number of pages in the source
    pub page_count: u32,

    /// When the run finished
    pub processed_at: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Create metadata for a named source.
    pub fn with_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Default::default()
        }
    }

    /// Convert metadata to YAML frontmatter format.
    pub fn to_yaml_frontmatter(&self) -> String {
        let mut lines = vec!["---".to_string()];

        if let Some(ref title) = self.title {
            lines.push(format!("title: \"{}\"", escape_yaml(title)));
        }
        if let Some(ref source) = self.source {
            lines.push(format!("source: \"{}\"", escape_yaml(source)));
        }
        if let Some(ref processed) = self.processed_at {
            lines.push(format!("processed: {}", processed.to_rfc3339()));
        }
        lines.push(format!("pages: {}", self.page_count));

        lines.push("---".to_string());
        lines.push(String::new());

        lines.join("\n")
    }
}

/// Escape special characters for YAML strings.
fn escape_yaml(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Aggregate counts over a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetrics {
    /// Total words across all lines
    pub total_words: usize,
    /// Total lines
    pub total_lines: usize,
    /// Total blocks
    pub total_blocks: usize,
    /// Mean page coverage percent (failed pages count as 0)
    pub coverage_percent: f64,
    /// Distinct extraction methods used
    pub extraction_methods: BTreeSet<ExtractionMethod>,
    /// Pages that fell back after a channel failure
    pub degraded_pages: usize,
    /// Pages that could not be loaded
    pub failed_pages: usize,
}

impl DocumentMetrics {
    /// Compute metrics over a page set.
    pub fn from_pages(pages: &[Page]) -> Self {
        let mut metrics = DocumentMetrics::default();
        for page in pages {
            metrics.total_words += page.word_count();
            metrics.total_lines += page.lines.len();
            metrics.total_blocks += page.blocks.len();
            metrics.coverage_percent += page.coverage.coverage_percent;
            metrics.extraction_methods.insert(page.method);
            match page.status {
                PageStatus::Ok => {}
                PageStatus::Degraded => metrics.degraded_pages += 1,
                PageStatus::Failed => metrics.failed_pages += 1,
            }
        }
        if !pages.is_empty() {
            metrics.coverage_percent /= pages.len() as f64;
        }
        metrics
    }
}

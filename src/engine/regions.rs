//! Coarse header/footer/main-content tagging from block position alone.

use std::collections::BTreeSet;

use crate::model::{Block, NormalizedBox, RegionType, SemanticRegion};

use super::options::RegionOptions;

/// Tags blocks with position-derived regions.
///
/// This is a band heuristic, not a trained layout model: only the topmost
/// block can become a header and only the bottommost a footer.
#[derive(Debug, Clone, Default)]
pub struct SemanticRegionClassifier {
    options: RegionOptions,
}

impl SemanticRegionClassifier {
    /// Create a classifier with the given bands.
    pub fn new(options: RegionOptions) -> Self {
        Self { options }
    }

    /// Classify a page's blocks into zero or more regions.
    pub fn classify(&self, blocks: &[Block]) -> Vec<SemanticRegion> {
        let opts = &self.options;
        let mut sorted: Vec<&Block> = blocks.iter().collect();
        sorted.sort_by(|a, b| {
            a.bbox
                .top
                .total_cmp(&b.bbox.top)
                .then(a.reading_order.cmp(&b.reading_order))
        });

        let mut regions = Vec::new();

        if let Some(first) = sorted.first() {
            if first.bbox.top < opts.header_band {
                regions.push(region(RegionType::Header, [*first], opts.header_confidence));
            }
        }

        let main: Vec<&Block> = sorted
            .iter()
            .copied()
            .filter(|b| b.bbox.top > opts.header_band && b.bbox.bottom < opts.footer_band)
            .collect();
        if !main.is_empty() {
            regions.push(region(
                RegionType::MainContent,
                main,
                opts.main_content_confidence,
            ));
        }

        if let Some(last) = sorted.last() {
            if last.bbox.bottom > opts.footer_band {
                regions.push(region(RegionType::Footer, [*last], opts.footer_confidence));
            }
        }

        regions
    }
}

fn region<'a, I>(region_type: RegionType, blocks: I, confidence: f64) -> SemanticRegion
where
    I: IntoIterator<Item = &'a Block>,
{
    let blocks: Vec<&Block> = blocks.into_iter().collect();
    let bbox = NormalizedBox::union_all(blocks.iter().map(|b| &b.bbox)).unwrap_or_default();
    let block_ids: BTreeSet<_> = blocks.iter().map(|b| b.id()).collect();
    SemanticRegion {
        region_type,
        bbox,
        confidence,
        block_ids,
    }
}

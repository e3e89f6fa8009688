//! Projection of the layout IR onto flat chunks.

use crate::model::{Block, Chunk, ChunkType, Document, Grounding, Page};

use super::RenderOptions;

/// Projects pages onto the canonical chunk list.
///
/// Projection is pure: the same document always yields the same chunks, and
/// ids are derived from page number and block reading order, so pages
/// processed concurrently can never collide.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkProjector;

impl ChunkProjector {
    /// Create a projector.
    pub fn new() -> Self {
        Self
    }

    /// Chunk id for a block on a page.
    pub fn chunk_id(page: u32, block: &Block) -> String {
        format!("p{}-b{}", page, block.reading_order)
    }

    /// Project one page, in block reading order.
    pub fn project_page(&self, page: &Page) -> Vec<Chunk> {
        page.blocks
            .iter()
            .map(|block| Chunk {
                id: Self::chunk_id(page.number, block),
                text: block.text(),
                chunk_type: ChunkType::from(block.block_type),
                groundings: vec![Grounding {
                    page: page.number,
                    bbox: block.bbox,
                }],
                confidence: block.confidence,
                semantic_role: page
                    .region_of(block)
                    .map(|r| r.region_type.label().to_string()),
            })
            .collect()
    }

    /// Project a whole document, pages in page order.
    pub fn project_document(&self, doc: &Document) -> Vec<Chunk> {
        doc.pages
            .iter()
            .flat_map(|page| self.project_page(page))
            .collect()
    }

    /// Project only the pages selected in `options`.
    pub fn project_selected(&self, doc: &Document, options: &RenderOptions) -> Vec<Chunk> {
        doc.pages
            .iter()
            .filter(|p| options.page_selection.includes(p.number))
            .flat_map(|page| self.project_page(page))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PageSelection;
    use crate::model::{BlockType, Line, Metadata, NormalizedBox, RegionType, SemanticRegion, Token};
    use std::collections::BTreeSet;

    fn block(text: &str, ty: BlockType, order: u32, top: f64) -> Block {
        let bbox = NormalizedBox::new(0.1, top, 0.9, top + 0.05);
        let lines = text
            .split('\n')
            .map(|t| Line {
                tokens: vec![Token::native(t, bbox, 1)],
                text: t.to_string(),
                bbox,
                reading_order: order,
            })
            .collect();
        Block {
            lines,
            bbox,
            block_type: ty,
            confidence: 1.0,
            reading_order: order,
        }
    }

    fn page(number: u32) -> Page {
        let mut page = Page::new(number, 1000, 1000);
        page.blocks = vec![
            block("Report", BlockType::Heading, 0, 0.05),
            block("Body line one\nline two", BlockType::Paragraph, 1, 0.4),
            block("Logo", BlockType::Logo, 2, 0.6),
        ];
        page.regions = vec![SemanticRegion {
            region_type: RegionType::Header,
            bbox: page.blocks[0].bbox,
            confidence: 0.7,
            block_ids: BTreeSet::from([0]),
        }];
        page
    }

    #[test]
    fn test_project_page() {
        let chunks = ChunkProjector::new().project_page(&page(2));
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].id, "p2-b0");
        assert_eq!(chunks[0].chunk_type, ChunkType::Title);
        assert_eq!(chunks[0].semantic_role.as_deref(), Some("header"));
        assert_eq!(chunks[1].text, "Body line one\nline two");
        assert_eq!(chunks[1].semantic_role, None);
        assert_eq!(chunks[2].chunk_type, ChunkType::Figure);
        assert_eq!(chunks[2].groundings[0].page, 2);
        assert_eq!(chunks[2].groundings[0].bbox, page(2).blocks[2].bbox);
    }

    #[test]
    fn test_document_ids_unique() {
        let doc = Document::from_pages(Metadata::default(), vec![page(2), page(1)]);
        let chunks = ChunkProjector::new().project_document(&doc);
        let ids: BTreeSet<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), chunks.len());
        assert_eq!(chunks[0].id, "p1-b0");
    }

    #[test]
    fn test_project_selected() {
        let doc = Document::from_pages(Metadata::default(), vec![page(1), page(2), page(3)]);
        let options = RenderOptions::default().with_pages(PageSelection::Pages(vec![2]));
        let chunks = ChunkProjector::new().project_selected(&doc, &options);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.page() == Some(2)));
    }

    #[test]
    fn test_empty_page_projects_to_empty_list() {
        let chunks = ChunkProjector::new().project_page(&Page::failed(1));
        assert!(chunks.is_empty());
    }
}

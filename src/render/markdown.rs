//! Markdown rendering of the chunk projection.

use crate::error::Result;
use crate::model::{Chunk, ChunkType, Document};

use super::{ChunkProjector, RenderOptions};

/// Convert a document to Markdown.
pub fn to_markdown(doc: &Document, options: &RenderOptions) -> Result<String> {
    MarkdownRenderer::new(options.clone()).render(doc)
}

/// Render already projected chunks to Markdown (no frontmatter).
pub fn chunks_to_markdown(chunks: &[Chunk], options: &RenderOptions) -> String {
    MarkdownRenderer::new(options.clone()).render_chunks(chunks)
}

/// Markdown renderer.
///
/// Titles become `#` headings, header chunks `##` headings, list chunks one
/// marker-prefixed line per item; everything else is emitted verbatim.
pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render a document to Markdown.
    pub fn render(&self, doc: &Document) -> Result<String> {
        let mut output = String::new();

        if self.options.include_frontmatter {
            output.push_str(&doc.metadata.to_yaml_frontmatter());
        }

        let chunks = ChunkProjector::new().project_selected(doc, &self.options);
        output.push_str(&self.render_chunks(&chunks));

        Ok(output.trim().to_string())
    }

    /// Render chunks, separated by blank lines.
    pub fn render_chunks(&self, chunks: &[Chunk]) -> String {
        let mut output = String::new();
        for chunk in chunks {
            if chunk.text.trim().is_empty() {
                continue;
            }
            self.render_chunk(&mut output, chunk);
        }
        output.trim_end().to_string()
    }

    fn render_chunk(&self, output: &mut String, chunk: &Chunk) {
        match chunk.chunk_type {
            ChunkType::Title => {
                output.push_str("# ");
                output.push_str(&single_line(&chunk.text));
            }
            ChunkType::Header => {
                output.push_str("## ");
                output.push_str(&single_line(&chunk.text));
            }
            ChunkType::List => self.render_list(output, &chunk.text),
            _ => output.push_str(&chunk.text),
        }
        output.push_str("\n\n");
    }

    fn render_list(&self, output: &mut String, text: &str) {
        let items: Vec<&str> = text
            .lines()
            .map(strip_marker)
            .filter(|item| !item.is_empty())
            .collect();
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                output.push('\n');
            }
            output.push(self.options.list_marker);
            output.push(' ');
            output.push_str(item);
        }
    }
}

/// Headings must stay on one line.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop a bullet the source already carried so items are not double-marked.
fn strip_marker(item: &str) -> &str {
    let item = item.trim();
    for bullet in ['-', '*', '•', '▪', '◦', '‣'] {
        if let Some(rest) = item.strip_prefix(bullet) {
            if rest.starts_with(char::is_whitespace) {
                return rest.trim_start();
            }
        }
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Grounding, Metadata, NormalizedBox};

    fn chunk(text: &str, ty: ChunkType) -> Chunk {
        Chunk {
            id: "p1-b0".to_string(),
            text: text.to_string(),
            chunk_type: ty,
            groundings: vec![Grounding {
                page: 1,
                bbox: NormalizedBox::default(),
            }],
            confidence: 1.0,
            semantic_role: None,
        }
    }

    #[test]
    fn test_title_and_header() {
        let md = chunks_to_markdown(
            &[
                chunk("Annual\nReport", ChunkType::Title),
                chunk("Section", ChunkType::Header),
                chunk("Body text", ChunkType::Text),
            ],
            &RenderOptions::default(),
        );
        assert_eq!(md, "# Annual Report\n\n## Section\n\nBody text");
    }

    #[test]
    fn test_list_items() {
        let md = chunks_to_markdown(
            &[chunk("apples\n• pears\n\n- plums", ChunkType::List)],
            &RenderOptions::default(),
        );
        assert_eq!(md, "- apples\n- pears\n- plums");

        let md = chunks_to_markdown(
            &[chunk("one", ChunkType::List)],
            &RenderOptions::default().with_list_marker('*'),
        );
        assert_eq!(md, "* one");
    }

    #[test]
    fn test_other_types_verbatim() {
        let md = chunks_to_markdown(
            &[
                chunk("| a | b |", ChunkType::Table),
                chunk("Page 3", ChunkType::Footer),
            ],
            &RenderOptions::default(),
        );
        assert_eq!(md, "| a | b |\n\nPage 3");
    }

    #[test]
    fn test_frontmatter() {
        let mut doc = Document::new();
        doc.metadata = Metadata::with_source("scan.json");
        let md = to_markdown(&doc, &RenderOptions::default().with_frontmatter(true)).unwrap();
        assert!(md.starts_with("---"));
        assert!(md.contains("source: \"scan.json\""));
    }

    #[test]
    fn test_empty_document() {
        let md = to_markdown(&Document::new(), &RenderOptions::default()).unwrap();
        assert!(md.is_empty());
    }
}

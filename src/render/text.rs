//! Plain text rendering.

use crate::error::Result;
use crate::model::Document;

use super::RenderOptions;

/// Convert a document to plain text.
///
/// Blocks are joined by blank lines, in page order then reading order.
pub fn to_text(doc: &Document, options: &RenderOptions) -> Result<String> {
    let output = doc
        .pages
        .iter()
        .filter(|p| options.page_selection.includes(p.number))
        .map(|p| p.plain_text())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(output.trim().to_string())
}

//! Token ingestion: pixel-space channel output into normalized tokens.
//!
//! Geometry anomalies are filtered here so they never reach clustering.
//! Boxes that merely straddle the page edge are clamped; boxes that are
//! non-finite, inverted, or entirely off the page are rejected.

use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::model::geometry::to_normalized;
use crate::model::{BlockType, NormalizedBox, PixelBox, Token};

use super::collaborator::{NativeToken, OcrOutput};

/// Page-level confidence assumed for whole-page OCR text without a score.
const DEFAULT_PAGE_TEXT_CONFIDENCE: f64 = 50.0;

/// Tokens accepted from one channel, plus the number rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ingested {
    /// Accepted tokens in channel order
    pub tokens: Vec<Token>,
    /// Fragments dropped for bad geometry or empty text
    pub rejected: usize,
}

/// Which OCR granularity an output was ingested at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrGranularity {
    /// Word boxes
    Word,
    /// Line boxes
    Line,
    /// Whole-page text without geometry
    Page,
    /// Nothing usable
    Empty,
}

/// Convert a pixel box to a token box, rejecting anomalies.
pub fn token_box(b: &PixelBox, page_width: f64, page_height: f64) -> Result<NormalizedBox> {
    if !(page_width > 0.0 && page_height > 0.0) {
        return Err(Error::InvalidGeometry(format!(
            "page has no area ({}x{})",
            page_width, page_height
        )));
    }
    let coords = [b.left, b.top, b.right, b.bottom];
    if coords.iter().any(|c| !c.is_finite()) {
        return Err(Error::InvalidGeometry(format!("non-finite box {:?}", b)));
    }
    if b.right < b.left || b.bottom < b.top {
        return Err(Error::InvalidGeometry(format!("inverted box {:?}", b)));
    }
    if b.right < 0.0 || b.bottom < 0.0 || b.left > page_width || b.top > page_height {
        return Err(Error::InvalidGeometry(format!("box off page {:?}", b)));
    }
    Ok(to_normalized(b, page_width, page_height))
}

/// NFC-normalize and trim token text.
pub fn normalize_text(text: &str) -> String {
    text.nfc().collect::<String>().trim().to_string()
}

/// Ingest native tokens for one page.
pub fn ingest_native(
    tokens: &[NativeToken],
    page: u32,
    page_width: f64,
    page_height: f64,
) -> Ingested {
    let mut out = Ingested::default();
    for raw in tokens {
        let text = normalize_text(&raw.text);
        if text.is_empty() {
            out.rejected += 1;
            continue;
        }
        match token_box(&raw.bbox, page_width, page_height) {
            Ok(bbox) => {
                let mut token = Token::native(text, bbox, page);
                token.hint = raw.hint.as_deref().and_then(BlockType::from_label);
                out.tokens.push(token);
            }
            Err(e) => {
                log::debug!("page {}: rejected native token {:?}: {}", page, raw.text, e);
                out.rejected += 1;
            }
        }
    }
    out
}

/// Ingest OCR output for one page at the finest granularity that yields tokens.
///
/// A granularity whose fragments are all rejected falls through to the next
/// coarser one; rejections still count toward `rejected`.
pub fn ingest_ocr(
    output: &OcrOutput,
    page: u32,
    page_width: f64,
    page_height: f64,
) -> (Ingested, OcrGranularity) {
    let mut out = Ingested::default();

    if !output.words.is_empty() {
        for word in &output.words {
            let hint = word.hint.as_deref().and_then(BlockType::from_label);
            push_ocr(
                &mut out,
                &word.text,
                &word.bbox,
                word.confidence,
                hint,
                page,
                (page_width, page_height),
            );
        }
        if !out.tokens.is_empty() {
            return (out, OcrGranularity::Word);
        }
        log::debug!("page {}: every OCR word rejected, falling back to lines", page);
    }

    if !output.lines.is_empty() {
        for line in &output.lines {
            push_ocr(
                &mut out,
                &line.text,
                &line.bbox,
                line.confidence,
                None,
                page,
                (page_width, page_height),
            );
        }
        if !out.tokens.is_empty() {
            return (out, OcrGranularity::Line);
        }
    }

    if let Some(text) = output.text.as_deref() {
        let text = normalize_text(text);
        if !text.is_empty() {
            let confidence = output.confidence.unwrap_or(DEFAULT_PAGE_TEXT_CONFIDENCE) / 100.0;
            out.tokens.push(Token::ocr(
                text,
                NormalizedBox::full_page(),
                confidence,
                page,
            ));
            return (out, OcrGranularity::Page);
        }
    }

    (out, OcrGranularity::Empty)
}

fn push_ocr(
    out: &mut Ingested,
    text: &str,
    bbox: &PixelBox,
    confidence: f64,
    hint: Option<BlockType>,
    page: u32,
    (page_width, page_height): (f64, f64),
) {
    let text = normalize_text(text);
    if text.is_empty() || !confidence.is_finite() {
        out.rejected += 1;
        return;
    }
    match token_box(bbox, page_width, page_height) {
        Ok(b) => {
            let mut token = Token::ocr(text, b, confidence / 100.0, page);
            token.hint = hint;
            out.tokens.push(token);
        }
        Err(e) => {
            log::debug!("page {}: rejected OCR fragment {:?}: {}", page, text, e);
            out.rejected += 1;
        }
    }
}

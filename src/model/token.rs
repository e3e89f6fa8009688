//! Word-level tokens from the two extraction channels.

use serde::{Deserialize, Serialize};

use super::{BlockType, NormalizedBox};

/// The extraction channel a token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Vector text embedded in the document
    Native,
    /// Optical character recognition over the rendered page
    Ocr,
}

/// The smallest positioned text unit.
///
/// Tokens are created once per page run and never mutated; clustering only
/// moves them into a [`Line`](super::Line).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Text content (NFC-normalized, trimmed)
    pub text: String,
    /// Position on the page
    #[serde(rename = "box")]
    pub bbox: NormalizedBox,
    /// Recognition confidence in `[0, 1]`; 1.0 for native text
    pub confidence: f64,
    /// Channel that produced the token
    pub source: Channel,
    /// 1-indexed page number
    pub page: u32,
    /// Block type suggested by the channel, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<BlockType>,
}

impl Token {
    /// Create a native token (confidence 1.0).
    pub fn native(text: impl Into<String>, bbox: NormalizedBox, page: u32) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence: 1.0,
            source: Channel::Native,
            page,
            hint: None,
        }
    }

    /// Create an OCR token with a confidence in `[0, 1]`.
    pub fn ocr(text: impl Into<String>, bbox: NormalizedBox, confidence: f64, page: u32) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence: confidence.clamp(0.0, 1.0),
            source: Channel::Ocr,
            page,
            hint: None,
        }
    }

    /// Number of characters in the token text.
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Mean character count over a token set (0 for an empty set).
pub fn avg_text_len(tokens: &[Token]) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    let total: usize = tokens.iter().map(Token::text_len).sum();
    total as f64 / tokens.len() as f64
}

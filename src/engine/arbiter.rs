//! Channel arbitration: decide per page whether native text suffices,
//! request OCR when it does not, and pick the better token set.

use std::fmt;

use crate::error::Result;
use crate::model::{avg_text_len, Coverage, ExtractionMethod, Token};

use super::options::ArbiterOptions;

/// Why native text was judged insufficient.
#[derive(Debug, Clone, PartialEq)]
pub enum OcrTrigger {
    /// Too few native tokens
    TooFewTokens(usize),
    /// Native tokens are suspiciously short on average
    ShortTokens(f64),
    /// Many tokens but none of them long (character-by-character extraction)
    NoLongTokens(usize),
    /// Native text is dominated by symbols (broken font encoding)
    SymbolHeavy(f64),
}

impl fmt::Display for OcrTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OcrTrigger::TooFewTokens(n) => write!(f, "only {} native tokens", n),
            OcrTrigger::ShortTokens(avg) => write!(f, "mean native token length {:.2}", avg),
            OcrTrigger::NoLongTokens(n) => write!(f, "{} native tokens, none long", n),
            OcrTrigger::SymbolHeavy(ratio) => write!(f, "symbol ratio {:.2}", ratio),
        }
    }
}

/// The selected token set for a page and how it was chosen.
#[derive(Debug, Clone, PartialEq)]
pub struct Arbitration {
    /// Tokens handed to clustering
    pub tokens: Vec<Token>,
    /// Channel accounting
    pub coverage: Coverage,
    /// Which channel won
    pub method: ExtractionMethod,
}

/// Chooses between the native and OCR channels for one page.
#[derive(Debug, Clone, Default)]
pub struct ChannelArbiter {
    options: ArbiterOptions,
}

impl ChannelArbiter {
    /// Create an arbiter with the given thresholds.
    pub fn new(options: ArbiterOptions) -> Self {
        Self { options }
    }

    /// Decide whether native tokens warrant an OCR pass.
    pub fn ocr_trigger(&self, native: &[Token]) -> Option<OcrTrigger> {
        let opts = &self.options;

        if native.len() < opts.min_native_tokens {
            return Some(OcrTrigger::TooFewTokens(native.len()));
        }

        let avg = avg_text_len(native);
        if avg < opts.min_avg_text_len {
            return Some(OcrTrigger::ShortTokens(avg));
        }

        if native.len() > opts.dense_token_count
            && !native.iter().any(|t| t.text_len() > opts.long_token_len)
        {
            return Some(OcrTrigger::NoLongTokens(native.len()));
        }

        let ratio = symbol_ratio(native);
        if ratio > opts.max_symbol_ratio {
            return Some(OcrTrigger::SymbolHeavy(ratio));
        }

        None
    }

    /// Drop OCR tokens that are low-confidence or blank.
    pub fn accept_ocr(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens
            .into_iter()
            .filter(|t| t.confidence > self.options.min_ocr_confidence && !t.text.trim().is_empty())
            .collect()
    }

    /// Whether accepted OCR tokens beat the native set.
    pub fn prefer_ocr(&self, native: &[Token], ocr: &[Token]) -> bool {
        let opts = &self.options;
        avg_text_len(ocr) > avg_text_len(native) * opts.ocr_avg_len_ratio
            || ocr.len() as f64 > native.len() as f64 * opts.ocr_count_ratio
    }

    /// Select the token set for a page.
    ///
    /// `request_ocr` is invoked at most once, and only when native text is
    /// insufficient. A failed request keeps the native tokens and marks the
    /// coverage degraded instead of propagating the error.
    pub fn arbitrate<F>(&self, page: u32, native: Vec<Token>, request_ocr: F) -> Arbitration
    where
        F: FnOnce() -> Result<Vec<Token>>,
    {
        let trigger = match self.ocr_trigger(&native) {
            Some(trigger) => trigger,
            None => {
                log::debug!("page {}: native text sufficient ({} tokens)", page, native.len());
                return native_only(native, ExtractionMethod::Native, false);
            }
        };

        log::debug!("page {}: requesting OCR ({})", page, trigger);

        let ocr = match request_ocr() {
            Ok(tokens) => self.accept_ocr(tokens),
            Err(e) => {
                log::warn!("page {}: OCR failed, keeping native text: {}", page, e);
                return native_only(native, ExtractionMethod::NativeFallback, true);
            }
        };

        let native_count = native.len();
        let ocr_count = ocr.len();
        let (tokens, method) = if self.prefer_ocr(&native, &ocr) {
            (ocr, ExtractionMethod::Ocr)
        } else {
            (native, ExtractionMethod::NativePreferred)
        };

        log::debug!(
            "page {}: {:?} selected (native {}, ocr {})",
            page,
            method,
            native_count,
            ocr_count
        );

        let coverage = Coverage {
            native_token_count: native_count,
            ocr_token_count: ocr_count,
            reconciled_token_count: tokens.len(),
            ..Default::default()
        }
        .with_computed_percent();

        Arbitration {
            tokens,
            coverage,
            method,
        }
    }
}

fn native_only(native: Vec<Token>, method: ExtractionMethod, degraded: bool) -> Arbitration {
    let coverage = Coverage {
        native_token_count: native.len(),
        reconciled_token_count: native.len(),
        degraded,
        ..Default::default()
    }
    .with_computed_percent();
    Arbitration {
        tokens: native,
        coverage,
        method,
    }
}

/// Fraction of visible characters that are neither letters nor digits.
fn symbol_ratio(tokens: &[Token]) -> f64 {
    let mut visible = 0usize;
    let mut symbols = 0usize;
    for c in tokens.iter().flat_map(|t| t.text.chars()) {
        if c.is_whitespace() {
            continue;
        }
        visible += 1;
        if !c.is_alphanumeric() {
            symbols += 1;
        }
    }
    if visible == 0 {
        0.0
    } else {
        symbols as f64 / visible as f64
    }
}

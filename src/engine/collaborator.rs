//! Interfaces to the external page renderer and OCR engine.
//!
//! Both collaborators work in pixel space. Page indices passed to
//! [`PageSource::load_page`] are 0-based; every page number in the model is
//! 1-based.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::PixelBox;

/// An opaque rendered page image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RasterImage {
    /// 0-based index of the page the raster was rendered from
    #[serde(default)]
    pub page_index: usize,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Encoded or raw pixel data, interpreted only by the OCR engine
    #[serde(default)]
    pub data: Vec<u8>,
}

/// A positioned text fragment from the native (vector text) channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeToken {
    /// Text content
    pub text: String,
    /// Position in rendered pixels
    #[serde(rename = "box")]
    pub bbox: PixelBox,
    /// Optional block type label (e.g. "table")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl NativeToken {
    /// Create a native token.
    pub fn new(text: impl Into<String>, bbox: PixelBox) -> Self {
        Self {
            text: text.into(),
            bbox,
            hint: None,
        }
    }
}

/// What the renderer produces for one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderedPage {
    /// Rendered width in pixels
    pub pixel_width: u32,
    /// Rendered height in pixels
    pub pixel_height: u32,
    /// Native text fragments (possibly empty)
    #[serde(default)]
    pub native_tokens: Vec<NativeToken>,
    /// Raster handed to OCR
    #[serde(default)]
    pub image: RasterImage,
}

/// A recognized word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    /// Recognized text
    pub text: String,
    /// Confidence in `[0, 100]`
    pub confidence: f64,
    /// Position in rendered pixels
    #[serde(rename = "bbox")]
    pub bbox: PixelBox,
    /// Optional layout label from the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// A recognized line, used when word boxes are unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    /// Recognized text
    pub text: String,
    /// Confidence in `[0, 100]`
    pub confidence: f64,
    /// Position in rendered pixels
    #[serde(rename = "bbox")]
    pub bbox: PixelBox,
}

/// OCR output at up to three granularities.
///
/// Consumers prefer words, then lines, then the whole-page text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrOutput {
    /// Word-level results
    #[serde(default)]
    pub words: Vec<OcrWord>,
    /// Line-level results
    #[serde(default)]
    pub lines: Vec<OcrLine>,
    /// Whole-page text
    #[serde(default)]
    pub text: Option<String>,
    /// Page-level confidence in `[0, 100]`
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl OcrOutput {
    /// Check whether the output carries anything at any granularity.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
            && self.lines.is_empty()
            && self.text.as_deref().map_or(true, |t| t.trim().is_empty())
    }
}

/// Produces per-page geometry, native text, and raster images.
pub trait PageSource: Send + Sync {
    /// Total number of pages in the source.
    fn page_count(&self) -> usize;

    /// Load one page (0-based index).
    fn load_page(&self, index: usize) -> Result<RenderedPage>;

    /// Human-readable source name for metadata.
    fn name(&self) -> Option<String> {
        None
    }

    /// Document title, if the source knows one.
    fn title(&self) -> Option<String> {
        None
    }
}

/// Cooperative cancellation flag shared between a run and its caller.
///
/// The orchestrator hands the run's token to [`OcrEngine::recognize_cancellable`]
/// so a long recognition can be abandoned mid-call.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Recognizes text in a page raster.
pub trait OcrEngine: Send + Sync {
    /// Run recognition over one image.
    fn recognize(&self, image: &RasterImage) -> Result<OcrOutput>;

    /// Run recognition, giving up once `cancel` is set.
    ///
    /// Engines that can poll between stages should override this and return
    /// an error as soon as the token fires. The default runs `recognize` to
    /// completion.
    fn recognize_cancellable(
        &self,
        image: &RasterImage,
        cancel: &CancellationToken,
    ) -> Result<OcrOutput> {
        if cancel.is_cancelled() {
            return Err(Error::Ocr("recognition cancelled".to_string()));
        }
        self.recognize(image)
    }
}

/// An OCR engine that is never available; every page stays native-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOcr;

impl OcrEngine for NoOcr {
    fn recognize(&self, _image: &RasterImage) -> Result<OcrOutput> {
        Err(Error::Ocr("no OCR engine configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_ocr_fails() {
        let result = NoOcr.recognize(&RasterImage::default());
        assert!(matches!(result, Err(Error::Ocr(_))));
    }

    #[test]
    fn test_default_recognize_honors_prior_cancel() {
        struct Blank;

        impl OcrEngine for Blank {
            fn recognize(&self, _image: &RasterImage) -> Result<OcrOutput> {
                Ok(OcrOutput::default())
            }
        }

        let token = CancellationToken::new();
        assert!(Blank.recognize_cancellable(&RasterImage::default(), &token).is_ok());
        token.cancel();
        assert!(matches!(
            Blank.recognize_cancellable(&RasterImage::default(), &token),
            Err(Error::Ocr(_))
        ));
    }

    #[test]
    fn test_ocr_output_is_empty() {
        assert!(OcrOutput::default().is_empty());
        let out = OcrOutput {
            text: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(out.is_empty());
        let out = OcrOutput {
            text: Some("page text".to_string()),
            ..Default::default()
        };
        assert!(!out.is_empty());
    }

    #[test]
    fn test_rendered_page_from_json() {
        let page: RenderedPage = serde_json::from_str(
            r#"{"pixel_width": 100, "pixel_height": 200,
                "native_tokens": [{"text": "Hi", "box": {"left": 1, "top": 2, "right": 10, "bottom": 8}}]}"#,
        )
        .unwrap();
        assert_eq!(page.native_tokens.len(), 1);
        assert_eq!(page.native_tokens[0].bbox.right, 10.0);
        assert!(page.image.data.is_empty());
    }
}

//! A page source and OCR engine backed by a recorded extraction dump.
//!
//! A dump is a JSON file holding what the renderer and OCR engine produced
//! for each page. It lets the engine run end to end without a PDF backend:
//!
//! ```json
//! {
//!   "name": "invoice.pdf",
//!   "pages": [
//!     {
//!       "pixel_width": 1700,
//!       "pixel_height": 2200,
//!       "native_tokens": [
//!         {"text": "Invoice", "box": {"left": 100, "top": 80, "right": 300, "bottom": 120}}
//!       ],
//!       "ocr": {"words": [{"text": "Invoice", "confidence": 96, "bbox": {"left": 100, "top": 80, "right": 300, "bottom": 120}}]}
//!     }
//!   ]
//! }
//! ```
//!
//! Pages may also set `"corrupt": true` (every load fails),
//! `"transient_failures": n` (the first `n` loads fail), or
//! `"ocr_error": "message"` (recognition fails).

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::engine::{NativeToken, OcrEngine, OcrOutput, PageSource, RasterImage, RenderedPage};
use crate::error::{Error, Result};

/// One recorded page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DumpPage {
    /// Rendered width in pixels
    pub pixel_width: u32,
    /// Rendered height in pixels
    pub pixel_height: u32,
    /// Native text fragments
    #[serde(default)]
    pub native_tokens: Vec<NativeToken>,
    /// Recorded OCR output; absent means OCR found nothing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr: Option<OcrOutput>,
    /// Simulated recognition failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_error: Option<String>,
    /// Every load of this page fails
    #[serde(default)]
    pub corrupt: bool,
    /// Number of initial loads that fail before one succeeds
    #[serde(default)]
    pub transient_failures: u32,
}

/// The on-disk dump format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dump {
    /// Source document name
    #[serde(default)]
    pub name: Option<String>,
    /// Source document title
    #[serde(default)]
    pub title: Option<String>,
    /// Recorded pages in document order
    pub pages: Vec<DumpPage>,
}

/// Serves pages and OCR output from a [`Dump`].
#[derive(Debug)]
pub struct DumpSource {
    dump: Dump,
    loads: Vec<AtomicU32>,
}

impl DumpSource {
    /// Open a dump file.
    ///
    /// A file that cannot be read or parsed is a document-level failure.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .map_err(|e| Error::DocumentOpen(format!("{}: {}", path.display(), e)))?;
        let mut source = Self::from_json(&data)
            .map_err(|e| Error::DocumentOpen(format!("{}: {}", path.display(), e)))?;
        if source.dump.name.is_none() {
            source.dump.name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned());
        }
        Ok(source)
    }

    /// Parse a dump from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let dump: Dump =
            serde_json::from_str(json).map_err(|e| Error::DocumentOpen(e.to_string()))?;
        Ok(Self::new(dump))
    }

    /// Wrap an in-memory dump.
    pub fn new(dump: Dump) -> Self {
        let loads = (0..dump.pages.len()).map(|_| AtomicU32::new(0)).collect();
        Self { dump, loads }
    }

    /// The underlying dump.
    pub fn dump(&self) -> &Dump {
        &self.dump
    }

    /// Total loads attempted for a page (0-based).
    pub fn load_count(&self, index: usize) -> u32 {
        self.loads
            .get(index)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

impl PageSource for DumpSource {
    fn page_count(&self) -> usize {
        self.dump.pages.len()
    }

    fn load_page(&self, index: usize) -> Result<RenderedPage> {
        let number = index as u32 + 1;
        let page = self
            .dump
            .pages
            .get(index)
            .ok_or(Error::PageOutOfRange(number, self.dump.pages.len() as u32))?;
        let attempt = self.loads[index].fetch_add(1, Ordering::SeqCst) + 1;

        if page.corrupt {
            return Err(Error::PageLoad {
                page: number,
                reason: "page data is corrupt".to_string(),
            });
        }
        if attempt <= page.transient_failures {
            return Err(Error::PageLoad {
                page: number,
                reason: format!("transient failure on attempt {}", attempt),
            });
        }

        Ok(RenderedPage {
            pixel_width: page.pixel_width,
            pixel_height: page.pixel_height,
            native_tokens: page.native_tokens.clone(),
            image: RasterImage {
                page_index: index,
                width: page.pixel_width,
                height: page.pixel_height,
                data: Vec::new(),
            },
        })
    }

    fn name(&self) -> Option<String> {
        self.dump.name.clone()
    }

    fn title(&self) -> Option<String> {
        self.dump.title.clone()
    }
}

impl OcrEngine for DumpSource {
    fn recognize(&self, image: &RasterImage) -> Result<OcrOutput> {
        let page = self.dump.pages.get(image.page_index).ok_or_else(|| {
            Error::Ocr(format!("no recorded page for raster {}", image.page_index))
        })?;
        if let Some(ref message) = page.ocr_error {
            return Err(Error::Ocr(message.clone()));
        }
        Ok(page.ocr.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"{
        "name": "sample.pdf",
        "pages": [
            {"pixel_width": 100, "pixel_height": 100,
             "native_tokens": [{"text": "Hi", "box": {"left": 1, "top": 1, "right": 9, "bottom": 5}}]},
            {"pixel_width": 100, "pixel_height": 100, "corrupt": true},
            {"pixel_width": 100, "pixel_height": 100, "transient_failures": 1,
             "ocr_error": "engine crashed"}
        ]
    }"#;

    #[test]
    fn test_from_json() {
        let source = DumpSource::from_json(DUMP).unwrap();
        assert_eq!(source.page_count(), 3);
        assert_eq!(source.name().as_deref(), Some("sample.pdf"));
        let page = source.load_page(0).unwrap();
        assert_eq!(page.native_tokens.len(), 1);
        assert_eq!(page.image.page_index, 0);
    }

    #[test]
    fn test_invalid_json_is_document_failure() {
        assert!(matches!(
            DumpSource::from_json("{not json"),
            Err(Error::DocumentOpen(_))
        ));
        assert!(matches!(
            DumpSource::open("/nonexistent/dump.json"),
            Err(Error::DocumentOpen(_))
        ));
    }

    #[test]
    fn test_corrupt_and_transient_pages() {
        let source = DumpSource::from_json(DUMP).unwrap();
        assert!(matches!(
            source.load_page(1),
            Err(Error::PageLoad { page: 2, .. })
        ));
        assert!(source.load_page(2).is_err());
        assert!(source.load_page(2).is_ok());
        assert_eq!(source.load_count(2), 2);
        assert!(matches!(
            source.load_page(7),
            Err(Error::PageOutOfRange(8, 3))
        ));
    }

    #[test]
    fn test_recorded_ocr() {
        let source = DumpSource::from_json(DUMP).unwrap();
        let missing = source
            .recognize(&RasterImage {
                page_index: 0,
                ..Default::default()
            })
            .unwrap();
        assert!(missing.is_empty());
        let failing = source.recognize(&RasterImage {
            page_index: 2,
            ..Default::default()
        });
        assert!(matches!(failing, Err(Error::Ocr(_))));
    }
}

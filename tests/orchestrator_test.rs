//! Integration tests for multi-page orchestration.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use relayout::engine::{
    CancellationToken, LayoutOptions, NativeToken, NoOcr, OcrEngine, OcrOutput, OcrWord,
    PageOrchestrator, PageSelection, PageSource, RasterImage, RenderedPage,
};
use relayout::model::{ExtractionMethod, PixelBox};
use relayout::{ChunkProjector, Error, Result};

/// A source whose pages carry a full line of prose, optionally sleeping so
/// that later pages finish first.
struct ProseSource {
    pages: usize,
    delay_ms: u64,
    cancel_at: Option<(usize, CancellationToken)>,
}

impl ProseSource {
    fn new(pages: usize) -> Self {
        Self {
            pages,
            delay_ms: 0,
            cancel_at: None,
        }
    }
}

impl PageSource for ProseSource {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn load_page(&self, index: usize) -> Result<RenderedPage> {
        if let Some((at, ref token)) = self.cancel_at {
            if index == at {
                token.cancel();
            }
        }
        if self.delay_ms > 0 {
            let remaining = (self.pages - index) as u64;
            thread::sleep(Duration::from_millis(self.delay_ms * remaining));
        }

        let native_tokens = (0..12)
            .map(|i| {
                let left = 40.0 + i as f64 * 75.0;
                NativeToken::new(
                    format!("sentence{}", i),
                    PixelBox::new(left, 400.0, left + 65.0, 420.0),
                )
            })
            .collect();
        Ok(RenderedPage {
            pixel_width: 1000,
            pixel_height: 1000,
            native_tokens,
            image: RasterImage {
                page_index: index,
                width: 1000,
                height: 1000,
                data: Vec::new(),
            },
        })
    }
}

/// A source with no native text on any page.
struct ScannedSource(usize);

impl PageSource for ScannedSource {
    fn page_count(&self) -> usize {
        self.0
    }

    fn load_page(&self, index: usize) -> Result<RenderedPage> {
        Ok(RenderedPage {
            pixel_width: 1000,
            pixel_height: 1000,
            native_tokens: Vec::new(),
            image: RasterImage {
                page_index: index,
                width: 1000,
                height: 1000,
                data: Vec::new(),
            },
        })
    }
}

#[derive(Default)]
struct CountingOcr {
    per_page: Mutex<Vec<usize>>,
    calls: AtomicUsize,
}

impl OcrEngine for CountingOcr {
    fn recognize(&self, image: &RasterImage) -> Result<OcrOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.per_page
            .lock()
            .map_err(|_| Error::Ocr("poisoned".to_string()))?
            .push(image.page_index);
        Ok(OcrOutput {
            words: vec![OcrWord {
                text: "scanned".to_string(),
                confidence: 92.0,
                bbox: PixelBox::new(100.0, 450.0, 220.0, 470.0),
                hint: None,
            }],
            ..Default::default()
        })
    }
}

#[test]
fn test_pages_assemble_in_page_order() {
    let source = ProseSource {
        delay_ms: 20,
        ..ProseSource::new(3)
    };
    let options = LayoutOptions::default().with_pages(PageSelection::Pages(vec![3, 1, 2]));

    let doc = PageOrchestrator::new(&source, &NoOcr)
        .with_options(options)
        .run()
        .unwrap();

    let numbers: Vec<u32> = doc.pages.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[test]
fn test_chunk_ids_unique_across_fifty_pages() {
    let source = ProseSource::new(50);
    let doc = PageOrchestrator::new(&source, &NoOcr).run().unwrap();
    assert_eq!(doc.page_count(), 50);

    let chunks = ChunkProjector::new().project_document(&doc);
    assert_eq!(chunks.len(), 50);
    let ids: HashSet<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids.len(), chunks.len());
}

#[test]
fn test_parallel_and_sequential_agree() {
    let source = ProseSource::new(8);
    let parallel = PageOrchestrator::new(&source, &NoOcr).run().unwrap();
    let sequential = PageOrchestrator::new(&source, &NoOcr)
        .with_options(LayoutOptions::default().sequential())
        .run()
        .unwrap();

    assert_eq!(parallel.pages, sequential.pages);
    assert_eq!(parallel.metrics, sequential.metrics);
}

#[test]
fn test_ocr_requested_at_most_once_per_page() {
    let source = ScannedSource(30);
    let ocr = CountingOcr::default();

    let doc = PageOrchestrator::new(&source, &ocr).run().unwrap();

    assert_eq!(ocr.calls.load(Ordering::SeqCst), 30);
    let mut seen = ocr.per_page.lock().unwrap().clone();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 30);
    assert!(doc.pages.iter().all(|p| p.method == ExtractionMethod::Ocr));
}

#[test]
fn test_sequential_cancellation_reports_partial_progress() {
    let token = CancellationToken::new();
    let source = ProseSource {
        cancel_at: Some((2, token.clone())),
        ..ProseSource::new(20)
    };

    let result = PageOrchestrator::new(&source, &NoOcr)
        .with_options(LayoutOptions::default().sequential())
        .with_cancellation(token)
        .run();

    match result {
        Err(Error::Cancelled { completed, total }) => {
            assert_eq!(completed, 2);
            assert_eq!(total, 20);
        }
        other => panic!("expected cancellation, got {:?}", other.map(|d| d.page_count())),
    }
}

#[test]
fn test_parallel_cancellation() {
    let token = CancellationToken::new();
    let source = ProseSource {
        cancel_at: Some((0, token.clone())),
        ..ProseSource::new(40)
    };

    let result = PageOrchestrator::new(&source, &NoOcr)
        .with_cancellation(token)
        .run();

    match result {
        Err(Error::Cancelled { completed, total }) => {
            assert!(completed < total);
            assert_eq!(total, 40);
        }
        other => panic!("expected cancellation, got {:?}", other.map(|d| d.page_count())),
    }
}

/// An engine that takes seconds per page but polls the run's token.
struct SlowOcr;

impl OcrEngine for SlowOcr {
    fn recognize(&self, image: &RasterImage) -> Result<OcrOutput> {
        self.recognize_cancellable(image, &CancellationToken::new())
    }

    fn recognize_cancellable(
        &self,
        _image: &RasterImage,
        cancel: &CancellationToken,
    ) -> Result<OcrOutput> {
        for _ in 0..300 {
            if cancel.is_cancelled() {
                return Err(Error::Ocr("recognition abandoned".to_string()));
            }
            thread::sleep(Duration::from_millis(10));
        }
        Ok(OcrOutput::default())
    }
}

#[test]
fn test_cancel_abandons_running_ocr() {
    let token = CancellationToken::new();
    let canceller = {
        let token = token.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            token.cancel();
        })
    };

    let started = Instant::now();
    let result = PageOrchestrator::new(&ScannedSource(1), &SlowOcr)
        .with_cancellation(token)
        .run();
    let elapsed = started.elapsed();
    canceller.join().unwrap();

    assert!(matches!(
        result,
        Err(Error::Cancelled {
            completed: 0,
            total: 1
        })
    ));
    assert!(elapsed < Duration::from_secs(1), "run took {:?}", elapsed);
}

#[test]
fn test_parallel_progress_is_monotonic() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let source = ProseSource::new(12);

    PageOrchestrator::new(&source, &NoOcr)
        .on_progress(move |p| sink.lock().unwrap().push(p))
        .run()
        .unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 13);
    assert_eq!(events[0].completed, 0);
    assert!(events.windows(2).all(|w| w[0].completed < w[1].completed));
    let last = events.last().unwrap();
    assert_eq!(last.completed, 12);
    assert!((last.percent - 100.0).abs() < 1e-9);
}

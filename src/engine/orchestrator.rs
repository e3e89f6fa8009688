//! Per-page processing and document assembly.
//!
//! Each page runs as an independent unit of work: load, ingest native text,
//! arbitrate (possibly invoking OCR once), then cluster lines, blocks, and
//! regions. Pages may run in parallel on the rayon pool; finished pages are
//! sent over a channel to a collector that owns the [`PageAccumulator`], so
//! completion order never leaks into the assembled [`Document`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::Utc;
use crossbeam_channel::Receiver;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::model::{Document, Metadata, Page, PageStatus, Token};

use super::arbiter::ChannelArbiter;
use super::blocks::BlockClusterer;
use super::collaborator::{CancellationToken, OcrEngine, PageSource, RenderedPage};
use super::ingest::{ingest_native, ingest_ocr};
use super::lines::LineClusterer;
use super::options::LayoutOptions;
use super::regions::SemanticRegionClassifier;

/// A progress update for a document run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Pages finished so far (including failed pages)
    pub completed: usize,
    /// Pages in this run
    pub total: usize,
    /// Completion in `[0, 100]`
    pub percent: f64,
}

impl Progress {
    fn new(completed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100.0
        } else {
            (completed as f64 / total as f64 * 100.0).min(100.0)
        };
        Self {
            completed,
            total,
            percent,
        }
    }
}

/// Callback receiving progress updates.
pub type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

/// Records which pages have had OCR invoked in the current run.
#[derive(Debug)]
pub struct OcrLedger {
    claimed: Vec<AtomicBool>,
}

impl OcrLedger {
    /// Create a ledger for a source with `page_count` pages.
    pub fn new(page_count: usize) -> Self {
        Self {
            claimed: (0..page_count).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    /// Claim the OCR slot for a page (0-based); true only the first time.
    pub fn claim(&self, index: usize) -> bool {
        self.claimed
            .get(index)
            .map(|slot| !slot.swap(true, Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Number of pages OCR has been claimed for.
    pub fn claimed_count(&self) -> usize {
        self.claimed
            .iter()
            .filter(|slot| slot.load(Ordering::SeqCst))
            .count()
    }
}

/// Buffers finished pages for one run, keyed by page number.
#[derive(Debug, Clone, Default)]
pub struct PageAccumulator {
    total: usize,
    pages: BTreeMap<u32, Page>,
}

impl PageAccumulator {
    /// Create an accumulator expecting `total` pages.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            pages: BTreeMap::new(),
        }
    }

    /// Record a finished page. Returns false if the page was already recorded.
    pub fn insert(&mut self, page: Page) -> bool {
        if self.pages.contains_key(&page.number) {
            log::warn!("page {} completed twice; keeping the first result", page.number);
            return false;
        }
        self.pages.insert(page.number, page);
        true
    }

    /// Pages finished so far.
    pub fn completed(&self) -> usize {
        self.pages.len()
    }

    /// Pages expected in this run.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Every expected page has completed or permanently failed.
    pub fn is_complete(&self) -> bool {
        self.completed() == self.total
    }

    /// Current progress.
    pub fn progress(&self) -> Progress {
        Progress::new(self.completed(), self.total)
    }

    /// Consume the accumulator, yielding pages sorted by page number.
    pub fn into_pages(self) -> Vec<Page> {
        self.pages.into_values().collect()
    }
}

/// The pure per-page layout stages: tokens in, lines/blocks/regions out.
#[derive(Debug, Clone, Default)]
pub struct PagePipeline {
    lines: LineClusterer,
    blocks: BlockClusterer,
    regions: SemanticRegionClassifier,
}

impl PagePipeline {
    /// Build the stages from layout options.
    pub fn new(options: &LayoutOptions) -> Self {
        Self {
            lines: LineClusterer::new(options.lines.clone()),
            blocks: BlockClusterer::new(options.blocks.clone()),
            regions: SemanticRegionClassifier::new(options.regions.clone()),
        }
    }

    /// Lay out a page from an already selected token set.
    pub fn layout(&self, number: u32, width_px: u32, height_px: u32, tokens: Vec<Token>) -> Page {
        let lines = self.lines.cluster(tokens);
        let blocks = self.blocks.cluster(lines.clone());
        let regions = self.regions.classify(&blocks);

        let mut page = Page::new(number, width_px, height_px);
        page.lines = lines;
        page.blocks = blocks;
        page.regions = regions;
        page
    }
}

/// Drives a document run over a page source and an OCR engine.
pub struct PageOrchestrator<'a> {
    source: &'a dyn PageSource,
    ocr: &'a dyn OcrEngine,
    options: LayoutOptions,
    pipeline: PagePipeline,
    arbiter: ChannelArbiter,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
}

impl<'a> PageOrchestrator<'a> {
    /// Create an orchestrator with default options.
    pub fn new(source: &'a dyn PageSource, ocr: &'a dyn OcrEngine) -> Self {
        let options = LayoutOptions::default();
        Self {
            source,
            ocr,
            pipeline: PagePipeline::new(&options),
            arbiter: ChannelArbiter::new(options.arbiter.clone()),
            options,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Set layout options.
    pub fn with_options(mut self, options: LayoutOptions) -> Self {
        self.pipeline = PagePipeline::new(&options);
        self.arbiter = ChannelArbiter::new(options.arbiter.clone());
        self.options = options;
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Receive progress updates.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Receive progress updates through a shared callback.
    pub fn with_progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Run every selected page and assemble the document.
    ///
    /// Page-scoped failures never abort the run; a page that cannot be loaded
    /// is recorded as failed. Only invalid options or cancellation fail the
    /// whole run.
    pub fn run(&self) -> Result<Document> {
        self.options.validate()?;

        let page_count = self.source.page_count();
        let numbers = self.options.pages.resolve(page_count as u32);
        let total = numbers.len();
        let ledger = OcrLedger::new(page_count);

        log::info!(
            "processing {} of {} pages ({})",
            total,
            page_count,
            if self.options.parallel { "parallel" } else { "sequential" }
        );

        self.emit(Progress::new(0, total));

        let accumulator = if self.options.parallel && total > 1 {
            self.run_parallel(&numbers, &ledger)?
        } else {
            self.run_sequential(&numbers, &ledger)
        };

        if self.cancel.is_cancelled() {
            log::info!(
                "run cancelled after {} of {} pages",
                accumulator.completed(),
                total
            );
            return Err(Error::Cancelled {
                completed: accumulator.completed(),
                total,
            });
        }

        if !accumulator.is_complete() {
            return Err(Error::Other(format!(
                "run finished with {} of {} pages",
                accumulator.completed(),
                total
            )));
        }

        if total == 0 {
            self.emit(Progress::new(0, 0));
        }

        let metadata = Metadata {
            source: self.source.name(),
            title: self.source.title(),
            page_count: page_count as u32,
            processed_at: Some(Utc::now()),
        };
        let document = Document::from_pages(metadata, accumulator.into_pages());

        log::info!(
            "run complete: {} pages, {} blocks, {} OCR'd, {} degraded, {} failed",
            document.page_count(),
            document.metrics.total_blocks,
            ledger.claimed_count(),
            document.metrics.degraded_pages,
            document.metrics.failed_pages
        );

        Ok(document)
    }

    fn run_sequential(&self, numbers: &[u32], ledger: &OcrLedger) -> PageAccumulator {
        let mut accumulator = PageAccumulator::new(numbers.len());
        for &number in numbers {
            if self.cancel.is_cancelled() {
                break;
            }
            let page = self.process_page(number, ledger);
            if self.cancel.is_cancelled() {
                break;
            }
            accumulator.insert(page);
            self.emit(accumulator.progress());
        }
        accumulator
    }

    fn run_parallel(&self, numbers: &[u32], ledger: &OcrLedger) -> Result<PageAccumulator> {
        let (tx, rx) = crossbeam_channel::unbounded::<Page>();
        let total = numbers.len();

        thread::scope(|scope| {
            let collector = scope.spawn(move || self.collect(rx, total));

            numbers.par_iter().for_each_with(tx, |tx, &number| {
                if self.cancel.is_cancelled() {
                    return;
                }
                let page = self.process_page(number, ledger);
                if self.cancel.is_cancelled() {
                    return;
                }
                // The collector only hangs up after every sender is dropped.
                let _ = tx.send(page);
            });

            collector
                .join()
                .map_err(|_| Error::Other("page collector panicked".to_string()))
        })
    }

    fn collect(&self, rx: Receiver<Page>, total: usize) -> PageAccumulator {
        let mut accumulator = PageAccumulator::new(total);
        for page in rx {
            if accumulator.insert(page) {
                self.emit(accumulator.progress());
            }
        }
        accumulator
    }

    /// Process one page (1-based number) to completion or permanent failure.
    pub fn process_page(&self, number: u32, ledger: &OcrLedger) -> Page {
        let index = (number as usize).saturating_sub(1);

        let rendered = match self.load_with_retry(number, index) {
            Ok(rendered) => rendered,
            Err(e) => {
                log::warn!("page {} failed permanently: {}", number, e);
                return Page::failed(number);
            }
        };

        let width = rendered.pixel_width as f64;
        let height = rendered.pixel_height as f64;
        let native = ingest_native(&rendered.native_tokens, number, width, height);

        let mut ocr_rejected = 0;
        let arbitration = self.arbiter.arbitrate(number, native.tokens, || {
            if !ledger.claim(index) {
                return Err(Error::Ocr(format!("page {} was already OCR'd", number)));
            }
            if self.cancel.is_cancelled() {
                return Err(Error::Ocr("run cancelled".to_string()));
            }
            let output = self.ocr.recognize_cancellable(&rendered.image, &self.cancel)?;
            let (ingested, granularity) = ingest_ocr(&output, number, width, height);
            log::debug!(
                "page {}: OCR returned {} tokens at {:?} granularity",
                number,
                ingested.tokens.len(),
                granularity
            );
            ocr_rejected = ingested.rejected;
            Ok(ingested.tokens)
        });

        let mut page = self.pipeline.layout(
            number,
            rendered.pixel_width,
            rendered.pixel_height,
            arbitration.tokens,
        );
        page.coverage = arbitration.coverage;
        page.coverage.rejected_token_count = native.rejected + ocr_rejected;
        page.method = arbitration.method;
        page.status = if page.coverage.degraded {
            PageStatus::Degraded
        } else {
            PageStatus::Ok
        };

        log::debug!(
            "page {}: {} lines, {} blocks, {} regions",
            number,
            page.lines.len(),
            page.blocks.len(),
            page.regions.len()
        );

        page
    }

    fn load_with_retry(&self, number: u32, index: usize) -> Result<RenderedPage> {
        let page_count = self.source.page_count();
        if index >= page_count {
            return Err(Error::PageOutOfRange(number, page_count as u32));
        }

        let attempts = self.options.max_page_attempts.max(1);
        let mut last_error = None;
        for attempt in 1..=attempts {
            match self.source.load_page(index) {
                Ok(rendered) => return Ok(rendered),
                Err(e) => {
                    log::debug!(
                        "page {}: load attempt {}/{} failed: {}",
                        number,
                        attempt,
                        attempts,
                        e
                    );
                    last_error = Some(e);
                }
            }
            if self.cancel.is_cancelled() {
                break;
            }
        }

        Err(last_error.unwrap_or_else(|| Error::PageLoad {
            page: number,
            reason: "no load attempted".to_string(),
        }))
    }

    fn emit(&self, progress: Progress) {
        if let Some(ref callback) = self.progress {
            callback(progress);
        }
    }
}

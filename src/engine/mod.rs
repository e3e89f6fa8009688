//! The reconstruction engine.
//!
//! Pipeline per page:
//!
//! ```text
//! PageSource ─▶ ingest ─▶ ChannelArbiter ─(OcrEngine)─▶ LineClusterer
//!     ─▶ BlockClusterer ─▶ SemanticRegionClassifier ─▶ Page
//! ```
//!
//! [`PageOrchestrator`] runs pages independently and assembles the
//! [`Document`](crate::model::Document) in page order.

mod arbiter;
mod blocks;
mod collaborator;
mod ingest;
mod lines;
mod options;
mod orchestrator;
mod regions;

pub use arbiter::{Arbitration, ChannelArbiter, OcrTrigger};
pub use blocks::BlockClusterer;
pub use collaborator::{
    CancellationToken, NativeToken, NoOcr, OcrEngine, OcrLine, OcrOutput, OcrWord, PageSource,
    RasterImage, RenderedPage,
};
pub use ingest::{ingest_native, ingest_ocr, normalize_text, token_box, Ingested, OcrGranularity};
pub use lines::LineClusterer;
pub use options::{
    ArbiterOptions, BlockOptions, LayoutOptions, LineOptions, PageSelection, RegionOptions,
};
pub use orchestrator::{
    OcrLedger, PageAccumulator, PageOrchestrator, PagePipeline, Progress, ProgressCallback,
};
pub use regions::SemanticRegionClassifier;

//! Listing-extraction pipeline for toolscout.
//!
//! [`SubmissionPipeline`] turns a submitted URL into a `ListingDraft` that
//! only references labels the CMS already defines. Every failure is absorbed:
//! the caller always receives a well-formed draft, and [`ExtractionReport`]
//! records what was absorbed.

pub mod assets;
pub mod fallback;
pub mod listing;
pub mod pipeline;
pub mod prompt;
pub mod reconcile;
pub mod report;
pub mod vocabulary;

pub use fallback::fallback_draft;
pub use pipeline::{
    AI_DISABLED_MESSAGE, PipelineConfig, ProgressReporter, SilentProgress, SubmissionPipeline,
    URL_REQUIRED_MESSAGE,
};
pub use report::{Degradation, ExtractionReport, FallbackReason};

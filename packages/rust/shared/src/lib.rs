//! Shared types, error model, and configuration for toolscout.
//!
//! This crate is the foundation depended on by all other toolscout crates.
//! It provides:
//! - [`ToolscoutError`]: the unified error type
//! - Domain types ([`ListingDraft`], [`ControlledVocabulary`], [`ActionResult`], [`SubmissionId`])
//! - Configuration ([`AppConfig`] and its sections, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AiConfig, AppConfig, AssetsConfig, CmsConfig, FetchConfig, MatchingConfig, MatchPolicy,
    PageFormat, ProviderConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{Result, ToolscoutError};
pub use types::{
    ActionResult, Alternative, ControlledVocabulary, FaqEntry, LearningCurve, ListingDraft,
    PricingSnapshot, SetupTime, SubmissionId, TriState, VocabularyKind, DEFAULT_TOOL_NAME,
};

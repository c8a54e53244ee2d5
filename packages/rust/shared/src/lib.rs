//! Shared types, error model, and configuration for speakerunify.
//!
//! This crate is the foundation depended on by all other speakerunify crates.
//! It provides:
//! - [`UnifyError`]: the unified error type
//! - Domain types ([`SpeakerRecord`], [`Location`], [`SourceInfo`], [`Source`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, RunConfig, SourceBinding, SourceOverride, StoreConfig, TopicsConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_config,
};
pub use error::{Result, UnifyError};
pub use types::{Location, Section, Source, SourceInfo, SpeakerId, SpeakerRecord};

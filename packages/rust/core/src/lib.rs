//! Identity resolution and the unification run for speakerunify.
//!
//! This crate ties adapters, normalization and storage together:
//! candidates are matched against the [`IdentityIndex`], merged by the
//! [`MergeEngine`], and driven source by source by [`run_unification`].

pub mod dedup;
pub mod identity;
pub mod merge;
pub mod pipeline;

pub use dedup::{CITY_BONUS, Decision, MATCH_THRESHOLD, decide};
pub use identity::{IdentityIndex, IndexEntry};
pub use merge::{Applied, MergeEngine, MergeStats, merge_records};
pub use pipeline::{
    ProgressReporter, RunSummary, SilentProgress, SourceStatus, SourceSummary, run_unification,
};

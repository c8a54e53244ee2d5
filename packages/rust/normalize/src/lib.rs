//! Value normalization shared by every source adapter.
//!
//! - [`topics`]: canonical topic folding ([`TopicCanonicalizer`])
//! - [`location`]: free-text or structured location → [`Location`](speakerunify_shared::Location)
//! - [`name`]: name fingerprints and the similarity ratio used for dedup

pub mod location;
pub mod name;
pub mod topics;

pub use location::{parse_location, parse_location_str};
pub use name::{fingerprint, initials_free_key, similarity};
pub use topics::{NormalizedTopics, TopicCanonicalizer, TopicMapping};

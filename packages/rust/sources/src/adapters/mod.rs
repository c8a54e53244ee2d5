//! Source adapter trait and the nine built-in adapters.
//!
//! Each adapter owns an explicit `serde` type for its source's native
//! document and turns it into a candidate [`SpeakerRecord`]. Adapters never
//! fail loudly: a document that does not fit the native shape (a `null`
//! where an object is expected, a wrong type, a missing required id) is
//! skipped by returning `None`.

mod a_speakers;
mod allamerican;
mod bigspeak;
mod eventraptor;
pub(crate) mod fields;
mod freespeaker;
mod leadingauth;
mod sessionize;
mod speakerhub;
mod tsh;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use speakerunify_normalize::TopicCanonicalizer;
use speakerunify_shared::{Source, SpeakerRecord};

pub use a_speakers::{ASpeakersAdapter, ASpeakersDoc};
pub use allamerican::{AllAmericanAdapter, AllAmericanDoc};
pub use bigspeak::{BigSpeakAdapter, BigSpeakDoc};
pub use eventraptor::{EventRaptorAdapter, EventRaptorDoc};
pub use fields::record_id;
pub use freespeaker::{FreeSpeakerAdapter, FreeSpeakerDoc};
pub use leadingauth::{LeadingAuthAdapter, LeadingAuthDoc};
pub use sessionize::{SessionizeAdapter, SessionizeDoc};
pub use speakerhub::{SpeakerHubAdapter, SpeakerHubDoc};
pub use tsh::{TshAdapter, TshDoc};

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Per-document inputs shared by every adapter.
pub struct AdaptContext<'a> {
    /// Run-wide topic canonicalizer.
    pub topics: &'a TopicCanonicalizer,
    /// The untyped native document, for placeholder ids.
    raw: &'a Value,
}

impl<'a> AdaptContext<'a> {
    pub fn new(topics: &'a TopicCanonicalizer, raw: &'a Value) -> Self {
        Self { topics, raw }
    }

    /// Deterministic stand-in for a missing native id, derived from the
    /// document's content so re-runs produce the same record id.
    pub fn placeholder_id(&self) -> String {
        let digest = fields::sha256_hex(&self.raw.to_string());
        format!("unknown-{}", &digest[..16])
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A pure transform from one source's native shape to a candidate record.
pub trait SourceAdapter: Send + Sync {
    /// The source's native document shape.
    type Native: DeserializeOwned;

    /// Which source this adapter reads.
    fn source(&self) -> Source;

    /// Build the candidate. `None` means "skip this document".
    fn transform(&self, native: Self::Native, ctx: &AdaptContext<'_>) -> Option<SpeakerRecord>;
}

/// Object-safe view of a [`SourceAdapter`], used by the registry and driver.
pub trait Adapter: Send + Sync {
    /// Which source this adapter reads.
    fn source(&self) -> Source;

    /// Decode and transform one native JSON document.
    fn adapt(&self, raw: &Value, topics: &TopicCanonicalizer) -> Option<SpeakerRecord>;

    /// Human-readable adapter name for tracing.
    fn name(&self) -> &str {
        self.source().tag()
    }
}

impl<T: SourceAdapter> Adapter for T {
    fn source(&self) -> Source {
        SourceAdapter::source(self)
    }

    fn adapt(&self, raw: &Value, topics: &TopicCanonicalizer) -> Option<SpeakerRecord> {
        let native = match T::Native::deserialize(raw) {
            Ok(native) => native,
            Err(e) => {
                tracing::debug!(
                    source = %SourceAdapter::source(self),
                    error = %e,
                    "native document does not fit source shape"
                );
                return None;
            }
        };
        self.transform(native, &AdaptContext::new(topics, raw))
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds one adapter per source, in processing order.
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn Adapter>>,
}

impl AdapterRegistry {
    /// Create a registry with all nine built-in adapters.
    pub fn new() -> Self {
        Self {
            adapters: vec![
                Box::new(ASpeakersAdapter),
                Box::new(AllAmericanAdapter),
                Box::new(BigSpeakAdapter),
                Box::new(EventRaptorAdapter),
                Box::new(FreeSpeakerAdapter),
                Box::new(LeadingAuthAdapter),
                Box::new(SessionizeAdapter),
                Box::new(SpeakerHubAdapter),
                Box::new(TshAdapter),
            ],
        }
    }

    /// Look up the adapter for a source.
    pub fn get(&self, source: Source) -> Option<&dyn Adapter> {
        self.adapters
            .iter()
            .find(|adapter| adapter.source() == source)
            .map(|adapter| adapter.as_ref())
    }

    /// All adapters, in processing order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Adapter> {
        self.adapters.iter().map(|adapter| adapter.as_ref())
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

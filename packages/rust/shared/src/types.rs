//! Core domain types: canonical speaker records and the source registry.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::UnifyError;

/// A loosely structured, concern-namespaced sub-object of a record
/// (`speaking_info`, `media`, `metadata`, ...).
pub type Section = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// SpeakerId
// ---------------------------------------------------------------------------

/// Stable canonical record identifier.
///
/// Derived once from `(source tag, native id)` of the document that first
/// produced the record; merges never change it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeakerId(pub String);

impl SpeakerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SpeakerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpeakerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// The nine upstream speaker directories, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "a_speakers")]
    ASpeakers,
    #[serde(rename = "allamerican")]
    AllAmerican,
    #[serde(rename = "bigspeak")]
    BigSpeak,
    #[serde(rename = "eventraptor")]
    EventRaptor,
    #[serde(rename = "freespeaker")]
    FreeSpeaker,
    #[serde(rename = "leadingauth")]
    LeadingAuth,
    #[serde(rename = "sessionize")]
    Sessionize,
    #[serde(rename = "speakerhub")]
    SpeakerHub,
    #[serde(rename = "tsh")]
    Tsh,
}

impl Source {
    /// Every source, in the fixed order a run processes them.
    pub const ALL: [Source; 9] = [
        Source::ASpeakers,
        Source::AllAmerican,
        Source::BigSpeak,
        Source::EventRaptor,
        Source::FreeSpeaker,
        Source::LeadingAuth,
        Source::Sessionize,
        Source::SpeakerHub,
        Source::Tsh,
    ];

    /// Short tag hashed into record ids (`"<tag>|<native id>"`).
    pub fn tag(self) -> &'static str {
        match self {
            Source::ASpeakers => "a_speakers",
            Source::AllAmerican => "allamerican",
            Source::BigSpeak => "bigspeak",
            Source::EventRaptor => "eventraptor",
            Source::FreeSpeaker => "freespeaker",
            Source::LeadingAuth => "leadingauth",
            Source::Sessionize => "sessionize",
            Source::SpeakerHub => "speakerhub",
            Source::Tsh => "tsh",
        }
    }

    /// Value written to `source_info.original_source`.
    pub fn label(self) -> &'static str {
        match self {
            Source::ASpeakers => "a_speakers",
            Source::AllAmerican => "allamericanspeakers",
            Source::BigSpeak => "bigspeak",
            Source::EventRaptor => "eventraptor",
            Source::FreeSpeaker => "freespeakerbureau",
            Source::LeadingAuth => "leadingauthorities",
            Source::Sessionize => "sessionize",
            Source::SpeakerHub => "speakerhub",
            Source::Tsh => "thespeakerhandbook",
        }
    }

    /// Database the scraper for this source writes into.
    pub fn default_database(self) -> &'static str {
        match self {
            Source::ASpeakers => "a_speakers",
            Source::AllAmerican => "allamericanspeakers",
            Source::BigSpeak => "bigspeak_scraper",
            Source::EventRaptor => "eventraptor",
            Source::FreeSpeaker => "freespeakerbureau_scraper",
            Source::LeadingAuth => "leading_authorities",
            Source::Sessionize => "sessionize_scraper",
            Source::SpeakerHub => "speakerhub_scraper",
            Source::Tsh => "thespeakerhandbook_scraper",
        }
    }

    /// Collection holding the native speaker documents.
    pub fn default_collection(self) -> &'static str {
        match self {
            Source::ASpeakers | Source::AllAmerican | Source::EventRaptor => "speakers",
            Source::BigSpeak | Source::Sessionize | Source::Tsh => "speaker_profiles",
            Source::FreeSpeaker => "speakers_profiles",
            Source::LeadingAuth => "speakers_final_details",
            Source::SpeakerHub => "speaker_details",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for Source {
    type Err = UnifyError;

    /// Accepts the tag, the provenance label, or the database name.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Source::ALL
            .into_iter()
            .find(|src| {
                src.tag() == wanted || src.label() == wanted || src.default_database() == wanted
            })
            .ok_or_else(|| UnifyError::validation(format!("unknown source '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// Fixed-shape location. `full_location` keeps the unparsed input for audit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub full_location: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl Location {
    pub fn is_empty(&self) -> bool {
        self.city.is_none()
            && self.state.is_none()
            && self.country.is_none()
            && self.full_location.is_none()
            && self.timezone.is_none()
    }
}

// ---------------------------------------------------------------------------
// SourceInfo
// ---------------------------------------------------------------------------

/// Provenance of the most recently merged contributing document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub original_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_scraped_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    /// Creation time reported by the source itself (not the record's).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// SpeakerRecord
// ---------------------------------------------------------------------------

/// One speaker identity.
///
/// Adapters produce candidates of this shape; the canonical collection
/// stores the same shape with lifecycle timestamps filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeakerRecord {
    pub id: SpeakerId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,

    #[serde(default)]
    pub location: Location,

    /// Channel name (`email`, `phone`, `website`, ...) to value.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub contact: BTreeMap<String, String>,
    /// Platform name to profile URL. Open-ended.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub social_media: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaking_info: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub professional_info: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publications: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaking_history: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_fields: Option<Section>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub testimonials: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reviews: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expertise_areas: Vec<String>,

    #[serde(default)]
    pub topics: BTreeSet<String>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    /// Always a subset of `topics`.
    #[serde(default)]
    pub topics_unmapped: BTreeSet<String>,

    pub source_info: SourceInfo,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SpeakerRecord {
    /// City used as the dedup tie-breaker.
    pub fn city(&self) -> Option<&str> {
        self.location.city.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_parses_tag_label_and_database() {
        assert_eq!("tsh".parse::<Source>().unwrap(), Source::Tsh);
        assert_eq!("thespeakerhandbook".parse::<Source>().unwrap(), Source::Tsh);
        assert_eq!("leading_authorities".parse::<Source>().unwrap(), Source::LeadingAuth);
        assert!("nope".parse::<Source>().is_err());
    }

    #[test]
    fn source_serde_uses_tag() {
        let json = serde_json::to_string(&Source::AllAmerican).unwrap();
        assert_eq!(json, "\"allamerican\"");
        let back: Source = serde_json::from_str("\"a_speakers\"").unwrap();
        assert_eq!(back, Source::ASpeakers);
    }

    #[test]
    fn record_serialization_skips_empty_sections() {
        let record = SpeakerRecord {
            id: SpeakerId::from("abc"),
            name: Some("Jane Doe".into()),
            source_info: SourceInfo {
                original_source: "bigspeak".into(),
                source_id: "42".into(),
                ..Default::default()
            },
            ..Default::default()
        };

        let value = serde_json::to_value(&record).expect("serialize");
        assert!(value.get("social_media").is_none());
        assert!(value.get("testimonials").is_none());
        assert_eq!(value["name"], "Jane Doe");

        let parsed: SpeakerRecord = serde_json::from_value(value).expect("deserialize");
        assert_eq!(parsed, record);
    }

    #[test]
    fn location_is_empty() {
        assert!(Location::default().is_empty());
        let loc = Location {
            country: Some("Germany".into()),
            ..Default::default()
        };
        assert!(!loc.is_empty());
    }
}

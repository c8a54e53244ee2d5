//! Field-level helpers shared by the adapters.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use scraper::Html;
use serde_json::Value;
use sha2::{Digest, Sha256};
use speakerunify_normalize::NormalizedTopics;
use speakerunify_shared::{Section, Source, SourceInfo, SpeakerId, SpeakerRecord};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Deterministic record id for `(source, native id)`.
pub fn record_id(source: Source, native_id: &str) -> SpeakerId {
    SpeakerId(sha256_hex(&format!("{}|{native_id}", source.tag())))
}

/// Provenance block with the fields every source carries.
pub fn source_info(source: Source, source_id: &str, source_url: Option<String>) -> SourceInfo {
    SourceInfo {
        original_source: source.label().to_string(),
        source_url: source_url.and_then(|url| clean_text(&url)),
        source_id: source_id.to_string(),
        ..Default::default()
    }
}

/// Native ids arrive as strings, numbers, or `{"$oid": "..."}`.
pub fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Object(obj) => obj.get("$oid").and_then(id_text),
        _ => None,
    }
}

/// `deserialize_with` helpers for native id fields.
pub mod de {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// A required id. `null` or an unusable value is an error.
    pub fn native_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        opt_native_id(deserializer)?.ok_or_else(|| D::Error::custom("native id is null or empty"))
    }

    /// An optional id. Unusable values are treated as absent.
    pub fn opt_native_id<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(super::id_text))
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

static MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[A-Za-z/!][^>]*>|&(#[0-9]+|#x[0-9A-Fa-f]+|[A-Za-z]+);").expect("valid regex"));
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));

/// Strip HTML tags and entities, then trim. Blank text becomes `None`.
pub fn clean_text(raw: &str) -> Option<String> {
    let text = if MARKUP_RE.is_match(raw) {
        let fragment = Html::parse_fragment(raw);
        let joined: String = fragment.root_element().text().collect();
        WS_RE.replace_all(&joined, " ").into_owned()
    } else {
        raw.to_string()
    };
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// [`clean_text`] over an optional native string.
pub fn text(raw: Option<String>) -> Option<String> {
    raw.as_deref().and_then(clean_text)
}

/// First non-blank of several optional strings, cleaned.
pub fn first_text<const N: usize>(candidates: [Option<&String>; N]) -> Option<String> {
    candidates.into_iter().flatten().find_map(|s| clean_text(s))
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Lenient timestamp parsing. Anything unrecognized is `None`.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s.trim()),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        Value::Object(obj) => match obj.get("$date")? {
            Value::Object(inner) => inner
                .get("$numberLong")
                .and_then(Value::as_str)
                .and_then(|ms| ms.parse::<i64>().ok())
                .and_then(DateTime::from_timestamp_millis),
            other => parse_timestamp(other),
        },
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// [`parse_timestamp`] over an optional native value.
pub fn timestamp(value: &Option<Value>) -> Option<DateTime<Utc>> {
    value.as_ref().and_then(parse_timestamp)
}

// ---------------------------------------------------------------------------
// Sections and lists
// ---------------------------------------------------------------------------

/// Null, blank strings, and empty containers carry no information.
/// An object is blank when every value in it is blank.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.values().all(is_blank),
        _ => false,
    }
}

/// Accumulates a [`Section`], dropping blank values.
#[derive(Debug, Default)]
pub struct SectionBuilder {
    fields: Section,
}

impl SectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(mut self, key: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        if !is_blank(&value) {
            self.fields.insert(key.to_string(), value);
        }
        self
    }

    /// Copy every non-blank entry of an existing object.
    pub fn merge(self, fields: Section) -> Self {
        fields
            .into_iter()
            .fold(self, |builder, (key, value)| builder.put(&key, value))
    }

    /// `None` when nothing survived.
    pub fn build(self) -> Option<Section> {
        (!self.fields.is_empty()).then_some(self.fields)
    }
}

/// Strings out of a JSON list (or a lone string). Blanks and non-strings are dropped.
pub fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => clean_text(s).into_iter().collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(clean_text)
            .collect(),
        _ => Vec::new(),
    }
}

/// Non-blank elements of a JSON list.
pub fn value_list(value: &Option<Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.iter().filter(|v| !is_blank(v)).cloned().collect(),
        _ => Vec::new(),
    }
}

/// `Some(value)` unless blank.
pub fn non_blank(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !is_blank(v))
}

/// An object passes through as a section; a bare scalar lands under `scalar_key`.
pub fn section_of(value: Option<Value>, scalar_key: &str) -> Option<Section> {
    match non_blank(value)? {
        Value::Object(fields) => SectionBuilder::new().merge(fields).build(),
        other => SectionBuilder::new().put(scalar_key, other).build(),
    }
}

/// A list passes through; a single value is wrapped.
pub fn one_or_many(value: Option<Value>) -> Option<Value> {
    match non_blank(value)? {
        list @ Value::Array(_) => Some(list),
        single => Some(Value::Array(vec![single])),
    }
}

// ---------------------------------------------------------------------------
// Channel maps
// ---------------------------------------------------------------------------

// Fields tried, in order, when a platform entry is an object without `url`.
const LINK_FALLBACKS: &[&str] = &[
    "handle", "label", "channel", "profile", "books", "blog", "newsletter",
];

/// Platform → link from a social object.
///
/// Entries may be plain strings or objects such as `{"url": ..}` or
/// `{"handle": ..}`. The platform set is open-ended.
pub fn social_links(value: &Value) -> BTreeMap<String, String> {
    let Value::Object(platforms) = value else {
        return BTreeMap::new();
    };

    platforms
        .iter()
        .filter_map(|(platform, entry)| {
            let link = match entry {
                Value::String(s) => clean_text(s),
                Value::Object(obj) => std::iter::once("url")
                    .chain(LINK_FALLBACKS.iter().copied())
                    .find_map(|key| obj.get(key).and_then(Value::as_str).and_then(clean_text)),
                _ => None,
            }?;
            Some((platform.to_ascii_lowercase(), link))
        })
        .collect()
}

/// Insert `key → value` when the value is non-blank text.
pub fn put_channel(map: &mut BTreeMap<String, String>, key: &str, value: Option<&str>) {
    if let Some(value) = value.and_then(clean_text) {
        map.insert(key.to_string(), value);
    }
}

// ---------------------------------------------------------------------------
// Topics
// ---------------------------------------------------------------------------

/// Topics and categories carry the same canonical set.
pub fn apply_topics(record: &mut SpeakerRecord, normalized: NormalizedTopics) {
    record.categories = normalized.canonical.clone();
    record.topics = normalized.canonical;
    record.topics_unmapped = normalized.unmapped;
}

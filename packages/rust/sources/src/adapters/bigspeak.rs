//! BigSpeak adapter.
//!
//! BigSpeak documents are the least uniform of the nine: topics, images,
//! `additional_info` and `structured_data` may each be missing, null, or of
//! an unexpected type. Every one of them is guarded, so only a document
//! that is not an object at all is skipped.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Value, json};
use speakerunify_normalize::parse_location;
use speakerunify_shared::{Location, Section, Source, SpeakerRecord};

use super::fields::{self, SectionBuilder, apply_topics, de, record_id, social_links};
use super::{AdaptContext, SourceAdapter};

/// Native BigSpeak profile.
#[derive(Debug, Deserialize)]
pub struct BigSpeakDoc {
    #[serde(default, deserialize_with = "de::opt_native_id")]
    speaker_id: Option<String>,
    #[serde(rename = "_id", default, deserialize_with = "de::opt_native_id")]
    object_id: Option<String>,
    name: Option<Value>,
    job_title: Option<Value>,
    description: Option<Value>,
    biography: Option<Value>,
    topics: Option<Value>,
    location: Option<Value>,
    social_media: Option<Value>,
    image_url: Option<Value>,
    images: Option<Value>,
    videos: Option<Value>,
    additional_info: Option<Value>,
    structured_data: Option<Value>,
    awards: Option<Value>,
    certifications: Option<Value>,
    keynote_topics: Option<Value>,
    speaking_programs: Option<Value>,
    suggested_programs: Option<Value>,
    fee_range: Option<Value>,
    languages: Option<Value>,
    why_choose: Option<Value>,
    source: Option<Value>,
    books: Option<Value>,
    testimonials: Option<Value>,
    profile_url: Option<Value>,
    scraped_at: Option<Value>,
    first_scraped_at: Option<Value>,
}

pub struct BigSpeakAdapter;

impl SourceAdapter for BigSpeakAdapter {
    type Native = BigSpeakDoc;

    fn source(&self) -> Source {
        Source::BigSpeak
    }

    fn transform(&self, doc: BigSpeakDoc, ctx: &AdaptContext<'_>) -> Option<SpeakerRecord> {
        let native_id = doc
            .speaker_id
            .or(doc.object_id)
            .unwrap_or_else(|| ctx.placeholder_id());

        let additional = as_object(&doc.additional_info);
        let structured = as_object(&doc.structured_data);
        let extra = |key: &str| additional.and_then(|o| o.get(key)).cloned();
        let sd = |key: &str| structured.and_then(|o| o.get(key));

        let mut contact = BTreeMap::new();
        fields::put_channel(&mut contact, "email", sd("email").and_then(Value::as_str));
        fields::put_channel(&mut contact, "phone", sd("telephone").and_then(Value::as_str));

        let location = match as_object(&doc.location).and_then(|o| o.get("travels_from")) {
            Some(travels_from) if !fields::is_blank(travels_from) => parse_location(travels_from),
            _ => match sd("address") {
                Some(address @ Value::Object(_)) => parse_location(address),
                _ => Location::default(),
            },
        };

        let gallery: Vec<Value> = match &doc.images {
            Some(Value::Array(images)) => images
                .iter()
                .filter_map(|img| img.get("url"))
                .filter(|url| !fields::is_blank(url))
                .cloned()
                .collect(),
            _ => Vec::new(),
        };

        let mut info = fields::source_info(Source::BigSpeak, &native_id, string(&doc.profile_url));
        info.scraped_at = fields::timestamp(&doc.scraped_at);
        info.first_scraped_at = fields::timestamp(&doc.first_scraped_at);

        let description = string(&doc.description);
        let mut record = SpeakerRecord {
            id: record_id(Source::BigSpeak, &native_id),
            name: string(&doc.name),
            display_name: string(&doc.name),
            job_title: string(&doc.job_title).or_else(|| sd("job_title").and_then(text_value)),
            biography: string(&doc.biography).or_else(|| description.clone()),
            description: description.or_else(|| sd("description_structured").and_then(text_value)),
            location,
            contact,
            social_media: doc.social_media.as_ref().map(social_links).unwrap_or_default(),
            speaking_info: SectionBuilder::new()
                .put("fee_ranges", json!({ "live_event": doc.fee_range }))
                .put("languages", doc.languages)
                .put("virtual_capable", extra("virtual_capable"))
                .build(),
            professional_info: SectionBuilder::new()
                .put("awards", doc.awards)
                .put("certifications", doc.certifications)
                .build(),
            content: SectionBuilder::new()
                .put("keynote_topics", doc.keynote_topics)
                .put("speaking_programs", doc.speaking_programs)
                .put("suggested_programs", doc.suggested_programs)
                .build(),
            media: SectionBuilder::new()
                .put("profile_image", doc.image_url)
                .put("videos", doc.videos)
                .put("image_gallery", gallery)
                .put("downloads", extra("downloads"))
                .build(),
            publications: SectionBuilder::new().put("books", doc.books).build(),
            testimonials: fields::value_list(&doc.testimonials),
            metadata: SectionBuilder::new()
                .put("why_choose", doc.why_choose)
                .put("structured_data", doc.structured_data.clone().filter(Value::is_object))
                .put("post_id", extra("post_id"))
                .put("meta_description", extra("meta_description"))
                .put("source", doc.source)
                .build(),
            source_info: info,
            ..Default::default()
        };
        apply_topics(&mut record, ctx.topics.normalize(topic_names(&doc.topics)));

        Some(record)
    }
}

fn as_object(value: &Option<Value>) -> Option<&Section> {
    value.as_ref().and_then(Value::as_object)
}

fn text_value(value: &Value) -> Option<String> {
    value.as_str().and_then(fields::clean_text)
}

fn string(value: &Option<Value>) -> Option<String> {
    value.as_ref().and_then(text_value)
}

/// `[{"name": ..}, ..]`; entries without a usable name are ignored.
fn topic_names(topics: &Option<Value>) -> Vec<String> {
    match topics {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|t| t.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Adapter;
    use speakerunify_normalize::TopicCanonicalizer;

    #[test]
    fn tolerates_nulls_everywhere() {
        let doc = json!({
            "name": "Alex Kim",
            "topics": [null, {"name": "Innovation"}, {"label": "x"}, "bare"],
            "images": null,
            "additional_info": null,
            "structured_data": null,
            "location": null
        });
        let canon = TopicCanonicalizer::default();
        let record = BigSpeakAdapter.adapt(&doc, &canon).expect("adapts");

        assert_eq!(record.topics.iter().collect::<Vec<_>>(), vec!["Innovation"]);
        assert!(record.location.is_empty());
        assert!(record.source_info.source_id.starts_with("unknown-"));

        // Placeholder ids are stable across runs.
        let again = BigSpeakAdapter.adapt(&doc, &canon).expect("adapts");
        assert_eq!(record.id, again.id);
    }

    #[test]
    fn structured_data_fallbacks() {
        let doc = json!({
            "speaker_id": 981,
            "name": "Alex Kim",
            "structured_data": {
                "email": "alex@example.com",
                "telephone": "+1 555 0100",
                "job_title": "Futurist",
                "address": {
                    "addressLocality": "Boston",
                    "addressRegion": "MA",
                    "addressCountry": "US"
                }
            },
            "additional_info": {"virtual_capable": true, "meta_description": "Futurist speaker"},
            "first_scraped_at": "2023-01-05"
        });
        let record = BigSpeakAdapter
            .adapt(&doc, &TopicCanonicalizer::default())
            .expect("adapts");

        assert_eq!(record.id, record_id(Source::BigSpeak, "981"));
        assert_eq!(record.job_title.as_deref(), Some("Futurist"));
        assert_eq!(record.contact["email"], "alex@example.com");
        assert_eq!(record.contact["phone"], "+1 555 0100");
        assert_eq!(record.city(), Some("Boston"));
        assert_eq!(record.speaking_info.expect("speaking")["virtual_capable"], true);
        assert_eq!(record.metadata.expect("metadata")["meta_description"], "Futurist speaker");
        assert!(record.source_info.first_scraped_at.is_some());
    }

    #[test]
    fn travels_from_wins_over_address() {
        let doc = json!({
            "speaker_id": "x",
            "location": {"travels_from": "Denver, Colorado, USA"},
            "structured_data": {"address": {"addressLocality": "Boston"}}
        });
        let record = BigSpeakAdapter
            .adapt(&doc, &TopicCanonicalizer::default())
            .expect("adapts");
        assert_eq!(record.city(), Some("Denver"));
    }
}

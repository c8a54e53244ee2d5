//! A-Speakers adapter.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Value, json};
use speakerunify_normalize::parse_location;
use speakerunify_shared::{Section, Source, SpeakerRecord};

use super::fields::{
    self, SectionBuilder, apply_topics, de, put_channel, record_id, social_links, string_list,
    text,
};
use super::{AdaptContext, SourceAdapter};

/// Native A-Speakers profile.
#[derive(Debug, Deserialize)]
pub struct ASpeakersDoc {
    #[serde(rename = "_id", deserialize_with = "de::native_id")]
    id: String,
    name: Option<String>,
    job_title: Option<String>,
    description: Option<String>,
    full_bio: Option<String>,
    location: Option<Value>,
    website: Option<String>,
    social_media: Option<Value>,
    fee_range: Option<Value>,
    languages: Option<Value>,
    topics: Option<Vec<String>>,
    keynotes: Option<Value>,
    image_url: Option<String>,
    videos: Option<Vec<Section>>,
    why_book_points: Option<Value>,
    reviews: Option<Value>,
    average_rating: Option<Value>,
    total_reviews: Option<Value>,
    url: Option<String>,
    scraped_at: Option<Value>,
}

pub struct ASpeakersAdapter;

impl SourceAdapter for ASpeakersAdapter {
    type Native = ASpeakersDoc;

    fn source(&self) -> Source {
        Source::ASpeakers
    }

    fn transform(&self, doc: ASpeakersDoc, ctx: &AdaptContext<'_>) -> Option<SpeakerRecord> {
        let mut contact = BTreeMap::new();
        put_channel(&mut contact, "website", doc.website.as_deref());

        let videos: Vec<Value> = doc.videos.iter().flatten().filter_map(video).collect();

        let mut info = fields::source_info(Source::ASpeakers, &doc.id, doc.url);
        info.scraped_at = fields::timestamp(&doc.scraped_at);

        let mut record = SpeakerRecord {
            id: record_id(Source::ASpeakers, &doc.id),
            display_name: text(doc.name.clone()),
            name: text(doc.name),
            job_title: text(doc.job_title),
            description: text(doc.description),
            biography: text(doc.full_bio),
            location: parse_location(doc.location.as_ref().unwrap_or(&Value::Null)),
            contact,
            social_media: doc.social_media.as_ref().map(social_links).unwrap_or_default(),
            speaking_info: SectionBuilder::new()
                .put("fee_ranges", json!({ "live_event": doc.fee_range }))
                .put("languages", doc.languages.as_ref().map(string_list))
                .build(),
            content: SectionBuilder::new().put("keynotes", doc.keynotes).build(),
            media: SectionBuilder::new()
                .put("profile_image", text(doc.image_url))
                .put("videos", videos)
                .build(),
            reviews: fields::value_list(&doc.reviews),
            ratings: SectionBuilder::new()
                .put("average_rating", doc.average_rating)
                .put("total_reviews", doc.total_reviews)
                .build(),
            metadata: SectionBuilder::new()
                .put("why_book_points", doc.why_book_points)
                .build(),
            source_info: info,
            ..Default::default()
        };
        apply_topics(&mut record, ctx.topics.normalize(doc.topics.unwrap_or_default()));

        Some(record)
    }
}

fn video(raw: &Section) -> Option<Value> {
    let field = |key: &str| raw.get(key).cloned();
    SectionBuilder::new()
        .put("url", field("url"))
        .put("title", field("title"))
        .put("description", field("description"))
        .put("thumbnail", field("thumbnail"))
        .put("video_id", field("video_id"))
        .build()
        .map(|mut section| {
            section.insert("type".into(), json!("video"));
            Value::Object(section)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Adapter;
    use speakerunify_normalize::{TopicCanonicalizer, TopicMapping};

    fn topics() -> TopicCanonicalizer {
        let mapping = TopicMapping::from_json_str(r#"{"Leadership": ["Executive Leadership"]}"#)
            .expect("mapping");
        TopicCanonicalizer::new(&mapping)
    }

    #[test]
    fn full_profile() {
        let doc = json!({
            "_id": {"$oid": "65a1f0c2"},
            "name": "Jane Doe",
            "job_title": "CEO",
            "full_bio": "<p>Jane leads.</p>",
            "location": "Austin, Texas, USA",
            "website": "https://jane.example",
            "social_media": {"twitter": "https://x.com/jane"},
            "fee_range": "$10k-$20k",
            "languages": "English",
            "topics": ["Executive Leadership", "Space"],
            "videos": [{"url": "https://v.example/1", "title": "Talk"}],
            "why_book_points": ["Funny"],
            "average_rating": 4.8,
            "scraped_at": "2024-03-01T10:00:00Z"
        });

        let record = ASpeakersAdapter.adapt(&doc, &topics()).expect("adapts");
        assert_eq!(record.id, record_id(Source::ASpeakers, "65a1f0c2"));
        assert_eq!(record.biography.as_deref(), Some("Jane leads."));
        assert_eq!(record.city(), Some("Austin"));
        assert_eq!(record.contact["website"], "https://jane.example");
        assert!(record.topics.contains("Leadership"));
        assert!(record.topics_unmapped.contains("Space"));
        assert_eq!(record.categories, record.topics);

        let speaking = record.speaking_info.expect("speaking info");
        assert_eq!(speaking["fee_ranges"]["live_event"], "$10k-$20k");
        assert_eq!(speaking["languages"], json!(["English"]));

        let media = record.media.expect("media");
        assert_eq!(media["videos"][0]["type"], "video");
        assert_eq!(record.source_info.original_source, "a_speakers");
        assert_eq!(record.source_info.source_id, "65a1f0c2");
        assert!(record.source_info.scraped_at.is_some());
    }

    #[test]
    fn missing_id_is_skipped() {
        assert!(ASpeakersAdapter.adapt(&json!({"name": "No Id"}), &topics()).is_none());
        assert!(ASpeakersAdapter.adapt(&json!({"_id": null}), &topics()).is_none());
    }

    #[test]
    fn null_video_entry_is_skipped() {
        let doc = json!({"_id": "1", "videos": [null]});
        assert!(ASpeakersAdapter.adapt(&doc, &topics()).is_none());
    }
}

//! All American Speakers adapter.

use serde::Deserialize;
use serde_json::Value;
use speakerunify_normalize::parse_location;
use speakerunify_shared::{Section, Source, SpeakerRecord};

use super::fields::{self, SectionBuilder, apply_topics, de, record_id, social_links, text};
use super::{AdaptContext, SourceAdapter};

/// Native All American Speakers profile.
#[derive(Debug, Deserialize)]
pub struct AllAmericanDoc {
    #[serde(deserialize_with = "de::native_id")]
    speaker_id: String,
    name: Option<String>,
    job_title: Option<String>,
    biography: Option<String>,
    location: Option<Value>,
    social_media: Option<Value>,
    fee_range: Option<Value>,
    #[serde(default)]
    categories: Vec<String>,
    /// `{title, description, ...}` objects; `title` is required.
    #[serde(default)]
    speaking_topics: Vec<Section>,
    /// `{url, type}` objects; both keys are required.
    #[serde(default)]
    images: Vec<Section>,
    videos: Option<Vec<Section>>,
    rating: Option<Value>,
    reviews: Option<Value>,
    url: Option<String>,
    scraped_at: Option<Value>,
}

pub struct AllAmericanAdapter;

impl SourceAdapter for AllAmericanAdapter {
    type Native = AllAmericanDoc;

    fn source(&self) -> Source {
        Source::AllAmerican
    }

    fn transform(&self, doc: AllAmericanDoc, ctx: &AdaptContext<'_>) -> Option<SpeakerRecord> {
        let mut raw_topics = doc.categories;
        for topic in &doc.speaking_topics {
            raw_topics.push(topic.get("title")?.as_str()?.to_string());
        }

        let mut profile_image = None;
        let mut gallery = Vec::new();
        for image in &doc.images {
            let url = image.get("url")?.clone();
            if image.get("type")? == "profile" {
                profile_image.get_or_insert(url);
            } else {
                gallery.push(url);
            }
        }

        let videos: Vec<Value> = doc
            .videos
            .iter()
            .flatten()
            .filter_map(|v| {
                let field = |key: &str| v.get(key).cloned();
                SectionBuilder::new()
                    .put("url", field("url"))
                    .put("title", field("title"))
                    .put("description", field("description"))
                    .put("type", field("type").unwrap_or_else(|| "video".into()))
                    .build()
                    .map(Value::Object)
            })
            .collect();

        let mut info = fields::source_info(Source::AllAmerican, &doc.speaker_id, doc.url);
        info.scraped_at = fields::timestamp(&doc.scraped_at);

        let mut record = SpeakerRecord {
            id: record_id(Source::AllAmerican, &doc.speaker_id),
            display_name: text(doc.name.clone()),
            name: text(doc.name),
            job_title: text(doc.job_title),
            biography: text(doc.biography),
            location: parse_location(doc.location.as_ref().unwrap_or(&Value::Null)),
            social_media: doc.social_media.as_ref().map(social_links).unwrap_or_default(),
            speaking_info: SectionBuilder::new().put("fee_ranges", doc.fee_range).build(),
            content: SectionBuilder::new()
                .put("keynotes", doc.speaking_topics)
                .build(),
            media: SectionBuilder::new()
                .put("profile_image", profile_image)
                .put("image_gallery", gallery)
                .put("videos", videos)
                .build(),
            ratings: fields::section_of(doc.rating, "average_rating"),
            reviews: fields::value_list(&doc.reviews),
            source_info: info,
            ..Default::default()
        };
        apply_topics(&mut record, ctx.topics.normalize(raw_topics));

        Some(record)
    }
}

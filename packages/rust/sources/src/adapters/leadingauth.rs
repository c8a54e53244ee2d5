//! Leading Authorities adapter.
//!
//! Leading Authorities has no stable numeric id, so the profile page URL is
//! the native id.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use speakerunify_shared::{Section, Source, SpeakerRecord};

use super::fields::{self, SectionBuilder, apply_topics, de, record_id, social_links, text};
use super::{AdaptContext, SourceAdapter};

/// Native Leading Authorities profile.
#[derive(Debug, Deserialize)]
pub struct LeadingAuthDoc {
    #[serde(deserialize_with = "de::native_id")]
    speaker_page_url: String,
    #[serde(rename = "_id", default, deserialize_with = "de::opt_native_id")]
    object_id: Option<String>,
    name: Option<String>,
    job_title: Option<String>,
    description: Option<String>,
    /// `{name, type}` objects; `name` is required.
    #[serde(default)]
    topics_and_types: Vec<Section>,
    topics: Option<Value>,
    social_media: Option<Value>,
    speaker_website: Option<String>,
    speaker_image_url: Option<String>,
    download_profile_link: Option<String>,
    download_topics_link: Option<String>,
    videos: Option<Value>,
    books_and_publications: Option<Value>,
    client_testimonials: Option<Vec<Section>>,
    recent_news: Option<Value>,
    /// Regional fee table, kept as is.
    speaker_fees: Option<Value>,
    scraped_at: Option<Value>,
}

pub struct LeadingAuthAdapter;

impl SourceAdapter for LeadingAuthAdapter {
    type Native = LeadingAuthDoc;

    fn source(&self) -> Source {
        Source::LeadingAuth
    }

    fn transform(&self, doc: LeadingAuthDoc, ctx: &AdaptContext<'_>) -> Option<SpeakerRecord> {
        let mut raw_topics = Vec::with_capacity(doc.topics_and_types.len());
        for topic in &doc.topics_and_types {
            raw_topics.push(topic.get("name")?.as_str()?);
        }
        let normalized = ctx.topics.normalize(raw_topics);

        let mut contact = BTreeMap::new();
        fields::put_channel(&mut contact, "website", doc.speaker_website.as_deref());

        let testimonials = doc
            .client_testimonials
            .iter()
            .flatten()
            .filter_map(|t| {
                SectionBuilder::new()
                    .put(
                        "content",
                        t.get("quote").and_then(Value::as_str).and_then(fields::clean_text),
                    )
                    .put("author", t.get("author").cloned())
                    .build()
                    .map(Value::Object)
            })
            .collect();

        let source_id = doc
            .object_id
            .clone()
            .unwrap_or_else(|| doc.speaker_page_url.clone());
        let mut info = fields::source_info(
            Source::LeadingAuth,
            &source_id,
            Some(doc.speaker_page_url.clone()),
        );
        info.scraped_at = fields::timestamp(&doc.scraped_at);

        let description = text(doc.description);
        let mut record = SpeakerRecord {
            id: record_id(Source::LeadingAuth, &doc.speaker_page_url),
            display_name: text(doc.name.clone()),
            name: text(doc.name),
            job_title: text(doc.job_title),
            biography: description.clone(),
            description,
            contact,
            social_media: doc.social_media.as_ref().map(social_links).unwrap_or_default(),
            speaking_info: SectionBuilder::new()
                .put("fee_ranges", doc.speaker_fees)
                .build(),
            content: SectionBuilder::new().put("topics", doc.topics).build(),
            media: SectionBuilder::new()
                .put("profile_image", text(doc.speaker_image_url))
                .put("videos", doc.videos)
                .put("profile_pdf", text(doc.download_profile_link))
                .put("topics_pdf", text(doc.download_topics_link))
                .build(),
            publications: SectionBuilder::new()
                .put("books", doc.books_and_publications)
                .build(),
            testimonials,
            metadata: SectionBuilder::new()
                .put("recent_news", doc.recent_news)
                .build(),
            source_info: info,
            ..Default::default()
        };
        apply_topics(&mut record, normalized);

        Some(record)
    }
}

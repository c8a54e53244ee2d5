//! EventRaptor adapter.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use speakerunify_shared::{Source, SpeakerRecord};

use super::fields::{self, SectionBuilder, apply_topics, de, record_id, social_links, text};
use super::{AdaptContext, SourceAdapter};

/// Native EventRaptor speaker.
#[derive(Debug, Deserialize)]
pub struct EventRaptorDoc {
    #[serde(deserialize_with = "de::native_id")]
    speaker_id: String,
    name: Option<String>,
    tagline: Option<String>,
    biography: Option<String>,
    email: Option<String>,
    business_areas: Option<Vec<String>>,
    social_media: Option<Value>,
    credentials: Option<Value>,
    presentations: Option<Value>,
    events: Option<Value>,
    profile_image: Option<String>,
    url: Option<String>,
    scraped_at: Option<Value>,
}

pub struct EventRaptorAdapter;

impl SourceAdapter for EventRaptorAdapter {
    type Native = EventRaptorDoc;

    fn source(&self) -> Source {
        Source::EventRaptor
    }

    fn transform(&self, doc: EventRaptorDoc, ctx: &AdaptContext<'_>) -> Option<SpeakerRecord> {
        let mut contact = BTreeMap::new();
        fields::put_channel(&mut contact, "email", doc.email.as_deref());

        let mut info = fields::source_info(Source::EventRaptor, &doc.speaker_id, doc.url);
        info.scraped_at = fields::timestamp(&doc.scraped_at);

        // EventRaptor profiles carry no location.
        let mut record = SpeakerRecord {
            id: record_id(Source::EventRaptor, &doc.speaker_id),
            display_name: text(doc.name.clone()),
            name: text(doc.name),
            tagline: text(doc.tagline),
            biography: text(doc.biography),
            contact,
            social_media: doc.social_media.as_ref().map(social_links).unwrap_or_default(),
            professional_info: SectionBuilder::new()
                .put("credentials", fields::one_or_many(doc.credentials))
                .build(),
            content: SectionBuilder::new()
                .put("presentations", doc.presentations)
                .build(),
            media: SectionBuilder::new()
                .put("profile_image", text(doc.profile_image))
                .build(),
            speaking_history: SectionBuilder::new().put("events", doc.events).build(),
            source_info: info,
            ..Default::default()
        };
        apply_topics(
            &mut record,
            ctx.topics.normalize(doc.business_areas.unwrap_or_default()),
        );

        Some(record)
    }
}

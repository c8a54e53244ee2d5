//! Sessionize adapter.

use serde::Deserialize;
use serde_json::Value;
use speakerunify_normalize::parse_location;
use speakerunify_shared::{Section, Source, SpeakerRecord};

use super::fields::{self, SectionBuilder, apply_topics, de, record_id, social_links, text};
use super::{AdaptContext, SourceAdapter};

/// Native Sessionize profile.
#[derive(Debug, Deserialize)]
pub struct SessionizeDoc {
    #[serde(rename = "_id", default, deserialize_with = "de::opt_native_id")]
    object_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_native_id")]
    username: Option<String>,
    name: Option<String>,
    #[serde(default)]
    basic_info: BasicInfo,
    #[serde(default)]
    professional_info: ProfessionalInfo,
    speaking_history: Option<SpeakingHistory>,
    #[serde(default)]
    metadata: Section,
}

#[derive(Debug, Default, Deserialize)]
struct BasicInfo {
    #[serde(default, deserialize_with = "de::opt_native_id")]
    username: Option<String>,
    name: Option<String>,
    tagline: Option<String>,
    bio: Option<String>,
    location: Option<Value>,
    profile_picture: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProfessionalInfo {
    #[serde(default)]
    topics: Vec<String>,
    expertise_areas: Option<Value>,
    /// Platform → string or `{url, handle, profile, ..}`.
    social_links: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SpeakingHistory {
    events: Option<Vec<Section>>,
    sessions: Option<Value>,
}

pub struct SessionizeAdapter;

impl SourceAdapter for SessionizeAdapter {
    type Native = SessionizeDoc;

    fn source(&self) -> Source {
        Source::Sessionize
    }

    fn transform(&self, doc: SessionizeDoc, ctx: &AdaptContext<'_>) -> Option<SpeakerRecord> {
        let basic = doc.basic_info;
        let professional = doc.professional_info;

        let username = basic
            .username
            .or(doc.username)
            .or(doc.object_id)
            .unwrap_or_else(|| ctx.placeholder_id());

        let speaking_history = doc.speaking_history.and_then(|history| {
            let events: Vec<Value> = history.events.iter().flatten().map(event).collect();
            SectionBuilder::new()
                .put("events", events)
                .put("sessions", history.sessions)
                .build()
        });

        let expertise = professional.expertise_areas;
        let expertise_areas = expertise.as_ref().map(fields::string_list).unwrap_or_default();

        let mut info = fields::source_info(Source::Sessionize, &username, basic.url);
        info.scraped_at = doc.metadata.get("scraped_at").and_then(fields::parse_timestamp);

        let name = text(basic.name).or_else(|| text(doc.name));
        let mut record = SpeakerRecord {
            id: record_id(Source::Sessionize, &username),
            display_name: name.clone(),
            name,
            tagline: text(basic.tagline),
            biography: text(basic.bio),
            location: parse_location(basic.location.as_ref().unwrap_or(&Value::Null)),
            social_media: professional
                .social_links
                .as_ref()
                .map(social_links)
                .unwrap_or_default(),
            professional_info: SectionBuilder::new()
                .put("expertise_areas", expertise)
                .build(),
            expertise_areas,
            media: SectionBuilder::new()
                .put("profile_image", text(basic.profile_picture))
                .build(),
            speaking_history,
            metadata: SectionBuilder::new().merge(doc.metadata).build(),
            platform_fields: SectionBuilder::new().put("username", username.as_str()).build(),
            source_info: info,
            ..Default::default()
        };
        apply_topics(&mut record, ctx.topics.normalize(professional.topics));

        Some(record)
    }
}

fn event(raw: &Section) -> Value {
    let field = |key: &str| raw.get(key).cloned();
    let mut event = SectionBuilder::new()
        .put("name", field("name"))
        .put("url", field("url"))
        .put("date", field("date"))
        .put("location", field("location"))
        .put("is_sessionize_event", field("is_sessionize_event"))
        .build()
        .unwrap_or_default();
    event.insert(
        "sessions".into(),
        field("sessions").unwrap_or_else(|| Value::Array(Vec::new())),
    );
    Value::Object(event)
}

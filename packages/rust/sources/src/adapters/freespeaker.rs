//! Free Speaker Bureau adapter.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use speakerunify_normalize::parse_location;
use speakerunify_shared::{Source, SpeakerRecord};

use super::fields::{
    self, SectionBuilder, apply_topics, de, put_channel, record_id, social_links, text,
};
use super::{AdaptContext, SourceAdapter};

/// Native Free Speaker Bureau profile.
#[derive(Debug, Deserialize)]
pub struct FreeSpeakerDoc {
    #[serde(rename = "_id", deserialize_with = "de::native_id")]
    id: String,
    name: Option<String>,
    role: Option<String>,
    biography: Option<String>,
    location: Option<Value>,
    website: Option<String>,
    #[serde(default)]
    contact_info: FreeSpeakerContact,
    social_media: Option<Value>,
    #[serde(default)]
    areas_of_expertise: Vec<String>,
    #[serde(default)]
    speaking_topics: Vec<String>,
    credentials: Option<Value>,
    awards: Option<Value>,
    member_level: Option<Value>,
    company: Option<Value>,
    speaker_since: Option<Value>,
    image_url: Option<String>,
    speaker_onesheet_url: Option<String>,
    meta_description: Option<Value>,
    email_source: Option<Value>,
    phone_source: Option<Value>,
    has_phone_section: Option<Value>,
    previous_engagements: Option<Value>,
    specialties: Option<Value>,
    profile_url: Option<String>,
    scraped_at: Option<Value>,
    created_at: Option<Value>,
    last_updated: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct FreeSpeakerContact {
    phone: Option<String>,
    email: Option<String>,
    booking_url: Option<String>,
    scheduling_url: Option<String>,
    whatsapp: Option<String>,
}

pub struct FreeSpeakerAdapter;

impl SourceAdapter for FreeSpeakerAdapter {
    type Native = FreeSpeakerDoc;

    fn source(&self) -> Source {
        Source::FreeSpeaker
    }

    fn transform(&self, doc: FreeSpeakerDoc, ctx: &AdaptContext<'_>) -> Option<SpeakerRecord> {
        let channels = &doc.contact_info;
        let mut contact = BTreeMap::new();
        put_channel(&mut contact, "phone", channels.phone.as_deref());
        put_channel(&mut contact, "email", channels.email.as_deref());
        put_channel(&mut contact, "website", doc.website.as_deref());
        put_channel(&mut contact, "booking_url", channels.booking_url.as_deref());
        put_channel(&mut contact, "scheduling_url", channels.scheduling_url.as_deref());
        put_channel(&mut contact, "whatsapp", channels.whatsapp.as_deref());

        let raw_topics: Vec<&String> = doc
            .areas_of_expertise
            .iter()
            .chain(&doc.speaking_topics)
            .collect();
        let normalized = ctx.topics.normalize(raw_topics);

        let mut info = fields::source_info(Source::FreeSpeaker, &doc.id, doc.profile_url);
        info.scraped_at = fields::timestamp(&doc.scraped_at);
        info.created_at = fields::timestamp(&doc.created_at);
        info.last_updated = fields::timestamp(&doc.last_updated);

        let has_phone_section = doc.has_phone_section.filter(|v| v.as_bool() != Some(false));

        let mut record = SpeakerRecord {
            id: record_id(Source::FreeSpeaker, &doc.id),
            display_name: text(doc.name.clone()),
            name: text(doc.name),
            job_title: text(doc.role),
            biography: text(doc.biography),
            location: parse_location(doc.location.as_ref().unwrap_or(&Value::Null)),
            contact,
            social_media: doc.social_media.as_ref().map(social_links).unwrap_or_default(),
            speaking_info: SectionBuilder::new()
                .put("speaker_since", doc.speaker_since)
                .build(),
            professional_info: SectionBuilder::new()
                .put("credentials", doc.credentials)
                .put("awards", doc.awards)
                .put("member_level", doc.member_level)
                .put("company", doc.company)
                .build(),
            media: SectionBuilder::new()
                .put("profile_image", text(doc.image_url))
                .put("profile_pdf", text(doc.speaker_onesheet_url))
                .build(),
            metadata: SectionBuilder::new()
                .put("meta_description", doc.meta_description)
                .put("email_source", doc.email_source)
                .put("phone_source", doc.phone_source)
                .put("has_phone_section", has_phone_section)
                .put("previous_engagements", doc.previous_engagements)
                .put("specialties", doc.specialties)
                .build(),
            expertise_areas: doc
                .areas_of_expertise
                .iter()
                .filter_map(|area| fields::clean_text(area))
                .collect(),
            source_info: info,
            ..Default::default()
        };
        apply_topics(&mut record, normalized);

        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Adapter;
    use serde_json::json;
    use speakerunify_normalize::TopicCanonicalizer;

    fn doc() -> Value {
        json!({
            "_id": {"$oid": "64ffab"},
            "name": "Morgan Reyes",
            "role": "Founder",
            "location": "Miami, Florida, USA",
            "website": "https://morgan.example",
            "contact_info": {
                "phone": "+1 305 555 0101",
                "email": "m@example.com",
                "booking_url": "https://book.example"
            },
            "areas_of_expertise": ["DEI"],
            "speaking_topics": ["Negotiation"],
            "company": "Reyes & Co",
            "meta_description": "Morgan Reyes, keynote speaker",
            "has_phone_section": false,
            "created_at": "2023-09-01T12:00:00",
            "last_updated": {"$date": "2024-02-02T00:00:00Z"}
        })
    }

    #[test]
    fn rich_contact_and_provenance() {
        let record = FreeSpeakerAdapter
            .adapt(&doc(), &TopicCanonicalizer::default())
            .expect("adapts");

        assert_eq!(record.contact.len(), 4);
        assert_eq!(record.contact["booking_url"], "https://book.example");
        assert_eq!(record.job_title.as_deref(), Some("Founder"));
        assert_eq!(record.expertise_areas, vec!["DEI"]);
        assert!(record.topics.contains("Negotiation"));
        assert_eq!(record.professional_info.expect("prof")["company"], "Reyes & Co");

        let metadata = record.metadata.expect("metadata");
        assert!(metadata.get("has_phone_section").is_none());
        assert_eq!(record.source_info.original_source, "freespeakerbureau");
        assert!(record.source_info.created_at.is_some());
        assert!(record.source_info.last_updated.is_some());
    }

    #[test]
    fn null_contact_info_is_skipped() {
        let mut raw = doc();
        raw["contact_info"] = Value::Null;
        assert!(
            FreeSpeakerAdapter
                .adapt(&raw, &TopicCanonicalizer::default())
                .is_none()
        );
    }
}

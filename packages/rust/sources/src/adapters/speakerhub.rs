//! SpeakerHub adapter.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Value, json};
use speakerunify_normalize::parse_location;
use speakerunify_shared::{Source, SpeakerRecord};

use super::fields::{
    self, SectionBuilder, apply_topics, de, first_text, put_channel, record_id, social_links, text,
};
use super::{AdaptContext, SourceAdapter};

/// Native SpeakerHub speaker detail page.
#[derive(Debug, Deserialize)]
pub struct SpeakerHubDoc {
    #[serde(rename = "_id", default, deserialize_with = "de::opt_native_id")]
    id: Option<String>,
    uid: Option<Value>,
    name: Option<String>,
    first_name: Option<Value>,
    last_name: Option<Value>,
    pronouns: Option<Value>,
    job_title: Option<String>,
    professional_title: Option<String>,
    company: Option<Value>,
    full_bio: Option<String>,
    bio_summary: Option<String>,
    #[serde(default)]
    topic_categories: Vec<String>,
    #[serde(default)]
    topics: Vec<String>,
    city: Option<String>,
    state_province: Option<String>,
    state: Option<String>,
    country: Option<String>,
    timezone: Option<String>,
    website: Option<String>,
    social_media: Option<Value>,
    linkedin_url: Option<String>,
    twitter_url: Option<String>,
    facebook_url: Option<String>,
    instagram_url: Option<String>,
    youtube_url: Option<String>,
    certifications: Option<Value>,
    awards: Option<Value>,
    education: Option<Value>,
    affiliations: Option<Value>,
    speaker_fees: Option<Value>,
    fee_range: Option<Value>,
    languages: Option<Value>,
    available_regions: Option<Value>,
    years_experience: Option<Value>,
    total_talks: Option<Value>,
    event_types: Option<Value>,
    presentations: Option<Value>,
    workshops: Option<Value>,
    profile_picture_url: Option<String>,
    profile_picture: Option<String>,
    banner_image_url: Option<String>,
    press_kit_url: Option<String>,
    videos: Option<Value>,
    publications: Option<Value>,
    past_talks: Option<Value>,
    testimonials: Option<Value>,
    rating: Option<Value>,
    recommendations_count: Option<Value>,
    why_choose_me: Option<Value>,
    competencies: Option<Value>,
    scraping_status: Option<Value>,
    profile_url: Option<String>,
    scraped_at: Option<Value>,
    last_updated: Option<Value>,
}

pub struct SpeakerHubAdapter;

impl SourceAdapter for SpeakerHubAdapter {
    type Native = SpeakerHubDoc;

    fn source(&self) -> Source {
        Source::SpeakerHub
    }

    fn transform(&self, doc: SpeakerHubDoc, ctx: &AdaptContext<'_>) -> Option<SpeakerRecord> {
        let native_id = doc.id.clone().unwrap_or_else(|| ctx.placeholder_id());

        let raw_topics: Vec<&String> = doc.topic_categories.iter().chain(&doc.topics).collect();
        let normalized = ctx.topics.normalize(raw_topics);

        let location = parse_location(&json!({
            "city": doc.city,
            "state": doc.state_province.as_ref().or(doc.state.as_ref()),
            "country": doc.country,
            "timezone": doc.timezone,
        }));

        let mut social = doc.social_media.as_ref().map(social_links).unwrap_or_default();
        for (platform, url) in [
            ("linkedin", &doc.linkedin_url),
            ("twitter", &doc.twitter_url),
            ("facebook", &doc.facebook_url),
            ("instagram", &doc.instagram_url),
            ("youtube", &doc.youtube_url),
        ] {
            put_channel(&mut social, platform, url.as_deref());
        }

        let mut contact = BTreeMap::new();
        put_channel(&mut contact, "website", doc.website.as_deref());

        let mut info = fields::source_info(Source::SpeakerHub, &native_id, doc.profile_url);
        info.scraped_at = fields::timestamp(&doc.scraped_at);
        info.last_updated = fields::timestamp(&doc.last_updated);

        let mut record = SpeakerRecord {
            id: record_id(Source::SpeakerHub, &native_id),
            display_name: text(doc.name.clone()),
            name: text(doc.name),
            job_title: first_text([doc.job_title.as_ref(), doc.professional_title.as_ref()]),
            biography: first_text([doc.full_bio.as_ref(), doc.bio_summary.as_ref()]),
            location,
            contact,
            social_media: social,
            speaking_info: SectionBuilder::new()
                .put("fee_ranges", fields::non_blank(doc.speaker_fees).or(doc.fee_range))
                .put("languages", doc.languages)
                .put("available_regions", doc.available_regions)
                .put("years_experience", doc.years_experience)
                .put("total_talks", doc.total_talks)
                .put("event_types", doc.event_types)
                .build(),
            professional_info: SectionBuilder::new()
                .put("pronouns", doc.pronouns)
                .put("certifications", doc.certifications)
                .put("awards", doc.awards)
                .put("education", doc.education)
                .put("affiliations", doc.affiliations)
                .put("company", doc.company)
                .put("professional_title", doc.professional_title)
                .build(),
            content: SectionBuilder::new()
                .put("presentations", doc.presentations)
                .put("workshops", doc.workshops)
                .build(),
            media: SectionBuilder::new()
                .put(
                    "profile_image",
                    first_text([doc.profile_picture_url.as_ref(), doc.profile_picture.as_ref()]),
                )
                .put("banner_image", text(doc.banner_image_url))
                .put("videos", doc.videos)
                .put("profile_pdf", text(doc.press_kit_url))
                .build(),
            publications: SectionBuilder::new()
                .put("articles", doc.publications)
                .build(),
            testimonials: fields::value_list(&doc.testimonials),
            ratings: SectionBuilder::new()
                .put("average_rating", doc.rating)
                .put("recommendation_count", doc.recommendations_count)
                .build(),
            speaking_history: SectionBuilder::new()
                .put("past_talks", doc.past_talks)
                .build(),
            metadata: SectionBuilder::new()
                .put("why_choose", doc.why_choose_me)
                .put("competencies", doc.competencies)
                .put("first_name", doc.first_name)
                .put("last_name", doc.last_name)
                .put("bio_summary", doc.bio_summary)
                .put("scraping_status", doc.scraping_status)
                .build(),
            platform_fields: SectionBuilder::new().put("uid", doc.uid).build(),
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
    use speakerunify_normalize::TopicCanonicalizer;

    #[test]
    fn flat_fields_are_grouped() {
        let doc = json!({
            "_id": 5521,
            "uid": "u-5521",
            "name": "Chris Park",
            "professional_title": "Data Scientist",
            "bio_summary": "Short bio",
            "topic_categories": ["Technology"],
            "topics": ["Data Science"],
            "city": "Seattle",
            "state_province": "WA",
            "country": "USA",
            "timezone": "America/Los_Angeles",
            "linkedin_url": "https://linkedin.com/in/cpark",
            "social_media": {"twitter": "https://x.com/old", "mastodon": "@cpark@hachyderm.io"},
            "twitter_url": "https://x.com/cpark",
            "fee_range": "$5k",
            "rating": 4.9,
            "past_talks": [{"title": "Models in prod"}]
        });
        let record = SpeakerHubAdapter
            .adapt(&doc, &TopicCanonicalizer::default())
            .expect("adapts");

        assert_eq!(record.id, record_id(Source::SpeakerHub, "5521"));
        assert_eq!(record.job_title.as_deref(), Some("Data Scientist"));
        assert_eq!(record.biography.as_deref(), Some("Short bio"));
        assert_eq!(record.location.state.as_deref(), Some("WA"));
        assert_eq!(record.location.timezone.as_deref(), Some("America/Los_Angeles"));
        assert_eq!(record.location.full_location.as_deref(), Some("Seattle, WA, USA"));
        assert_eq!(record.social_media["twitter"], "https://x.com/cpark");
        assert_eq!(record.social_media["mastodon"], "@cpark@hachyderm.io");
        assert_eq!(record.speaking_info.expect("speaking")["fee_ranges"], "$5k");
        assert_eq!(record.platform_fields.expect("platform")["uid"], "u-5521");
        assert_eq!(record.topics.len(), 2);
    }

    #[test]
    fn missing_id_uses_placeholder() {
        let record = SpeakerHubAdapter
            .adapt(&json!({"name": "Anon"}), &TopicCanonicalizer::default())
            .expect("adapts");
        assert!(record.source_info.source_id.starts_with("unknown-"));
    }
}

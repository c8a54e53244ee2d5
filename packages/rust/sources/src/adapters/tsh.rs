//! The Speaker Handbook adapter.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use speakerunify_normalize::parse_location;
use speakerunify_shared::{Source, SpeakerRecord};

use super::fields::{
    self, SectionBuilder, apply_topics, de, first_text, put_channel, record_id, social_links, text,
};
use super::{AdaptContext, SourceAdapter};

/// Native Speaker Handbook profile.
#[derive(Debug, Deserialize)]
pub struct TshDoc {
    #[serde(default, deserialize_with = "de::opt_native_id")]
    speaker_id: Option<String>,
    #[serde(rename = "_id", default, deserialize_with = "de::opt_native_id")]
    object_id: Option<String>,
    display_name: Option<String>,
    job_title: Option<String>,
    biography: Option<String>,
    strapline: Option<String>,
    travels_from: Option<Value>,
    home_country: Option<Value>,
    topics: Option<Vec<String>>,
    social_links: Option<Value>,
    #[serde(default)]
    contact: TshContact,
    website: Option<String>,
    awards: Option<Value>,
    languages: Option<Value>,
    engagement_types: Option<Value>,
    event_type: Option<Value>,
    fees: Option<Value>,
    image_url_hd: Option<String>,
    image_url: Option<String>,
    image_gallery: Option<Value>,
    download_profile_link: Option<String>,
    video_categories: Option<Value>,
    books: Option<Value>,
    testimonials: Option<Value>,
    gender: Option<Value>,
    notability: Option<Value>,
    biography_highlights: Option<Value>,
    membership: Option<Value>,
    nationality: Option<Value>,
    knows_about: Option<Value>,
    page_title: Option<Value>,
    meta_description: Option<Value>,
    scrape_status: Option<Value>,
    json_ld_talks: Option<Value>,
    profile_url: Option<String>,
    scraped_at: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct TshContact {
    email: Option<String>,
}

pub struct TshAdapter;

impl SourceAdapter for TshAdapter {
    type Native = TshDoc;

    fn source(&self) -> Source {
        Source::Tsh
    }

    fn transform(&self, doc: TshDoc, ctx: &AdaptContext<'_>) -> Option<SpeakerRecord> {
        let native_id = doc
            .speaker_id
            .or(doc.object_id)
            .unwrap_or_else(|| ctx.placeholder_id());

        let mut contact = BTreeMap::new();
        put_channel(&mut contact, "email", doc.contact.email.as_deref());
        put_channel(&mut contact, "website", doc.website.as_deref());

        let origin = fields::non_blank(doc.travels_from).or_else(|| doc.home_country.clone());

        let mut info = fields::source_info(Source::Tsh, &native_id, doc.profile_url);
        info.scraped_at = fields::timestamp(&doc.scraped_at);

        let mut record = SpeakerRecord {
            id: record_id(Source::Tsh, &native_id),
            display_name: text(doc.display_name.clone()),
            name: text(doc.display_name),
            job_title: text(doc.job_title),
            biography: text(doc.biography),
            tagline: text(doc.strapline.clone()),
            location: parse_location(origin.as_ref().unwrap_or(&Value::Null)),
            contact,
            social_media: doc.social_links.as_ref().map(social_links).unwrap_or_default(),
            speaking_info: SectionBuilder::new()
                .put("languages", doc.languages)
                .put("engagement_types", doc.engagement_types)
                .put("event_types", doc.event_type)
                .put("fee_structure", doc.fees)
                .build(),
            professional_info: SectionBuilder::new().put("awards", doc.awards).build(),
            media: SectionBuilder::new()
                .put(
                    "profile_image",
                    first_text([doc.image_url_hd.as_ref(), doc.image_url.as_ref()]),
                )
                .put("image_gallery", doc.image_gallery)
                .put("profile_pdf", text(doc.download_profile_link))
                .put("video_categories", doc.video_categories)
                .build(),
            publications: SectionBuilder::new().put("books", doc.books).build(),
            testimonials: fields::value_list(&doc.testimonials),
            metadata: SectionBuilder::new()
                .put("gender", doc.gender)
                .put("notability", doc.notability)
                .put("biography_highlights", doc.biography_highlights)
                .put("membership", doc.membership)
                .put("nationality", doc.nationality)
                .put("knows_about", doc.knows_about)
                .put("page_title", doc.page_title)
                .put("meta_description", doc.meta_description)
                .put("home_country", doc.home_country)
                .put("strapline", doc.strapline)
                .put("scrape_status", doc.scrape_status)
                .put("json_ld_talks", doc.json_ld_talks)
                .build(),
            source_info: info,
            ..Default::default()
        };
        apply_topics(&mut record, ctx.topics.normalize(doc.topics.unwrap_or_default()));

        Some(record)
    }
}

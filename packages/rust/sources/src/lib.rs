//! Source adapters: one typed transform per upstream speaker directory.
//!
//! This crate provides:
//! - [`adapters`]: the [`SourceAdapter`] trait and the nine implementations
//! - [`AdapterRegistry`]: looks up the adapter for a [`Source`](speakerunify_shared::Source)

pub mod adapters;

pub use adapters::{
    AdaptContext, Adapter, AdapterRegistry, ASpeakersAdapter, AllAmericanAdapter, BigSpeakAdapter,
    EventRaptorAdapter, FreeSpeakerAdapter, LeadingAuthAdapter, SessionizeAdapter,
    SourceAdapter, SpeakerHubAdapter, TshAdapter, record_id,
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use speakerunify_normalize::TopicCanonicalizer;
    use speakerunify_shared::Source;

    // -----------------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------------

    #[test]
    fn registry_covers_every_source_in_order() {
        let registry = AdapterRegistry::new();
        let order: Vec<Source> = registry.iter().map(|a| a.source()).collect();
        assert_eq!(order, Source::ALL.to_vec());

        for source in Source::ALL {
            let adapter = registry.get(source).expect("adapter registered");
            assert_eq!(adapter.name(), source.tag());
        }
    }

    // -----------------------------------------------------------------------
    // Cross-adapter robustness
    // -----------------------------------------------------------------------

    /// A minimal document each source accepts.
    fn minimal(source: Source) -> Value {
        match source {
            Source::ASpeakers | Source::FreeSpeaker => json!({"_id": "n1", "name": "Jane Doe"}),
            Source::AllAmerican | Source::EventRaptor => {
                json!({"speaker_id": "n1", "name": "Jane Doe"})
            }
            Source::LeadingAuth => {
                json!({"speaker_page_url": "https://la.example/jane", "name": "Jane Doe"})
            }
            Source::Sessionize => json!({"basic_info": {"username": "n1", "name": "Jane Doe"}}),
            Source::Tsh => json!({"speaker_id": "n1", "display_name": "Jane Doe"}),
            Source::BigSpeak | Source::SpeakerHub => json!({"_id": "n1", "name": "Jane Doe"}),
        }
    }

    #[test]
    fn every_adapter_accepts_a_minimal_document() {
        let registry = AdapterRegistry::new();
        let canon = TopicCanonicalizer::default();

        for adapter in registry.iter() {
            let source = adapter.source();
            let record = adapter
                .adapt(&minimal(source), &canon)
                .unwrap_or_else(|| panic!("{source} rejected a minimal document"));
            assert_eq!(record.name.as_deref(), Some("Jane Doe"), "{source}");
            assert_eq!(record.source_info.original_source, source.label(), "{source}");
            assert!(record.topics_unmapped.is_subset(&record.topics), "{source}");
        }
    }

    #[test]
    fn non_object_documents_are_skipped() {
        let registry = AdapterRegistry::new();
        let canon = TopicCanonicalizer::default();

        for adapter in registry.iter() {
            for raw in [Value::Null, json!("text"), json!([1, 2]), json!(7)] {
                assert!(adapter.adapt(&raw, &canon).is_none(), "{} {raw}", adapter.name());
            }
        }
    }

    #[test]
    fn null_in_place_of_a_nested_object_is_skipped() {
        let canon = TopicCanonicalizer::default();
        let cases = [
            (Source::FreeSpeaker, json!({"_id": "1", "contact_info": null})),
            (Source::Sessionize, json!({"_id": "1", "professional_info": null})),
            (Source::Tsh, json!({"speaker_id": "1", "contact": null})),
            (Source::AllAmerican, json!({"speaker_id": "1", "images": null})),
            (Source::LeadingAuth, json!({"speaker_page_url": "u", "topics_and_types": null})),
            (Source::SpeakerHub, json!({"_id": "1", "topics": null})),
        ];

        let registry = AdapterRegistry::new();
        for (source, raw) in cases {
            let adapter = registry.get(source).expect("adapter registered");
            assert!(adapter.adapt(&raw, &canon).is_none(), "{source}");
        }
    }

    #[test]
    fn ids_are_deterministic_across_calls() {
        let registry = AdapterRegistry::new();
        let canon = TopicCanonicalizer::default();
        for adapter in registry.iter() {
            let raw = minimal(adapter.source());
            let first = adapter.adapt(&raw, &canon).expect("adapts");
            let second = adapter.adapt(&raw, &canon).expect("adapts");
            assert_eq!(first.id, second.id);
        }
    }
}

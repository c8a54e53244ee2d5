//! Applying decisions: field-level merge and the write batch.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde_json::Value;
use speakerunify_shared::{Location, Result, Section, SpeakerId, SpeakerRecord};
use speakerunify_storage::{BatchOutcome, SpeakerStore, StagedRecord};

use crate::dedup::Decision;
use crate::identity::IdentityIndex;

// ---------------------------------------------------------------------------
// Field-level merge
// ---------------------------------------------------------------------------

/// Merge `candidate` into `existing`; a field is overwritten only by a
/// non-null, non-empty candidate value.
///
/// - scalars and location parts: non-null wins
/// - contact, social media and sections: key by key, recursively
/// - testimonials, reviews, expertise areas: replaced when non-empty
/// - topic sets: union
/// - provenance: replaced, keeping the earliest `first_scraped_at`
///
/// `id` and `created_at` never change.
pub fn merge_records(existing: &mut SpeakerRecord, candidate: SpeakerRecord) {
    overwrite(&mut existing.name, candidate.name);
    overwrite(&mut existing.display_name, candidate.display_name);
    overwrite(&mut existing.job_title, candidate.job_title);
    overwrite(&mut existing.description, candidate.description);
    overwrite(&mut existing.biography, candidate.biography);
    overwrite(&mut existing.tagline, candidate.tagline);

    merge_location(&mut existing.location, candidate.location);
    merge_channels(&mut existing.contact, candidate.contact);
    merge_channels(&mut existing.social_media, candidate.social_media);

    merge_section(&mut existing.speaking_info, candidate.speaking_info);
    merge_section(&mut existing.professional_info, candidate.professional_info);
    merge_section(&mut existing.content, candidate.content);
    merge_section(&mut existing.media, candidate.media);
    merge_section(&mut existing.publications, candidate.publications);
    merge_section(&mut existing.ratings, candidate.ratings);
    merge_section(&mut existing.speaking_history, candidate.speaking_history);
    merge_section(&mut existing.metadata, candidate.metadata);
    merge_section(&mut existing.platform_fields, candidate.platform_fields);

    replace_list(&mut existing.testimonials, candidate.testimonials);
    replace_list(&mut existing.reviews, candidate.reviews);
    replace_list(&mut existing.expertise_areas, candidate.expertise_areas);

    existing.topics.extend(candidate.topics);
    existing.categories.extend(candidate.categories);
    existing.topics_unmapped.extend(candidate.topics_unmapped);

    let first_scraped_at = existing
        .source_info
        .first_scraped_at
        .into_iter()
        .chain(candidate.source_info.first_scraped_at)
        .min();
    existing.source_info = candidate.source_info;
    existing.source_info.first_scraped_at = first_scraped_at;
}

fn overwrite(slot: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        *slot = Some(value);
    }
}

fn merge_location(existing: &mut Location, candidate: Location) {
    overwrite(&mut existing.city, candidate.city);
    overwrite(&mut existing.state, candidate.state);
    overwrite(&mut existing.country, candidate.country);
    overwrite(&mut existing.full_location, candidate.full_location);
    overwrite(&mut existing.timezone, candidate.timezone);
}

fn merge_channels(existing: &mut BTreeMap<String, String>, candidate: BTreeMap<String, String>) {
    existing.extend(
        candidate
            .into_iter()
            .filter(|(_, value)| !value.trim().is_empty()),
    );
}

fn merge_section(existing: &mut Option<Section>, candidate: Option<Section>) {
    let Some(candidate) = candidate else {
        return;
    };
    match existing {
        Some(current) => merge_objects(current, candidate),
        None => {
            let mut fresh = Section::new();
            merge_objects(&mut fresh, candidate);
            *existing = (!fresh.is_empty()).then_some(fresh);
        }
    }
}

fn merge_objects(existing: &mut Section, candidate: Section) {
    for (key, value) in candidate {
        if is_empty_value(&value) {
            continue;
        }
        match value {
            Value::Object(incoming) => match existing.get_mut(&key) {
                Some(Value::Object(current)) => merge_objects(current, incoming),
                _ => {
                    existing.insert(key, Value::Object(incoming));
                }
            },
            value => {
                existing.insert(key, value);
            }
        }
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.values().all(is_empty_value),
        _ => false,
    }
}

fn replace_list<T>(existing: &mut Vec<T>, candidate: Vec<T>) {
    if !candidate.is_empty() {
        *existing = candidate;
    }
}

// ---------------------------------------------------------------------------
// Merge engine
// ---------------------------------------------------------------------------

/// What [`MergeEngine::apply`] did with a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// A new canonical record was created.
    Inserted(SpeakerId),
    /// An existing record absorbed the candidate.
    Updated(SpeakerId),
}

/// Running totals of the merge engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub new: u64,
    pub updated: u64,
    pub written: u64,
    pub write_failures: u64,
}

/// Applies decisions against the canonical store through a write batch.
///
/// Pending records are the source of truth for their ids until flushed,
/// so repeated merges into one record within a batch accumulate. A record
/// keeps the name and city it was indexed under at creation for life, so a
/// re-run rebuilds the same index it started from.
pub struct MergeEngine<'a> {
    store: &'a SpeakerStore,
    batch_size: usize,
    pending: HashMap<SpeakerId, StagedRecord>,
    order: Vec<SpeakerId>,
    stats: MergeStats,
}

impl<'a> MergeEngine<'a> {
    pub fn new(store: &'a SpeakerStore, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
            pending: HashMap::new(),
            order: Vec::new(),
            stats: MergeStats::default(),
        }
    }

    /// Apply one decision, flushing when the batch is full.
    ///
    /// NEW registers the record in `index`. A NEW candidate whose id is
    /// already stored (a re-run, or a rename that defeated the fingerprint)
    /// is merged into the stored record instead and counts as an update.
    pub async fn apply(
        &mut self,
        decision: Decision,
        candidate: SpeakerRecord,
        index: &mut IdentityIndex,
        now: DateTime<Utc>,
    ) -> Result<Applied> {
        let target = match decision {
            Decision::Match(id) => id,
            Decision::New => candidate.id.clone(),
        };

        let applied = match self.load(&target).await? {
            Some(mut existing) => {
                merge_records(&mut existing.record, candidate);
                existing.record.updated_at = Some(now);
                self.stage(existing);
                self.stats.updated += 1;
                Applied::Updated(target)
            }
            None => {
                if target != candidate.id {
                    tracing::warn!(
                        matched = %target,
                        id = %candidate.id,
                        "matched record not found, inserting candidate"
                    );
                }
                let mut record = candidate;
                record.created_at = Some(now);
                record.updated_at = None;
                if let Some(name) = record.name.as_deref() {
                    index.insert(record.id.clone(), name, record.city());
                }
                let id = record.id.clone();
                self.stage(StagedRecord::from(record));
                self.stats.new += 1;
                Applied::Inserted(id)
            }
        };

        if self.pending.len() >= self.batch_size {
            self.flush().await?;
        }
        Ok(applied)
    }

    /// Write every pending record.
    pub async fn flush(&mut self) -> Result<BatchOutcome> {
        if self.order.is_empty() {
            return Ok(BatchOutcome::default());
        }
        let batch: Vec<StagedRecord> = self
            .order
            .drain(..)
            .filter_map(|id| self.pending.remove(&id))
            .collect();

        let outcome = self.store.write_batch(&batch).await?;
        self.stats.written += outcome.written as u64;
        self.stats.write_failures += outcome.failed as u64;
        Ok(outcome)
    }

    pub fn stats(&self) -> MergeStats {
        self.stats
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Pending first, then the store. A stored row already has its index
    /// identity, which the upsert leaves untouched.
    async fn load(&mut self, id: &SpeakerId) -> Result<Option<StagedRecord>> {
        if let Some(staged) = self.pending.remove(id) {
            return Ok(Some(staged));
        }
        Ok(self.store.get(id).await?.map(StagedRecord::from))
    }

    fn stage(&mut self, staged: StagedRecord) {
        let id = staged.record.id.clone();
        if !self.order.contains(&id) {
            self.order.push(id.clone());
        }
        self.pending.insert(id, staged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use speakerunify_shared::SourceInfo;
    use uuid::Uuid;

    fn record(id: &str, name: &str) -> SpeakerRecord {
        SpeakerRecord {
            id: SpeakerId::from(id),
            name: Some(name.into()),
            source_info: SourceInfo {
                original_source: "tsh".into(),
                source_id: id.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn section(value: Value) -> Option<Section> {
        value.as_object().cloned()
    }

    // -----------------------------------------------------------------------
    // merge_records
    // -----------------------------------------------------------------------

    #[test]
    fn null_never_regresses_a_field() {
        let mut existing = record("a", "Jane Doe");
        existing.job_title = Some("CEO".into());

        merge_records(&mut existing, record("b", "Jane Doe"));
        assert_eq!(existing.job_title.as_deref(), Some("CEO"));

        let mut chair = record("b", "Jane Doe");
        chair.job_title = Some("Chair".into());
        merge_records(&mut existing, chair);
        assert_eq!(existing.job_title.as_deref(), Some("Chair"));
        assert_eq!(existing.id, SpeakerId::from("a"));
    }

    #[test]
    fn blank_strings_do_not_overwrite() {
        let mut existing = record("a", "Jane Doe");
        existing.biography = Some("Long bio".into());
        let mut candidate = record("b", "   ");
        candidate.biography = Some("".into());

        merge_records(&mut existing, candidate);
        assert_eq!(existing.name.as_deref(), Some("Jane Doe"));
        assert_eq!(existing.biography.as_deref(), Some("Long bio"));
    }

    #[test]
    fn maps_merge_key_by_key() {
        let mut existing = record("a", "Jane");
        existing.social_media.insert("twitter".into(), "https://x.com/old".into());
        existing.social_media.insert("linkedin".into(), "https://li/jane".into());
        let mut candidate = record("b", "Jane");
        candidate.social_media.insert("twitter".into(), "https://x.com/new".into());
        candidate.social_media.insert("github".into(), "https://gh/jane".into());

        merge_records(&mut existing, candidate);
        assert_eq!(existing.social_media.len(), 3);
        assert_eq!(existing.social_media["twitter"], "https://x.com/new");
        assert_eq!(existing.social_media["linkedin"], "https://li/jane");
    }

    #[test]
    fn sections_merge_recursively() {
        let mut existing = record("a", "Jane");
        existing.speaking_info = section(json!({
            "fee_ranges": {"live_event": "$10k", "virtual": "$5k"},
            "languages": ["English"]
        }));
        let mut candidate = record("b", "Jane");
        candidate.speaking_info = section(json!({
            "fee_ranges": {"live_event": "$12k", "virtual": null},
            "languages": [],
            "years_experience": 12
        }));

        merge_records(&mut existing, candidate);
        let merged = Value::Object(existing.speaking_info.expect("section"));
        assert_eq!(
            merged,
            json!({
                "fee_ranges": {"live_event": "$12k", "virtual": "$5k"},
                "languages": ["English"],
                "years_experience": 12
            })
        );
    }

    #[test]
    fn topics_union_and_lists_replace() {
        let mut existing = record("a", "Jane");
        existing.topics = ["Leadership".to_string()].into();
        existing.testimonials = vec![json!({"content": "old"})];
        let mut candidate = record("b", "Jane");
        candidate.topics = ["Space".to_string()].into();
        candidate.topics_unmapped = ["Space".to_string()].into();

        merge_records(&mut existing, candidate);
        assert_eq!(existing.topics.len(), 2);
        assert!(existing.topics_unmapped.is_subset(&existing.topics));
        assert_eq!(existing.testimonials, vec![json!({"content": "old"})]);

        let mut replacing = record("c", "Jane");
        replacing.testimonials = vec![json!({"content": "new"})];
        merge_records(&mut existing, replacing);
        assert_eq!(existing.testimonials, vec![json!({"content": "new"})]);
    }

    #[test]
    fn provenance_keeps_earliest_first_scrape() {
        let early = "2022-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let late = "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();

        let mut existing = record("a", "Jane");
        existing.source_info.first_scraped_at = Some(early);
        let mut candidate = record("b", "Jane");
        candidate.source_info.original_source = "bigspeak".into();
        candidate.source_info.first_scraped_at = Some(late);

        merge_records(&mut existing, candidate);
        assert_eq!(existing.source_info.original_source, "bigspeak");
        assert_eq!(existing.source_info.source_id, "b");
        assert_eq!(existing.source_info.first_scraped_at, Some(early));
    }

    // -----------------------------------------------------------------------
    // MergeEngine
    // -----------------------------------------------------------------------

    async fn temp_store() -> SpeakerStore {
        let path = std::env::temp_dir().join(format!("su_test_{}.db", Uuid::now_v7()));
        SpeakerStore::open(&path).await.expect("open test db")
    }

    #[tokio::test]
    async fn new_then_match_within_one_batch() {
        let store = temp_store().await;
        let mut index = IdentityIndex::new();
        let mut engine = MergeEngine::new(&store, 100);
        let now = Utc::now();

        let mut first = record("a", "Jane Doe");
        first.job_title = Some("CEO".into());
        let applied = engine.apply(Decision::New, first, &mut index, now).await.unwrap();
        assert_eq!(applied, Applied::Inserted(SpeakerId::from("a")));
        assert_eq!(index.len(), 1);

        let second = record("b", "Jane Doe");
        let applied = engine
            .apply(Decision::Match(SpeakerId::from("a")), second, &mut index, now)
            .await
            .unwrap();
        assert_eq!(applied, Applied::Updated(SpeakerId::from("a")));
        assert_eq!(engine.pending_len(), 1);

        engine.flush().await.unwrap();
        let stored = store.get(&SpeakerId::from("a")).await.unwrap().expect("stored");
        assert_eq!(stored.job_title.as_deref(), Some("CEO"));
        assert!(stored.created_at.is_some());
        assert!(stored.updated_at.is_some());
        assert_eq!(
            engine.stats(),
            MergeStats {
                new: 1,
                updated: 1,
                written: 1,
                write_failures: 0
            }
        );
    }

    #[tokio::test]
    async fn batch_flushes_at_capacity() {
        let store = temp_store().await;
        let mut index = IdentityIndex::new();
        let mut engine = MergeEngine::new(&store, 2);
        let now = Utc::now();

        for (id, name) in [("a", "Ann One"), ("b", "Bo Two"), ("c", "Cy Three")] {
            engine
                .apply(Decision::New, record(id, name), &mut index, now)
                .await
                .unwrap();
        }
        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(engine.pending_len(), 1);

        engine.flush().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn new_with_stored_id_becomes_update() {
        let store = temp_store().await;
        let mut existing = record("a", "Jane Doe");
        existing.created_at = Some(Utc::now());
        existing.tagline = Some("Original".into());
        store
            .write_batch(&[StagedRecord::from(existing)])
            .await
            .unwrap();

        let mut index = IdentityIndex::new();
        let mut engine = MergeEngine::new(&store, 10);
        let applied = engine
            .apply(Decision::New, record("a", "Jane Doe"), &mut index, Utc::now())
            .await
            .unwrap();
        assert_eq!(applied, Applied::Updated(SpeakerId::from("a")));
        engine.flush().await.unwrap();

        let stored = store.get(&SpeakerId::from("a")).await.unwrap().expect("stored");
        assert_eq!(stored.tagline.as_deref(), Some("Original"));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn renaming_match_keeps_indexed_identity() {
        let store = temp_store().await;
        let mut index = IdentityIndex::new();
        let mut engine = MergeEngine::new(&store, 1);
        let now = Utc::now();

        let mut first = record("a", "Jane Doe");
        first.location.city = Some("Austin".into());
        engine.apply(Decision::New, first, &mut index, now).await.unwrap();

        // Flushed on its own, then renamed by a match loaded back from the store.
        let mut renamed = record("t", "Jane A. Doe");
        renamed.location.city = Some("Reno".into());
        engine
            .apply(Decision::Match(SpeakerId::from("a")), renamed, &mut index, now)
            .await
            .unwrap();
        engine.flush().await.unwrap();

        let stored = store.get(&SpeakerId::from("a")).await.unwrap().expect("stored");
        assert_eq!(stored.name.as_deref(), Some("Jane A. Doe"));

        let rebuilt = IdentityIndex::from_rows(store.index_rows().await.unwrap());
        assert_eq!(rebuilt.lookup("janedoe").len(), 1);
        assert!(rebuilt.lookup("janeadoe").is_empty());
    }
}

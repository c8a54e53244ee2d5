//! In-memory identity index over the canonical collection.
//!
//! Built once per run from the stored `(id, name, city)` rows and extended
//! as NEW records are created, so decisions within a run see every record
//! written earlier in the same run, flushed or not.

use std::collections::HashMap;

use speakerunify_normalize::{fingerprint, initials_free_key};
use speakerunify_shared::SpeakerId;
use speakerunify_storage::IndexRow;

/// One known identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub id: SpeakerId,
    /// The stored record's name, compared against candidates.
    pub name: String,
    pub city: Option<String>,
}

/// `fingerprint(name) → entries`, plus a secondary key with middle initials
/// removed so `"Jane A. Doe"` can find `"Jane Doe"`.
#[derive(Debug, Default)]
pub struct IdentityIndex {
    by_fingerprint: HashMap<String, Vec<IndexEntry>>,
    by_initials_free: HashMap<String, Vec<IndexEntry>>,
    len: usize,
}

impl IdentityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from stored rows. Rows without a usable name are ignored.
    pub fn from_rows(rows: impl IntoIterator<Item = IndexRow>) -> Self {
        let mut index = Self::new();
        for row in rows {
            if let Some(name) = row.name {
                index.insert(row.id, &name, row.city.as_deref());
            }
        }
        index
    }

    /// Entries whose name has exactly this fingerprint.
    pub fn lookup(&self, fingerprint: &str) -> &[IndexEntry] {
        self.by_fingerprint
            .get(fingerprint)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every entry that could be the same person as `name`: the exact
    /// fingerprint bucket first, then the initials-free bucket, without
    /// repeating an id.
    pub fn candidates(&self, name: &str) -> Vec<&IndexEntry> {
        let key = fingerprint(name);
        if key.is_empty() {
            return Vec::new();
        }

        let mut out: Vec<&IndexEntry> = self.lookup(&key).iter().collect();
        let loose = initials_free_key(name);
        if let Some(bucket) = self.by_initials_free.get(&loose) {
            for entry in bucket {
                if !out.iter().any(|seen| seen.id == entry.id) {
                    out.push(entry);
                }
            }
        }
        out
    }

    /// Register an identity. Returns `false` (and indexes nothing) when the
    /// name has an empty fingerprint. Re-inserting an id refreshes its entry.
    pub fn insert(&mut self, id: SpeakerId, name: &str, city: Option<&str>) -> bool {
        let key = fingerprint(name);
        if key.is_empty() {
            return false;
        }
        let entry = IndexEntry {
            id,
            name: name.to_string(),
            city: city.map(str::to_string),
        };

        if upsert(self.by_fingerprint.entry(key).or_default(), entry.clone()) {
            self.len += 1;
        }
        let loose = initials_free_key(name);
        if !loose.is_empty() {
            upsert(self.by_initials_free.entry(loose).or_default(), entry);
        }
        true
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Returns `true` when the entry is new to the bucket.
fn upsert(bucket: &mut Vec<IndexEntry>, entry: IndexEntry) -> bool {
    match bucket.iter_mut().find(|e| e.id == entry.id) {
        Some(existing) => {
            *existing = entry;
            false
        }
        None => {
            bucket.push(entry);
            true
        }
    }
}

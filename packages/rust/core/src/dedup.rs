//! Match-or-new decisions for candidate records.

use speakerunify_normalize::similarity;
use speakerunify_shared::{SpeakerId, SpeakerRecord};

use crate::identity::{IdentityIndex, IndexEntry};

/// A candidate must score strictly above this to match.
pub const MATCH_THRESHOLD: f64 = 90.0;

/// Added when both sides have the same city (case-insensitive).
pub const CITY_BONUS: f64 = 10.0;

/// Outcome of [`decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Merge into this existing record.
    Match(SpeakerId),
    /// Create a new record.
    New,
}

/// Decide whether `candidate` is an already known speaker.
///
/// Each index candidate is scored by name similarity against the stored
/// name, plus [`CITY_BONUS`] for a shared city. The best score wins if it
/// exceeds [`MATCH_THRESHOLD`]; ties keep the earlier entry.
pub fn decide(index: &IdentityIndex, candidate: &SpeakerRecord) -> Decision {
    let Some(name) = candidate.name.as_deref() else {
        return Decision::New;
    };

    let best = index
        .candidates(name)
        .into_iter()
        .map(|entry| (score(name, candidate.city(), entry), entry))
        .fold(None::<(f64, &IndexEntry)>, |best, (score, entry)| match best {
            Some((top, _)) if top >= score => best,
            _ => Some((score, entry)),
        });

    match best {
        Some((score, entry)) if score > MATCH_THRESHOLD => {
            tracing::trace!(candidate = name, matched = %entry.id, score, "dedup match");
            Decision::Match(entry.id.clone())
        }
        _ => Decision::New,
    }
}

/// Similarity of `name` to the entry's stored name, with the city bonus.
pub fn score(name: &str, city: Option<&str>, entry: &IndexEntry) -> f64 {
    let base = similarity(name, &entry.name);
    match (city, entry.city.as_deref()) {
        (Some(a), Some(b)) if same_city(a, b) => base + CITY_BONUS,
        _ => base,
    }
}

fn same_city(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    !a.is_empty() && a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, city: Option<&str>) -> SpeakerRecord {
        let mut record = SpeakerRecord {
            name: Some(name.into()),
            ..Default::default()
        };
        record.location.city = city.map(str::to_string);
        record
    }

    fn index_with(name: &str, city: &str) -> IdentityIndex {
        let mut index = IdentityIndex::new();
        index.insert(SpeakerId::from("existing"), name, Some(city));
        index
    }

    #[test]
    fn middle_initial_same_city_matches() {
        let index = index_with("Jane Doe", "Austin");
        assert_eq!(
            decide(&index, &candidate("Jane A. Doe", Some("austin"))),
            Decision::Match(SpeakerId::from("existing"))
        );
    }

    #[test]
    fn middle_initial_different_city_is_new() {
        let index = index_with("Jane Doe", "Austin");
        assert_eq!(decide(&index, &candidate("Jane A. Doe", Some("Reno"))), Decision::New);
        assert_eq!(decide(&index, &candidate("Jane A. Doe", None)), Decision::New);
    }

    #[test]
    fn identical_name_matches_without_city() {
        let index = index_with("Jane Doe", "Austin");
        assert_eq!(
            decide(&index, &candidate("Jane Doe", None)),
            Decision::Match(SpeakerId::from("existing"))
        );
    }

    #[test]
    fn nameless_or_letterless_candidates_are_new() {
        let index = index_with("Jane Doe", "Austin");
        let mut nameless = candidate("x", None);
        nameless.name = None;
        assert_eq!(decide(&index, &nameless), Decision::New);
        assert_eq!(decide(&index, &candidate("1234", Some("Austin"))), Decision::New);
    }

    #[test]
    fn best_scoring_entry_wins() {
        let mut index = IdentityIndex::new();
        index.insert(SpeakerId::from("reno"), "Jane Doe", Some("Reno"));
        index.insert(SpeakerId::from("austin"), "Jane Doe", Some("Austin"));
        assert_eq!(
            decide(&index, &candidate("Jane Doe", Some("Austin"))),
            Decision::Match(SpeakerId::from("austin"))
        );
    }

    #[test]
    fn blank_cities_never_earn_the_bonus() {
        let entry = IndexEntry {
            id: SpeakerId::from("e"),
            name: "Jane Doe".into(),
            city: Some(" ".into()),
        };
        assert_eq!(score("Jane A. Doe", Some(" "), &entry), similarity("Jane A. Doe", "Jane Doe"));
    }
}

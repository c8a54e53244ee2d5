//! Canonical topic folding.
//!
//! The mapping file is a JSON object `{ "<canonical>": ["<variant>", ...] }`.
//! It is loaded once per run; a missing or malformed file is fatal because
//! every topic would otherwise land in the unmapped bucket.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use speakerunify_shared::{Result, UnifyError};

// ---------------------------------------------------------------------------
// TopicMapping
// ---------------------------------------------------------------------------

/// Canonical topic → literal variants, in file order.
#[derive(Debug, Clone, Default)]
pub struct TopicMapping {
    entries: Vec<(String, Vec<String>)>,
}

impl TopicMapping {
    /// Parse a mapping from its JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| UnifyError::parse(format!("invalid topic mapping: {e}")))
    }

    /// Read and parse a mapping file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| UnifyError::io(path, e))?;
        Self::from_json_str(&content).map_err(|e| {
            UnifyError::config(format!("topic mapping {}: {e}", path.display()))
        })
    }

    /// Number of canonical topics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(canonical, variants)` in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(canonical, variants)| (canonical.as_str(), variants.as_slice()))
    }
}

// serde_json's default map type sorts keys, which would lose the file order
// that decides duplicate-variant resolution. Collect entries directly instead.
impl<'de> Deserialize<'de> for TopicMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = TopicMapping;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of canonical topic -> list of variants")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((canonical, variants)) = map.next_entry::<String, Vec<String>>()? {
                    entries.push((canonical, variants));
                }
                Ok(TopicMapping { entries })
            }
        }

        deserializer.deserialize_map(MappingVisitor)
    }
}

// ---------------------------------------------------------------------------
// TopicCanonicalizer
// ---------------------------------------------------------------------------

/// Result of [`TopicCanonicalizer::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedTopics {
    /// Canonical topics, including unmapped ones kept verbatim.
    pub canonical: BTreeSet<String>,
    /// Topics with no mapping. Always a subset of `canonical`.
    pub unmapped: BTreeSet<String>,
}

/// Reverse index (variant → canonical) built once from a [`TopicMapping`].
#[derive(Debug, Clone, Default)]
pub struct TopicCanonicalizer {
    exact: HashMap<String, String>,
    folded: HashMap<String, String>,
}

impl TopicCanonicalizer {
    /// Build the reverse index.
    ///
    /// Canonical labels map to themselves; variants are inserted afterwards in
    /// file order, so a variant listed under several canonicals resolves to
    /// the last one.
    pub fn new(mapping: &TopicMapping) -> Self {
        let mut exact = HashMap::new();
        let mut folded = HashMap::new();

        for (canonical, _) in mapping.iter() {
            let key = collapse_whitespace(canonical);
            folded.insert(key.to_lowercase(), canonical.to_string());
            exact.insert(key, canonical.to_string());
        }
        for (canonical, variants) in mapping.iter() {
            for variant in variants {
                let key = collapse_whitespace(variant);
                if key.is_empty() {
                    continue;
                }
                folded.insert(key.to_lowercase(), canonical.to_string());
                exact.insert(key, canonical.to_string());
            }
        }

        tracing::debug!(
            canonical = mapping.len(),
            variants = exact.len(),
            "built topic reverse index"
        );

        Self { exact, folded }
    }

    /// Load the mapping file and build the reverse index.
    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::new(&TopicMapping::load(path)?))
    }

    /// Canonical target of a single topic string, if one is known.
    ///
    /// Verbatim lookup first, then a case-insensitive one.
    pub fn canonical_for(&self, topic: &str) -> Option<&str> {
        let key = collapse_whitespace(topic);
        self.exact
            .get(&key)
            .or_else(|| self.folded.get(&key.to_lowercase()))
            .map(String::as_str)
    }

    /// Fold a free-text topic list into canonical + unmapped sets.
    ///
    /// Blank entries are ignored; nothing else is ever dropped.
    pub fn normalize<I, S>(&self, raw: I) -> NormalizedTopics
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = NormalizedTopics::default();

        for topic in raw {
            let clean = collapse_whitespace(topic.as_ref());
            if clean.is_empty() {
                continue;
            }
            match self.canonical_for(&clean) {
                Some(canonical) => {
                    out.canonical.insert(canonical.to_string());
                }
                None => {
                    out.unmapped.insert(clean.clone());
                    out.canonical.insert(clean);
                }
            }
        }

        out
    }
}

fn collapse_whitespace(s: &str) -> String {
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
    WS_RE.replace_all(s.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> TopicCanonicalizer {
        let path = Path::new("../../../fixtures/json/topic_mapping.fixture.json");
        TopicCanonicalizer::from_path(path).expect("load fixture mapping")
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn every_variant_folds_to_its_canonical() {
        let json = r#"{
            "Leadership": ["leadership development", "Executive Leadership"],
            "Artificial Intelligence": ["AI", "Generative AI"]
        }"#;
        let mapping = TopicMapping::from_json_str(json).unwrap();
        let canon = TopicCanonicalizer::new(&mapping);

        for (canonical, variants) in mapping.iter() {
            for variant in variants {
                let out = canon.normalize([variant]);
                assert_eq!(out.canonical, set(&[canonical]), "variant {variant}");
                assert!(out.unmapped.is_empty(), "variant {variant}");
            }
        }
    }

    #[test]
    fn unknown_topic_is_kept_and_flagged() {
        let out = fixture().normalize(["Xyzzy Talks"]);
        assert_eq!(out.canonical, set(&["Xyzzy Talks"]));
        assert_eq!(out.unmapped, set(&["Xyzzy Talks"]));
    }

    #[test]
    fn whitespace_is_collapsed_and_blanks_ignored() {
        let out = fixture().normalize(["  Executive \n  Leadership ", "", "   ", "Xyzzy   Talks"]);
        assert_eq!(out.canonical, set(&["Leadership", "Xyzzy Talks"]));
        assert_eq!(out.unmapped, set(&["Xyzzy Talks"]));
    }

    #[test]
    fn duplicate_variant_resolves_to_last_canonical() {
        // "Machine Learning" is listed under both; "Technology" comes later.
        let canon = fixture();
        assert_eq!(canon.canonical_for("Machine Learning"), Some("Technology"));
    }

    #[test]
    fn case_insensitive_second_pass() {
        let canon = fixture();
        let out = canon.normalize(["EXECUTIVE leadership", "dei"]);
        assert_eq!(out.canonical, set(&["Diversity & Inclusion", "Leadership"]));
        assert!(out.unmapped.is_empty());
    }

    #[test]
    fn canonical_label_maps_to_itself() {
        let out = fixture().normalize(["Artificial Intelligence"]);
        assert_eq!(out.canonical, set(&["Artificial Intelligence"]));
        assert!(out.unmapped.is_empty());
    }

    #[test]
    fn preserves_file_order() {
        let mapping = TopicMapping::from_json_str(r#"{"Zeta": [], "Alpha": ["a"]}"#).unwrap();
        let order: Vec<&str> = mapping.iter().map(|(c, _)| c).collect();
        assert_eq!(order, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn malformed_mapping_is_an_error() {
        assert!(TopicMapping::from_json_str(r#"["not", "an", "object"]"#).is_err());
        assert!(TopicMapping::from_json_str(r#"{"Leadership": "not a list"}"#).is_err());

        let missing = TopicCanonicalizer::from_path(Path::new("/nonexistent/topic_mapping.json"));
        assert!(missing.is_err());
    }
}

//! Location parsing.
//!
//! Inputs come either as free text (`"City, State, Country"`) or as an
//! already-structured object. Both produce the same fixed-shape
//! [`Location`]; absent or empty input yields an all-null record.

use serde_json::Value;
use speakerunify_shared::{Location, Section};

/// Normalize any JSON location value (string, object, or null).
pub fn parse_location(input: &Value) -> Location {
    match input {
        Value::String(s) => parse_location_str(s),
        Value::Object(fields) => parse_structured(fields),
        _ => Location::default(),
    }
}

/// Split a free-text location on commas.
///
/// Three parts are city/state/country, two are city/country, and a single
/// bare token is taken as a country or region, never a city. With more than
/// three parts the first is the city and the last two are state and country.
/// `full_location` always keeps the input verbatim.
pub fn parse_location_str(raw: &str) -> Location {
    if raw.trim().is_empty() {
        return Location::default();
    }

    let parts: Vec<Option<String>> = raw.split(',').map(non_empty).collect();
    let (city, state, country) = match parts.as_slice() {
        [country] => (None, None, country.clone()),
        [city, country] => (city.clone(), None, country.clone()),
        [city, state, country] => (city.clone(), state.clone(), country.clone()),
        [city, .., state, country] => (city.clone(), state.clone(), country.clone()),
        [] => (None, None, None),
    };

    Location {
        city,
        state,
        country,
        full_location: Some(raw.to_string()),
        timezone: None,
    }
}

/// Copy a structured location through, accepting the key aliases sources use.
fn parse_structured(fields: &Section) -> Location {
    let city = first_text(fields, &["city", "addressLocality", "locality"]);
    let state = first_text(fields, &["state", "state_province", "region", "addressRegion"]);
    let country = first_text(fields, &["country", "addressCountry", "country_name"]);
    let timezone = first_text(fields, &["timezone", "time_zone"]);

    let full_location = first_text(fields, &["full_location"]).or_else(|| {
        let street = first_text(fields, &["street", "streetAddress"]);
        let postal = first_text(fields, &["postal_code", "postalCode"]);
        let joined = [street, city.clone(), state.clone(), postal, country.clone()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");
        (!joined.is_empty()).then_some(joined)
    });

    Location {
        city,
        state,
        country,
        full_location,
        timezone,
    }
}

fn first_text(fields: &Section, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| fields.get(*key).and_then(text_of))
}

/// Text content of a scalar, or of a schema.org `{ "name": ... }` object.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(obj) => obj.get("name").and_then(text_of),
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn three_part_string() {
        let loc = parse_location_str("Austin, Texas, USA");
        assert_eq!(loc.city.as_deref(), Some("Austin"));
        assert_eq!(loc.state.as_deref(), Some("Texas"));
        assert_eq!(loc.country.as_deref(), Some("USA"));
        assert_eq!(loc.full_location.as_deref(), Some("Austin, Texas, USA"));
        assert_eq!(loc.timezone, None);
    }

    #[test]
    fn bare_token_is_a_country() {
        let loc = parse_location_str("Germany");
        assert_eq!(loc.city, None);
        assert_eq!(loc.state, None);
        assert_eq!(loc.country.as_deref(), Some("Germany"));
        assert_eq!(loc.full_location.as_deref(), Some("Germany"));
    }

    #[test]
    fn two_part_string_skips_state() {
        let loc = parse_location_str("London, United Kingdom");
        assert_eq!(loc.city.as_deref(), Some("London"));
        assert_eq!(loc.state, None);
        assert_eq!(loc.country.as_deref(), Some("United Kingdom"));
    }

    #[test]
    fn long_string_keeps_first_and_last_two() {
        let loc = parse_location_str("Brooklyn, New York City, New York, USA");
        assert_eq!(loc.city.as_deref(), Some("Brooklyn"));
        assert_eq!(loc.state.as_deref(), Some("New York"));
        assert_eq!(loc.country.as_deref(), Some("USA"));
    }

    #[test]
    fn empty_input_is_all_null() {
        assert!(parse_location_str("").is_empty());
        assert!(parse_location_str("   ").is_empty());
        assert!(parse_location(&Value::Null).is_empty());
        assert!(parse_location(&json!({})).is_empty());
        assert!(parse_location(&json!(42)).is_empty());
    }

    #[test]
    fn blank_segments_become_null() {
        let loc = parse_location_str("Austin, , USA");
        assert_eq!(loc.city.as_deref(), Some("Austin"));
        assert_eq!(loc.state, None);
        assert_eq!(loc.country.as_deref(), Some("USA"));
    }

    #[test]
    fn structured_object_with_aliases() {
        let loc = parse_location(&json!({
            "city": "Denver",
            "state_province": "Colorado",
            "country": "USA",
            "timezone": "America/Denver"
        }));
        assert_eq!(loc.city.as_deref(), Some("Denver"));
        assert_eq!(loc.state.as_deref(), Some("Colorado"));
        assert_eq!(loc.timezone.as_deref(), Some("America/Denver"));
        assert_eq!(loc.full_location.as_deref(), Some("Denver, Colorado, USA"));
    }

    #[test]
    fn schema_org_address() {
        let loc = parse_location(&json!({
            "streetAddress": "1 Main St",
            "addressLocality": "Boston",
            "addressRegion": "MA",
            "postalCode": "02110",
            "addressCountry": {"@type": "Country", "name": "US"}
        }));
        assert_eq!(loc.city.as_deref(), Some("Boston"));
        assert_eq!(loc.state.as_deref(), Some("MA"));
        assert_eq!(loc.country.as_deref(), Some("US"));
        assert_eq!(loc.full_location.as_deref(), Some("1 Main St, Boston, MA, 02110, US"));
    }
}

//! Status-code matching against OpenAPI `responses` maps.
//!
//! Response maps are keyed by exact codes (`"200"`), range patterns
//! (`"1XX"`..`"5XX"`) or `"default"`. Both the response validators and the
//! mock engine resolve numeric status codes against such maps, so the two
//! lookups here are generic over the value type.

use indexmap::IndexMap;

/// Resolve a numeric status code against a status-keyed map.
///
/// Lookup order is exact code, then the `NXX` range pattern, then
/// `"default"`. Codes outside 100..=599 skip straight to `"default"`.
/// Presence of the key is what matters: an explicit `null` value under a
/// matching key is returned as a match.
///
/// # Example
///
/// ```rust,ignore
/// let responses: IndexMap<String, Value> = ...; // {"400": .., "4XX": .., "default": ..}
/// let res = find_status_code_match(402, &responses); // the "4XX" entry
/// ```
pub fn find_status_code_match<T>(code: u16, map: &IndexMap<String, T>) -> Option<&T> {
    if (100..=599).contains(&code) {
        if let Some(value) = map.get(code.to_string().as_str()) {
            return Some(value);
        }
        let pattern = format!("{}XX", code / 100);
        if let Some(value) = map.get(pattern.as_str()) {
            return Some(value);
        }
    }
    map.get("default")
}

/// Choose a representative response from a status-keyed map.
///
/// Used by the mock engine when no status code is requested. Preference
/// order:
///
/// 1. the numerically lowest exact 2xx code
/// 2. the `"2XX"` pattern
/// 3. `"default"`
/// 4. the first key in insertion order
///
/// The returned status is the parsed numeric code; pattern and `"default"`
/// keys report 200.
pub fn find_default_status_code_match<T>(map: &IndexMap<String, T>) -> Option<(u16, &T)> {
    let mut lowest: Option<(u16, &T)> = None;
    for (key, value) in map {
        if let Ok(code) = key.parse::<u16>() {
            if (200..300).contains(&code) && lowest.map_or(true, |(best, _)| code < best) {
                lowest = Some((code, value));
            }
        }
    }
    if lowest.is_some() {
        return lowest;
    }
    if let Some(value) = map.get("2XX") {
        return Some((200, value));
    }
    if let Some(value) = map.get("default") {
        return Some((200, value));
    }
    map.first()
        .map(|(key, value)| (key.parse::<u16>().unwrap_or(200), value))
}

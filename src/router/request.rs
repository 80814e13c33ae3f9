use serde_json::{Map, Value};
use std::collections::HashMap;

/// A transport-agnostic inbound request.
///
/// Transports adapt their native request type into this shape; nothing here
/// depends on any HTTP framework. The `path` may still carry a query string.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    /// HTTP method, any case
    pub method: String,
    /// Request path, possibly with a query string appended
    pub path: String,
    /// Headers, arbitrary-case keys
    pub headers: HashMap<String, String>,
    /// Pre-parsed or raw query input; when absent the query string is taken
    /// from `path`
    pub query: Option<QueryInput>,
    /// Request body. Text bodies that may or may not be JSON are passed as
    /// `Value::String`
    pub body: Option<Value>,
}

/// Query input as supplied by the transport.
#[derive(Debug, Clone)]
pub enum QueryInput {
    /// A raw query string, with or without the leading `?`
    Raw(String),
    /// An already decoded map
    Map(Map<String, Value>),
}

/// The normalized, decoded request handed to handlers and validators.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    /// Lowercased HTTP method
    pub method: String,
    /// Normalized path relative to the api root
    pub path: String,
    /// Path template variables captured from the matched operation
    pub params: Map<String, Value>,
    /// Decoded query parameters; repeated keys accumulate into arrays
    pub query: Map<String, Value>,
    /// Headers with lowercased keys
    pub headers: Map<String, Value>,
    /// Cookies parsed from the `cookie` header
    pub cookies: Map<String, Value>,
    /// Request body; strings are JSON-parsed when possible
    pub body: Option<Value>,
}

/// Parse the `cookie` header (RFC 6265 `name=value; name=value`) into a map.
pub fn parse_cookies(headers: &Map<String, Value>) -> Map<String, Value> {
    headers
        .get("cookie")
        .and_then(Value::as_str)
        .map(|c| {
            c.split(';')
                .filter_map(|pair| {
                    let mut parts = pair.trim().splitn(2, '=');
                    let name = parts.next()?.trim();
                    if name.is_empty() {
                        return None;
                    }
                    let value = parts.next().unwrap_or("").trim();
                    Some((name.to_string(), Value::String(value.to_string())))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Decode a query string into a map, accumulating repeated keys into arrays.
pub fn parse_query_string(query: &str) -> Map<String, Value> {
    let mut out = Map::new();
    let query = query.trim_start_matches('?');
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let value = Value::String(value.into_owned());
        match out.get_mut(key.as_ref()) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                out.insert(key.into_owned(), value);
            }
        }
    }
    out
}

/// The query-string portion of a path, if any.
pub(crate) fn query_of_path(path: &str) -> Option<&str> {
    path.split_once('?').map(|(_, query)| query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_cookies() {
        let mut headers = Map::new();
        headers.insert("cookie".to_string(), json!("a=b; session=x21; flag"));
        let cookies = parse_cookies(&headers);
        assert_eq!(cookies.get("a"), Some(&json!("b")));
        assert_eq!(cookies.get("session"), Some(&json!("x21")));
        assert_eq!(cookies.get("flag"), Some(&json!("")));
    }

    #[test]
    fn test_parse_query_string() {
        let q = parse_query_string("?x=1&y=two");
        assert_eq!(q.get("x"), Some(&json!("1")));
        assert_eq!(q.get("y"), Some(&json!("two")));
    }

    #[test]
    fn test_repeated_keys_become_arrays() {
        let q = parse_query_string("a=1&a=2&a=3&b=solo");
        assert_eq!(q.get("a"), Some(&json!(["1", "2", "3"])));
        assert_eq!(q.get("b"), Some(&json!("solo")));
    }

    #[test]
    fn test_percent_decoding() {
        let q = parse_query_string("name=a%20b");
        assert_eq!(q.get("name"), Some(&json!("a b")));
    }
}

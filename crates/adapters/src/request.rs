//! Raw request parts handed to the guard by the surrounding framework.

use payload_guard_engine::FieldLookup;
use std::collections::BTreeMap;

/// Parse a query string (`a=1&b=two`) into a map.
///
/// Percent-escapes and `+` are decoded; when a key repeats, the first value
/// wins.
#[must_use]
pub fn parse_query_string(query: &str) -> BTreeMap<String, String> {
    let query = query.trim().trim_start_matches('?');
    let mut map = BTreeMap::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        map.entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    map
}

/// Header map with case-insensitive names.
///
/// Names are stored lowercased; the first value of a repeated header wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: BTreeMap<String, String>,
}

impl HeaderMap {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header unless one with the same name is present.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.entries
            .entry(name.trim().to_ascii_lowercase())
            .or_insert_with(|| value.into());
    }

    /// Value of `name`, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Number of distinct headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no header is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FieldLookup for HeaderMap {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.append(name.as_ref(), value);
        }
        headers
    }
}

/// The parts of one request a guard can validate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestData {
    body: Vec<u8>,
    query: BTreeMap<String, String>,
    params: BTreeMap<String, String>,
    headers: HeaderMap,
}

impl RequestData {
    /// Empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Merge a raw query string. Keys already present keep their value.
    #[must_use]
    pub fn with_query_string(mut self, query: &str) -> Self {
        for (key, value) in parse_query_string(query) {
            self.query.entry(key).or_insert(value);
        }
        self
    }

    /// Add one query parameter unless present.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(key.into()).or_insert_with(|| value.into());
        self
    }

    /// Set one route parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add one header unless present.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Query parameters.
    #[must_use]
    pub const fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    /// Route parameters.
    #[must_use]
    pub const fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn repeated_query_keys_keep_the_first_value(
            key in "[a-z]{1,8}",
            first in "[a-z0-9]{0,8}",
            second in "[a-z0-9]{0,8}",
        ) {
            let query = parse_query_string(&format!("{key}={first}&{key}={second}"));
            prop_assert_eq!(query.get(&key), Some(&first));
            prop_assert_eq!(query.len(), 1);
        }

        #[test]
        fn header_lookup_ignores_case(name in "[A-Za-z-]{1,16}", value in "[ -~]{0,16}") {
            let headers: HeaderMap = [(name.as_str(), value.clone())].into_iter().collect();
            prop_assert_eq!(headers.get(&name.to_ascii_uppercase()), Some(value.as_str()));
            prop_assert_eq!(headers.get(&name.to_ascii_lowercase()), Some(value.as_str()));
        }
    }

    #[test]
    fn query_strings_decode_and_keep_first_value() {
        let query = parse_query_string("?q=rust+lang&page=2&page=3&tag=a%26b");

        assert_eq!(query.get("q").map(String::as_str), Some("rust lang"));
        assert_eq!(query.get("page").map(String::as_str), Some("2"));
        assert_eq!(query.get("tag").map(String::as_str), Some("a&b"));
    }

    #[test]
    fn headers_ignore_case() {
        let request = RequestData::new()
            .with_header("X-Request-Id", "abc")
            .with_header("x-request-id", "ignored");

        assert_eq!(request.headers().get("x-REQUEST-id"), Some("abc"));
        assert_eq!(request.headers().lookup("X-Request-Id"), Some("abc"));
        assert_eq!(request.headers().len(), 1);
    }

    #[test]
    fn builder_collects_every_part() {
        let request = RequestData::new()
            .with_body(r#"{"title":"hi"}"#)
            .with_query_string("page=1")
            .with_query("page", "9")
            .with_param("id", "42");

        assert_eq!(request.body(), br#"{"title":"hi"}"#);
        assert_eq!(request.query().get("page").map(String::as_str), Some("1"));
        assert_eq!(request.params().get("id").map(String::as_str), Some("42"));
        assert!(request.headers().is_empty());
    }
}

//! Inbound request model.
//!
//! # Responsibilities
//! - Capture method, path, query, headers, body and cookies of an admitted request
//! - Keep headers as an ordered list so duplicates survive exactly
//! - Produce the header set forwarded to the destination (everything but `Host`)

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};

use crate::security::ClientIdentity;

/// Ordered `(name, value)` header pairs with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList(Vec<(HeaderName, HeaderValue)>);

impl HeaderList {
    /// First value for `name`.
    pub fn get<'a>(&'a self, name: &'a str) -> Option<&'a HeaderValue> {
        self.get_all(name).next()
    }

    /// Every value for `name`, in arrival order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a HeaderValue> + 'a {
        self.0
            .iter()
            .filter(move |(n, _)| n.as_str().eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Copy of the list with every header named in `excluded` removed.
    pub fn without(&self, excluded: &[&str]) -> Self {
        self.0
            .iter()
            .filter(|(n, _)| !excluded.iter().any(|e| n.as_str().eq_ignore_ascii_case(e)))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.0.iter().map(|(n, v)| (n, v))
    }

    /// Rebuild a [`HeaderMap`], appending so duplicates are kept.
    pub fn to_header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(self.0.len());
        for (name, value) in &self.0 {
            map.append(name.clone(), value.clone());
        }
        map
    }
}

impl From<&HeaderMap> for HeaderList {
    fn from(map: &HeaderMap) -> Self {
        map.iter().map(|(n, v)| (n.clone(), v.clone())).collect()
    }
}

impl FromIterator<(HeaderName, HeaderValue)> for HeaderList {
    fn from_iter<I: IntoIterator<Item = (HeaderName, HeaderValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// An admitted request as seen by the forwarding engine.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderList,
    pub body: Bytes,
    pub cookies: BTreeMap<String, String>,
    pub client: ClientIdentity,
}

impl InboundRequest {
    pub fn from_parts(
        method: Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: Bytes,
        client: ClientIdentity,
    ) -> Self {
        let headers = HeaderList::from(headers);
        let cookies = parse_cookies(&headers);
        Self {
            method,
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            headers,
            body,
            cookies,
            client,
        }
    }

    /// Path plus `?query` when one was sent.
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }

    /// Headers sent to the destination. `Host` is dropped so the client sets
    /// the destination's own authority; cookies travel in their `Cookie` headers.
    pub fn forwarded_headers(&self) -> HeaderList {
        self.headers.without(&[header::HOST.as_str()])
    }
}

/// Parse every `Cookie` header into a name → value map. Later duplicates win.
pub fn parse_cookies(headers: &HeaderList) -> BTreeMap<String, String> {
    headers
        .get_all(header::COOKIE.as_str())
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().trim_matches('"').to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_map(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn lookup_is_case_insensitive_and_keeps_duplicates() {
        let headers = HeaderList::from(&header_map(&[
            ("x-trace", "one"),
            ("x-trace", "two"),
            ("accept", "application/json"),
        ]));

        assert_eq!(headers.get("X-Trace").unwrap(), "one");
        let all: Vec<_> = headers.get_all("X-TRACE").collect();
        assert_eq!(all, vec!["one", "two"]);
        assert_eq!(headers.iter().count(), 3);
    }

    #[test]
    fn without_removes_all_values_of_named_headers() {
        let headers = HeaderList::from(&header_map(&[
            ("connection", "keep-alive"),
            ("set-cookie", "a=1"),
            ("set-cookie", "b=2"),
        ]));

        let filtered = headers.without(&["Connection"]);
        assert!(!filtered.contains("connection"));
        assert_eq!(filtered.get_all("set-cookie").count(), 2);
    }

    #[test]
    fn header_map_round_trip_preserves_duplicates() {
        let headers = HeaderList::from(&header_map(&[("vary", "accept"), ("vary", "origin")]));
        let map = headers.to_header_map();
        assert_eq!(map.get_all("vary").iter().count(), 2);
    }

    #[test]
    fn forwarded_headers_drop_host_only() {
        let uri: Uri = "/api/payment/checkout?currency=USD".parse().unwrap();
        let request = InboundRequest::from_parts(
            Method::POST,
            &uri,
            &header_map(&[
                ("host", "proxy.local:5002"),
                ("content-type", "application/json"),
                ("cookie", "session=abc"),
            ]),
            Bytes::from_static(br#"{"amount": 100}"#),
            ClientIdentity::unknown(),
        );

        let forwarded = request.forwarded_headers();
        assert!(!forwarded.contains("host"));
        assert_eq!(forwarded.get("content-type").unwrap(), "application/json");
        assert_eq!(forwarded.get("cookie").unwrap(), "session=abc");
        assert_eq!(request.path_and_query(), "/api/payment/checkout?currency=USD");
    }

    #[test]
    fn parses_cookies_from_all_cookie_headers() {
        let headers = HeaderList::from(&header_map(&[
            ("cookie", "session=abc; theme=\"dark\""),
            ("cookie", "lang=en;broken"),
        ]));

        let cookies = parse_cookies(&headers);
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies["session"], "abc");
        assert_eq!(cookies["theme"], "dark");
        assert_eq!(cookies["lang"], "en");
    }
}

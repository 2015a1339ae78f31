use crate::router::{ParamVec, RouteMatch, SplatVec};
use http::Method;
use serde_json::Value;
use std::collections::HashMap;

/// Parsed HTTP request handed to the dispatch pipeline by the transport layer.
///
/// One `Request` is built per incoming request and threaded mutably through the
/// pipeline. The named-parameter and wildcard captures are re-pointed for each
/// matched filter or route before its handler runs, so `param()` and `splat()`
/// always reflect the pattern currently being executed.
#[derive(Debug)]
pub struct Request {
    method: Method,
    /// Raw request URI including any query string
    uri: String,
    /// Path portion of the URI (everything before `?`)
    path: String,
    /// HTTP headers (lowercase keys)
    headers: HashMap<String, String>,
    /// Parsed query string parameters
    query_params: HashMap<String, String>,
    body: Option<String>,
    /// Request-scoped attributes, shared between filters and the route handler
    attributes: HashMap<String, Value>,
    /// Named captures from the pattern currently executing
    params: ParamVec,
    /// Wildcard captures from the pattern currently executing
    splat: SplatVec,
}

/// Parse query string parameters from a request URI.
///
/// Extracts everything after the `?` character and URL-decodes parameter
/// names and values.
pub fn parse_query_params(uri: &str) -> HashMap<String, String> {
    if let Some(pos) = uri.find('?') {
        let query_str = &uri[pos + 1..];
        url::form_urlencoded::parse(query_str.as_bytes())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    } else {
        HashMap::new()
    }
}

impl Request {
    /// Build a request from transport-level parts.
    ///
    /// Header names are lowercased so lookups are case-insensitive; the query
    /// string is split off the URI and parsed eagerly.
    #[must_use]
    pub fn new(
        method: Method,
        uri: impl Into<String>,
        headers: HashMap<String, String>,
        body: Option<String>,
    ) -> Self {
        let uri = uri.into();
        let path = uri.split('?').next().unwrap_or("/").to_string();
        let query_params = parse_query_params(&uri);
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        Self {
            method,
            uri,
            path,
            headers,
            query_params,
            body,
            attributes: HashMap::new(),
            params: ParamVec::new(),
            splat: SplatVec::new(),
        }
    }

    /// Shorthand constructor for a request with no extra headers or body.
    #[must_use]
    pub fn from_parts(method: Method, uri: impl Into<String>) -> Self {
        Self::new(method, uri, HashMap::new(), None)
    }

    /// Attach a header, replacing any existing value (builder style).
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Attach a body (builder style).
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Raw request URI, including the query string if present.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get a header by name (case-insensitive per RFC 7230).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The declared `Accept` header, used for content-type route matching.
    #[must_use]
    pub fn accept(&self) -> Option<&str> {
        self.header("accept")
    }

    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Get a query parameter by name.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    /// Get a named path parameter captured by the current match.
    ///
    /// Accepts the name with or without the leading colon, so both
    /// `param("name")` and `param(":name")` resolve the `:name` token.
    /// Uses "last write wins" semantics when the same name occurs at
    /// several path depths.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        let name = name.strip_prefix(':').unwrap_or(name);
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Wildcard captures from the current match, in left-to-right order.
    #[must_use]
    pub fn splat(&self) -> &[String] {
        &self.splat
    }

    /// Convert the current match's params to a HashMap.
    /// Note: this allocates - use `param()` in hot paths instead.
    #[must_use]
    pub fn params_map(&self) -> HashMap<String, String> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// Get a request-scoped attribute set by an earlier filter or handler.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Set a request-scoped attribute visible to later filters and handlers
    /// within the same dispatch.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: Value) {
        self.attributes.insert(name.into(), value);
    }

    /// Re-point the parameter and wildcard captures at the given match.
    /// Called by the pipeline before each matched handler runs.
    pub(crate) fn apply_match(&mut self, route_match: &RouteMatch) {
        self.params = route_match.params.clone();
        self.splat = route_match.splat.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_params() {
        let q = parse_query_params("/p?x=1&y=2");
        assert_eq!(q.get("x"), Some(&"1".to_string()));
        assert_eq!(q.get("y"), Some(&"2".to_string()));
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut h = HashMap::new();
        h.insert("Accept".to_string(), "application/json".to_string());
        let req = Request::new(Method::GET, "/pets", h, None);
        assert_eq!(req.header("ACCEPT"), Some("application/json"));
        assert_eq!(req.accept(), Some("application/json"));
    }

    #[test]
    fn test_path_splits_off_query_string() {
        let req = Request::from_parts(Method::GET, "/pets?limit=10");
        assert_eq!(req.path(), "/pets");
        assert_eq!(req.uri(), "/pets?limit=10");
        assert_eq!(req.query_param("limit"), Some("10"));
    }
}

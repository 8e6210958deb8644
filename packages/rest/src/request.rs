//! Per-call request values and parameter serialization.
//!
//! A `RequestContext` is built fresh for every logical call and consumed by
//! `RestClient::send`, so no parameter set, policy or callback can leak from
//! one exchange into the next. The client instance itself keeps only static
//! configuration.

use url::form_urlencoded;

use crate::cache::CachePolicy;
use crate::types::Method;

/// An insertion-ordered parameter map.
///
/// Setting an existing name replaces its value in place. Enumeration order is
/// the insertion order, which makes query strings, bodies and cache keys
/// deterministic for a given call site. Order is irrelevant to request
/// semantics but deliberately significant to cache-key derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any existing value for the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl ToString) {
        let name = name.into();
        let value = value.to_string();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Builder-style `set`.
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set(name, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// How POST/PUT parameter bodies are serialized on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyEncoding {
    /// `application/x-www-form-urlencoded`: `key=value` pairs joined by `&`.
    #[default]
    Form,
    /// A single JSON object holding every parameter.
    Json,
}

impl BodyEncoding {
    pub fn content_type(self) -> &'static str {
        match self {
            BodyEncoding::Form => "application/x-www-form-urlencoded",
            BodyEncoding::Json => "application/json",
        }
    }
}

/// Everything that varies per logical call: method, endpoint path, parameter
/// set and cache policy.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    method: Method,
    path: String,
    params: Params,
    policy: CachePolicy,
}

impl RequestContext {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self {
            method: Method::PUT,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.set(name, value);
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Cache interaction only applies to GET; other methods ignore the
    /// policy at dispatch time.
    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }
}

/// Append percent-encoded parameters to a URL that may already carry a query
/// string.
pub(crate) fn append_query(url: &str, params: &Params) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let joiner = if url.contains('?') { '&' } else { '?' };
    format!("{url}{joiner}{}", encode_pairs(params))
}

/// `application/x-www-form-urlencoded` body.
pub(crate) fn form_body(params: &Params) -> String {
    encode_pairs(params)
}

/// Single-JSON-object body: every parameter becomes a string member.
pub(crate) fn json_body(params: &Params) -> String {
    let mut object = serde_json::Map::new();
    for (name, value) in params.iter() {
        object.insert(name.to_string(), serde_json::Value::from(value));
    }
    serde_json::Value::Object(object).to_string()
}

fn encode_pairs(params: &Params) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in params.iter() {
        serializer.append_pair(name, value);
    }
    serializer.finish()
}

use serde::Serialize;
use serde_json::{Map, Value};

/// HTTP method for requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
}

impl Method {
    /// Whether this method carries a serialized parameter body.
    pub fn has_body(self) -> bool {
        matches!(self, Method::POST | Method::PUT)
    }

    /// Only reads consult the cache-policy table.
    pub fn is_read(self) -> bool {
        self == Method::GET
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => http::Method::GET,
            Method::POST => http::Method::POST,
            Method::PUT => http::Method::PUT,
            Method::DELETE => http::Method::DELETE,
        }
    }
}

/// A raw HTTP exchange result: numeric status and undecoded body text.
///
/// Produced by an `HttpExecutor`. Classification (success vs status error)
/// and body parsing happen one layer up, in the client.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    /// Check if the response status indicates success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A parsed response body.
///
/// The structural type is inferred from the first non-whitespace character of
/// the raw body rather than a declared content type: `{` parses as a JSON
/// object, `[` as a JSON array, and anything else is passed through verbatim
/// as an opaque string so non-JSON acknowledgements don't fail the call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Object(Map<String, Value>),
    Array(Vec<Value>),
    Raw(String),
}

impl Payload {
    /// Sniff and parse a raw body.
    ///
    /// Returns `Err` only when the body looked like JSON (`{` or `[`) but
    /// failed to parse.
    pub fn sniff(raw: &str) -> Result<Payload, serde_json::Error> {
        let trimmed = raw.trim();
        match trimmed.chars().next() {
            Some('{') => Ok(Payload::Object(serde_json::from_str(trimmed)?)),
            Some('[') => Ok(Payload::Array(serde_json::from_str(trimmed)?)),
            _ => Ok(Payload::Raw(raw.to_string())),
        }
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Payload::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Payload::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&str> {
        match self {
            Payload::Raw(text) => Some(text),
            _ => None,
        }
    }
}

/// The single tagged result produced per dispatched request.
pub type Outcome = Result<Payload, crate::error::Error>;

//! # chime-feedback
//!
//! Host-facing surface of the chime feedback service, built on the
//! `chime-rest` core. Collects nothing itself: the host hands over message
//! text, reporter identity and any extra properties it wants attached, and
//! registers a `Handlers` pair for the outcome.
//!
//! ```ignore
//! use chime_feedback::{Feedback, FeedbackClient, FeedbackConfig};
//! use chime_rest::Handlers;
//!
//! let client = FeedbackClient::new(FeedbackConfig::new(42, "abc123", cache_dir))?;
//! client.submit(
//!     Feedback::new("love the app", "a@b.com").with_nps(9),
//!     Handlers::new().on_error(|error| eprintln!("submit failed: {error}")),
//! )?;
//! ```

use std::path::PathBuf;
use std::time::Duration;

use chime_rest::{
    ClientConfig, Delivery, Error, Handlers, Params, RequestContext, RestClient, TrustMode,
};

/// Hosted service endpoint used when the config does not override it.
pub const DEFAULT_BASE_URL: &str = "https://chime.app/api/";

const USER_AGENT: &str = concat!("Chime Rust SDK/", env!("CARGO_PKG_VERSION"));

/// Configuration for a feedback client: which application it reports to and
/// how to reach the service.
#[derive(Debug, Clone)]
pub struct FeedbackConfig {
    app_id: u64,
    api_key: String,
    cache_dir: PathBuf,
    base_url: String,
    language: String,
    trust: TrustMode,
    timeout: Duration,
}

impl FeedbackConfig {
    pub fn new(app_id: u64, api_key: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_id,
            api_key: api_key.into(),
            cache_dir: cache_dir.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            language: "en".to_string(),
            trust: TrustMode::default(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Point at a self-hosted service instead of the default endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Reporter language attached to submitted feedback.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_trust_mode(mut self, trust: TrustMode) -> Self {
        self.trust = trust;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// One piece of user feedback.
#[derive(Debug, Clone, Default)]
pub struct Feedback {
    message: String,
    email: String,
    name: Option<String>,
    properties: serde_json::Map<String, serde_json::Value>,
    tags: Vec<String>,
    nps: Option<u8>,
}

impl Feedback {
    pub fn new(message: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach an arbitrary host-supplied property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Net-promoter rating, 0–10.
    pub fn with_nps(mut self, score: u8) -> Self {
        self.nps = Some(score);
        self
    }
}

/// A tracked product event.
#[derive(Debug, Clone, Default)]
pub struct Event {
    user_id: String,
    name: String,
    attributes: serde_json::Map<String, serde_json::Value>,
}

impl Event {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Client for one registered application.
pub struct FeedbackClient {
    rest: RestClient,
    app_id: u64,
    language: String,
}

impl FeedbackClient {
    pub fn new(config: FeedbackConfig) -> Result<Self, Error> {
        let rest = RestClient::new(
            ClientConfig::new(config.base_url.clone(), config.cache_dir.clone())
                .with_url_suffix(format!("?key={}", config.api_key))
                .with_user_agent(USER_AGENT)
                .with_trust_mode(config.trust)
                .with_timeout(config.timeout),
        )?;
        Ok(Self {
            rest,
            app_id: config.app_id,
            language: config.language,
        })
    }

    /// Submit user feedback.
    pub fn submit(&self, feedback: Feedback, handlers: Handlers) -> Result<Delivery, Error> {
        let context = RequestContext::post(self.endpoint("submit"))
            .with_params(submit_params(&feedback, &self.language));
        self.rest.send(context, handlers)
    }

    /// Record that the feedback entry point was shown.
    pub fn impression(&self, handlers: Handlers) -> Result<Delivery, Error> {
        let context = RequestContext::post(self.endpoint("impression")).with_params(base_params());
        self.rest.send(context, handlers)
    }

    /// Record that the feedback form was opened.
    pub fn open(&self, handlers: Handlers) -> Result<Delivery, Error> {
        let context = RequestContext::post(self.endpoint("open")).with_params(base_params());
        self.rest.send(context, handlers)
    }

    /// Track a product event for a known user.
    pub fn track(&self, event: Event, handlers: Handlers) -> Result<Delivery, Error> {
        let context =
            RequestContext::post(self.endpoint("event")).with_params(event_params(&event));
        self.rest.send(context, handlers)
    }

    /// Stop delivering completions for in-flight calls.
    pub fn cancel(&self) {
        self.rest.cancel();
    }

    fn endpoint(&self, action: &str) -> String {
        format!("applications/{}/{}", self.app_id, action)
    }
}

/// Standing parameters attached to every call.
fn base_params() -> Params {
    Params::new()
        .with("sdk", "rust")
        .with("version", env!("CARGO_PKG_VERSION"))
}

fn submit_params(feedback: &Feedback, language: &str) -> Params {
    let mut params = base_params()
        .with("message", &feedback.message)
        .with("email", &feedback.email)
        .with(
            "properties",
            serde_json::Value::Object(feedback.properties.clone()),
        )
        .with("language", language)
        .with(
            "tags_json",
            serde_json::Value::from(feedback.tags.clone()),
        );
    if let Some(name) = &feedback.name {
        params.set("name", name);
    }
    if let Some(nps) = feedback.nps {
        params.set("nps", nps);
    }
    params
}

fn event_params(event: &Event) -> Params {
    let mut params = base_params()
        .with("external_user_id", &event.user_id)
        .with("name", &event.name);
    if !event.attributes.is_empty() {
        params.set(
            "attributes_json",
            serde_json::Value::Object(event.attributes.clone()),
        );
    }
    params
}

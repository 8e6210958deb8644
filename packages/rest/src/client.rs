//! Request orchestration: the cache-policy state machine and result routing.
//!
//! `RestClient` holds static configuration only. Every logical call passes a
//! fresh `RequestContext` and `Handlers` pair to `send`, which consults the
//! cache policy, optionally serves from the disk cache, and queues the
//! network leg on the client's background worker. Exactly one outcome is
//! delivered per dispatched request, except for a `CacheThenNetwork` hit
//! (two successes, cache first) and `UpdateCache` (none).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CachePolicy, DiskCache};
use crate::dispatcher::{Delivery, Dispatcher, Job, OutcomeSender};
use crate::error::Error;
use crate::executor::{HttpExecutor, PreparedRequest, ReqwestExecutor, TransportOptions, TrustMode};
use crate::request::{self, BodyEncoding, RequestContext};
use crate::types::{Method, Payload, RawResponse};

/// Static configuration for a client instance.
///
/// `base_url` should end with a slash; the per-call path and the optional
/// `url_suffix` are concatenated onto it verbatim.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    url_suffix: String,
    user_agent: Option<String>,
    basic_auth: Option<(String, String)>,
    trust: TrustMode,
    encoding: BodyEncoding,
    timeout: Duration,
    cache_dir: PathBuf,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            url_suffix: String::new(),
            user_agent: None,
            basic_auth: None,
            trust: TrustMode::default(),
            encoding: BodyEncoding::default(),
            timeout: Duration::from_secs(30),
            cache_dir: cache_dir.into(),
        }
    }

    /// Appended after the path of every endpoint, e.g. `?key=abc123`.
    pub fn with_url_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.url_suffix = suffix.into();
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((username.into(), password.into()));
        self
    }

    pub fn with_trust_mode(mut self, trust: TrustMode) -> Self {
        self.trust = trust;
        self
    }

    pub fn with_body_encoding(mut self, encoding: BodyEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            timeout: self.timeout,
            user_agent: self.user_agent.clone(),
            basic_auth: self.basic_auth.clone(),
            trust: self.trust,
        }
    }
}

/// The callback pair a collaborator registers per logical call.
///
/// `on_success` is `FnMut` because a `CacheThenNetwork` hit delivers twice:
/// the cached result immediately, then the network result when it arrives.
#[derive(Default)]
pub struct Handlers {
    on_success: Option<Box<dyn FnMut(&Payload) + Send>>,
    on_error: Option<Box<dyn FnMut(&Error) + Send>>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_success(mut self, callback: impl FnMut(&Payload) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl FnMut(&Error) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    fn success(&mut self, payload: &Payload) {
        if let Some(callback) = &mut self.on_success {
            callback(payload);
        }
    }

    fn error(&mut self, error: &Error, notifier: &dyn Notifier) {
        match &mut self.on_error {
            Some(callback) => callback(error),
            None => notifier.notify(error),
        }
    }
}

/// Host-level collaborator that receives failures no error callback claimed.
pub trait Notifier: Send + Sync {
    fn notify(&self, error: &Error);
}

/// Default notifier: logs and moves on.
struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, error: &Error) {
        tracing::warn!(%error, "request failed with no error callback registered");
    }
}

/// Client for one remote API: static configuration, a disk cache and a
/// dedicated background worker.
///
/// Requests issued against the same instance while one is pending are queued
/// and run strictly after it; instances are independent and may run
/// concurrently.
pub struct RestClient {
    config: ClientConfig,
    cache: DiskCache,
    dispatcher: Dispatcher,
    notifier: Arc<dyn Notifier>,
}

impl RestClient {
    /// Build a client with the production transport.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let executor = ReqwestExecutor::new(config.transport_options()).map_err(Error::Transport)?;
        Ok(Self::with_executor(config, Arc::new(executor)))
    }

    /// Build a client over an arbitrary executor. This is the test seam.
    pub fn with_executor(config: ClientConfig, executor: Arc<dyn HttpExecutor>) -> Self {
        let cache = DiskCache::new(config.cache_dir.clone());
        let dispatcher = Dispatcher::spawn(executor);
        Self {
            config,
            cache,
            dispatcher,
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Replace the default (logging) fallback notifier.
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    /// Dispatch one exchange. Never blocks on network I/O; a cache-served
    /// result (policies that read the cache) is parsed and delivered
    /// synchronously before this returns.
    pub fn send(&self, context: RequestContext, mut handlers: Handlers) -> Result<Delivery, Error> {
        let endpoint = self.endpoint(context.path());
        let key = DiskCache::key_for(&endpoint, context.params());
        let (tx, delivery) = Delivery::channel();

        // The policy table only exists for reads.
        let policy = if context.method().is_read() {
            context.policy()
        } else {
            CachePolicy::IgnoreCache
        };

        let mut served_from_cache = false;
        if policy.reads_cache() {
            if let Some(body) = self.cache.get(&key) {
                match Payload::sniff(&body) {
                    Ok(payload) => {
                        handlers.success(&payload);
                        let _ = tx.send(Ok(payload));
                        served_from_cache = true;
                    }
                    Err(error) => {
                        // Corrupt entry: treat as a miss and let the network
                        // leg overwrite it.
                        tracing::debug!(%key, %error, "cached body failed to parse");
                    }
                }
            }
        }

        if policy == CachePolicy::CacheElseNetwork && served_from_cache {
            return Ok(delivery);
        }

        let prepared = self.prepare(&context, &endpoint)?;
        let method = context.method();
        let cache = self.cache.clone();
        let notifier = Arc::clone(&self.notifier);
        self.dispatcher.submit(Job {
            request: prepared,
            complete: Box::new(move |result| {
                complete_exchange(result, method, policy, &key, &cache, handlers, tx, notifier);
            }),
        })?;

        Ok(delivery)
    }

    /// Stop delivering completions for this instance. Best-effort: an
    /// exchange already inside its socket call may still finish the
    /// transport leg, but its result never reaches a callback.
    pub fn cancel(&self) {
        self.dispatcher.cancel();
    }

    /// Delete every cached entry. Intended for external lifecycle events
    /// (low storage, explicit user action), not called by the core itself.
    pub fn clear_cache(&self) -> std::io::Result<()> {
        self.cache.clear()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.config.base_url, path, self.config.url_suffix)
    }

    fn prepare(&self, context: &RequestContext, endpoint: &str) -> Result<PreparedRequest, Error> {
        let method = context.method();
        let (url, body, content_type) = if method == Method::GET {
            (request::append_query(endpoint, context.params()), None, None)
        } else if method.has_body() {
            let body = match self.config.encoding {
                BodyEncoding::Form => request::form_body(context.params()),
                BodyEncoding::Json => request::json_body(context.params()),
            };
            (
                endpoint.to_string(),
                Some(body),
                Some(self.config.encoding.content_type()),
            )
        } else {
            (endpoint.to_string(), None, None)
        };

        url::Url::parse(&url)?;

        Ok(PreparedRequest {
            method,
            url,
            body,
            content_type,
        })
    }
}

/// Consume the worker's raw result: classify the status, sniff/parse the
/// body, write the cache where the policy says so, and deliver.
#[allow(clippy::too_many_arguments)]
fn complete_exchange(
    result: Result<RawResponse, String>,
    method: Method,
    policy: CachePolicy,
    key: &str,
    cache: &DiskCache,
    mut handlers: Handlers,
    tx: OutcomeSender,
    notifier: Arc<dyn Notifier>,
) {
    let outcome = match result {
        Err(message) => Err(Error::Transport(message)),
        Ok(raw) if !raw.is_success() => Err(Error::Status {
            code: raw.status,
            body: raw.body,
        }),
        Ok(raw) => match Payload::sniff(&raw.body) {
            Ok(payload) => {
                if method.is_read() && policy.writes_cache() {
                    cache.save(key, raw.body.trim());
                }
                Ok(payload)
            }
            Err(error) => Err(Error::Malformed(error)),
        },
    };

    match outcome {
        Ok(payload) => {
            if policy.delivers_network_success() {
                handlers.success(&payload);
                let _ = tx.send(Ok(payload));
            }
        }
        Err(error) => {
            handlers.error(&error, notifier.as_ref());
            let _ = tx.send(Err(error));
        }
    }
}

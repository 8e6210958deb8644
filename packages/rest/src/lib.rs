//! # chime-rest
//!
//! Policy-driven REST client core: blocking transport behind an executor
//! trait, a content-addressed disk cache, and a per-client background worker
//! that delivers typed outcomes without blocking the calling thread.
//!
//! ## Dispatching a request
//!
//! ```ignore
//! use chime_rest::{CachePolicy, ClientConfig, Handlers, RequestContext, RestClient};
//!
//! let client = RestClient::new(ClientConfig::new("https://api.example.com/", cache_dir))?;
//!
//! let context = RequestContext::get("apps/42/feed")
//!     .with_param("page", 1)
//!     .with_policy(CachePolicy::CacheElseNetwork);
//!
//! let delivery = client.send(
//!     context,
//!     Handlers::new()
//!         .on_success(|payload| println!("got {payload:?}"))
//!         .on_error(|error| eprintln!("failed: {error}")),
//! )?;
//!
//! // Callbacks fire as outcomes are produced; `wait` additionally blocks
//! // until the exchange completes and hands back everything delivered.
//! let outcomes = delivery.wait();
//! ```
//!
//! ## Cache policies
//!
//! GET requests select one of five policies: `IgnoreCache` / `NetworkOnly`
//! (straight to the network), `CacheElseNetwork` (network only on a miss),
//! `CacheThenNetwork` (cached result immediately, fresh result after), and
//! `UpdateCache` (refresh the cache silently). Write methods never touch the
//! cache.

pub mod cache;
pub mod client;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod request;
pub mod types;

pub use cache::{CachePolicy, DiskCache};
pub use client::{ClientConfig, Handlers, Notifier, RestClient};
pub use dispatcher::Delivery;
pub use error::Error;
pub use executor::{HttpExecutor, PreparedRequest, ReqwestExecutor, TransportOptions, TrustMode};
pub use request::{BodyEncoding, Params, RequestContext};
pub use types::{Method, Outcome, Payload, RawResponse};

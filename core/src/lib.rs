//! Dynamic client for a REST payment-processing API.
//!
//! # Overview
//! Requests are built by chaining allow-listed resource segments and
//! identifiers onto the API base endpoint, parameters are flattened into
//! `parent[child]` form pairs, and the JSON response comes back as a
//! `serde_json::Value`.
//!
//! ```no_run
//! use stripe_core::{Client, ClientConfig, Params, Resources};
//!
//! let stripe = Client::new(ClientConfig::new("sk_test_..."));
//! let plan = stripe.plans().id("gold").get(Params::new())?;
//! let sub = stripe
//!     .customers()
//!     .id("cus_123")
//!     .subscription()
//!     .post(Params::new().insert("plan", "gold"))?;
//! # Ok::<(), stripe_core::Error>(())
//! ```
//!
//! # Design
//! - Paths are immutable values owned by a per-request builder, never state on
//!   the client, so clients are `Clone + Send + Sync`.
//! - `Client` blocks on a `ureq` agent; `AsyncClient` returns futures on a
//!   `reqwest` client and can schedule requests with a continuation.
//! - Request building (`request`) and response decoding (`decode`) are pure
//!   functions over plain `HttpRequest` / `HttpResponse` data; only the
//!   `transport` module performs I/O.

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod http;
pub mod params;
pub mod path;
pub mod request;
pub mod resource;
pub mod transport;

pub use client::{AsyncClient, Client, RequestBuilder};
pub use config::ClientConfig;
pub use decode::{decode, decode_as};
pub use error::{Error, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use params::{ParamValue, Params};
pub use path::ResourcePath;
pub use request::build_request;
pub use resource::{Resource, Resources};
pub use transport::{AsyncTransport, ReqwestTransport, Transport, UreqTransport};

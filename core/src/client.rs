//! Blocking and non-blocking entry points for the payment API.
//!
//! # Design
//! A client holds only immutable configuration and a transport. Every request
//! starts from a fresh `RequestBuilder` rooted at the base endpoint, and the
//! builder is consumed when the request is dispatched, so the next access
//! always starts from the base again. Because no path state lives on the
//! client, one instance can be cloned and shared across threads or tasks.
//!
//! `Client` blocks the calling thread for the round trip; `AsyncClient`
//! returns futures, or schedules the request on the runtime with `spawn_with`
//! and hands the decoded value to a continuation.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::ClientConfig;
use crate::decode::decode;
use crate::error::{Error, Result};
use crate::http::HttpMethod;
use crate::params::Params;
use crate::path::ResourcePath;
use crate::request::build_request;
use crate::resource::{Resource, Resources};
use crate::transport::{mask_url, AsyncTransport, ReqwestTransport, Transport, UreqTransport};

struct Shared<T> {
    config: ClientConfig,
    transport: T,
}

/// Synchronous client: each verb blocks until the response is decoded.
pub struct Client<T = UreqTransport> {
    shared: Arc<Shared<T>>,
}

impl Client<UreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout);
        Self::with_transport(config, transport)
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ClientConfig::from_env()?))
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            shared: Arc::new(Shared { config, transport }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// A builder at the bare base endpoint.
    pub fn path(&self) -> RequestBuilder<'_, Self> {
        RequestBuilder {
            client: self,
            path: ResourcePath::base(&self.shared.config.api_endpoint()),
        }
    }

    /// Start a path with a segment given by name.
    pub fn segment(&self, name: &str) -> Result<RequestBuilder<'_, Self>> {
        self.path().segment(name)
    }

    /// Build, send and decode one request.
    pub fn execute(&self, method: HttpMethod, path: &ResourcePath, params: &Params) -> Result<Value> {
        let request = build_request(method, path, params)?;
        debug!(%method, url = %mask_url(&request.url), "dispatching request");
        let response = self.shared.transport.execute(&request)?;
        decode(response)
    }
}

impl<'a, T: Transport> Resources for &'a Client<T> {
    type Output = RequestBuilder<'a, Client<T>>;

    fn resource(self, resource: Resource) -> Self::Output {
        self.path().resource(resource)
    }
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

/// Non-blocking client: verbs return futures driven by the tokio runtime.
pub struct AsyncClient<T = ReqwestTransport> {
    shared: Arc<Shared<T>>,
    runtime: Handle,
}

impl AsyncClient<ReqwestTransport> {
    /// Must be called from within a tokio runtime; spawned requests run there.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Self::with_transport(config, transport)
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }
}

impl<T: AsyncTransport> AsyncClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::Config(format!("async client needs a tokio runtime: {e}")))?;
        Ok(Self {
            shared: Arc::new(Shared { config, transport }),
            runtime,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// A builder at the bare base endpoint.
    pub fn path(&self) -> RequestBuilder<'_, Self> {
        RequestBuilder {
            client: self,
            path: ResourcePath::base(&self.shared.config.api_endpoint()),
        }
    }

    /// Start a path with a segment given by name.
    pub fn segment(&self, name: &str) -> Result<RequestBuilder<'_, Self>> {
        self.path().segment(name)
    }

    /// Build, send and decode one request.
    pub async fn execute(&self, method: HttpMethod, path: &ResourcePath, params: &Params) -> Result<Value> {
        let request = build_request(method, path, params)?;
        debug!(%method, url = %mask_url(&request.url), "dispatching request");
        let response = self.shared.transport.execute(&request).await?;
        decode(response)
    }

    /// Schedule a request on the runtime and return immediately.
    ///
    /// Once the response decodes, `continuation` runs with the value and the
    /// value is also returned through the handle. Transport and decode errors
    /// surface through the handle; the continuation is skipped for them.
    pub fn spawn_with<F>(
        &self,
        method: HttpMethod,
        path: ResourcePath,
        params: Params,
        continuation: F,
    ) -> JoinHandle<Result<Value>>
    where
        F: FnOnce(&Value) + Send + 'static,
    {
        let client = self.clone();
        self.runtime.spawn(async move {
            let value = client.execute(method, &path, &params).await?;
            continuation(&value);
            Ok(value)
        })
    }

    pub fn spawn(&self, method: HttpMethod, path: ResourcePath, params: Params) -> JoinHandle<Result<Value>> {
        self.spawn_with(method, path, params, |_| {})
    }
}

impl<'a, T: AsyncTransport> Resources for &'a AsyncClient<T> {
    type Output = RequestBuilder<'a, AsyncClient<T>>;

    fn resource(self, resource: Resource) -> Self::Output {
        self.path().resource(resource)
    }
}

impl<T> Clone for AsyncClient<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            runtime: self.runtime.clone(),
        }
    }
}

impl<T> fmt::Debug for AsyncClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncClient")
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

/// One request being built. Consumed by the verb that dispatches it.
#[derive(Debug)]
pub struct RequestBuilder<'a, C> {
    client: &'a C,
    path: ResourcePath,
}

impl<'a, C> RequestBuilder<'a, C> {
    /// Append a segment by name, rejecting names outside the allow-list.
    pub fn segment(self, name: &str) -> Result<Self> {
        Ok(Self {
            path: self.path.segment(name)?,
            client: self.client,
        })
    }

    /// Append an identifier verbatim.
    pub fn id(self, id: impl fmt::Display) -> Self {
        Self {
            path: self.path.id(id),
            client: self.client,
        }
    }

    /// Drop every segment built so far.
    pub fn reset(self) -> Self {
        Self {
            path: self.path.reset(),
            client: self.client,
        }
    }

    pub fn url(&self) -> &str {
        self.path.url()
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    pub fn into_path(self) -> ResourcePath {
        self.path
    }
}

impl<'a, C> Resources for RequestBuilder<'a, C> {
    type Output = Self;

    fn resource(self, resource: Resource) -> Self {
        Self {
            path: self.path.resource(resource),
            client: self.client,
        }
    }
}

impl<T: Transport> RequestBuilder<'_, Client<T>> {
    pub fn send(self, method: HttpMethod, params: Params) -> Result<Value> {
        self.client.execute(method, &self.path, &params)
    }

    pub fn get(self, params: Params) -> Result<Value> {
        self.send(HttpMethod::Get, params)
    }

    pub fn post(self, params: Params) -> Result<Value> {
        self.send(HttpMethod::Post, params)
    }

    pub fn put(self, params: Params) -> Result<Value> {
        self.send(HttpMethod::Put, params)
    }

    pub fn delete(self, params: Params) -> Result<Value> {
        self.send(HttpMethod::Delete, params)
    }
}

impl<T: AsyncTransport> RequestBuilder<'_, AsyncClient<T>> {
    pub async fn send(self, method: HttpMethod, params: Params) -> Result<Value> {
        self.client.execute(method, &self.path, &params).await
    }

    pub async fn get(self, params: Params) -> Result<Value> {
        self.send(HttpMethod::Get, params).await
    }

    pub async fn post(self, params: Params) -> Result<Value> {
        self.send(HttpMethod::Post, params).await
    }

    pub async fn put(self, params: Params) -> Result<Value> {
        self.send(HttpMethod::Put, params).await
    }

    pub async fn delete(self, params: Params) -> Result<Value> {
        self.send(HttpMethod::Delete, params).await
    }

    /// See [`AsyncClient::spawn_with`].
    pub fn spawn_with<F>(self, method: HttpMethod, params: Params, continuation: F) -> JoinHandle<Result<Value>>
    where
        F: FnOnce(&Value) + Send + 'static,
    {
        self.client.spawn_with(method, self.path, params, continuation)
    }

    pub fn spawn(self, method: HttpMethod, params: Params) -> JoinHandle<Result<Value>> {
        self.client.spawn(method, self.path, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::http::{HttpRequest, HttpResponse};

    /// Records every request and answers with a canned response.
    struct Recording {
        requests: Mutex<Vec<HttpRequest>>,
        response: HttpResponse,
    }

    impl Recording {
        fn answering(status: u16, body: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                response: HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.to_string(),
                },
            }
        }

        fn last(&self) -> HttpRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for Recording {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.response.clone())
        }
    }

    const BASE: &str = "https://api_key:@api.stripe.com/v1";

    fn client(status: u16, body: &str) -> Client<Recording> {
        Client::with_transport(ClientConfig::new("api_key"), Recording::answering(status, body))
    }

    fn transport(client: &Client<Recording>) -> &Recording {
        &client.shared.transport
    }

    #[test]
    fn accessors_start_from_base() {
        let c = client(200, "{}");
        for r in Resource::ALL {
            assert_eq!(c.resource(r).url(), format!("{BASE}/{}", r.as_str()));
        }
        assert_eq!(c.plans().url(), format!("{BASE}/plans"));
        assert_eq!(c.path().url(), BASE);
    }

    #[test]
    fn customer_subscription_chain() {
        let c = client(200, "{}");
        let builder = c.customers().id("CID").subscription();
        assert_eq!(builder.url(), format!("{BASE}/customers/CID/subscription"));
    }

    #[test]
    fn unknown_segment_fails_without_io() {
        let c = client(200, "{}");
        let err = c.segment("foobar").unwrap_err();
        assert!(matches!(err, Error::UnknownResource(ref name) if name == "foobar"));
        assert!(c.customers().segment("foobar").is_err());
        assert!(transport(&c).requests.lock().unwrap().is_empty());
    }

    #[test]
    fn next_access_after_dispatch_starts_from_base() {
        let c = client(200, r#"{"id":"abc","object":"plan"}"#);
        let value = c.plans().id("abc").get(Params::new()).unwrap();
        assert_eq!(value["id"], "abc");
        assert_eq!(transport(&c).last().url, format!("{BASE}/plans/abc"));
        assert_eq!(c.charges().url(), format!("{BASE}/charges"));
    }

    #[test]
    fn failed_dispatch_also_leaves_a_fresh_path() {
        let c = client(404, r#"{"error":{"message":"No such plan"}}"#);
        let err = c.plans().id("missing").delete(Params::new()).unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(c.plans().url(), format!("{BASE}/plans"));
    }

    #[test]
    fn verbs_place_params_by_method() {
        let c = client(200, "{}");
        let params = || Params::new().insert("customer", "cus_1");

        c.invoices().upcoming().get(params()).unwrap();
        let req = transport(&c).last();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, format!("{BASE}/invoices/upcoming?customer=cus_1"));

        c.recipients().id("rp_1").put(params()).unwrap();
        let req = transport(&c).last();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, format!("{BASE}/recipients/rp_1"));
        assert_eq!(req.body.as_deref(), Some("customer=cus_1"));

        c.customers().id("cus_1").delete(Params::new()).unwrap();
        let req = transport(&c).last();
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());
    }

    #[test]
    fn invalid_json_surfaces_as_decode_error() {
        let c = client(200, "not valid json");
        let err = c.balance().get(Params::new()).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        assert!(err.to_string().contains("not valid json"));
    }

    #[test]
    fn clones_share_transport() {
        let c = client(200, "{}");
        let other = c.clone();
        other.account().get(Params::new()).unwrap();
        assert_eq!(transport(&c).requests.lock().unwrap().len(), 1);
    }

    struct Canned(HttpResponse);

    impl AsyncTransport for Canned {
        async fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse> {
            Ok(self.0.clone())
        }
    }

    fn async_client(status: u16, body: &str) -> AsyncClient<Canned> {
        let response = HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        };
        AsyncClient::with_transport(ClientConfig::new("api_key"), Canned(response)).unwrap()
    }

    #[tokio::test]
    async fn async_verbs_decode() {
        let c = async_client(200, r#"{"id":"abc","object":"plan"}"#);
        assert_eq!(c.plans().url(), format!("{BASE}/plans"));
        let value = c.plans().id("abc").get(Params::new()).await.unwrap();
        assert_eq!(value["id"], "abc");
    }

    #[tokio::test]
    async fn spawned_decode_failure_skips_continuation() {
        let c = async_client(200, "not valid json");
        let called = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&called);
        let handle = c.events().spawn_with(HttpMethod::Get, Params::new(), move |_| {
            *flag.lock().unwrap() = true;
        });
        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        assert!(!*called.lock().unwrap());
    }

    #[test]
    fn async_client_requires_runtime() {
        let err = AsyncClient::new(ClientConfig::new("k")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}

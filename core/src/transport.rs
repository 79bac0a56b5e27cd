//! The I/O edge: executes an `HttpRequest` and returns an `HttpResponse`.
//!
//! # Design
//! Transports return every status as data; interpreting it is the decoder's
//! job. Both implementations move the API key out of the URL userinfo and into
//! a basic-auth header before sending, so the wire carries the same
//! credential without relying on the HTTP stack to honor userinfo.

use std::future::Future;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use percent_encoding::percent_decode_str;
use tracing::trace;
use url::Url;

use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Blocking transport.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Non-blocking transport driven by the tokio runtime.
pub trait AsyncTransport: Send + Sync + 'static {
    fn execute(&self, request: &HttpRequest) -> impl Future<Output = Result<HttpResponse>> + Send;
}

/// Mask sensitive credential values for logging.
pub fn mask_credential(value: &str) -> String {
    let len = value.chars().count();
    if len <= 8 {
        "*".repeat(len)
    } else {
        let head: String = value.chars().take(4).collect();
        let tail: String = value.chars().skip(len - 4).collect();
        format!("{head}...{tail}")
    }
}

/// The URL with its userinfo masked, for log lines.
pub fn mask_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            if !parsed.username().is_empty() {
                let masked = mask_credential(parsed.username());
                let _ = parsed.set_username(&masked);
            }
            parsed.to_string()
        }
        Err(_) => "<unparseable url>".to_string(),
    }
}

/// Split a URL into its credential-free form and an `Authorization` value.
pub fn lift_credentials(url: &str) -> Result<(String, Option<String>)> {
    let mut parsed = Url::parse(url).map_err(|e| Error::Transport(format!("invalid URL: {e}")))?;
    if parsed.username().is_empty() && parsed.password().is_none() {
        return Ok((parsed.to_string(), None));
    }

    // Userinfo comes back percent-encoded; the header carries the raw key.
    let user = decode_userinfo(parsed.username())?;
    let password = decode_userinfo(parsed.password().unwrap_or(""))?;
    let credentials = format!("{user}:{password}");
    let header = format!("Basic {}", STANDARD.encode(credentials));
    parsed
        .set_username("")
        .and_then(|_| parsed.set_password(None))
        .map_err(|_| Error::Transport("URL cannot carry credentials".to_string()))?;
    Ok((parsed.to_string(), Some(header)))
}

fn decode_userinfo(part: &str) -> Result<String> {
    percent_decode_str(part)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| Error::Transport(format!("credential is not valid UTF-8: {e}")))
}

fn response_headers(headers: &http::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                v.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
    auth: Option<&str>,
) -> ureq::RequestBuilder<B> {
    for (k, v) in headers {
        builder = builder.header(k.as_str(), v.as_str());
    }
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let (url, auth) = lift_credentials(&request.url)?;
        let auth = auth.as_deref();
        let headers = &request.headers;

        let mut response = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(url.as_str()), headers, auth).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(url.as_str()), headers, auth).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(self.agent.post(url.as_str()), headers, auth).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => with_headers(self.agent.post(url.as_str()), headers, auth).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                with_headers(self.agent.put(url.as_str()), headers, auth).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => with_headers(self.agent.put(url.as_str()), headers, auth).send_empty(),
        }?;

        let status = response.status().as_u16();
        let headers = response_headers(response.headers());
        let body = response.body_mut().read_to_string()?;
        trace!(status, bytes = body.len(), "response received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Non-blocking transport backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl AsyncTransport for ReqwestTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let (url, auth) = lift_credentials(&request.url)?;
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, url.as_str());
        for (k, v) in &request.headers {
            builder = builder.header(k.as_str(), v.as_str());
        }
        if let Some(auth) = auth {
            builder = builder.header(reqwest::header::AUTHORIZATION, auth);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response_headers(response.headers());
        let body = response.text().await?;
        trace!(status, bytes = body.len(), "response received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

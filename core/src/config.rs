//! Client configuration.

use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_SCHEME: &str = "https";
pub const DEFAULT_HOST: &str = "api.stripe.com";
pub const DEFAULT_VERSION: &str = "v1";

/// Where and how the client talks to the API.
///
/// The key travels in the URL's userinfo (`scheme://KEY:@host/version`), the
/// remote API's historical convention. Transports lift it into a basic-auth
/// header on the wire.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub scheme: String,
    pub host: String,
    pub version: String,
    /// Passed through to the transport; `None` leaves its default in place.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            scheme: DEFAULT_SCHEME.to_string(),
            host: DEFAULT_HOST.to_string(),
            version: DEFAULT_VERSION.to_string(),
            timeout: None,
        }
    }

    /// Read `STRIPE_API_KEY` (required) plus optional `STRIPE_API_HOST`,
    /// `STRIPE_API_SCHEME`, `STRIPE_API_VERSION` and `STRIPE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("STRIPE_API_KEY")
            .map_err(|_| Error::Config("STRIPE_API_KEY is not set".to_string()))?;
        let mut config = Self::new(api_key);
        if let Ok(host) = env::var("STRIPE_API_HOST") {
            config.host = host;
        }
        if let Ok(scheme) = env::var("STRIPE_API_SCHEME") {
            config.scheme = scheme;
        }
        if let Ok(version) = env::var("STRIPE_API_VERSION") {
            config.version = version;
        }
        if let Ok(secs) = env::var("STRIPE_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| Error::Config(format!("STRIPE_TIMEOUT_SECS is not a number: {secs}")))?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `scheme://api_key:@host/version`, the root every path is built on.
    pub fn api_endpoint(&self) -> String {
        format!(
            "{}://{}:@{}/{}",
            self.scheme, self.api_key, self.host, self.version
        )
    }
}

// Keeps the key out of debug output.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &crate::transport::mask_credential(&self.api_key))
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("version", &self.version)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_embeds_key_with_empty_password() {
        let config = ClientConfig::new("api_key");
        assert_eq!(config.api_endpoint(), "https://api_key:@api.stripe.com/v1");
    }

    #[test]
    fn overrides_apply() {
        let config = ClientConfig::new("k")
            .with_scheme("http")
            .with_host("127.0.0.1:3000")
            .with_version("v2")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.api_endpoint(), "http://k:@127.0.0.1:3000/v2");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn debug_masks_the_key() {
        let config = ClientConfig::new("sk_test_1234567890");
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk_test_1234567890"));
        assert!(debug.contains("sk_t...7890"));
    }
}

//! Immutable resource URL builder.
//!
//! # Design
//! A `ResourcePath` is a value, not a field on the client: every extension
//! returns a new path, so two requests built concurrently from the same client
//! never see each other's segments. A freshly created path always starts at
//! the base endpoint, which is how "reset after dispatch" falls out for free.

use std::fmt;

use crate::resource::{Resource, Resources};

/// A `/`-joined URL rooted at the API base endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    base: String,
    url: String,
}

impl ResourcePath {
    /// A path pointing at the bare base endpoint.
    pub fn base(endpoint: &str) -> Self {
        let endpoint = endpoint.trim_end_matches('/').to_string();
        Self {
            url: endpoint.clone(),
            base: endpoint,
        }
    }

    /// Append an allow-listed segment.
    pub fn resource(&self, resource: Resource) -> Self {
        self.join(resource.as_str())
    }

    /// Append a segment by name, rejecting names outside the allow-list.
    pub fn segment(&self, name: &str) -> crate::Result<Self> {
        Ok(self.resource(name.parse()?))
    }

    /// Append a caller-supplied identifier verbatim. No validation: slashes
    /// and other reserved characters end up in the URL as given.
    pub fn id(&self, id: impl fmt::Display) -> Self {
        self.join(&id.to_string())
    }

    /// A path back at the base endpoint.
    pub fn reset(&self) -> Self {
        Self::base(&self.base)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub fn is_base(&self) -> bool {
        self.url == self.base
    }

    fn join(&self, part: &str) -> Self {
        Self {
            base: self.base.clone(),
            url: format!("{}/{part}", self.url),
        }
    }
}

impl Resources for &ResourcePath {
    type Output = ResourcePath;

    fn resource(self, resource: Resource) -> ResourcePath {
        ResourcePath::resource(self, resource)
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

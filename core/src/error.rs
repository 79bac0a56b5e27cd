//! Error types for the payment API client.
//!
//! # Design
//! One enum covers every failure a call can produce. Path errors surface at
//! access time, before any I/O. Non-2xx responses land in `Http` with the raw
//! status and body; bodies that are not JSON land in `Decode` with the raw
//! response attached for diagnostics.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the client, its builders and its transports.
#[derive(Debug, Error)]
pub enum Error {
    /// A path segment outside the resource allow-list was requested.
    #[error("unknown resource: {0}")]
    UnknownResource(String),

    /// Request parameters could not be turned into form pairs.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body is not valid JSON.
    #[error("{source} (API response was: {response})")]
    Decode {
        #[source]
        source: serde_json::Error,
        response: String,
    },

    /// Connection-level failure reported by the HTTP stack.
    #[error("transport error: {0}")]
    Transport(String),

    /// Missing or malformed client configuration.
    #[error("config error: {0}")]
    Config(String),

    /// A request spawned on the runtime panicked or was cancelled.
    #[error("spawned request failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    /// HTTP status of the failed response, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(e: ureq::Error) -> Self {
        Error::Transport(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}

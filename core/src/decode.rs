//! Response decoding.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};
use crate::http::HttpResponse;

/// Decode a response body as JSON, unchanged.
///
/// Non-2xx statuses become `Error::Http`; bodies that fail to parse become
/// `Error::Decode` carrying the raw response.
pub fn decode(response: HttpResponse) -> Result<Value> {
    decode_as(response)
}

/// Like `decode`, deserializing into a caller-chosen type.
pub fn decode_as<T: DeserializeOwned>(response: HttpResponse) -> Result<T> {
    if !response.is_success() {
        warn!(status = response.status, "API returned an error status");
        return Err(Error::Http {
            status: response.status,
            body: response.body,
        });
    }
    serde_json::from_str(&response.body).map_err(|source| {
        warn!(status = response.status, error = %source, "API response is not valid JSON");
        Error::Decode {
            source,
            response: response.to_string(),
        }
    })
}

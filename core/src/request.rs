//! Turns a path, a verb and parameters into an `HttpRequest`.

use crate::error::Result;
use crate::http::{HttpMethod, HttpRequest};
use crate::params::Params;
use crate::path::ResourcePath;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Build the request for `method` on `path`.
///
/// GET/DELETE put non-empty params in the query string, POST/PUT put them in a
/// form body. Empty params produce neither.
pub fn build_request(method: HttpMethod, path: &ResourcePath, params: &Params) -> Result<HttpRequest> {
    let mut url = path.url().to_string();
    let mut headers = Vec::new();
    let mut body = None;

    if !params.is_empty() {
        let encoded = params.encode()?;
        if method.params_in_query() {
            url.push('?');
            url.push_str(&encoded);
        } else {
            headers.push(("content-type".to_string(), FORM_CONTENT_TYPE.to_string()));
            body = Some(encoded);
        }
    }

    Ok(HttpRequest {
        method,
        url,
        headers,
        body,
    })
}

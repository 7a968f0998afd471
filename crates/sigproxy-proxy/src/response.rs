use crate::{error::Error, Body};
use bytes::Bytes;
use http::{
    header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA},
    HeaderValue, Response,
};
use http_body_util::{BodyExt, Full};

/// Wrap a buffered payload into the response body type
pub fn full(content: impl Into<Bytes>) -> Body {
    Full::new(content.into())
        .map_err(|never| match never {})
        .boxed()
}

/// JSON rejection response for a failed exchange
#[must_use]
pub fn error(error: &Error) -> Response<Body> {
    let body = serde_json::json!({ "error": error.to_string() }).to_string();

    let mut response = Response::new(full(body));
    *response.status_mut() = error.status();

    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json;charset=UTF-8"),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

    response
}

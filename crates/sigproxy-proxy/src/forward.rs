//!
//! Construction of the upstream request and relaying of the upstream response
//!

use crate::{
    error::{Error, Result},
    Body,
};
use bytes::Bytes;
use http::{
    header::{
        CONNECTION, HOST, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE, TRAILER, TRANSFER_ENCODING,
        UPGRADE,
    },
    HeaderMap, HeaderName, Request, Response, Uri,
};
use http_signatures::scheme;
use sigproxy_http_client::{body::Deadline, Client};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument};

static KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");
static PROXY_CONNECTION: HeaderName = HeaderName::from_static("proxy-connection");

/// Headers that only apply to a single connection
fn is_hop_by_hop(name: &HeaderName) -> bool {
    [
        &CONNECTION,
        &KEEP_ALIVE,
        &PROXY_AUTHENTICATE,
        &PROXY_AUTHORIZATION,
        &PROXY_CONNECTION,
        &TE,
        &TRAILER,
        &TRANSFER_ENCODING,
        &UPGRADE,
    ]
    .contains(&name)
}

/// Remove hop-by-hop headers, including the ones listed in the `Connection` header
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }

    let hop_by_hop: Vec<HeaderName> = headers
        .keys()
        .filter(|name| is_hop_by_hop(name))
        .cloned()
        .collect();

    for name in hop_by_hop {
        headers.remove(name);
    }
}

/// Upstream base URL followed by the path and query of the incoming request
pub fn target_uri(upstream: &str, uri: &Uri) -> Result<Uri> {
    let path_and_query = uri
        .path_and_query()
        .map_or("/", |path_and_query| path_and_query.as_str());

    Uri::try_from(format!(
        "{}{path_and_query}",
        upstream.trim_end_matches('/')
    ))
    .map_err(|error| Error::InvalidRequest(error.into()))
}

/// Rewrite the incoming request into the request sent to the upstream
///
/// The `Host` header is dropped so the client derives it from the target URI
pub fn upstream_request(upstream: &str, request: Request<Bytes>) -> Result<Request<Bytes>> {
    let (mut parts, body) = request.into_parts();

    parts.uri = target_uri(upstream, &parts.uri)?;
    parts.version = http::Version::HTTP_11;
    strip_hop_by_hop(&mut parts.headers);
    parts.headers.remove(HOST);

    Ok(Request::from_parts(parts, body))
}

/// Send the request to the upstream and prepare the response for relaying
///
/// The timeout covers the whole upstream response.
/// Once it passes while the body is still streaming, the body fails
/// and the client connection is aborted.
#[instrument(skip_all, fields(uri = %request.uri().path()))]
pub async fn send(
    client: &Client,
    request: Request<Bytes>,
    timeout: Duration,
) -> Result<Response<Body>> {
    let deadline = Instant::now() + timeout;
    let request = request.map(sigproxy_http_client::Body::new);
    let response = tokio::time::timeout_at(deadline, client.execute(request))
        .await
        .map_err(|_| Error::Timeout)??;
    debug!(status = %response.status(), "upstream responded");

    let mut response = response.map(|body| Body::new(Deadline::new(body, deadline)));

    let headers = response.headers_mut();
    strip_hop_by_hop(headers);
    scheme::strip(headers);

    Ok(response)
}

#[cfg(test)]
mod test {
    use super::{strip_hop_by_hop, target_uri, upstream_request};
    use bytes::Bytes;
    use http::{
        header::{CONNECTION, HOST, TRANSFER_ENCODING, USER_AGENT},
        HeaderMap, HeaderValue, Request, Uri,
    };

    #[test]
    fn joins_target() {
        let uri = Uri::from_static("/ping?a=b");
        assert_eq!(
            target_uri("https://api.example.com/", &uri).unwrap(),
            "https://api.example.com/ping?a=b"
        );
        assert_eq!(
            target_uri("https://api.example.com/v1", &uri).unwrap(),
            "https://api.example.com/v1/ping?a=b"
        );
    }

    #[test]
    fn strips_connection_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("close, x-private"));
        headers.insert("x-private", HeaderValue::from_static("1"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(USER_AGENT, HeaderValue::from_static("curl/8.0"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert_eq!(headers[USER_AGENT], "curl/8.0");
    }

    #[test]
    fn rewrites_request() {
        let request = Request::post("/submit")
            .header(HOST, "127.0.0.1:3000")
            .header(USER_AGENT, "curl/8.0")
            .body(Bytes::from_static(b"payload"))
            .unwrap();

        let request = upstream_request("http://upstream.local:8080", request).unwrap();

        assert_eq!(request.uri(), "http://upstream.local:8080/submit");
        assert!(request.headers().get(HOST).is_none());
        assert_eq!(request.headers()[USER_AGENT], "curl/8.0");
        assert_eq!(request.body(), &Bytes::from_static(b"payload"));
    }
}

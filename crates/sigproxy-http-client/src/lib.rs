//!
//! HTTP client used to forward requests to the upstream
//!
//! Requests are passed through as-is: no redirects are followed and no content encodings are touched.
//!

#![deny(missing_docs)]

use self::body::TimedOut;
use bytes::Bytes;
use http_body::Body as HttpBody;
use http_body_util::{BodyExt, Limited};
use hyper::{Request, Response as HyperResponse};
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client as HyperClient},
    rt::TokioExecutor,
};
use std::{error::Error as StdError, fmt, io, time::Duration};
use tower::{
    timeout::{error::Elapsed, TimeoutLayer},
    util::BoxCloneSyncService,
    BoxError, Service, ServiceBuilder, ServiceExt,
};

/// Response body wrappers
pub mod body;

type Result<T, E = Error> = std::result::Result<T, E>;

/// Default body limit of 1MB
const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Default request timeout of 30s (same as Firefox)
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout of 10s
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Request body type. Requests are always fully buffered before they are forwarded
pub type Body = http_body_util::Full<Bytes>;

/// Response body type
pub type ResponseBody = http_body_util::combinators::BoxBody<Bytes, BoxError>;

/// Response type
pub type Response = HyperResponse<ResponseBody>;

/// Client error type
pub struct Error {
    inner: BoxError,
}

impl Error {
    #[inline]
    fn new<E>(inner: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self {
            inner: inner.into(),
        }
    }

    /// Whether the error was caused by a connect, request or body timeout
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        let mut current: Option<&(dyn StdError + 'static)> = Some(&*self.inner);
        while let Some(error) = current {
            if error.is::<Elapsed>() || error.is::<TimedOut>() {
                return true;
            }

            if error
                .downcast_ref::<io::Error>()
                .is_some_and(|error| error.kind() == io::ErrorKind::TimedOut)
            {
                return true;
            }

            current = error.source();
        }

        false
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl StdError for Error {}

/// Builder for the HTTP client
pub struct ClientBuilder {
    connect_timeout: Option<Duration>,
    content_length_limit: Option<usize>,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Set the connect timeout
    ///
    /// Defaults to 10s
    #[must_use]
    pub fn connect_timeout(self, connect_timeout: Option<Duration>) -> Self {
        Self {
            connect_timeout,
            ..self
        }
    }

    /// Set the content length limit of response bodies
    ///
    /// This is enforced at the body level, regardless of whether the `Content-Length` header is set or not.
    ///
    /// Defaults to 1MB
    #[must_use]
    pub fn content_length_limit(self, content_length_limit: Option<usize>) -> Self {
        Self {
            content_length_limit,
            ..self
        }
    }

    /// Set the timeout until the response head arrived
    ///
    /// Bound the body as well by wrapping it into a [`body::Deadline`].
    ///
    /// Defaults to 30s
    #[must_use]
    pub fn timeout(self, timeout: Option<Duration>) -> Self {
        Self { timeout, ..self }
    }

    /// Build the HTTP client
    ///
    /// # Errors
    ///
    /// - The native certificate store couldn't be loaded
    pub fn build(self) -> Result<Client> {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(self.connect_timeout);

        let connector = HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(Error::new)?
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let client = HyperClient::builder(TokioExecutor::new()).build(connector);

        Ok(self.service(client))
    }

    /// Build the HTTP client by wrapping another HTTP client service
    #[must_use]
    pub fn service<S, B>(self, client: S) -> Client
    where
        S: Service<Request<Body>, Response = HyperResponse<B>> + Clone + Send + Sync + 'static,
        S::Error: Into<BoxError>,
        S::Future: Send + 'static,
        B: HttpBody<Data = Bytes> + Send + Sync + 'static,
        B::Error: Into<BoxError>,
    {
        let content_length_limit = self.content_length_limit;
        let client = client
            .map_response(move |response: HyperResponse<B>| {
                response.map(|body| match content_length_limit {
                    Some(limit) => ResponseBody::new(Limited::new(body, limit)),
                    None => ResponseBody::new(body.map_err(Into::into)),
                })
            })
            .map_err(Into::<BoxError>::into);

        Client {
            inner: BoxCloneSyncService::new(
                ServiceBuilder::new()
                    .option_layer(self.timeout.map(TimeoutLayer::new))
                    .service(client),
            ),
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            content_length_limit: Some(DEFAULT_BODY_LIMIT),
            timeout: Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

/// A pass-through HTTP client
#[derive(Clone)]
pub struct Client {
    inner: BoxCloneSyncService<Request<Body>, Response, BoxError>,
}

impl Client {
    /// Build a new client
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Execute an HTTP request
    ///
    /// # Errors
    ///
    /// - The inner client service isn't ready
    /// - The request failed or timed out
    pub async fn execute(&self, req: Request<Body>) -> Result<Response> {
        self.inner.clone().oneshot(req).await.map_err(Error::new)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

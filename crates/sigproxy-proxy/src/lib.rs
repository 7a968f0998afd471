//!
//! Signing/verifying reverse proxy
//!
//! Every request runs through an [`Exchange`] on its own task. The only state shared between exchanges is the
//! immutable [`Proxy`] itself, which holds the key store, the codec configuration and the upstream client.
//!

use self::{
    error::{BoxError, ConfigError, Result},
    exchange::{Exchange, Stage},
    inbound::Verifier,
    outbound::Signer,
};
use bytes::Bytes;
use http::{HeaderName, HeaderValue, Request, Response};
use http_body::Body as HttpBody;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use http_signatures::{Component, SignatureScheme, ValidityPolicy};
use sigproxy_config::{
    keys::Role,
    proxy::{Mode, Scheme},
    Configuration,
};
use sigproxy_http_client::Client;
use sigproxy_keystore::KeyStore;
use smol_str::SmolStr;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tracing::instrument;

pub mod error;
pub mod exchange;
pub mod forward;
pub mod inbound;
pub mod listener;
pub mod outbound;
pub mod response;
pub mod signal;

pub use self::{error::Error, listener::Listener};

/// Body of the responses sent back to the client
pub type Body = sigproxy_http_client::ResponseBody;

#[derive(Debug)]
enum Handler {
    Outbound(Signer),
    Inbound(Verifier),
}

fn parse_components(raw: &[SmolStr]) -> Result<Vec<Component>, ConfigError> {
    raw.iter()
        .map(|component| Component::parse(component).map_err(ConfigError::from))
        .collect()
}

fn parse_header_name(name: &SmolStr) -> Result<HeaderName, ConfigError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ConfigError::InvalidHeaderName(name.clone()))
}

async fn read_body<B>(body: B, limit: usize, timeout: Duration) -> Result<Bytes>
where
    B: HttpBody<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    tokio::time::timeout(timeout, Limited::new(body, limit).collect())
        .await
        .map_err(|_| Error::Timeout)?
        .map(|collected| collected.to_bytes())
        .map_err(|error| {
            if error.is::<LengthLimitError>() {
                Error::BodyTooLarge
            } else {
                Error::ReadBody(error)
            }
        })
}

#[derive(Debug)]
pub struct Proxy {
    mode: Mode,
    scheme: SignatureScheme,
    upstream: SmolStr,
    keys: Arc<KeyStore>,
    client: Client,
    max_body_size: usize,
    body_read_timeout: Duration,
    upstream_timeout: Duration,
    handler: Handler,
}

impl Proxy {
    /// Build the proxy with an HTTP client derived from the configuration
    pub fn new(config: &Configuration, keys: Arc<KeyStore>) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .connect_timeout(Some(Duration::from_secs(
                config.proxy.upstream_connect_timeout_secs,
            )))
            .content_length_limit(None)
            .timeout(Some(Duration::from_secs(config.proxy.upstream_timeout_secs)))
            .build()?;

        Self::with_client(config, keys, client)
    }

    /// Build the proxy around an existing HTTP client
    pub fn with_client(
        config: &Configuration,
        keys: Arc<KeyStore>,
        client: Client,
    ) -> Result<Self, ConfigError> {
        let proxy = &config.proxy;

        let handler = match proxy.mode {
            Mode::Outbound => {
                let outbound = proxy
                    .outbound
                    .as_ref()
                    .ok_or(ConfigError::MissingOutbound)?;

                let key_selector = outbound
                    .key_selector_header
                    .as_ref()
                    .map(parse_header_name)
                    .transpose()?;

                let default_headers = outbound
                    .default_headers
                    .iter()
                    .map(|(name, value)| {
                        let value = HeaderValue::from_str(value)
                            .map_err(|_| ConfigError::InvalidHeaderValue(name.clone()))?;
                        Ok((parse_header_name(name)?, value))
                    })
                    .collect::<Result<_, ConfigError>>()?;

                let upstreams: HashMap<_, _> = config
                    .keys
                    .iter()
                    .filter(|key| key.role == Role::Sign)
                    .filter_map(|key| Some((key.id.clone(), key.upstream.clone()?)))
                    .collect();

                Handler::Outbound(Signer {
                    identity: outbound.identity.clone(),
                    key_selector,
                    upstreams,
                    default_headers,
                    components: parse_components(&proxy.components)?,
                    expires_in: outbound.expires_in_secs.map(Duration::from_secs),
                    nonce: outbound.nonce,
                })
            }
            Mode::Inbound => Handler::Inbound(Verifier {
                require_signature: proxy.inbound.require_signature,
                policy: ValidityPolicy {
                    tolerance: Duration::from_secs(proxy.inbound.clock_skew_secs),
                    max_age: proxy.inbound.max_signature_age_secs.map(Duration::from_secs),
                    required_components: parse_components(&proxy.inbound.required_components)?,
                },
                timeout: Duration::from_secs(proxy.verification_timeout_secs),
            }),
        };

        let scheme = match proxy.scheme {
            Scheme::Rfc9421 => SignatureScheme::Rfc9421,
            Scheme::Cavage => SignatureScheme::Cavage,
        };

        Ok(Self {
            mode: proxy.mode,
            scheme,
            upstream: proxy.upstream.clone(),
            keys,
            client,
            max_body_size: config.server.max_body_size,
            body_read_timeout: Duration::from_secs(config.server.body_read_timeout_secs),
            upstream_timeout: Duration::from_secs(proxy.upstream_timeout_secs),
            handler,
        })
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn keys(&self) -> &KeyStore {
        &self.keys
    }

    /// Run a single exchange to completion
    ///
    /// Never fails. Errors are turned into JSON rejection responses.
    #[instrument(skip_all, fields(method = %request.method()))]
    pub async fn handle<B>(&self, request: Request<B>) -> Response<Body>
    where
        B: HttpBody<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        let mut exchange = Exchange::new(self.mode, request.method().clone(), request.uri().path());

        match self.process(&mut exchange, request).await {
            Ok(response) => {
                exchange.complete(response.status());
                response
            }
            Err(error) => {
                exchange.reject(&error);
                response::error(&error)
            }
        }
    }

    async fn process<B>(
        &self,
        exchange: &mut Exchange,
        request: Request<B>,
    ) -> Result<Response<Body>>
    where
        B: HttpBody<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = request.into_parts();
        let body = read_body(body, self.max_body_size, self.body_read_timeout).await?;
        let request = Request::from_parts(parts, body);

        let request = match self.handler {
            Handler::Outbound(ref signer) => {
                signer
                    .sign(&self.keys, self.scheme, &self.upstream, exchange, request)
                    .await?
            }
            Handler::Inbound(ref verifier) => {
                verifier
                    .verify(&self.keys, self.scheme, &self.upstream, exchange, request)
                    .await?
            }
        };

        exchange.transition(Stage::Forwarded);
        forward::send(&self.client, request, self.upstream_timeout).await
    }
}

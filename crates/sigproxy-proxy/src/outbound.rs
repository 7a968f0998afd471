use crate::{
    error::{Error, Result},
    exchange::{Exchange, Stage},
    forward,
};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Request};
use http_signatures::{
    digest::{self, DigestAlgorithm},
    easy::{self, SignOptions},
    scheme,
    validity::unix_timestamp,
    Component, SignatureScheme, DIGEST_HEADER,
};
use sigproxy_keystore::KeyStore;
use smol_str::SmolStr;
use std::{
    collections::HashMap,
    time::{Duration, SystemTime},
};
use tracing::{debug, instrument};
use uuid::Uuid;

const NONCE_MODULUS: u128 = 10_000_000_000;

/// Random 10 digit nonce
fn generate_nonce() -> String {
    format!("{:010}", Uuid::new_v4().as_u128() % NONCE_MODULUS)
}

/// Signs requests on their way to the upstream
#[derive(Debug)]
pub struct Signer {
    pub(crate) identity: SmolStr,
    pub(crate) key_selector: Option<HeaderName>,
    /// Upstreams of the signing keys that don't use the proxy-wide one
    pub(crate) upstreams: HashMap<SmolStr, SmolStr>,
    pub(crate) default_headers: Vec<(HeaderName, HeaderValue)>,
    pub(crate) components: Vec<Component>,
    pub(crate) expires_in: Option<Duration>,
    pub(crate) nonce: bool,
}

impl Signer {
    /// Pick the signing key, removing the selector header on the way
    fn select_key(&self, headers: &mut HeaderMap) -> SmolStr {
        let selected = self
            .key_selector
            .as_ref()
            .and_then(|name| headers.remove(name));

        selected.map_or_else(
            || self.identity.clone(),
            |value| String::from_utf8_lossy(value.as_bytes()).into_owned().into(),
        )
    }

    fn wants_digest(&self) -> bool {
        self.components.iter().any(
            |component| matches!(component, Component::Header(name) if *name == DIGEST_HEADER),
        )
    }

    /// Set the `Digest` header from the body, replacing whatever the client sent
    ///
    /// Bodyless requests only get one if the client already claimed a digest.
    fn attach_digest(&self, request: &mut Request<Bytes>) -> Result<()> {
        if !self.wants_digest()
            || (request.body().is_empty() && !request.headers().contains_key(&DIGEST_HEADER))
        {
            return Ok(());
        }

        let digest = digest::compute(DigestAlgorithm::default(), request.body());
        let digest =
            HeaderValue::try_from(digest).map_err(|error| Error::InvalidRequest(error.into()))?;
        request.headers_mut().insert(DIGEST_HEADER.clone(), digest);

        Ok(())
    }

    fn add_default_headers(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.default_headers {
            if !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }
    }

    /// Components of the configuration that the request can actually provide
    ///
    /// Derived components are always covered. Headers are skipped if the request doesn't carry them.
    fn covered<B>(&self, request: &Request<B>) -> Vec<Component> {
        self.components
            .iter()
            .filter(|component| match component {
                Component::Header(name) => request.headers().contains_key(name),
                Component::Expires => self.expires_in.is_some(),
                _ => true,
            })
            .cloned()
            .collect()
    }

    #[instrument(skip_all, fields(exchange_id = %exchange.id()))]
    pub async fn sign(
        &self,
        keys: &KeyStore,
        scheme: SignatureScheme,
        upstream: &str,
        exchange: &mut Exchange,
        mut request: Request<Bytes>,
    ) -> Result<Request<Bytes>> {
        let key_id = self.select_key(request.headers_mut());
        let key = keys
            .signing_key(&key_id)
            .map_err(|_| Error::UnknownKeyId(key_id.clone()))?;

        let upstream = self.upstreams.get(&key_id).map_or(upstream, SmolStr::as_str);
        let mut request = forward::upstream_request(upstream, request)?;
        scheme::strip(request.headers_mut());
        self.add_default_headers(request.headers_mut());
        self.attach_digest(&mut request)?;

        let options = SignOptions {
            scheme,
            components: self.covered(&request),
            created: unix_timestamp(SystemTime::now()),
            expires_in: self.expires_in,
            nonce: self.nonce.then(generate_nonce),
        };

        let prepared = easy::prepare_signature(&request, &key_id, key.algorithm(), &options)
            .map_err(Error::Sign)?;
        exchange.transition(Stage::Canonicalized);

        prepared.sign(key, &mut request).await.map_err(Error::Sign)?;
        exchange.transition(Stage::Signed);
        debug!(%key_id, %upstream, "signed request");

        Ok(request)
    }
}

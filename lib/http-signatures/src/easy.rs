//!
//! High-level signing and verification of whole requests
//!
//! Both directions are split into a synchronous preparation step (parameter handling and signature string construction)
//! and an asynchronous cryptographic step, which runs on the blocking thread pool.
//!

use crate::{
    crypto::{self, SignError, SigningKey, VerifyError, VerifyingKey},
    scheme::ExtractError,
    signature_string,
    validity::{ValidityError, ValidityPolicy},
    Algorithm, BoxError, Component, SignatureParams, SignatureScheme,
};
use http::header::InvalidHeaderValue;
use miette::Diagnostic;
use std::{future::Future, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, instrument};

/// Combined error type of the high-level API
#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    /// Blocking task failed to complete
    #[error(transparent)]
    Blocking(#[from] tokio::task::JoinError),

    /// Failed to retrieve the key
    #[error("Failed to retrieve key")]
    GetKey(#[source] BoxError),

    /// Serialised signature isn't a valid header value
    #[error(transparent)]
    InvalidHeaderValue(#[from] InvalidHeaderValue),

    /// Signature headers are missing or malformed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Extract(#[from] ExtractError),

    /// Signature isn't acceptable under the validity policy
    #[error(transparent)]
    Validity(#[from] ValidityError),

    /// Signature string couldn't be constructed
    #[error(transparent)]
    SignatureString(#[from] signature_string::Error),

    #[error(transparent)]
    Sign(#[from] SignError),

    #[error(transparent)]
    Verify(#[from] VerifyError),
}

/// Options for creating a new signature
#[derive(Clone, Debug, Default)]
pub struct SignOptions {
    /// Scheme to serialise the signature with
    pub scheme: SignatureScheme,

    /// Components to cover, in order
    pub components: Vec<Component>,

    /// Creation time (UNIX timestamp in seconds)
    pub created: u64,

    /// Lifetime of the signature. Sets `expires` relative to `created`
    pub expires_in: Option<Duration>,

    /// Nonce to embed
    pub nonce: Option<String>,
}

/// Parameters and signature string, ready for the cryptographic step
#[derive(Debug)]
pub struct Prepared {
    scheme: SignatureScheme,
    params: SignatureParams,
    signature_string: String,
}

impl Prepared {
    /// Parameters the signature string was built from
    #[must_use]
    pub fn params(&self) -> &SignatureParams {
        &self.params
    }

    /// Exact string that gets signed
    #[must_use]
    pub fn signature_string(&self) -> &str {
        &self.signature_string
    }

    /// Sign the prepared signature string and attach the resulting headers to the request
    #[instrument(skip_all, fields(key_id = %self.params.key_id))]
    pub async fn sign<B>(
        mut self,
        key: Arc<SigningKey>,
        request: &mut http::Request<B>,
    ) -> Result<SignatureParams, Error> {
        let algorithm = self.params.algorithm;
        let signature_string = self.signature_string;
        self.params.signature = tokio::task::spawn_blocking(move || {
            crypto::sign(signature_string.as_bytes(), &key, algorithm)
        })
        .await??;

        self.scheme.attach(&self.params, request.headers_mut())?;
        debug!("attached signature");

        Ok(self.params)
    }

    /// Verify the signature contained in the parameters against the prepared signature string
    #[instrument(skip_all, fields(key_id = %self.params.key_id))]
    pub async fn verify(self, key: Arc<VerifyingKey>) -> Result<SignatureParams, Error> {
        let Self {
            params,
            signature_string,
            ..
        } = self;

        let params = tokio::task::spawn_blocking(move || {
            crypto::verify(
                signature_string.as_bytes(),
                &params.signature,
                &key,
                params.algorithm,
            )
            .map(|()| params)
        })
        .await??;
        debug!("signature valid");

        Ok(params)
    }
}

/// Build the parameters and the signature string for a new signature
pub fn prepare_signature<B>(
    request: &http::Request<B>,
    key_id: &str,
    algorithm: Algorithm,
    options: &SignOptions,
) -> Result<Prepared, Error> {
    let params = SignatureParams {
        key_id: key_id.to_owned(),
        algorithm: Some(algorithm),
        created: Some(options.created),
        expires: options
            .expires_in
            .map(|expires_in| options.created.saturating_add(expires_in.as_secs())),
        nonce: options.nonce.clone(),
        components: options.components.clone(),
        signature: Vec::new(),
    };
    let signature_string = options.scheme.build_signing_string(request, &params)?;

    Ok(Prepared {
        scheme: options.scheme,
        params,
        signature_string,
    })
}

/// Extract the signature from the request, check it against the policy and build the signature string
///
/// Doesn't touch any key material. Validity is checked before any cryptographic work happens.
pub fn prepare_verification<B>(
    request: &http::Request<B>,
    scheme: SignatureScheme,
    policy: &ValidityPolicy,
    now: u64,
) -> Result<Prepared, Error> {
    let params = scheme.extract(request.headers())?;
    policy.check(&params, now)?;
    let signature_string = scheme.build_signing_string(request, &params)?;

    Ok(Prepared {
        scheme,
        params,
        signature_string,
    })
}

/// Sign a request with the provided key
#[instrument(skip_all, fields(%key_id))]
pub async fn sign<B>(
    mut request: http::Request<B>,
    key_id: &str,
    key: Arc<SigningKey>,
    options: &SignOptions,
) -> Result<http::Request<B>, Error> {
    let prepared = prepare_signature(&request, key_id, key.algorithm(), options)?;
    prepared.sign(key, &mut request).await?;

    Ok(request)
}

/// Verify the signature of a request
///
/// The key is looked up through `get_key` using the key ID of the signature
#[instrument(skip_all)]
pub async fn verify<B, F, Fut, E>(
    request: &http::Request<B>,
    scheme: SignatureScheme,
    policy: &ValidityPolicy,
    now: u64,
    get_key: F,
) -> Result<SignatureParams, Error>
where
    F: FnOnce(&str) -> Fut,
    Fut: Future<Output = Result<Arc<VerifyingKey>, E>>,
    E: Into<BoxError>,
{
    let prepared = prepare_verification(request, scheme, policy, now)?;
    let key = get_key(&prepared.params().key_id)
        .await
        .map_err(|error| Error::GetKey(error.into()))?;

    prepared.verify(key).await
}

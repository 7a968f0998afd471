//!
//! Scheme independent signature parameters
//!

use crate::{
    algorithm::{Algorithm, UnsupportedAlgorithm},
    component::{Component, UnknownComponent},
};
use miette::{Diagnostic, SourceSpan};
use std::ops::Range;
use thiserror::Error;

/// Parameters are structurally valid but semantically contradictory
#[derive(Debug, Diagnostic, Error, PartialEq)]
pub enum InvalidParameters {
    /// Expiry lies before the creation time
    #[error("Signature expires before it was created")]
    ExpiresBeforeCreated,

    /// Key ID is empty or contains characters that can't be transported in a quoted string
    #[error("Invalid key ID")]
    InvalidKeyId,

    /// Nonce contains characters that can't be transported in a quoted string
    #[error("Invalid nonce")]
    InvalidNonce,

    /// The signature doesn't cover anything
    #[error("Signature covers no components")]
    NoComponents,
}

/// Signature parameters
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignatureParams {
    /// Identifier of the key the signature was created with
    pub key_id: String,

    /// Declared algorithm
    pub algorithm: Option<Algorithm>,

    /// Creation time (UNIX timestamp in seconds)
    pub created: Option<u64>,

    /// Expiry time (UNIX timestamp in seconds)
    pub expires: Option<u64>,

    /// Random value used once
    pub nonce: Option<String>,

    /// Ordered list of covered components
    pub components: Vec<Component>,

    /// Raw signature bytes. Empty while the signature is still being built
    pub signature: Vec<u8>,
}

fn is_quotable(value: &str) -> bool {
    value
        .bytes()
        .all(|byte| (b' '..=b'~').contains(&byte) && byte != b'"' && byte != b'\\')
}

impl SignatureParams {
    /// Check the invariants every parsed or serialised parameter set upholds
    pub fn validate(&self) -> Result<(), InvalidParameters> {
        if self.key_id.is_empty() || !is_quotable(&self.key_id) {
            return Err(InvalidParameters::InvalidKeyId);
        }

        if self.nonce.as_deref().is_some_and(|nonce| !is_quotable(nonce)) {
            return Err(InvalidParameters::InvalidNonce);
        }

        if self.components.is_empty() {
            return Err(InvalidParameters::NoComponents);
        }

        if let (Some(created), Some(expires)) = (self.created, self.expires) {
            if expires < created {
                return Err(InvalidParameters::ExpiresBeforeCreated);
            }
        }

        Ok(())
    }

    /// Whether the signature covers the component
    #[must_use]
    pub fn covers(&self, component: &Component) -> bool {
        self.components.contains(component)
    }
}

/// Reason a header value couldn't be parsed
#[derive(Debug, Diagnostic, Error)]
pub enum ParseErrorKind {
    /// Input ended in the middle of a parameter
    #[error("Unexpected end of input")]
    UnexpectedEnd,

    /// Token that doesn't fit the grammar at this position
    #[error("Unexpected token")]
    UnexpectedToken,

    /// Parameter we don't know about
    #[error("Unknown parameter \"{0}\"")]
    UnknownParameter(String),

    /// Required parameter is missing
    #[error("Missing \"{0}\" parameter")]
    MissingParameter(&'static str),

    /// Numeric parameter isn't a valid non-negative integer
    #[error("Invalid number")]
    InvalidNumber,

    /// Signature isn't valid base64
    #[error("Invalid base64")]
    InvalidBase64,

    /// `Signature` has no entry for the label found in `Signature-Input`
    #[error("Missing signature for label \"{0}\"")]
    MissingLabel(String),

    #[error(transparent)]
    InvalidParameters(#[from] InvalidParameters),

    #[error(transparent)]
    UnknownComponent(#[from] UnknownComponent),

    #[error(transparent)]
    UnsupportedAlgorithm(#[from] UnsupportedAlgorithm),
}

/// Header value couldn't be parsed
#[derive(Debug, Diagnostic, Error)]
#[error("Failed to parse signature header: {kind}")]
#[diagnostic(code(http_signatures::parse))]
pub struct ParseError {
    /// What went wrong
    pub kind: ParseErrorKind,

    /// Location inside the header value
    #[label("{kind}")]
    pub span: SourceSpan,
}

impl ParseError {
    pub(crate) fn new(kind: impl Into<ParseErrorKind>, span: Range<usize>) -> Self {
        Self {
            kind: kind.into(),
            span: span.into(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{InvalidParameters, SignatureParams};
    use crate::Component;

    fn params() -> SignatureParams {
        SignatureParams {
            key_id: "k1".into(),
            algorithm: None,
            created: Some(100),
            expires: Some(160),
            nonce: Some("1234567890".into()),
            components: vec![Component::Method, Component::Path],
            signature: Vec::new(),
        }
    }

    #[test]
    fn valid() {
        assert_eq!(params().validate(), Ok(()));
    }

    #[test]
    fn expires_before_created() {
        let mut params = params();
        params.expires = Some(99);
        assert_eq!(
            params.validate(),
            Err(InvalidParameters::ExpiresBeforeCreated)
        );
    }

    #[test]
    fn unquotable_key_id() {
        let mut params = params();
        params.key_id = "k\"1".into();
        assert_eq!(params.validate(), Err(InvalidParameters::InvalidKeyId));

        params.key_id = String::new();
        assert_eq!(params.validate(), Err(InvalidParameters::InvalidKeyId));
    }

    #[test]
    fn covers() {
        let params = params();
        assert!(params.covers(&Component::Method));
        assert!(!params.covers(&Component::Query));
    }
}

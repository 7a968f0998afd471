//!
//! Dispatch between the supported signature schemes
//!

use crate::{
    cavage,
    params::{ParseError, ParseErrorKind},
    rfc9421, signature_string, SignatureParams, SIGNATURE_HEADER, SIGNATURE_INPUT_HEADER,
};
use http::{
    header::{InvalidHeaderValue, ToStrError},
    HeaderMap, HeaderValue,
};
use miette::Diagnostic;
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Failed to pull signature parameters out of a header map
#[derive(Debug, Diagnostic, Error)]
pub enum ExtractError {
    /// No signature headers present
    #[error("Missing signature")]
    MissingSignature,

    /// Header had an invalid value (non-UTF8 value)
    #[error(transparent)]
    InvalidHeaderValue(#[from] ToStrError),

    /// Header present but malformed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),
}

/// Serialised header values
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SerialisedSignature {
    /// Value of the `Signature` header
    pub signature: String,

    /// Value of the `Signature-Input` header, RFC 9421 only
    pub signature_input: Option<String>,
}

/// Signature scheme
#[derive(AsRefStr, Clone, Copy, Debug, Default, Display, EnumString, Eq, Hash, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum SignatureScheme {
    /// RFC 9421 HTTP message signatures
    #[default]
    Rfc9421,

    /// draft-cavage-http-signatures
    Cavage,
}

impl SignatureScheme {
    /// Build the exact byte string that gets signed
    pub fn build_signing_string<B>(
        self,
        request: &http::Request<B>,
        params: &SignatureParams,
    ) -> Result<String, signature_string::Error> {
        match self {
            Self::Rfc9421 => rfc9421::signature_base::construct(request, params),
            Self::Cavage => cavage::signature_string::construct(request, params),
        }
    }

    /// Serialise the parameters into header values
    #[must_use]
    pub fn serialise(self, params: &SignatureParams) -> SerialisedSignature {
        match self {
            Self::Rfc9421 => {
                let (signature_input, signature) =
                    rfc9421::serialise(params, rfc9421::DEFAULT_LABEL);

                SerialisedSignature {
                    signature,
                    signature_input: Some(signature_input),
                }
            }
            Self::Cavage => SerialisedSignature {
                signature: cavage::serialise(params),
                signature_input: None,
            },
        }
    }

    /// Parse header values back into parameters
    pub fn parse(
        self,
        signature: &str,
        signature_input: Option<&str>,
    ) -> Result<SignatureParams, ParseError> {
        match self {
            Self::Rfc9421 => {
                let signature_input = signature_input.ok_or_else(|| {
                    ParseError::new(ParseErrorKind::MissingParameter("Signature-Input"), 0..0)
                })?;

                rfc9421::parse(signature_input, signature)
            }
            Self::Cavage => cavage::parse_header_value(signature),
        }
    }

    /// Insert the serialised signature into the header map, replacing any previous signature
    pub fn attach(
        self,
        params: &SignatureParams,
        headers: &mut HeaderMap,
    ) -> Result<(), InvalidHeaderValue> {
        let serialised = self.serialise(params);

        headers.insert(
            SIGNATURE_HEADER.clone(),
            HeaderValue::from_str(&serialised.signature)?,
        );

        if let Some(signature_input) = serialised.signature_input {
            headers.insert(
                SIGNATURE_INPUT_HEADER.clone(),
                HeaderValue::from_str(&signature_input)?,
            );
        }

        Ok(())
    }

    /// Read the signature parameters out of the header map
    pub fn extract(self, headers: &HeaderMap) -> Result<SignatureParams, ExtractError> {
        match self {
            Self::Rfc9421 => {
                let (Some(signature), Some(signature_input)) = (
                    headers.get(&SIGNATURE_HEADER),
                    headers.get(&SIGNATURE_INPUT_HEADER),
                ) else {
                    return Err(ExtractError::MissingSignature);
                };

                Ok(rfc9421::parse(signature_input.to_str()?, signature.to_str()?)?)
            }
            Self::Cavage => {
                let value = cavage::find_header(headers).ok_or(ExtractError::MissingSignature)?;
                Ok(cavage::parse_header_value(value.to_str()?)?)
            }
        }
    }
}

/// Remove every signature related header
pub fn strip(headers: &mut HeaderMap) {
    headers.remove(&SIGNATURE_HEADER);
    headers.remove(&SIGNATURE_INPUT_HEADER);
}

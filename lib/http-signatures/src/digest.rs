//!
//! `Digest` header handling
//!

use miette::Diagnostic;
use sha2::{Digest, Sha256, Sha512};
use std::str::FromStr;
use strum::{AsRefStr, EnumString};
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Digest verification error
#[derive(Debug, Diagnostic, Error, PartialEq)]
pub enum DigestError {
    /// Header didn't contain any digest we support
    #[error("Unsupported digest algorithm")]
    UnsupportedAlgorithm,

    /// Header value isn't of the form `algorithm=base64`
    #[error("Malformed digest header")]
    Malformed,

    /// Body doesn't match the digest
    #[error("Digest mismatch")]
    Mismatch,
}

/// Supported digest algorithms
#[derive(AsRefStr, Clone, Copy, Debug, Default, EnumString, Eq, PartialEq)]
#[strum(ascii_case_insensitive)]
pub enum DigestAlgorithm {
    /// SHA-256
    #[default]
    #[strum(to_string = "SHA-256")]
    Sha256,

    /// SHA-512
    #[strum(to_string = "SHA-512")]
    Sha512,
}

impl DigestAlgorithm {
    fn hash(self, body: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(body).to_vec(),
            Self::Sha512 => Sha512::digest(body).to_vec(),
        }
    }
}

/// Compute the value of a `Digest` header over the body (`SHA-256=<base64>`)
#[must_use]
pub fn compute(algorithm: DigestAlgorithm, body: &[u8]) -> String {
    format!(
        "{}={}",
        algorithm.as_ref(),
        base64_simd::STANDARD.encode_to_string(algorithm.hash(body))
    )
}

/// Verify a `Digest` header value against the body
///
/// The value may list multiple digests separated by commas. Unsupported algorithms are skipped, every supported one has to match.
pub fn verify(header_value: &str, body: &[u8]) -> Result<(), DigestError> {
    let mut checked = false;

    for entry in header_value.split(',') {
        let (algorithm, encoded) = entry
            .trim()
            .split_once('=')
            .ok_or(DigestError::Malformed)?;

        let Ok(algorithm) = DigestAlgorithm::from_str(algorithm) else {
            continue;
        };

        let provided = base64_simd::STANDARD
            .decode_to_vec(encoded)
            .map_err(|_| DigestError::Malformed)?;

        if !bool::from(algorithm.hash(body).ct_eq(&provided)) {
            return Err(DigestError::Mismatch);
        }

        checked = true;
    }

    if checked {
        Ok(())
    } else {
        Err(DigestError::UnsupportedAlgorithm)
    }
}

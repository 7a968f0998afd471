//!
//! Signature algorithm identifiers
//!

use miette::Diagnostic;
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// The algorithm name isn't one we know about
#[derive(Debug, Diagnostic, Error, PartialEq)]
#[error("Unsupported algorithm \"{0}\"")]
#[diagnostic(code(http_signatures::unsupported_algorithm))]
pub struct UnsupportedAlgorithm(pub String);

/// Supported signature algorithms
#[derive(AsRefStr, Clone, Copy, Debug, Display, EnumString, Eq, Hash, PartialEq)]
pub enum Algorithm {
    /// HMAC using SHA-256 over a shared secret
    #[strum(to_string = "hmac-sha256")]
    HmacSha256,

    /// RSASSA-PKCS1-v1_5 using SHA-256
    #[strum(to_string = "rsa-sha256", serialize = "rsa-v1_5-sha256")]
    RsaSha256,

    /// EdDSA using Curve25519
    #[strum(to_string = "ed25519")]
    Ed25519,

    /// ECDSA using the P-256 curve and SHA-256
    #[strum(to_string = "ecdsa-p256-sha256")]
    EcdsaP256Sha256,
}

impl Algorithm {
    /// Parse an algorithm name as it appears in the `alg`/`algorithm` parameter
    pub fn parse(name: &str) -> Result<Self, UnsupportedAlgorithm> {
        Self::from_str(name).map_err(|_| UnsupportedAlgorithm(name.to_owned()))
    }

    /// Whether the algorithm operates on a shared secret instead of a key pair
    #[must_use]
    pub fn is_symmetric(self) -> bool {
        matches!(self, Self::HmacSha256)
    }
}

use crate::Algorithm;
use miette::Diagnostic;
use ring::{
    hmac,
    signature::{
        UnparsedPublicKey, VerificationAlgorithm, ECDSA_P256_SHA256_ASN1, ED25519,
        RSA_PKCS1_2048_8192_SHA256,
    },
};
use std::fmt;
use thiserror::Error;

/// Verification error
#[derive(Debug, Diagnostic, Error)]
pub enum VerifyError {
    /// The declared algorithm doesn't match the algorithm of the key
    #[error("Key uses {key} but the signature declares {declared}")]
    UnsupportedAlgorithm {
        /// Algorithm of the key
        key: Algorithm,

        /// Algorithm the signature parameters declare
        declared: Algorithm,
    },

    /// Verification failed
    #[error("Verification failed")]
    Verification,
}

/// Key able to verify signatures
pub enum VerifyingKey {
    /// Public half of an asymmetric key pair
    Public {
        /// Algorithm of the key
        algorithm: Algorithm,

        /// Raw public key, bound to its verification algorithm
        key: UnparsedPublicKey<Vec<u8>>,
    },

    /// HMAC-SHA256 shared secret
    Hmac(hmac::Key),
}

impl VerifyingKey {
    /// Construct a HMAC-SHA256 key from a shared secret
    #[must_use]
    pub fn hmac(secret: &[u8]) -> Self {
        Self::Hmac(hmac::Key::new(hmac::HMAC_SHA256, secret))
    }

    /// Construct a verifying key from raw public key bytes
    ///
    /// Returns `None` for symmetric algorithms
    #[must_use]
    pub fn public(algorithm: Algorithm, public_key: Vec<u8>) -> Option<Self> {
        let verification: &'static dyn VerificationAlgorithm = match algorithm {
            Algorithm::Ed25519 => &ED25519,
            Algorithm::RsaSha256 => &RSA_PKCS1_2048_8192_SHA256,
            Algorithm::EcdsaP256Sha256 => &ECDSA_P256_SHA256_ASN1,
            Algorithm::HmacSha256 => return None,
        };

        Some(Self::Public {
            algorithm,
            key: UnparsedPublicKey::new(verification, public_key),
        })
    }

    /// Algorithm the key verifies
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Public { algorithm, .. } => *algorithm,
            Self::Hmac(..) => Algorithm::HmacSha256,
        }
    }

    /// Check the signature over the message
    ///
    /// HMAC tags are compared in constant time
    #[must_use]
    pub fn verify(&self, msg: &[u8], signature: &[u8]) -> bool {
        match self {
            Self::Public { key, .. } => key.verify(msg, signature).is_ok(),
            Self::Hmac(key) => hmac::verify(key, msg, signature).is_ok(),
        }
    }
}

impl fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VerifyingKey")
            .field(&self.algorithm())
            .finish()
    }
}

/// Verify that the message corresponds with the signature using the provided verifying key
///
/// If the parameters declare an algorithm, it has to match the algorithm of the key
#[inline]
pub fn verify(
    msg: &[u8],
    signature: &[u8],
    key: &VerifyingKey,
    declared: Option<Algorithm>,
) -> Result<(), VerifyError> {
    if let Some(declared) = declared {
        if declared != key.algorithm() {
            return Err(VerifyError::UnsupportedAlgorithm {
                key: key.algorithm(),
                declared,
            });
        }
    }

    if key.verify(msg, signature) {
        Ok(())
    } else {
        Err(VerifyError::Verification)
    }
}

use super::VerifyingKey;
use crate::Algorithm;
use miette::Diagnostic;
use ring::{
    hmac,
    rand::SystemRandom,
    signature::{
        EcdsaKeyPair, Ed25519KeyPair, KeyPair, RsaKeyPair, UnparsedPublicKey,
        VerificationAlgorithm, ECDSA_P256_SHA256_ASN1, ED25519, RSA_PKCS1_2048_8192_SHA256,
        RSA_PKCS1_SHA256,
    },
};
use std::fmt;
use thiserror::Error;

/// Signing error
#[derive(Debug, Diagnostic, Error)]
pub enum SignError {
    /// The declared algorithm doesn't match the algorithm of the key
    #[error("Key uses {key} but the signature declares {declared}")]
    UnsupportedAlgorithm {
        /// Algorithm of the key
        key: Algorithm,

        /// Algorithm the signature parameters declare
        declared: Algorithm,
    },

    /// The underlying primitive failed
    #[error("Failed to sign message")]
    Unspecified(#[from] ring::error::Unspecified),
}

/// Enum dispatch over various signing keys
pub enum SigningKey {
    /// Ed25519
    Ed25519(Ed25519KeyPair),

    /// RSA
    Rsa(RsaKeyPair),

    /// ECDSA P-256
    EcdsaP256(EcdsaKeyPair),

    /// HMAC-SHA256 shared secret
    Hmac(hmac::Key),
}

impl SigningKey {
    /// Construct a HMAC-SHA256 key from a shared secret
    #[must_use]
    pub fn hmac(secret: &[u8]) -> Self {
        Self::Hmac(hmac::Key::new(hmac::HMAC_SHA256, secret))
    }

    /// Algorithm the key signs with
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Ed25519(..) => Algorithm::Ed25519,
            Self::Rsa(..) => Algorithm::RsaSha256,
            Self::EcdsaP256(..) => Algorithm::EcdsaP256Sha256,
            Self::Hmac(..) => Algorithm::HmacSha256,
        }
    }

    /// Sign a message
    pub fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, SignError> {
        let signature = match self {
            Self::Ed25519(key) => key.sign(msg).as_ref().to_vec(),
            Self::Rsa(key) => {
                let mut buf = vec![0; key.public().modulus_len()];
                key.sign(&RSA_PKCS1_SHA256, &SystemRandom::new(), msg, &mut buf)?;
                buf
            }
            Self::EcdsaP256(key) => key.sign(&SystemRandom::new(), msg)?.as_ref().to_vec(),
            Self::Hmac(key) => hmac::sign(key, msg).as_ref().to_vec(),
        };

        Ok(signature)
    }

    /// Key that verifies signatures created by this key
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        let public = |verification: &'static dyn VerificationAlgorithm, public_key: &[u8]| {
            VerifyingKey::Public {
                algorithm: self.algorithm(),
                key: UnparsedPublicKey::new(verification, public_key.to_vec()),
            }
        };

        match self {
            Self::Ed25519(key) => public(&ED25519, key.public_key().as_ref()),
            Self::Rsa(key) => public(&RSA_PKCS1_2048_8192_SHA256, key.public_key().as_ref()),
            Self::EcdsaP256(key) => public(&ECDSA_P256_SHA256_ASN1, key.public_key().as_ref()),
            Self::Hmac(key) => VerifyingKey::Hmac(key.clone()),
        }
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SigningKey")
            .field(&self.algorithm())
            .finish()
    }
}

/// Sign a message with the provided signing key
///
/// If the parameters declare an algorithm, it has to match the algorithm of the key
#[inline]
pub fn sign(
    payload: &[u8],
    key: &SigningKey,
    declared: Option<Algorithm>,
) -> Result<Vec<u8>, SignError> {
    if let Some(declared) = declared {
        if declared != key.algorithm() {
            return Err(SignError::UnsupportedAlgorithm {
                key: key.algorithm(),
                declared,
            });
        }
    }

    key.sign(payload)
}

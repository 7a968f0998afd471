//!
//! Parse cryptographic keys for use in the HTTP signature implementations
//!

use super::{legacy_pem, SigningKey, VerifyingKey};
use crate::Algorithm;
use const_oid::{
    db::{
        rfc5912::{ID_EC_PUBLIC_KEY, RSA_ENCRYPTION, SECP_256_R_1},
        rfc8410::ID_ED_25519,
    },
    ObjectIdentifier,
};
use miette::Diagnostic;
use pkcs8::{
    der::AnyRef, spki::AlgorithmIdentifierRef, Document, EncryptedPrivateKeyInfo, PrivateKeyInfo,
    SecretDocument, SubjectPublicKeyInfoRef,
};
use ring::{
    rand::SystemRandom,
    signature::{EcdsaKeyPair, Ed25519KeyPair, RsaKeyPair, ECDSA_P256_SHA256_ASN1_SIGNING},
};
use sec1::EcPrivateKey;
use thiserror::Error;

/// Key parsing error
#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    /// Decryption failed, most likely because of a wrong password
    #[error("Failed to decrypt the key")]
    Decryption,

    /// Malformed DER structure
    #[error(transparent)]
    Der(#[from] pkcs8::der::Error),

    /// Key rejected
    #[error(transparent)]
    KeyRejected(#[from] ring::error::KeyRejected),

    /// Malformed key
    #[error("Malformed key")]
    MalformedKey,

    /// The key is encrypted but no password was supplied
    #[error("Key is encrypted but no password was provided")]
    MissingPassword,

    /// Malformed PKCS#8 document
    #[error(transparent)]
    Pkcs8(#[from] pkcs8::Error),

    /// Malformed SEC1 document
    #[error(transparent)]
    Sec1(#[from] sec1::Error),

    /// Unknown key type
    #[error("Unknown key type")]
    UnknownKeyType,

    /// Traditional PEM encryption with a cipher we don't implement
    #[error("Unsupported key encryption \"{0}\"")]
    UnsupportedEncryption(String),
}

/// Map the algorithm identifier of a key to the signature algorithm we use it with
fn key_algorithm(identifier: &AlgorithmIdentifierRef<'_>) -> Result<Algorithm, Error> {
    let algorithm = if identifier.oid == RSA_ENCRYPTION {
        Algorithm::RsaSha256
    } else if identifier.oid == ID_ED_25519 {
        Algorithm::Ed25519
    } else if identifier.oid == ID_EC_PUBLIC_KEY {
        let curve: ObjectIdentifier = identifier
            .parameters_oid()
            .map_err(|_| Error::MalformedKey)?;

        if curve != SECP_256_R_1 {
            return Err(Error::UnknownKeyType);
        }

        Algorithm::EcdsaP256Sha256
    } else {
        return Err(Error::UnknownKeyType);
    };

    Ok(algorithm)
}

/// Parse a public key from its SPKI PEM form
///
/// Currently supported algorithms:
///
/// - RSA
/// - Ed25519
/// - ECDSA P-256
#[inline]
pub fn public_key(pem: &str) -> Result<VerifyingKey, Error> {
    let (_pem_tag, document) = Document::from_pem(pem)?;
    let spki: SubjectPublicKeyInfoRef<'_> = document.decode_msg()?;
    let algorithm = key_algorithm(&spki.algorithm)?;

    let raw_bytes = spki
        .subject_public_key
        .as_bytes()
        .ok_or(Error::MalformedKey)?
        .to_vec();

    VerifyingKey::public(algorithm, raw_bytes).ok_or(Error::UnknownKeyType)
}

/// Construct a HMAC-SHA256 key from a raw shared secret
#[inline]
#[must_use]
pub fn hmac_key(secret: &[u8]) -> SigningKey {
    SigningKey::hmac(secret)
}

fn pkcs8_private_key(der: &[u8]) -> Result<SigningKey, Error> {
    let private_key_info = PrivateKeyInfo::try_from(der)?;

    let signing_key = match key_algorithm(&private_key_info.algorithm)? {
        Algorithm::RsaSha256 => SigningKey::Rsa(RsaKeyPair::from_pkcs8(der)?),
        Algorithm::Ed25519 => {
            SigningKey::Ed25519(Ed25519KeyPair::from_pkcs8_maybe_unchecked(der)?)
        }
        Algorithm::EcdsaP256Sha256 => SigningKey::EcdsaP256(EcdsaKeyPair::from_pkcs8(
            &ECDSA_P256_SHA256_ASN1_SIGNING,
            der,
            &SystemRandom::new(),
        )?),
        Algorithm::HmacSha256 => return Err(Error::UnknownKeyType),
    };

    Ok(signing_key)
}

/// Wrap a SEC1 `ECPrivateKey` into PKCS#8, the only container ring loads ECDSA keys from
fn sec1_private_key(der: &[u8]) -> Result<SigningKey, Error> {
    let ec_private_key = EcPrivateKey::try_from(der)?;
    let curve = ec_private_key
        .parameters
        .and_then(|parameters| parameters.named_curve());
    if curve.is_some_and(|curve| curve != SECP_256_R_1) {
        return Err(Error::UnknownKeyType);
    }

    let curve = SECP_256_R_1;
    let private_key_info = PrivateKeyInfo {
        algorithm: AlgorithmIdentifierRef {
            oid: ID_EC_PUBLIC_KEY,
            parameters: Some(AnyRef::from(&curve)),
        },
        private_key: der,
        public_key: None,
    };
    let document = SecretDocument::encode_msg(&private_key_info)?;

    pkcs8_private_key(document.as_bytes())
}

fn der_private_key(label: &str, der: &[u8]) -> Result<SigningKey, Error> {
    match label {
        "RSA PRIVATE KEY" => Ok(SigningKey::Rsa(RsaKeyPair::from_der(der)?)),
        "EC PRIVATE KEY" => sec1_private_key(der),
        "PRIVATE KEY" => pkcs8_private_key(der),
        _ => Err(Error::UnknownKeyType),
    }
}

/// Parse a private key from its PEM form.
/// This function uses constant-time PEM decoding and zeroizes any temporary allocations.
///
/// Accepted PEM labels:
///
/// - `PRIVATE KEY` (PKCS#8)
/// - `ENCRYPTED PRIVATE KEY` (PKCS#8, requires a password)
/// - `RSA PRIVATE KEY` (PKCS#1)
/// - `EC PRIVATE KEY` (SEC1, P-256 only)
///
/// PKCS#1 and SEC1 documents may use OpenSSL's traditional `Proc-Type: 4,ENCRYPTED` encryption
/// (AES-128/192/256-CBC or DES-EDE3-CBC), which requires a password as well.
///
/// Currently supported algorithms:
///
/// - RSA
/// - Ed25519
/// - ECDSA P-256
#[inline]
pub fn private_key(pem: &str, password: Option<&str>) -> Result<SigningKey, Error> {
    if legacy_pem::is_encrypted(pem) {
        let password = password.ok_or(Error::MissingPassword)?;
        let (label, document) = legacy_pem::decrypt(pem, password.as_bytes())?;

        return der_private_key(label, document.as_bytes());
    }

    let (tag_line, document) = SecretDocument::from_pem(pem)?;

    match tag_line {
        "ENCRYPTED PRIVATE KEY" => {
            let password = password.ok_or(Error::MissingPassword)?;
            let encrypted: EncryptedPrivateKeyInfo<'_> = document.decode_msg()?;
            let decrypted = encrypted.decrypt(password)?;

            pkcs8_private_key(decrypted.as_bytes())
        }
        label => der_private_key(label, document.as_bytes()),
    }
}

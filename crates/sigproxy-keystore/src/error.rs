use crate::Role;
use http_signatures::{algorithm::UnsupportedAlgorithm, crypto::parse, Algorithm};
use smol_str::SmolStr;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Key \"{key_id}\" declares algorithm {declared} but the key material is {actual}")]
    AlgorithmMismatch {
        key_id: SmolStr,
        declared: Algorithm,
        actual: Algorithm,
    },

    #[error("Duplicate key identifier \"{0}\" for role {1:?}")]
    DuplicateIdentifier(SmolStr, Role),

    #[error("Key \"{key_id}\" has an invalid base64 secret")]
    InvalidSecret { key_id: SmolStr },

    #[error("Failed to parse key \"{key_id}\"")]
    KeyParse {
        key_id: SmolStr,
        #[source]
        source: parse::Error,
    },

    #[error("Key \"{key_id}\" has neither a path nor a secret")]
    MissingMaterial { key_id: SmolStr },

    #[error("No {1:?} key with identifier \"{0}\"")]
    NotFound(SmolStr, Role),

    #[error("Failed to read key \"{key_id}\"")]
    Read {
        key_id: SmolStr,
        #[source]
        source: io::Error,
    },

    #[error("Key \"{key_id}\" uses an unsupported algorithm")]
    UnsupportedAlgorithm {
        key_id: SmolStr,
        #[source]
        source: UnsupportedAlgorithm,
    },
}

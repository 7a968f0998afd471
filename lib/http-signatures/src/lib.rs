//!
//! HTTP message signatures
//!
//! Implements the RFC 9421 `Signature-Input`/`Signature` pair as well as the older cavage draft `Signature` header.
//! Both schemes share the same parameter model ([`SignatureParams`]), the same components and the same key handling.
//!

use http::HeaderName;

pub mod algorithm;
pub mod cavage;
pub mod component;
pub mod crypto;
pub mod digest;
#[cfg(feature = "easy")]
pub mod easy;
pub mod params;
pub mod rfc9421;
pub mod scheme;
pub mod signature_string;
pub mod validity;

pub use self::{
    algorithm::Algorithm,
    component::Component,
    params::{ParseError, SignatureParams},
    scheme::SignatureScheme,
    validity::ValidityPolicy,
};

#[cfg(feature = "easy")]
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// `Signature` header name
pub static SIGNATURE_HEADER: HeaderName = HeaderName::from_static("signature");

/// `Signature-Input` header name (RFC 9421 only)
pub static SIGNATURE_INPUT_HEADER: HeaderName = HeaderName::from_static("signature-input");

/// `Digest` header name
pub static DIGEST_HEADER: HeaderName = HeaderName::from_static("digest");

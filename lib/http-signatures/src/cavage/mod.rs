//!
//! Cavage draft `Signature` header
//!

use crate::{params::ParseError, SignatureParams, SIGNATURE_HEADER};
use http::{header::AUTHORIZATION, HeaderMap};

mod parse;
mod serialise;

pub mod signature_string;

pub use self::{parse::parse, serialise::serialise};

const AUTHORIZATION_PREFIX: &str = "Signature ";

/// Locate the raw cavage signature value in the headers
///
/// Prefers the `Signature` header and falls back to `Authorization: Signature ...`
#[must_use]
pub fn find_header(headers: &HeaderMap) -> Option<&http::HeaderValue> {
    headers.get(&SIGNATURE_HEADER).or_else(|| {
        headers.get(AUTHORIZATION).filter(|value| {
            value
                .as_bytes()
                .get(..AUTHORIZATION_PREFIX.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(AUTHORIZATION_PREFIX.as_bytes()))
        })
    })
}

/// Parse a value taken from either the `Signature` or the `Authorization` header
pub fn parse_header_value(value: &str) -> Result<SignatureParams, ParseError> {
    let is_authorization = value
        .get(..AUTHORIZATION_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(AUTHORIZATION_PREFIX));

    if is_authorization {
        parse(&value[AUTHORIZATION_PREFIX.len()..]).map_err(|mut error| {
            let offset = error.span.offset() + AUTHORIZATION_PREFIX.len();
            error.span = (offset, error.span.len()).into();
            error
        })
    } else {
        parse(value)
    }
}

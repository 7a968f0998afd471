//!
//! RFC 9421 `Signature-Input` and `Signature` headers
//!

use crate::params::ParseError;
use crate::SignatureParams;

mod parse;
mod serialise;

pub mod signature_base;

pub use self::{
    parse::{parse_input, parse_signature},
    serialise::{serialise, serialise_params, DEFAULT_LABEL},
};

/// Parse the `Signature-Input` header and pick the matching entry out of the `Signature` header
///
/// Only the first member of `Signature-Input` is considered
pub fn parse(signature_input: &str, signature: &str) -> Result<SignatureParams, ParseError> {
    let (label, mut params) = parse_input(signature_input)?;
    params.signature = parse_signature(signature, &label)?;
    Ok(params)
}

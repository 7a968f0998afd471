//!
//! Utilities for handling cavage signature strings
//!

use crate::{
    signature_string::{resolve, Error},
    SignatureParams,
};
use std::fmt::Write;

/// Construct a new signature string from the signature parameters and an HTTP request
#[inline]
pub fn construct<B>(request: &http::Request<B>, params: &SignatureParams) -> Result<String, Error> {
    let mut signature_string = String::new();
    for component in &params.components {
        let value = resolve(component, request, params)?;
        let _ = writeln!(signature_string, "{component}: {value}");
    }

    // Remove the last new-line
    signature_string.pop();

    Ok(signature_string)
}

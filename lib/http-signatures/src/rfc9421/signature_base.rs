//!
//! Construction of the RFC 9421 signature base
//!

use super::serialise_params;
use crate::{
    signature_string::{resolve, Error},
    SignatureParams,
};
use std::fmt::Write;

/// Construct the signature base from the signature parameters and an HTTP request
///
/// Every covered component becomes a `"name": value` line, followed by the `"@signature-params"` line
#[inline]
pub fn construct<B>(request: &http::Request<B>, params: &SignatureParams) -> Result<String, Error> {
    let mut signature_base = String::new();
    for component in &params.components {
        let value = resolve(component, request, params)?;
        let _ = writeln!(signature_base, "\"{component}\": {value}");
    }

    let _ = write!(
        signature_base,
        "\"@signature-params\": {}",
        serialise_params(params)
    );

    Ok(signature_base)
}

#[cfg(test)]
mod test {
    use crate::{Component, SignatureParams};
    use http::{header::CONTENT_TYPE, Request};

    #[test]
    fn signature_base() {
        let request = Request::post("https://example.com/foo?param=Value&Pet=dog")
            .header(CONTENT_TYPE, "application/json")
            .body(())
            .unwrap();
        let params = SignatureParams {
            key_id: "test-key-rsa".into(),
            algorithm: None,
            created: Some(1_618_884_473),
            expires: None,
            nonce: None,
            components: vec![
                Component::Method,
                Component::Authority,
                Component::Path,
                Component::Query,
                Component::Header(CONTENT_TYPE),
            ],
            signature: Vec::new(),
        };

        assert_eq!(
            super::construct(&request, &params).unwrap(),
            "\"@method\": POST\n\
             \"@authority\": example.com\n\
             \"@path\": /foo\n\
             \"@query\": ?param=Value&Pet=dog\n\
             \"content-type\": application/json\n\
             \"@signature-params\": (\"@method\" \"@authority\" \"@path\" \"@query\" \"content-type\");keyid=\"test-key-rsa\";created=1618884473"
        );
    }
}

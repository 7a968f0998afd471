use crate::{Component, SignatureParams};
use std::fmt::Write;

/// Serialise the parameters into a cavage `Signature` header value
#[inline]
#[must_use]
pub fn serialise(params: &SignatureParams) -> String {
    let mut buffer = String::new();

    let _ = write!(buffer, "keyId=\"{}\"", params.key_id);

    if let Some(algorithm) = params.algorithm {
        let _ = write!(buffer, ",algorithm=\"{algorithm}\"");
    }

    if let Some(created) = params.created {
        let _ = write!(buffer, ",created={created}");
    }

    if let Some(expires) = params.expires {
        let _ = write!(buffer, ",expires={expires}");
    }

    if let Some(ref nonce) = params.nonce {
        let _ = write!(buffer, ",nonce=\"{nonce}\"");
    }

    buffer.push_str(",headers=\"");
    for item in itertools::intersperse(params.components.iter().map(Component::as_str), " ") {
        buffer.push_str(item);
    }
    buffer.push('"');

    let _ = write!(
        buffer,
        ",signature=\"{}\"",
        base64_simd::STANDARD.encode_to_string(&params.signature)
    );

    buffer
}

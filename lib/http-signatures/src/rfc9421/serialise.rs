use crate::SignatureParams;
use std::fmt::Write;

/// Label used for signatures we produce
pub const DEFAULT_LABEL: &str = "sig1";

fn write_string(buffer: &mut String, value: &str) {
    buffer.push('"');
    for ch in value.chars() {
        if matches!(ch, '"' | '\\') {
            buffer.push('\\');
        }
        buffer.push(ch);
    }
    buffer.push('"');
}

/// Serialise the inner list and parameters, exactly as they appear after `label=`
///
/// Parameters are always emitted in the order `keyid`, `alg`, `created`, `expires`, `nonce`.
/// The same string is the value of the `@signature-params` line of the signature base.
#[must_use]
pub fn serialise_params(params: &SignatureParams) -> String {
    let mut buffer = String::from("(");
    for (idx, component) in params.components.iter().enumerate() {
        if idx > 0 {
            buffer.push(' ');
        }
        write_string(&mut buffer, component.as_str());
    }
    buffer.push(')');

    buffer.push_str(";keyid=");
    write_string(&mut buffer, &params.key_id);

    if let Some(algorithm) = params.algorithm {
        let _ = write!(buffer, ";alg=\"{algorithm}\"");
    }

    if let Some(created) = params.created {
        let _ = write!(buffer, ";created={created}");
    }

    if let Some(expires) = params.expires {
        let _ = write!(buffer, ";expires={expires}");
    }

    if let Some(ref nonce) = params.nonce {
        buffer.push_str(";nonce=");
        write_string(&mut buffer, nonce);
    }

    buffer
}

/// Serialise the parameters into the values of the `Signature-Input` and `Signature` headers (in that order)
#[must_use]
pub fn serialise(params: &SignatureParams, label: &str) -> (String, String) {
    let signature_input = format!("{label}={}", serialise_params(params));
    let signature = format!(
        "{label}=:{}:",
        base64_simd::STANDARD.encode_to_string(&params.signature)
    );

    (signature_input, signature)
}

#[cfg(test)]
mod test {
    use super::{serialise, DEFAULT_LABEL};
    use crate::{Algorithm, Component, SignatureParams};

    #[test]
    fn canonical_order() {
        let params = SignatureParams {
            key_id: "k1".into(),
            algorithm: Some(Algorithm::Ed25519),
            created: Some(1_700_000_000),
            expires: Some(1_700_000_060),
            nonce: Some("4815162342".into()),
            components: vec![Component::Method, Component::Path, Component::Query],
            signature: vec![0, 1, 2],
        };

        let (signature_input, signature) = serialise(&params, DEFAULT_LABEL);
        assert_eq!(
            signature_input,
            r#"sig1=("@method" "@path" "@query");keyid="k1";alg="ed25519";created=1700000000;expires=1700000060;nonce="4815162342""#
        );
        assert_eq!(signature, "sig1=:AAEC:");
    }
}

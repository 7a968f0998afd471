use crate::{
    error::{Error, Result},
    exchange::{Exchange, Stage},
    forward,
};
use bytes::Bytes;
use http::{HeaderMap, Request};
use http_signatures::{
    cavage,
    digest::{self, DigestError},
    easy,
    validity::unix_timestamp,
    SignatureScheme, ValidityPolicy, DIGEST_HEADER, SIGNATURE_HEADER, SIGNATURE_INPUT_HEADER,
};
use sigproxy_keystore::KeyStore;
use std::time::{Duration, SystemTime};
use tracing::{debug, instrument};

/// Whether the headers carry any signature of the scheme
fn is_signed(scheme: SignatureScheme, headers: &HeaderMap) -> bool {
    match scheme {
        SignatureScheme::Rfc9421 => {
            headers.contains_key(&SIGNATURE_HEADER)
                || headers.contains_key(&SIGNATURE_INPUT_HEADER)
        }
        SignatureScheme::Cavage => cavage::find_header(headers).is_some(),
    }
}

/// Verifies requests before they reach the local target
#[derive(Debug)]
pub struct Verifier {
    pub(crate) require_signature: bool,
    pub(crate) policy: ValidityPolicy,
    pub(crate) timeout: Duration,
}

impl Verifier {
    #[instrument(skip_all, fields(exchange_id = %exchange.id()))]
    pub async fn verify(
        &self,
        keys: &KeyStore,
        scheme: SignatureScheme,
        upstream: &str,
        exchange: &mut Exchange,
        request: Request<Bytes>,
    ) -> Result<Request<Bytes>> {
        if !self.require_signature && !is_signed(scheme, request.headers()) {
            debug!("forwarding unsigned request");
            let request = forward::upstream_request(upstream, request)?;
            exchange.transition(Stage::Canonicalized);
            return Ok(request);
        }

        let now = unix_timestamp(SystemTime::now());
        let prepared = easy::prepare_verification(&request, scheme, &self.policy, now)?;
        exchange.transition(Stage::Canonicalized);

        if let Some(value) = request.headers().get(&DIGEST_HEADER) {
            let value = value.to_str().map_err(|_| DigestError::Malformed)?;
            digest::verify(value, request.body())?;
        }

        let key_id = prepared.params().key_id.as_str();
        let key = keys
            .verifying_key(key_id)
            .map_err(|_| Error::UnknownKeyId(key_id.into()))?;

        let params = tokio::time::timeout(self.timeout, prepared.verify(key))
            .await
            .map_err(|_| Error::Timeout)??;
        exchange.transition(Stage::Verified);
        debug!(key_id = %params.key_id, "verified request");

        forward::upstream_request(upstream, request)
    }
}

#[cfg(test)]
mod test {
    use super::is_signed;
    use http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
    use http_signatures::{SignatureScheme, SIGNATURE_HEADER};

    #[test]
    fn detects_signatures() {
        let mut headers = HeaderMap::new();
        assert!(!is_signed(SignatureScheme::Rfc9421, &headers));
        assert!(!is_signed(SignatureScheme::Cavage, &headers));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer token"));
        assert!(!is_signed(SignatureScheme::Cavage, &headers));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Signature keyId=\"a\""));
        assert!(is_signed(SignatureScheme::Cavage, &headers));

        headers.insert(SIGNATURE_HEADER.clone(), HeaderValue::from_static("sig1=:AAAA:"));
        assert!(is_signed(SignatureScheme::Rfc9421, &headers));
    }
}

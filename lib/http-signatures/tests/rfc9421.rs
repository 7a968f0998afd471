use http::Request;
use http_signatures::{
    crypto::{SigningKey, VerifyingKey},
    easy::{self, Error, SignOptions},
    scheme::ExtractError,
    validity::ValidityError,
    Component, SignatureScheme, ValidityPolicy, SIGNATURE_HEADER, SIGNATURE_INPUT_HEADER,
};
use proptest::{prop_assert, prop_assert_eq, proptest};
use std::{convert::Infallible, future, sync::Arc, time::Duration};


const NOW: u64 = 1_700_000_000;

fn options() -> SignOptions {
    SignOptions {
        scheme: SignatureScheme::Rfc9421,
        components: vec![
            Component::Method,
            Component::Path,
            Component::Query,
            Component::Authority,
        ],
        created: NOW,
        expires_in: Some(Duration::from_secs(60)),
        nonce: Some("0123456789".into()),
    }
}

fn request(path: &str) -> Request<()> {
    Request::get(path)
        .header("host", "localhost:8080")
        .body(())
        .unwrap()
}

async fn sign(key: &Arc<SigningKey>, req: Request<()>) -> Request<()> {
    easy::sign(req, "k1", Arc::clone(key), &options())
        .await
        .unwrap()
}

async fn verify(
    key: &Arc<SigningKey>,
    req: &Request<()>,
    now: u64,
) -> Result<http_signatures::SignatureParams, Error> {
    let verifying_key: Arc<VerifyingKey> = Arc::new(key.verifying_key());
    easy::verify(
        req,
        SignatureScheme::Rfc9421,
        &ValidityPolicy::default(),
        now,
        move |_key_id| future::ready(Ok::<_, Infallible>(verifying_key)),
    )
    .await
}

#[tokio::test]
async fn roundtrip_every_algorithm() {
    let keys = [
        self::data::get_private_key(),
        self::data::ed25519_key(),
        Arc::new(
            http_signatures::crypto::parse::private_key(
                &self::data::pkcs8_pem(&self::data::ecdsa_pkcs8()),
                None,
            )
            .unwrap(),
        ),
        self::data::hmac_key(),
    ];

    for key in keys {
        let signed = sign(&key, request("/ping?a=1")).await;
        assert!(signed.headers().contains_key(&SIGNATURE_HEADER));
        assert!(signed.headers().contains_key(&SIGNATURE_INPUT_HEADER));

        let params = verify(&key, &signed, NOW + 1).await.unwrap();
        assert_eq!(params.key_id, "k1");
        assert_eq!(params.algorithm, Some(key.algorithm()));
    }
}

#[tokio::test]
async fn tampered_path() {
    let key = self::data::ed25519_key();
    let signed = sign(&key, request("/ping")).await;

    let (mut parts, body) = signed.into_parts();
    parts.uri = "/pong".parse().unwrap();
    let tampered = Request::from_parts(parts, body);

    assert!(matches!(
        verify(&key, &tampered, NOW).await,
        Err(Error::Verify(..))
    ));
}

#[tokio::test]
async fn wrong_key() {
    let key = self::data::ed25519_key();
    let other = self::data::ed25519_key();
    let signed = sign(&key, request("/ping")).await;

    assert!(matches!(
        verify(&other, &signed, NOW).await,
        Err(Error::Verify(..))
    ));
}

#[tokio::test]
async fn algorithm_mismatch() {
    let key = self::data::ed25519_key();
    let other = self::data::hmac_key();
    let signed = sign(&key, request("/ping")).await;

    assert!(matches!(
        verify(&other, &signed, NOW).await,
        Err(Error::Verify(
            http_signatures::crypto::VerifyError::UnsupportedAlgorithm { .. }
        ))
    ));
}

#[tokio::test]
async fn expired() {
    let key = self::data::hmac_key();
    let signed = sign(&key, request("/ping")).await;

    assert!(matches!(
        verify(&key, &signed, NOW + 61).await,
        Err(Error::Validity(ValidityError::Expired))
    ));
}

#[tokio::test]
async fn unsigned() {
    let key = self::data::hmac_key();

    assert!(matches!(
        verify(&key, &request("/ping"), NOW).await,
        Err(Error::Extract(ExtractError::MissingSignature))
    ));
}

#[tokio::test]
async fn missing_component() {
    let req = Request::get("/ping").body(()).unwrap();
    let options = SignOptions {
        components: vec![Component::parse("x-request-id").unwrap()],
        ..options()
    };

    assert!(matches!(
        easy::sign(req, "k1", self::data::hmac_key(), &options).await,
        Err(Error::SignatureString(..))
    ));
}

proptest! {
    #[test]
    fn signing_string_is_deterministic(path in "/[a-z0-9]{0,16}", query in "[a-z]{1,8}=[a-z0-9]{0,8}") {
        let req = request(&format!("{path}?{query}"));
        let prepared = easy::prepare_signature(&req, "k1", http_signatures::Algorithm::Ed25519, &options()).unwrap();
        let again = easy::prepare_signature(&req, "k1", http_signatures::Algorithm::Ed25519, &options()).unwrap();

        prop_assert_eq!(prepared.signature_string(), again.signature_string());
        prop_assert!(prepared.signature_string().ends_with(
            r#""@signature-params": ("@method" "@path" "@query" "@authority");keyid="k1";alg="ed25519";created=1700000000;expires=1700000060;nonce="0123456789""#
        ));
        let query_line = format!("\"@query\": ?{query}\n");
        prop_assert!(prepared.signature_string().contains(&query_line));
    }
}

use http_signatures::{
    crypto::{self, parse, SignError, SigningKey},
    Algorithm,
};
use std::sync::Arc;


#[test]
fn pkcs1_rsa() {
    let key = parse::private_key(self::data::get_rsa_pem(), None).unwrap();
    assert_eq!(key.algorithm(), Algorithm::RsaSha256);

    let signature = key.sign(b"hello").unwrap();
    assert_eq!(signature.len(), 256);
    assert!(key.verifying_key().verify(b"hello", &signature));
    assert!(!key.verifying_key().verify(b"hellO", &signature));
}

#[test]
fn pkcs8_keys() {
    let ed25519 = parse::private_key(&self::data::pkcs8_pem(&self::data::ed25519_pkcs8()), None)
        .unwrap();
    assert_eq!(ed25519.algorithm(), Algorithm::Ed25519);

    let ecdsa =
        parse::private_key(&self::data::pkcs8_pem(&self::data::ecdsa_pkcs8()), None).unwrap();
    assert_eq!(ecdsa.algorithm(), Algorithm::EcdsaP256Sha256);

    let signature = ecdsa.sign(b"message").unwrap();
    assert!(ecdsa.verifying_key().verify(b"message", &signature));
}

#[test]
fn encrypted_pkcs8() {
    let pem = self::data::encrypted_pkcs8_pem(&self::data::ed25519_pkcs8());

    assert!(matches!(
        parse::private_key(&pem, None),
        Err(parse::Error::MissingPassword)
    ));
    assert!(parse::private_key(&pem, Some("wrong password")).is_err());

    let key = parse::private_key(&pem, Some(self::data::PASSWORD)).unwrap();
    assert_eq!(key.algorithm(), Algorithm::Ed25519);
}

#[test]
fn declared_algorithm_mismatch() {
    let key = SigningKey::hmac(b"secret");

    assert!(matches!(
        crypto::sign(b"payload", &key, Some(Algorithm::Ed25519)),
        Err(SignError::UnsupportedAlgorithm { .. })
    ));
    assert!(crypto::sign(b"payload", &key, Some(Algorithm::HmacSha256)).is_ok());
}

#[test]
fn hmac_is_symmetric() {
    let key = SigningKey::hmac(b"secret");
    let signature = key.sign(b"payload").unwrap();

    let verifying_key = http_signatures::crypto::VerifyingKey::hmac(b"secret");
    assert!(verifying_key.verify(b"payload", &signature));
    assert!(!http_signatures::crypto::VerifyingKey::hmac(b"other").verify(b"payload", &signature));
}

#[test]
fn debug_hides_key_material() {
    let key = SigningKey::hmac(b"super-secret-value");
    assert_eq!(format!("{key:?}"), "SigningKey(HmacSha256)");
}

#[test]
fn flipped_signature_bytes_are_rejected() {
    let ecdsa_pem = self::data::pkcs8_pem(&self::data::ecdsa_pkcs8());
    let ecdsa = parse::private_key(&ecdsa_pem, None).unwrap();
    let keys = [
        self::data::get_private_key(),
        self::data::ed25519_key(),
        Arc::new(ecdsa),
        self::data::hmac_key(),
    ];
    let message = b"\"@method\": POST\n\"@path\": /inbox";

    for key in keys {
        let signature = key.sign(message).unwrap();
        let verifying_key = key.verifying_key();
        assert!(verifying_key.verify(message, &signature));

        for index in 0..signature.len() {
            for mask in [0x01, 0x80, 0xff] {
                let mut tampered = signature.clone();
                tampered[index] ^= mask;
                assert!(
                    !verifying_key.verify(message, &tampered),
                    "{:?} accepted a signature with byte {index} flipped by {mask:#04x}",
                    key.algorithm(),
                );
            }
        }
    }
}

#[test]
fn sec1_keys() {
    let key = parse::private_key(self::data::EC_PRIVATE_KEY, None).unwrap();
    assert_eq!(key.algorithm(), Algorithm::EcdsaP256Sha256);

    let signature = key.sign(b"message").unwrap();
    assert!(key.verifying_key().verify(b"message", &signature));

    assert!(matches!(
        parse::private_key(self::data::EC_P384_PRIVATE_KEY, None),
        Err(parse::Error::UnknownKeyType)
    ));
}

#[test]
fn legacy_encrypted_sec1_keys() {
    let plain = parse::private_key(self::data::EC_PRIVATE_KEY, None)
        .unwrap()
        .verifying_key();

    for pem in [
        self::data::EC_PRIVATE_KEY_AES256,
        self::data::EC_PRIVATE_KEY_DES3,
    ] {
        assert!(matches!(
            parse::private_key(pem, None),
            Err(parse::Error::MissingPassword)
        ));
        assert!(parse::private_key(pem, Some("wrong password")).is_err());

        let key = parse::private_key(pem, Some(self::data::LEGACY_PASSWORD)).unwrap();
        assert_eq!(key.algorithm(), Algorithm::EcdsaP256Sha256);

        let signature = key.sign(b"message").unwrap();
        assert!(plain.verify(b"message", &signature));
    }
}

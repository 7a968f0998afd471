//!
//! OpenSSL's traditional PEM encryption (`Proc-Type: 4,ENCRYPTED`)
//!
//! The key is derived with `EVP_BytesToKey` (MD5, one iteration).
//! The salt is the first 8 bytes of the IV.
//!

use super::parse::Error;
use cbc::cipher::{block_padding::Pkcs7, BlockCipher, BlockDecryptMut, KeyInit, KeyIvInit};
use md5::{Digest, Md5};
use pkcs8::SecretDocument;

const BEGIN: &str = "-----BEGIN ";
const END: &str = "-----END ";
const ENCAPSULATED_BOUNDARY: &str = "-----";

/// Whether the PEM document carries traditional encryption headers
pub fn is_encrypted(pem: &str) -> bool {
    pem.lines().any(|line| line.trim() == "Proc-Type: 4,ENCRYPTED")
}

fn evp_bytes_to_key(password: &[u8], salt: &[u8], len: usize) -> Vec<u8> {
    let mut key = Vec::with_capacity(len + 16);
    let mut previous = None;

    while key.len() < len {
        let mut hasher = Md5::new();
        if let Some(previous) = previous {
            hasher.update(previous);
        }
        hasher.update(password);
        hasher.update(salt);

        let block = hasher.finalize();
        key.extend_from_slice(&block);
        previous = Some(block);
    }

    key.truncate(len);
    key
}

fn decrypt_cbc<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, Error>
where
    C: BlockCipher + BlockDecryptMut + KeyInit,
{
    cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| Error::MalformedKey)?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::Decryption)
}

/// Decrypt the document, returning its label and the plain DER bytes
pub fn decrypt<'a>(pem: &'a str, password: &[u8]) -> Result<(&'a str, SecretDocument), Error> {
    let mut lines = pem
        .lines()
        .map(str::trim)
        .skip_while(|line| !line.starts_with(BEGIN));

    let label = lines
        .next()
        .and_then(|line| line.strip_prefix(BEGIN))
        .and_then(|line| line.strip_suffix(ENCAPSULATED_BOUNDARY))
        .ok_or(Error::MalformedKey)?;

    let mut dek_info = None;
    let mut encoded = String::new();
    for line in lines {
        if line.starts_with(END) {
            break;
        }

        if let Some(value) = line.strip_prefix("DEK-Info:") {
            dek_info = Some(value.trim());
        } else if !line.contains(':') {
            encoded.push_str(line);
        }
    }

    let (cipher, iv) = dek_info
        .and_then(|dek_info| dek_info.split_once(','))
        .ok_or(Error::MalformedKey)?;
    let iv = hex_simd::decode_to_vec(iv.trim()).map_err(|_| Error::MalformedKey)?;
    let salt = iv.get(..8).ok_or(Error::MalformedKey)?;
    let ciphertext = base64_simd::STANDARD
        .decode_to_vec(encoded)
        .map_err(|_| Error::MalformedKey)?;

    let plaintext = match cipher {
        "AES-128-CBC" => {
            let key = evp_bytes_to_key(password, salt, 16);
            decrypt_cbc::<aes::Aes128>(&key, &iv, &ciphertext)?
        }
        "AES-192-CBC" => {
            let key = evp_bytes_to_key(password, salt, 24);
            decrypt_cbc::<aes::Aes192>(&key, &iv, &ciphertext)?
        }
        "AES-256-CBC" => {
            let key = evp_bytes_to_key(password, salt, 32);
            decrypt_cbc::<aes::Aes256>(&key, &iv, &ciphertext)?
        }
        "DES-EDE3-CBC" => {
            let key = evp_bytes_to_key(password, salt, 24);
            decrypt_cbc::<des::TdesEde3>(&key, &iv, &ciphertext)?
        }
        other => return Err(Error::UnsupportedEncryption(other.to_owned())),
    };

    // A wrong password usually fails the padding check, otherwise the DER check catches it
    let document = SecretDocument::try_from(plaintext).map_err(|_| Error::Decryption)?;

    Ok((label, document))
}

//!
//! Immutable store of signing and verification keys
//!
//! Built once at startup and shared as `Arc<KeyStore>` afterwards. Lookups never lock.
//!

use http_signatures::{
    crypto::{parse, SigningKey, VerifyingKey},
    Algorithm,
};
use sigproxy_config::keys::Configuration as KeyConfiguration;
use smol_str::SmolStr;
use std::{collections::HashMap, sync::Arc};
use tokio::fs;
use tracing::debug;

mod error;

pub use self::error::Error;
pub use sigproxy_config::keys::Role;

const PUBLIC_KEY_PEM_HEADER: &str = "-----BEGIN PUBLIC KEY-----";

/// Key material of an entry
#[derive(Clone, Debug)]
pub enum KeyMaterial {
    Signing(Arc<SigningKey>),
    Verifying(Arc<VerifyingKey>),
}

/// Single key known to the proxy
#[derive(Clone, Debug)]
pub struct KeyEntry {
    pub identifier: SmolStr,
    pub algorithm: Algorithm,
    pub material: KeyMaterial,
}

impl KeyEntry {
    #[must_use]
    pub fn signing(identifier: impl Into<SmolStr>, key: SigningKey) -> Self {
        Self {
            identifier: identifier.into(),
            algorithm: key.algorithm(),
            material: KeyMaterial::Signing(Arc::new(key)),
        }
    }

    #[must_use]
    pub fn verifying(identifier: impl Into<SmolStr>, key: VerifyingKey) -> Self {
        Self {
            identifier: identifier.into(),
            algorithm: key.algorithm(),
            material: KeyMaterial::Verifying(Arc::new(key)),
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        match self.material {
            KeyMaterial::Signing(..) => Role::Sign,
            KeyMaterial::Verifying(..) => Role::Verify,
        }
    }
}

#[derive(Debug, Default)]
pub struct KeyStore {
    signing: HashMap<SmolStr, KeyEntry>,
    verifying: HashMap<SmolStr, KeyEntry>,
}

impl KeyStore {
    /// Build a store from already parsed entries
    pub fn new<I>(entries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = KeyEntry>,
    {
        let mut store = Self::default();
        for entry in entries {
            let role = entry.role();
            let map = match role {
                Role::Sign => &mut store.signing,
                Role::Verify => &mut store.verifying,
            };

            if map.contains_key(&entry.identifier) {
                return Err(Error::DuplicateIdentifier(entry.identifier, role));
            }

            debug!(key_id = %entry.identifier, algorithm = %entry.algorithm, ?role, "loaded key");
            map.insert(entry.identifier.clone(), entry);
        }

        Ok(store)
    }

    /// Read and parse every configured key
    pub async fn from_config(config: &[KeyConfiguration]) -> Result<Self, Error> {
        let mut entries = Vec::with_capacity(config.len());
        for key in config {
            entries.push(load_entry(key).await?);
        }

        Self::new(entries)
    }

    /// Look up a key by identifier and role
    pub fn get(&self, identifier: &str, role: Role) -> Result<&KeyEntry, Error> {
        let map = match role {
            Role::Sign => &self.signing,
            Role::Verify => &self.verifying,
        };

        map.get(identifier)
            .ok_or_else(|| Error::NotFound(identifier.into(), role))
    }

    pub fn signing_key(&self, identifier: &str) -> Result<Arc<SigningKey>, Error> {
        match self.get(identifier, Role::Sign)?.material {
            KeyMaterial::Signing(ref key) => Ok(Arc::clone(key)),
            KeyMaterial::Verifying(..) => Err(Error::NotFound(identifier.into(), Role::Sign)),
        }
    }

    pub fn verifying_key(&self, identifier: &str) -> Result<Arc<VerifyingKey>, Error> {
        match self.get(identifier, Role::Verify)?.material {
            KeyMaterial::Verifying(ref key) => Ok(Arc::clone(key)),
            KeyMaterial::Signing(..) => Err(Error::NotFound(identifier.into(), Role::Verify)),
        }
    }

    /// Every entry, signing keys first, sorted by identifier
    pub fn entries(&self) -> impl Iterator<Item = &KeyEntry> {
        let mut signing: Vec<_> = self.signing.values().collect();
        signing.sort_unstable_by(|left, right| left.identifier.cmp(&right.identifier));

        let mut verifying: Vec<_> = self.verifying.values().collect();
        verifying.sort_unstable_by(|left, right| left.identifier.cmp(&right.identifier));

        signing.into_iter().chain(verifying)
    }
}

async fn load_entry(config: &KeyConfiguration) -> Result<KeyEntry, Error> {
    let key_id = &config.id;
    let declared = Algorithm::parse(&config.algorithm).map_err(|source| {
        Error::UnsupportedAlgorithm {
            key_id: key_id.clone(),
            source,
        }
    })?;
    let key_parse = |source| Error::KeyParse {
        key_id: key_id.clone(),
        source,
    };

    let entry = match (&config.path, &config.secret) {
        (Some(path), _) => {
            let pem = fs::read_to_string(path.as_str())
                .await
                .map_err(|source| Error::Read {
                    key_id: key_id.clone(),
                    source,
                })?;
            let password = config.password.as_deref();

            match config.role {
                Role::Sign => KeyEntry::signing(
                    key_id.clone(),
                    parse::private_key(&pem, password).map_err(key_parse)?,
                ),
                Role::Verify if pem.contains(PUBLIC_KEY_PEM_HEADER) => {
                    KeyEntry::verifying(key_id.clone(), parse::public_key(&pem).map_err(key_parse)?)
                }
                Role::Verify => KeyEntry::verifying(
                    key_id.clone(),
                    parse::private_key(&pem, password)
                        .map_err(key_parse)?
                        .verifying_key(),
                ),
            }
        }
        (None, Some(secret)) => {
            let secret = base64_simd::STANDARD
                .decode_to_vec(secret.as_bytes())
                .map_err(|_| Error::InvalidSecret {
                    key_id: key_id.clone(),
                })?;

            match config.role {
                Role::Sign => KeyEntry::signing(key_id.clone(), parse::hmac_key(&secret)),
                Role::Verify => KeyEntry::verifying(key_id.clone(), VerifyingKey::hmac(&secret)),
            }
        }
        (None, None) => {
            return Err(Error::MissingMaterial {
                key_id: key_id.clone(),
            })
        }
    };

    if entry.algorithm != declared {
        return Err(Error::AlgorithmMismatch {
            key_id: key_id.clone(),
            declared,
            actual: entry.algorithm,
        });
    }

    Ok(entry)
}

#[cfg(test)]
mod test {
    use super::{Error, KeyEntry, KeyStore, Role};
    use http_signatures::crypto::SigningKey;

    fn store() -> KeyStore {
        let key = SigningKey::hmac(b"secret");
        KeyStore::new([
            KeyEntry::verifying("shared", key.verifying_key()),
            KeyEntry::signing("shared", key),
        ])
        .unwrap()
    }

    #[test]
    fn same_identifier_in_both_roles() {
        let store = store();

        assert_eq!(store.get("shared", Role::Sign).unwrap().role(), Role::Sign);
        assert_eq!(
            store.get("shared", Role::Verify).unwrap().role(),
            Role::Verify
        );
        assert!(store.signing_key("shared").is_ok());
        assert!(store.verifying_key("shared").is_ok());
    }

    #[test]
    fn not_found() {
        let store = store();
        assert!(matches!(
            store.get("other", Role::Verify),
            Err(Error::NotFound(..))
        ));
    }

    #[test]
    fn duplicate_identifier() {
        let result = KeyStore::new([
            KeyEntry::signing("k1", SigningKey::hmac(b"one")),
            KeyEntry::signing("k1", SigningKey::hmac(b"two")),
        ]);

        assert!(matches!(
            result,
            Err(Error::DuplicateIdentifier(id, Role::Sign)) if id == "k1"
        ));
    }

    #[test]
    fn debug_hides_material() {
        let debug = format!("{:?}", store());
        assert!(!debug.contains("secret"));
        assert!(debug.contains("HmacSha256"));
    }

    #[test]
    fn entries_are_ordered() {
        let store = KeyStore::new([
            KeyEntry::signing("b", SigningKey::hmac(b"b")),
            KeyEntry::signing("a", SigningKey::hmac(b"a")),
        ])
        .unwrap();

        let ids: Vec<_> = store.entries().map(|entry| entry.identifier.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }
}

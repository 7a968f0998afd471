use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Sign,
    Verify,
}

/// Key definition
///
/// Exactly one of `path` (PEM file) or `secret` (base64 encoded HMAC secret) has to be set.
/// Signing keys may route to their own `upstream` instead of the proxy-wide one.
#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Configuration {
    pub id: SmolStr,
    pub role: Role,
    pub algorithm: SmolStr,
    pub path: Option<SmolStr>,
    pub password: Option<SmolStr>,
    pub secret: Option<SmolStr>,
    pub upstream: Option<SmolStr>,
}

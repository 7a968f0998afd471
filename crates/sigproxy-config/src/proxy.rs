use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Sign requests before forwarding them
    Outbound,
    /// Verify requests before forwarding them
    Inbound,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scheme {
    #[default]
    Rfc9421,
    Cavage,
}

fn default_components() -> Vec<SmolStr> {
    ["@method", "@path", "@query", "@authority"]
        .into_iter()
        .map(SmolStr::new)
        .collect()
}

fn default_upstream_connect_timeout_secs() -> u64 {
    10
}

fn default_upstream_timeout_secs() -> u64 {
    30
}

fn default_verification_timeout_secs() -> u64 {
    5
}

fn default_expires_in_secs() -> Option<u64> {
    Some(60)
}

fn default_headers() -> BTreeMap<SmolStr, SmolStr> {
    BTreeMap::from([(SmolStr::new("accept"), SmolStr::new("*/*"))])
}

fn default_true() -> bool {
    true
}

fn default_clock_skew_secs() -> u64 {
    30
}

fn default_max_signature_age_secs() -> Option<u64> {
    Some(15 * 60)
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutboundConfiguration {
    /// Identifier of the default signing key
    pub identity: SmolStr,
    /// Request header that selects a different signing key. Stripped before forwarding
    pub key_selector_header: Option<SmolStr>,
    #[serde(default = "default_expires_in_secs")]
    pub expires_in_secs: Option<u64>,
    #[serde(default = "default_true")]
    pub nonce: bool,
    /// Headers added to every outgoing request that doesn't carry them already
    #[serde(default = "default_headers")]
    pub default_headers: BTreeMap<SmolStr, SmolStr>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct InboundConfiguration {
    #[serde(default = "default_true")]
    pub require_signature: bool,
    #[serde(default = "default_clock_skew_secs")]
    pub clock_skew_secs: u64,
    #[serde(default = "default_max_signature_age_secs")]
    pub max_signature_age_secs: Option<u64>,
    #[serde(default)]
    pub required_components: Vec<SmolStr>,
}

impl Default for InboundConfiguration {
    fn default() -> Self {
        Self {
            require_signature: true,
            clock_skew_secs: default_clock_skew_secs(),
            max_signature_age_secs: default_max_signature_age_secs(),
            required_components: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Configuration {
    pub mode: Mode,
    #[serde(default)]
    pub scheme: Scheme,
    pub upstream: SmolStr,
    #[serde(default = "default_upstream_connect_timeout_secs")]
    pub upstream_connect_timeout_secs: u64,
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,
    #[serde(default = "default_verification_timeout_secs")]
    pub verification_timeout_secs: u64,
    #[serde(default = "default_components")]
    pub components: Vec<SmolStr>,
    pub outbound: Option<OutboundConfiguration>,
    #[serde(default)]
    pub inbound: InboundConfiguration,
}

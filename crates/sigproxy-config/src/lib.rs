pub mod keys;
pub mod proxy;
pub mod server;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::{net::IpAddr, path::Path};
use thiserror::Error;
use tokio::fs;

/// Semantic configuration error
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Bind address {0} is not a loopback address")]
    NotLoopback(IpAddr),

    #[error("Upstream \"{0}\" is not an absolute http(s) URL")]
    InvalidUpstream(SmolStr),

    #[error("Outbound mode requires a [proxy.outbound] section")]
    MissingOutbound,

    #[error("Outbound identity \"{0}\" is not configured as a signing key")]
    UnknownIdentity(SmolStr),

    #[error("Key \"{0}\" needs exactly one of `path` or `secret`")]
    AmbiguousKeySource(SmolStr),
}

fn is_http_url(value: &str) -> bool {
    url::Url::parse(value)
        .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
}

#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Configuration {
    #[serde(default)]
    pub server: server::Configuration,
    pub proxy: proxy::Configuration,
    #[serde(default)]
    pub keys: Vec<keys::Configuration>,
}

impl Configuration {
    pub async fn load<P>(path: P) -> eyre::Result<Self>
    where
        P: AsRef<Path>,
    {
        let content = fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Parse and validate a TOML document
    pub fn parse(content: &str) -> eyre::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.server.bind_address.is_loopback() {
            return Err(ValidationError::NotLoopback(self.server.bind_address));
        }

        if !is_http_url(&self.proxy.upstream) {
            return Err(ValidationError::InvalidUpstream(self.proxy.upstream.clone()));
        }

        for key in &self.keys {
            if key.path.is_some() == key.secret.is_some() {
                return Err(ValidationError::AmbiguousKeySource(key.id.clone()));
            }

            if let Some(ref upstream) = key.upstream {
                if !is_http_url(upstream) {
                    return Err(ValidationError::InvalidUpstream(upstream.clone()));
                }
            }
        }

        if self.proxy.mode == proxy::Mode::Outbound {
            let outbound = self
                .proxy
                .outbound
                .as_ref()
                .ok_or(ValidationError::MissingOutbound)?;

            let has_identity = self
                .keys
                .iter()
                .any(|key| key.role == keys::Role::Sign && key.id == outbound.identity);
            if !has_identity {
                return Err(ValidationError::UnknownIdentity(outbound.identity.clone()));
            }
        }

        Ok(())
    }
}

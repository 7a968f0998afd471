use http::StatusCode;
use http_signatures::{
    crypto::VerifyError,
    digest::DigestError,
    easy,
    scheme::ExtractError,
    signature_string,
    validity::ValidityError,
};
use smol_str::SmolStr;
use std::{io, net::IpAddr};
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fatal error raised while setting up the proxy
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Refusing to bind to non-loopback address {0}")]
    NotLoopback(IpAddr),

    #[error("Failed to bind the listener")]
    Bind(#[from] io::Error),

    #[error("Invalid component")]
    InvalidComponent(#[from] http_signatures::component::UnknownComponent),

    #[error("Invalid header name \"{0}\"")]
    InvalidHeaderName(SmolStr),

    #[error("Invalid value for header \"{0}\"")]
    InvalidHeaderValue(SmolStr),

    #[error("Outbound mode requires a [proxy.outbound] section")]
    MissingOutbound,

    #[error("Failed to build the upstream client")]
    HttpClient(#[from] sigproxy_http_client::Error),
}

/// Error ending a single exchange
///
/// Every variant maps to a fixed status code. The messages are sent to the client verbatim and never include key material.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Missing signature")]
    MissingSignature,

    #[error("Unknown key ID \"{0}\"")]
    UnknownKeyId(SmolStr),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error(transparent)]
    Validity(#[from] ValidityError),

    #[error(transparent)]
    Digest(#[from] DigestError),

    #[error("Malformed signature header")]
    Extract(#[source] ExtractError),

    #[error(transparent)]
    SignatureString(#[from] signature_string::Error),

    #[error("Unsupported signature algorithm")]
    UnsupportedAlgorithm,

    #[error("Invalid request")]
    InvalidRequest(#[from] http::Error),

    #[error("Failed to read request body")]
    ReadBody(#[source] BoxError),

    #[error("Request body too large")]
    BodyTooLarge,

    #[error("Failed to sign request")]
    Sign(#[source] easy::Error),

    #[error("Upstream request failed")]
    Upstream(#[from] sigproxy_http_client::Error),

    #[error("Timed out")]
    Timeout,

    #[error("Internal error")]
    Blocking(#[from] tokio::task::JoinError),
}

impl Error {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingSignature
            | Self::UnknownKeyId(..)
            | Self::InvalidSignature
            | Self::Validity(..)
            | Self::Digest(DigestError::Mismatch) => StatusCode::UNAUTHORIZED,
            Self::Digest(..)
            | Self::Extract(..)
            | Self::SignatureString(..)
            | Self::UnsupportedAlgorithm
            | Self::InvalidRequest(..)
            | Self::ReadBody(..) => StatusCode::BAD_REQUEST,
            Self::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Sign(..) | Self::Blocking(..) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream(error) if error.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            Self::Upstream(..) => StatusCode::BAD_GATEWAY,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl From<easy::Error> for Error {
    fn from(value: easy::Error) -> Self {
        match value {
            easy::Error::Extract(ExtractError::MissingSignature) => Self::MissingSignature,
            easy::Error::Extract(error) => Self::Extract(error),
            easy::Error::Validity(error) => Self::Validity(error),
            easy::Error::SignatureString(error) => Self::SignatureString(error),
            easy::Error::Verify(VerifyError::Verification) => Self::InvalidSignature,
            easy::Error::Verify(VerifyError::UnsupportedAlgorithm { .. }) => {
                Self::UnsupportedAlgorithm
            }
            easy::Error::Blocking(error) => Self::Blocking(error),
            error @ (easy::Error::GetKey(..)
            | easy::Error::InvalidHeaderValue(..)
            | easy::Error::Sign(..)) => Self::Sign(error),
        }
    }
}

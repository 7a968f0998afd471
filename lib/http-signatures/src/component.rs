//!
//! Covered components of a signature
//!

use http::HeaderName;
use miette::Diagnostic;
use std::{fmt, str::FromStr};
use thiserror::Error;

/// The component name is neither a known derived component nor a valid header name,
/// or the component is absent from the message it was requested from
#[derive(Debug, Diagnostic, Error, PartialEq)]
#[error("Unknown component \"{0}\"")]
#[diagnostic(code(http_signatures::unknown_component))]
pub struct UnknownComponent(pub String);

/// Component covered by a signature
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Component {
    /// `@method`
    Method,

    /// `@path`
    Path,

    /// `@query`
    Query,

    /// `@authority`
    Authority,

    /// `@target-uri`
    TargetUri,

    /// `(request-target)`
    RequestTarget,

    /// `(created)`
    Created,

    /// `(expires)`
    Expires,

    /// Regular HTTP header, always lowercase
    Header(HeaderName),
}

impl Component {
    /// Parse a component name
    ///
    /// Header names get normalised to lowercase
    pub fn parse(raw: &str) -> Result<Self, UnknownComponent> {
        let component = match raw {
            "@method" => Self::Method,
            "@path" => Self::Path,
            "@query" => Self::Query,
            "@authority" => Self::Authority,
            "@target-uri" => Self::TargetUri,
            "(request-target)" => Self::RequestTarget,
            "(created)" => Self::Created,
            "(expires)" => Self::Expires,
            header if !header.starts_with(['@', '(']) => HeaderName::try_from(header)
                .map(Self::Header)
                .map_err(|_| UnknownComponent(raw.to_owned()))?,
            _ => return Err(UnknownComponent(raw.to_owned())),
        };

        Ok(component)
    }

    /// Canonical name of the component
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Method => "@method",
            Self::Path => "@path",
            Self::Query => "@query",
            Self::Authority => "@authority",
            Self::TargetUri => "@target-uri",
            Self::RequestTarget => "(request-target)",
            Self::Created => "(created)",
            Self::Expires => "(expires)",
            Self::Header(name) => name.as_str(),
        }
    }

    /// Derived components aren't taken from a header
    #[must_use]
    pub fn is_derived(&self) -> bool {
        !matches!(self, Self::Header(..))
    }
}

impl FromStr for Component {
    type Err = UnknownComponent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//!
//! Resolution of covered components against an HTTP request
//!
//! The scheme specific modules only decide how the resolved values get laid out
//!

use crate::{
    component::{Component, UnknownComponent},
    params::SignatureParams,
};
use http::header::HOST;
use miette::Diagnostic;
use std::borrow::Cow;
use thiserror::Error;

/// Signature string error
#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    /// Header had an invalid value (non-UTF8 value)
    #[error(transparent)]
    InvalidHeaderValue(#[from] http::header::ToStrError),

    /// Component is missing from the request
    #[error(transparent)]
    UnknownComponent(#[from] UnknownComponent),
}

fn missing(component: &Component) -> Error {
    UnknownComponent(component.as_str().to_owned()).into()
}

/// Resolve the value of a single component
///
/// Header values appearing multiple times get joined with `, `
pub fn resolve<'a, B>(
    component: &Component,
    request: &'a http::Request<B>,
    params: &SignatureParams,
) -> Result<Cow<'a, str>, Error> {
    let uri = request.uri();
    let path = match uri.path() {
        "" => "/",
        path => path,
    };

    let value = match component {
        Component::Method => Cow::Borrowed(request.method().as_str()),
        Component::Path => Cow::Borrowed(path),
        Component::Query => Cow::Owned(format!("?{}", uri.query().unwrap_or_default())),
        Component::Authority => {
            if let Some(host) = request.headers().get(HOST) {
                Cow::Owned(host.to_str()?.to_lowercase())
            } else if let Some(authority) = uri.authority() {
                Cow::Owned(authority.as_str().to_lowercase())
            } else {
                return Err(missing(component));
            }
        }
        Component::TargetUri => Cow::Owned(uri.to_string()),
        Component::RequestTarget => {
            let method = request.method().as_str().to_lowercase();
            let path_and_query = uri
                .path_and_query()
                .map_or(path, |path_and_query| path_and_query.as_str());

            Cow::Owned(format!("{method} {path_and_query}"))
        }
        Component::Created => {
            Cow::Owned(params.created.ok_or_else(|| missing(component))?.to_string())
        }
        Component::Expires => {
            Cow::Owned(params.expires.ok_or_else(|| missing(component))?.to_string())
        }
        Component::Header(name) => {
            let mut values = request.headers().get_all(name).iter().peekable();
            if values.peek().is_none() {
                return Err(missing(component));
            }

            let mut joined = String::new();
            for (idx, value) in values.enumerate() {
                if idx > 0 {
                    joined.push_str(", ");
                }
                joined.push_str(value.to_str()?.trim());
            }

            Cow::Owned(joined)
        }
    };

    Ok(value)
}

//!
//! Time window and coverage checks applied before a signature gets verified
//!

use crate::{Component, SignatureParams};
use miette::Diagnostic;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Default upper bound for the age of a signature
pub const MAX_ACCEPTED_SIGNATURE_AGE: Duration = Duration::from_secs(15 * 60);

/// Reason the signature isn't acceptable, regardless of whether it is cryptographically valid
#[derive(Debug, Diagnostic, Error, PartialEq)]
pub enum ValidityError {
    /// Expiry passed or the signature is older than the configured maximum age
    #[error("Signature expired")]
    Expired,

    /// Creation lies in the future, beyond the tolerated clock skew
    #[error("Signature not yet valid")]
    NotYetValid,

    /// The policy bounds the signature age but the signature carries no creation time
    #[error("Signature lacks a creation time")]
    MissingCreated,

    /// Components the policy requires aren't covered
    #[error("Signature doesn't cover the required components")]
    MissingRequiredComponents,
}

/// Acceptance policy for signatures
#[derive(Clone, Debug)]
pub struct ValidityPolicy {
    /// Tolerated clock skew for the creation time
    pub tolerance: Duration,

    /// Maximum age of a signature, measured from its creation time
    pub max_age: Option<Duration>,

    /// Components every signature has to cover
    pub required_components: Vec<Component>,
}

impl Default for ValidityPolicy {
    fn default() -> Self {
        Self {
            tolerance: Duration::ZERO,
            max_age: Some(MAX_ACCEPTED_SIGNATURE_AGE),
            required_components: Vec::new(),
        }
    }
}

#[inline]
fn is_subset<T: PartialEq>(left: &[T], right: &[T]) -> bool {
    if left.len() <= right.len() {
        left.iter().all(|item| right.contains(item))
    } else {
        false
    }
}

/// Current UNIX timestamp in seconds
#[must_use]
pub fn unix_timestamp(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}

impl ValidityPolicy {
    /// Check the parameters against the policy at the UNIX timestamp `now`
    ///
    /// `expires` is compared without tolerance. With a maximum age set, `created` is mandatory.
    pub fn check(&self, params: &SignatureParams, now: u64) -> Result<(), ValidityError> {
        if !is_subset(&self.required_components, &params.components) {
            return Err(ValidityError::MissingRequiredComponents);
        }

        if let Some(created) = params.created {
            if created > now.saturating_add(self.tolerance.as_secs()) {
                return Err(ValidityError::NotYetValid);
            }
        }

        if let Some(max_age) = self.max_age {
            let created = params.created.ok_or(ValidityError::MissingCreated)?;
            if created.saturating_add(max_age.as_secs()) < now {
                return Err(ValidityError::Expired);
            }
        }

        if let Some(expires) = params.expires {
            if expires < now {
                return Err(ValidityError::Expired);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{is_subset, ValidityError, ValidityPolicy};
    use crate::{Component, SignatureParams};
    use http::header::DATE;
    use proptest::{prop_assert_eq, proptest};
    use std::time::Duration;

    const NOW: u64 = 1_700_000_000;

    fn params(created: Option<u64>, expires: Option<u64>) -> SignatureParams {
        SignatureParams {
            key_id: "k1".into(),
            algorithm: None,
            created,
            expires,
            nonce: None,
            components: vec![Component::Method, Component::Path],
            signature: Vec::new(),
        }
    }

    fn policy() -> ValidityPolicy {
        ValidityPolicy {
            tolerance: Duration::from_secs(30),
            ..ValidityPolicy::default()
        }
    }

    #[test]
    fn fresh() {
        assert_eq!(policy().check(&params(Some(NOW), Some(NOW + 60)), NOW), Ok(()));
        assert_eq!(policy().check(&params(Some(NOW), None), NOW), Ok(()));
    }

    #[test]
    fn age_needs_creation_time() {
        assert_eq!(
            policy().check(&params(None, None), NOW),
            Err(ValidityError::MissingCreated)
        );
        assert_eq!(
            policy().check(&params(None, Some(NOW + 60)), NOW),
            Err(ValidityError::MissingCreated)
        );

        let unbounded = ValidityPolicy {
            max_age: None,
            ..policy()
        };
        assert_eq!(unbounded.check(&params(None, None), NOW), Ok(()));
        assert_eq!(
            unbounded.check(&params(None, Some(NOW - 1)), NOW),
            Err(ValidityError::Expired)
        );
    }

    #[test]
    fn expired_without_tolerance() {
        assert_eq!(
            policy().check(&params(Some(NOW - 61), Some(NOW - 1)), NOW),
            Err(ValidityError::Expired)
        );
    }

    #[test]
    fn too_old() {
        assert_eq!(
            policy().check(&params(Some(NOW - 16 * 60), None), NOW),
            Err(ValidityError::Expired)
        );
    }

    #[test]
    fn from_the_future() {
        assert_eq!(
            policy().check(&params(Some(NOW + 30), None), NOW),
            Ok(())
        );
        assert_eq!(
            policy().check(&params(Some(NOW + 31), None), NOW),
            Err(ValidityError::NotYetValid)
        );
    }

    #[test]
    fn required_components() {
        let policy = ValidityPolicy {
            required_components: vec![Component::Method, Component::Header(DATE)],
            ..policy()
        };

        assert_eq!(
            policy.check(&params(Some(NOW), None), NOW),
            Err(ValidityError::MissingRequiredComponents)
        );
    }

    proptest! {
        #[test]
        fn subset_always_works(left: Vec<u8>, right: Vec<u8>) {
            let mut right = right;
            right.extend_from_slice(&left);
            prop_assert_eq!(is_subset(&left, &right), true);
        }
    }
}

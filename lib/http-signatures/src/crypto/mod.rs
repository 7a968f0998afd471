//!
//! Common cryptographic operations
//!

mod legacy_pem;
mod sign;
mod verify;

pub mod parse;

pub use self::sign::{sign, SignError, SigningKey};
pub use self::verify::{verify, VerifyError, VerifyingKey};

//! Accounts, bearer sessions and Google sign-in.

pub mod account;
pub mod google;
pub mod session;

pub use account::*;
pub use google::*;
pub use session::*;

use thiserror::Error;

use crate::crypto::CryptoError;
use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Account is disabled")]
    Inactive,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Google sign-in rejected: {0}")]
    InvalidIdentityToken(String),

    #[error("Google sign-in is not configured")]
    IdentityNotConfigured,

    #[error("Could not verify the Google token: {0}")]
    IdentityUnavailable(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

//! Reasons a partner fails authentication.
//!
//! Callers only ever see a generic denial; the variant is for operators.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("partner credentials are incomplete")]
    MissingCredentials,

    #[error("partner {0} is not registered")]
    UnknownPartner(String),

    #[error("partner key does not match partner {0}")]
    KeyMismatch(String),

    #[error("password for partner {0} is not valid base64: {1}")]
    PasswordEncoding(String, base64::DecodeError),

    #[error("password for partner {0} is not valid UTF-8")]
    PasswordNotUtf8(String),

    #[error("wrong password for partner {0}")]
    PasswordMismatch(String),
}

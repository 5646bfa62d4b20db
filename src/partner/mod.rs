//! Partner registry and authentication.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::debug;

mod directory;
pub use directory::{PartnerDirectory, PartnerRecord};

mod error;
pub use error::AuthError;

/// Checks a partner's key and encoded password against the directory.
#[derive(Debug, Clone)]
pub struct PartnerAuthenticator {
    directory: Arc<PartnerDirectory>,
}

impl PartnerAuthenticator {
    pub fn new(directory: Arc<PartnerDirectory>) -> Self {
        Self { directory }
    }

    /// Authenticate a partner:
    /// - Reject blank credentials
    /// - Find the partner by reference number
    /// - Require the exact partner key
    /// - Decode the base64 password and compare it with the stored one
    pub fn authenticate(
        &self,
        partner_key: &str,
        partner_ref_no: &str,
        encoded_password: &str,
    ) -> Result<&PartnerRecord, AuthError> {
        if [partner_key, partner_ref_no, encoded_password]
            .iter()
            .any(|value| value.trim().is_empty())
        {
            return Err(AuthError::MissingCredentials);
        }

        let record = self
            .directory
            .get(partner_ref_no)
            .ok_or_else(|| AuthError::UnknownPartner(partner_ref_no.to_string()))?;

        if record.partner_key != partner_key {
            return Err(AuthError::KeyMismatch(partner_ref_no.to_string()));
        }

        let bytes = BASE64
            .decode(encoded_password)
            .map_err(|e| AuthError::PasswordEncoding(partner_ref_no.to_string(), e))?;
        let password = String::from_utf8(bytes)
            .map_err(|_| AuthError::PasswordNotUtf8(partner_ref_no.to_string()))?;

        if password != record.password {
            return Err(AuthError::PasswordMismatch(partner_ref_no.to_string()));
        }

        Ok(record)
    }

    /// Boolean form of [`authenticate`](Self::authenticate).
    pub fn validate_partner(
        &self,
        partner_key: &str,
        partner_ref_no: &str,
        encoded_password: &str,
    ) -> bool {
        match self.authenticate(partner_key, partner_ref_no, encoded_password) {
            Ok(_) => true,
            Err(reason) => {
                debug!(%reason, "partner authentication rejected");
                false
            }
        }
    }
}

/// Base64 of the UTF-8 password, as partners are expected to send it.
pub fn encode_password(password: &str) -> String {
    BASE64.encode(password.as_bytes())
}

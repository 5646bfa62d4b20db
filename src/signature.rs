//! Request signatures.
//!
//! The signing string is the concatenation, without separators, of the
//! `yyyyMMddHHmmss` timestamp, partner key, partner reference number, total
//! amount in cents and the encoded password as sent. The signature is the
//! base64 of the lowercase hex SHA-256 digest of that string (base64 of the
//! hex text, not of the raw digest bytes).

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::model::TransactionRequest;
use crate::timestamp::{RequestTime, TimestampError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature is missing")]
    Missing,
    #[error("cannot normalize timestamp: {0}")]
    Timestamp(#[from] TimestampError),
    #[error("signature does not match request fields")]
    Mismatch,
}

/// Compute the signature for already-normalized fields.
pub fn generate_signature(
    timestamp: &str,
    partner_key: &str,
    partner_ref_no: &str,
    total_amount: i64,
    encoded_password: &str,
) -> String {
    let signing_string =
        format!("{timestamp}{partner_key}{partner_ref_no}{total_amount}{encoded_password}");
    let digest = Sha256::digest(signing_string.as_bytes());
    BASE64.encode(hex::encode(digest))
}

/// Recomputes request signatures and compares them with the supplied one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureVerifier;

impl SignatureVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Signature a well-behaved partner would attach to `request`.
    pub fn sign(&self, request: &TransactionRequest) -> Result<String, TimestampError> {
        let time = RequestTime::parse(&request.timestamp)?;
        Ok(generate_signature(
            &time.signing_form(),
            &request.partner_key,
            &request.partner_ref_no,
            request.total_amount.cents(),
            &request.partner_password,
        ))
    }

    pub fn verify(&self, request: &TransactionRequest) -> Result<(), SignatureError> {
        let supplied = request.sig.trim();
        if supplied.is_empty() {
            return Err(SignatureError::Missing);
        }

        let expected = self.sign(request)?;
        if supplied != expected {
            return Err(SignatureError::Mismatch);
        }
        Ok(())
    }

    /// Boolean form of [`verify`](Self::verify).
    pub fn validate_signature(&self, request: &TransactionRequest) -> bool {
        match self.verify(request) {
            Ok(()) => true,
            Err(reason) => {
                debug!(partner = %request.partner_key, %reason, "signature rejected");
                false
            }
        }
    }
}

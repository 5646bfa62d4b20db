//! Failure taxonomy of the transaction pipeline.
//!
//! `Display` of [`PipelineError`] is what the partner sees. Authentication,
//! signature and internal failures collapse to fixed messages; the cause is
//! kept as `source()` for the operational log.

use thiserror::Error;

use super::Stage;
use crate::discount::DiscountError;
use crate::partner::AuthError;
use crate::signature::SignatureError;
use crate::validation::ValidationError;

/// Coarse classification of a failed submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Missing or badly formatted field.
    MalformedInput,
    /// Well-formed but breaks a business rule (limits, expiry, totals).
    BusinessRuleViolation,
    AuthenticationFailure,
    IntegrityFailure,
    InternalFault,
}

/// Top-level error returned by [`Pipeline::evaluate`](super::Pipeline::evaluate).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Access Denied!")]
    AccessDenied(#[source] AuthError),

    #[error("Invalid signature!")]
    InvalidSignature(#[source] SignatureError),

    #[error("Internal server error occurred")]
    Internal(#[from] InternalFault),
}

/// Unexpected failure inside a stage.
#[derive(Debug, Error)]
pub enum InternalFault {
    #[error(transparent)]
    Discount(#[from] DiscountError),

    #[error("{0} stage panicked: {1}")]
    Panic(Stage, String),
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::Validation(e) => e.kind(),
            PipelineError::AccessDenied(_) => FailureKind::AuthenticationFailure,
            PipelineError::InvalidSignature(_) => FailureKind::IntegrityFailure,
            PipelineError::Internal(_) => FailureKind::InternalFault,
        }
    }

    /// Stage that produced the failure.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Validation(_) => Stage::Validate,
            PipelineError::AccessDenied(_) => Stage::Authenticate,
            PipelineError::InvalidSignature(_) => Stage::VerifySignature,
            PipelineError::Internal(InternalFault::Discount(_)) => Stage::ComputeDiscount,
            PipelineError::Internal(InternalFault::Panic(stage, _)) => *stage,
        }
    }
}

impl From<DiscountError> for PipelineError {
    fn from(e: DiscountError) -> Self {
        PipelineError::Internal(InternalFault::Discount(e))
    }
}

//! Structural and business-rule validation of incoming requests.
//!
//! Checks run in a fixed order and the first failure wins.

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

use crate::Amount;
use crate::model::{ItemDetail, TransactionRequest};
use crate::pipeline::FailureKind;
use crate::timestamp::RequestTime;

pub const MAX_CREDENTIAL_LEN: usize = 50;
pub const MAX_ITEM_REF_LEN: usize = 50;
pub const MAX_ITEM_NAME_LEN: usize = 100;
pub const MAX_ITEM_QTY: i64 = 5;

/// Default tolerated distance between request time and server time.
pub const DEFAULT_MAX_SKEW_SECS: i64 = 5 * 60;

/// Why a request was rejected. `Display` is the message returned to the partner.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Request is Required.")]
    MissingRequest,

    #[error("{0} is Required.")]
    MissingField(&'static str),

    #[error("{0} exceeds maximum length of {1} characters.")]
    TooLong(&'static str, usize),

    #[error("totalamount must be a positive value.")]
    NonPositiveTotal,

    #[error("timestamp must be in valid ISO 8601 format.")]
    InvalidTimestamp,

    #[error("Expired.")]
    Expired,

    #[error("Item is Required.")]
    MissingItem,

    #[error("qty must be a positive value.")]
    NonPositiveQty,

    #[error("qty must not exceed {0}.")]
    QtyTooLarge(i64),

    #[error("unitprice must be a positive value.")]
    NonPositiveUnitPrice,

    #[error("Invalid Total Amount.")]
    TotalMismatch,
}

impl ValidationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ValidationError::MissingRequest
            | ValidationError::MissingField(_)
            | ValidationError::InvalidTimestamp
            | ValidationError::MissingItem => FailureKind::MalformedInput,
            ValidationError::TooLong(..)
            | ValidationError::NonPositiveTotal
            | ValidationError::Expired
            | ValidationError::NonPositiveQty
            | ValidationError::QtyTooLarge(_)
            | ValidationError::NonPositiveUnitPrice
            | ValidationError::TotalMismatch => FailureKind::BusinessRuleViolation,
        }
    }
}

/// Validates requests against the submission rules.
#[derive(Debug, Clone, Copy)]
pub struct TransactionValidator {
    max_skew: TimeDelta,
}

impl Default for TransactionValidator {
    fn default() -> Self {
        Self::new(TimeDelta::seconds(DEFAULT_MAX_SKEW_SECS))
    }
}

impl TransactionValidator {
    pub fn new(max_skew: TimeDelta) -> Self {
        Self { max_skew }
    }

    /// Validate against the current clock.
    pub fn validate(&self, request: Option<&TransactionRequest>) -> Result<(), ValidationError> {
        self.validate_at(request, Utc::now())
    }

    /// Validate a request as if received at `now`:
    /// - Required fields present and within length
    /// - Positive total amount
    /// - Parseable timestamp within the tolerated skew of `now`
    /// - Every item well-formed, and items adding up to the total
    pub fn validate_at(
        &self,
        request: Option<&TransactionRequest>,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        let request = request.ok_or(ValidationError::MissingRequest)?;

        require("partnerkey", &request.partner_key)?;
        require("partnerrefno", &request.partner_ref_no)?;
        require("partnerpassword", &request.partner_password)?;
        require("timestamp", &request.timestamp)?;
        require("sig", &request.sig)?;

        limit("partnerkey", &request.partner_key, MAX_CREDENTIAL_LEN)?;
        limit("partnerrefno", &request.partner_ref_no, MAX_CREDENTIAL_LEN)?;
        limit("partnerpassword", &request.partner_password, MAX_CREDENTIAL_LEN)?;

        if !request.total_amount.is_positive() {
            return Err(ValidationError::NonPositiveTotal);
        }

        let time =
            RequestTime::parse(&request.timestamp).map_err(|_| ValidationError::InvalidTimestamp)?;
        if time.skew_from(now) > self.max_skew {
            return Err(ValidationError::Expired);
        }

        let items = request.items();
        if items.is_empty() {
            return Ok(());
        }

        for item in items {
            validate_item(item.as_ref())?;
        }

        let computed = items_total(items).ok_or(ValidationError::TotalMismatch)?;
        if computed != request.total_amount {
            return Err(ValidationError::TotalMismatch);
        }

        Ok(())
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

fn limit(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong(field, max));
    }
    Ok(())
}

fn validate_item(item: Option<&ItemDetail>) -> Result<(), ValidationError> {
    let item = item.ok_or(ValidationError::MissingItem)?;

    require("partneritemref", &item.partner_item_ref)?;
    limit("partneritemref", &item.partner_item_ref, MAX_ITEM_REF_LEN)?;

    require("name", &item.name)?;
    limit("name", &item.name, MAX_ITEM_NAME_LEN)?;

    if item.qty <= 0 {
        return Err(ValidationError::NonPositiveQty);
    }
    if item.qty > MAX_ITEM_QTY {
        return Err(ValidationError::QtyTooLarge(MAX_ITEM_QTY));
    }

    if !item.unit_price.is_positive() {
        return Err(ValidationError::NonPositiveUnitPrice);
    }

    Ok(())
}

/// Sum of `qty * unitprice`, or `None` on overflow. Items must already be validated.
fn items_total(items: &[Option<ItemDetail>]) -> Option<Amount> {
    items.iter().flatten().try_fold(Amount::ZERO, |acc, item| {
        acc.checked_add(item.unit_price.checked_mul(item.qty)?)
    })
}

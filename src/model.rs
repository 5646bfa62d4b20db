//! Wire types exchanged with partners.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Amount;

/// Placeholder written wherever a secret would otherwise be shown.
pub const MASKED: &str = "[MASKED]";

/// A signed transaction submitted by a partner.
///
/// Missing string fields deserialize as empty strings and a missing amount as
/// zero, so that absence is reported by the validator rather than the parser.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    #[serde(rename = "partnerkey", default)]
    pub partner_key: String,
    #[serde(rename = "partnerrefno", default)]
    pub partner_ref_no: String,
    /// Base64 of the UTF-8 plaintext password.
    #[serde(rename = "partnerpassword", default)]
    pub partner_password: String,
    #[serde(rename = "totalamount", default)]
    pub total_amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Option<ItemDetail>>>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub sig: String,
}

impl TransactionRequest {
    /// Items actually present, or an empty slice.
    pub fn items(&self) -> &[Option<ItemDetail>] {
        self.items.as_deref().unwrap_or_default()
    }
}

// Passwords and signatures must never end up in log output.
impl fmt::Debug for TransactionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionRequest")
            .field("partner_key", &self.partner_key)
            .field("partner_ref_no", &self.partner_ref_no)
            .field("partner_password", &MASKED)
            .field("total_amount", &self.total_amount)
            .field("items", &self.items)
            .field("timestamp", &self.timestamp)
            .field("sig", &MASKED)
            .finish()
    }
}

/// One line of a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetail {
    #[serde(rename = "partneritemref", default)]
    pub partner_item_ref: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub qty: i64,
    #[serde(rename = "unitprice", default)]
    pub unit_price: Amount,
}

/// A request as received, tagged with its position in the input.
/// `request` is `None` when the body was absent or could not be decoded.
#[derive(Debug, Clone)]
pub struct Submission {
    pub line: usize,
    pub request: Option<TransactionRequest>,
}

/// Outcome returned to the partner. `result` is 1 on success and 0 on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub result: u8,
    #[serde(rename = "resultmessage", default, skip_serializing_if = "Option::is_none")]
    pub result_message: Option<String>,
    #[serde(rename = "totalamount", default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Amount>,
    #[serde(rename = "totaldiscount", default, skip_serializing_if = "Option::is_none")]
    pub total_discount: Option<Amount>,
    #[serde(rename = "finalamount", default, skip_serializing_if = "Option::is_none")]
    pub final_amount: Option<Amount>,
}

impl TransactionResponse {
    pub const SUCCESS: u8 = 1;
    pub const FAILURE: u8 = 0;

    pub fn success(total_amount: Amount, total_discount: Amount, final_amount: Amount) -> Self {
        Self {
            result: Self::SUCCESS,
            result_message: None,
            total_amount: Some(total_amount),
            total_discount: Some(total_discount),
            final_amount: Some(final_amount),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            result: Self::FAILURE,
            result_message: Some(message.into()),
            total_amount: None,
            total_discount: None,
            final_amount: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result == Self::SUCCESS
    }
}

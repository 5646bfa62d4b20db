use std::collections::HashMap;

use serde::Deserialize;

/// Credentials of a partner allowed to submit transactions.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct PartnerRecord {
    #[serde(rename = "partnerrefno")]
    pub partner_ref_no: String,
    #[serde(rename = "partnerkey")]
    pub partner_key: String,
    /// Plaintext reference password.
    pub password: String,
}

impl PartnerRecord {
    pub fn new(
        partner_ref_no: impl Into<String>,
        partner_key: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            partner_ref_no: partner_ref_no.into(),
            partner_key: partner_key.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for PartnerRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartnerRecord")
            .field("partner_ref_no", &self.partner_ref_no)
            .field("partner_key", &self.partner_key)
            .field("password", &crate::model::MASKED)
            .finish()
    }
}

/// Read-only registry of known partners, keyed by reference number.
///
/// Built once and then shared; there is no way to mutate it after
/// construction, so concurrent readers need no synchronization.
#[derive(Debug, Clone, Default)]
pub struct PartnerDirectory {
    partners: HashMap<String, PartnerRecord>,
}

impl PartnerDirectory {
    /// Build a directory from records. A later record with the same reference
    /// number replaces an earlier one; file loading rejects duplicates before
    /// reaching this point.
    pub fn new(records: impl IntoIterator<Item = PartnerRecord>) -> Self {
        let partners = records
            .into_iter()
            .map(|record| (record.partner_ref_no.clone(), record))
            .collect();
        Self { partners }
    }

    /// The fixed table used when no partner file is configured.
    pub fn builtin() -> Self {
        Self::new([
            PartnerRecord::new("FG-00001", "FAKEGOOGLE", "FAKEPASSWORD1234"),
            PartnerRecord::new("FG-00002", "FAKEPEOPLE", "FAKEPASSWORD4578"),
        ])
    }

    pub fn get(&self, partner_ref_no: &str) -> Option<&PartnerRecord> {
        self.partners.get(partner_ref_no)
    }

    /// Stored password, only when both the key and the reference number match.
    pub fn password_for(&self, partner_key: &str, partner_ref_no: &str) -> Option<&str> {
        self.get(partner_ref_no)
            .filter(|record| record.partner_key == partner_key)
            .map(|record| record.password.as_str())
    }

    pub fn len(&self) -> usize {
        self.partners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }
}

use std::fmt;

/// Stages a submission moves through, in order. Any stage may end the run
/// with a failure; only a completed `ComputeDiscount` leads to success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Receive,
    Validate,
    Authenticate,
    VerifySignature,
    ComputeDiscount,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Receive,
        Stage::Validate,
        Stage::Authenticate,
        Stage::VerifySignature,
        Stage::ComputeDiscount,
    ];

    /// The stage after this one, `None` once the discount is computed.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Receive => Some(Stage::Validate),
            Stage::Validate => Some(Stage::Authenticate),
            Stage::Authenticate => Some(Stage::VerifySignature),
            Stage::VerifySignature => Some(Stage::ComputeDiscount),
            Stage::ComputeDiscount => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Receive => "receive",
            Stage::Validate => "validate",
            Stage::Authenticate => "authenticate",
            Stage::VerifySignature => "verify_signature",
            Stage::ComputeDiscount => "compute_discount",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

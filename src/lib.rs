pub mod amount;
pub mod config;
pub mod csv;
pub mod discount;
pub mod jsonl;
pub mod model;
pub mod partner;
pub mod pipeline;
pub mod redact;
pub mod signature;
pub mod timestamp;
pub mod validation;

pub use amount::Amount;
pub use discount::{Discount, DiscountCalculator};
pub use model::{ItemDetail, Submission, TransactionRequest, TransactionResponse};
pub use partner::{PartnerAuthenticator, PartnerDirectory, PartnerRecord};
pub use pipeline::Pipeline;
pub use signature::{SignatureVerifier, generate_signature};
pub use validation::TransactionValidator;

//! Transaction processing pipeline.
//!
//! A submission goes through validation, partner authentication, signature
//! verification and discount calculation, in that order. The first failing
//! stage ends processing and decides the response; nothing is retried.
//! Also supports an async stream of submissions.

use std::any::Any;
use std::cell::Cell;
use std::error::Error as _;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, error, info, info_span, warn};

use crate::discount::DiscountCalculator;
use crate::model::{Submission, TransactionRequest, TransactionResponse};
use crate::partner::{PartnerAuthenticator, PartnerDirectory};
use crate::redact;
use crate::signature::SignatureVerifier;
use crate::validation::{TransactionValidator, ValidationError};

mod state;
pub use state::Stage;

mod error;
pub use error::{FailureKind, InternalFault, PipelineError};

/// The transaction pipeline.
///
/// Holds no per-request state; one instance serves any number of requests.
#[derive(Debug, Clone)]
pub struct Pipeline {
    validator: TransactionValidator,
    authenticator: PartnerAuthenticator,
    verifier: SignatureVerifier,
    calculator: DiscountCalculator,
}

/// Public API
impl Pipeline {
    pub fn new(directory: Arc<PartnerDirectory>) -> Self {
        Self {
            validator: TransactionValidator::default(),
            authenticator: PartnerAuthenticator::new(directory),
            verifier: SignatureVerifier::new(),
            calculator: DiscountCalculator::new(),
        }
    }

    pub fn with_validator(mut self, validator: TransactionValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Process every submission of the stream, returning responses in input order.
    pub async fn run(
        &self,
        mut stream: impl Stream<Item = Submission> + Unpin,
    ) -> Vec<TransactionResponse> {
        let mut responses = Vec::new();
        while let Some(submission) = stream.next().await {
            let span = info_span!("request", line = submission.line);
            let response = span.in_scope(|| self.process(submission.request.as_ref()));
            responses.push(response);
        }
        responses
    }

    /// Process one request against the current clock. Never panics.
    pub fn process(&self, request: Option<&TransactionRequest>) -> TransactionResponse {
        self.process_at(request, Utc::now())
    }

    /// Process one request as if received at `now`. Never panics.
    pub fn process_at(
        &self,
        request: Option<&TransactionRequest>,
        now: DateTime<Utc>,
    ) -> TransactionResponse {
        match guarded(|stage| self.run_stages(request, now, stage)) {
            Ok(response) => response,
            Err(e) => {
                Self::log_failure(&e);
                TransactionResponse::failure(e.to_string())
            }
        }
    }

    /// Process a raw JSON body. A body that does not decode into a request
    /// is handled as an absent request.
    pub fn process_json(&self, body: &str) -> TransactionResponse {
        match serde_json::from_str::<Option<TransactionRequest>>(body) {
            Ok(request) => self.process(request.as_ref()),
            Err(e) => {
                warn!(error = %e, body = %redact::masked_body(body), "request body could not be decoded");
                self.process(None)
            }
        }
    }

    /// Run every stage and return the first failure, without panic protection.
    pub fn evaluate(
        &self,
        request: Option<&TransactionRequest>,
        now: DateTime<Utc>,
    ) -> Result<TransactionResponse, PipelineError> {
        self.run_stages(request, now, &Cell::new(Stage::Receive))
    }
}

/// Private API
impl Pipeline {
    fn run_stages(
        &self,
        request: Option<&TransactionRequest>,
        now: DateTime<Utc>,
        stage: &Cell<Stage>,
    ) -> Result<TransactionResponse, PipelineError> {
        stage.set(Stage::Receive);
        let request = request.ok_or(ValidationError::MissingRequest)?;
        info!(
            partner = %request.partner_key,
            ref_no = %request.partner_ref_no,
            amount = %request.total_amount,
            "transaction received"
        );

        stage.set(Stage::Validate);
        self.validator.validate_at(Some(request), now)?;

        stage.set(Stage::Authenticate);
        self.authenticator
            .authenticate(
                &request.partner_key,
                &request.partner_ref_no,
                &request.partner_password,
            )
            .map_err(PipelineError::AccessDenied)?;

        stage.set(Stage::VerifySignature);
        self.verifier
            .verify(request)
            .map_err(PipelineError::InvalidSignature)?;
        debug!(partner = %request.partner_key, "transaction verified");

        stage.set(Stage::ComputeDiscount);
        let discount = self.calculator.calculate(request.total_amount)?;

        info!(
            partner = %request.partner_key,
            amount = %request.total_amount,
            percentage = %discount.percentage,
            discount = %discount.amount,
            final_amount = %discount.final_amount,
            items = request.items().len(),
            "transaction accepted"
        );

        Ok(TransactionResponse::success(
            request.total_amount,
            discount.amount,
            discount.final_amount,
        ))
    }

    fn log_failure(e: &PipelineError) {
        let cause = e
            .source()
            .map(ToString::to_string)
            .unwrap_or_else(|| e.to_string());

        match e.kind() {
            FailureKind::InternalFault => {
                error!(stage = %e.stage(), %cause, "transaction failed");
            }
            // which credential was wrong stays out of the default log level
            kind @ FailureKind::AuthenticationFailure => {
                debug!(stage = %e.stage(), %cause, "partner authentication rejected");
                warn!(stage = %e.stage(), ?kind, "transaction rejected");
            }
            kind => {
                warn!(stage = %e.stage(), ?kind, %cause, "transaction rejected");
            }
        }
    }
}

/// Run `f`, turning a panic into an internal fault attributed to the stage
/// `f` had reached.
fn guarded<F>(f: F) -> Result<TransactionResponse, PipelineError>
where
    F: FnOnce(&Cell<Stage>) -> Result<TransactionResponse, PipelineError>,
{
    let stage = Cell::new(Stage::Receive);
    panic::catch_unwind(AssertUnwindSafe(|| f(&stage))).unwrap_or_else(|payload| {
        Err(InternalFault::Panic(stage.get(), panic_message(payload.as_ref())).into())
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Amount;
    use crate::model::ItemDetail;
    use crate::partner::encode_password;
    use chrono::TimeZone;

    // test utils

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 15, 2, 11, 22).unwrap()
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(Arc::new(PartnerDirectory::builtin()))
    }

    fn item(qty: i64, unit_price: i64) -> ItemDetail {
        ItemDetail {
            partner_item_ref: "i-00001".to_string(),
            name: "Pen".to_string(),
            qty,
            unit_price: Amount::from_cents(unit_price),
        }
    }

    fn signed(mut request: TransactionRequest) -> TransactionRequest {
        request.sig = SignatureVerifier::new().sign(&request).unwrap();
        request
    }

    fn request_at(timestamp: &str, total: i64) -> TransactionRequest {
        signed(TransactionRequest {
            partner_key: "FAKEGOOGLE".to_string(),
            partner_ref_no: "FG-00001".to_string(),
            partner_password: encode_password("FAKEPASSWORD1234"),
            total_amount: Amount::from_cents(total),
            items: None,
            timestamp: timestamp.to_string(),
            sig: String::new(),
        })
    }

    fn request(total: i64) -> TransactionRequest {
        request_at("2024-08-15T02:11:22.0000000Z", total)
    }

    fn fresh_request(total: i64) -> TransactionRequest {
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        request_at(&timestamp, total)
    }

    fn message(response: &TransactionResponse) -> &str {
        response.result_message.as_deref().unwrap_or_default()
    }

    // Success

    #[test]
    fn small_amount_passes_without_discount() {
        let mut req = request(1000);
        req.items = Some(vec![Some(item(4, 200)), Some(item(2, 100))]);
        let req = signed(req);

        let response = pipeline().process_at(Some(&req), now());
        assert_eq!(
            response,
            TransactionResponse::success(
                Amount::from_cents(1000),
                Amount::ZERO,
                Amount::from_cents(1000)
            )
        );
    }

    #[test]
    fn discounted_amount() {
        let response = pipeline().process_at(Some(&request(99_700)), now());
        assert!(response.is_success());
        assert_eq!(response.total_amount, Some(Amount::from_cents(99_700)));
        assert_eq!(response.total_discount, Some(Amount::from_cents(10_967)));
        assert_eq!(response.final_amount, Some(Amount::from_cents(88_733)));
    }

    #[test]
    fn second_partner_is_accepted() {
        let mut req = request(50_000);
        req.partner_key = "FAKEPEOPLE".to_string();
        req.partner_ref_no = "FG-00002".to_string();
        req.partner_password = encode_password("FAKEPASSWORD4578");
        let req = signed(req);

        assert!(pipeline().process_at(Some(&req), now()).is_success());
    }

    // Failures

    #[test]
    fn absent_request() {
        let response = pipeline().process_at(None, now());
        assert_eq!(response, TransactionResponse::failure("Request is Required."));
    }

    #[test]
    fn validation_failure_message_is_specific() {
        let mut req = request(1000);
        req.items = Some(vec![Some(item(5, 100))]);
        let response = pipeline().process_at(Some(&req), now());
        assert_eq!(message(&response), "Invalid Total Amount.");
        assert_eq!(response.total_amount, None);
    }

    #[test]
    fn expired_request() {
        let req = request(1000);
        let later = now() + chrono::TimeDelta::seconds(301);
        assert_eq!(message(&pipeline().process_at(Some(&req), later)), "Expired.");
    }

    #[test]
    fn unknown_partner_is_denied() {
        let mut req = request(1000);
        req.partner_ref_no = "FG-00042".to_string();
        let req = signed(req);
        assert_eq!(message(&pipeline().process_at(Some(&req), now())), "Access Denied!");
    }

    #[test]
    fn wrong_password_is_denied() {
        let mut req = request(1000);
        req.partner_password = encode_password("FAKEPASSWORD4578");
        let req = signed(req);
        assert_eq!(message(&pipeline().process_at(Some(&req), now())), "Access Denied!");
    }

    #[test]
    fn tampered_request_has_invalid_signature() {
        let mut req = request(1000);
        req.total_amount = Amount::from_cents(2000);
        assert_eq!(
            message(&pipeline().process_at(Some(&req), now())),
            "Invalid signature!"
        );
    }

    // Ordering

    #[test]
    fn validation_runs_before_authentication() {
        let mut req = request(1000);
        req.partner_ref_no = "FG-00042".to_string();
        req.sig = String::new();
        assert_eq!(
            message(&pipeline().process_at(Some(&req), now())),
            "sig is Required."
        );
    }

    #[test]
    fn authentication_runs_before_signature() {
        let mut req = request(1000);
        req.partner_key = "FAKEPEOPLE".to_string();
        req.sig = "bogus".to_string();
        assert_eq!(message(&pipeline().process_at(Some(&req), now())), "Access Denied!");
    }

    #[test]
    fn evaluate_reports_kind_and_stage() {
        let mut req = request(1000);
        req.sig = "bogus".to_string();
        let err = pipeline().evaluate(Some(&req), now()).unwrap_err();
        assert_eq!(err.kind(), FailureKind::IntegrityFailure);
        assert_eq!(err.stage(), Stage::VerifySignature);

        let err = pipeline().evaluate(None, now()).unwrap_err();
        assert_eq!(err.kind(), FailureKind::MalformedInput);
    }

    // Panic protection

    #[test]
    fn panic_becomes_internal_fault() {
        let result = guarded(|stage| {
            stage.set(Stage::Authenticate);
            panic!("directory corrupted")
        });
        match result {
            Err(PipelineError::Internal(InternalFault::Panic(stage, msg))) => {
                assert_eq!(stage, Stage::Authenticate);
                assert_eq!(msg, "directory corrupted");
            }
            other => panic!("expected internal fault, got {other:?}"),
        }
    }

    #[test]
    fn internal_fault_message_is_generic() {
        let err: PipelineError = InternalFault::Panic(Stage::Validate, "secret detail".into()).into();
        let response = TransactionResponse::failure(err.to_string());
        assert_eq!(message(&response), "Internal server error occurred");
    }

    // JSON bodies

    #[test]
    fn json_body_is_processed() {
        let body = serde_json::to_string(&fresh_request(1000)).unwrap();
        assert!(pipeline().process_json(&body).is_success());
    }

    #[test]
    fn undecodable_body_is_absent_request() {
        let pipeline = pipeline();
        for body in ["", "null", "{not json", r#"{"totalamount": "lots"}"#] {
            assert_eq!(
                message(&pipeline.process_json(body)),
                "Request is Required.",
                "body: {body}"
            );
        }
    }

    // Streams

    #[tokio::test]
    async fn run_answers_each_submission_in_order() {
        let submissions = vec![
            Submission {
                line: 1,
                request: Some(fresh_request(100_000)),
            },
            Submission {
                line: 2,
                request: None,
            },
            Submission {
                line: 3,
                request: Some(fresh_request(1000)),
            },
        ];

        let responses = pipeline().run(tokio_stream::iter(submissions)).await;

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0].total_discount, Some(Amount::from_cents(3000)));
        assert_eq!(message(&responses[1]), "Request is Required.");
        assert_eq!(responses[2].total_discount, Some(Amount::ZERO));
    }
}

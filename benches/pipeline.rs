use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use trx_gate::partner::encode_password;
use trx_gate::{
    Amount, DiscountCalculator, ItemDetail, PartnerDirectory, Pipeline, SignatureVerifier,
    TransactionRequest,
};

/// Generates signed requests for the built-in partners.
///
/// Pattern (repeating):
/// 1. FAKEGOOGLE, no items
/// 2. FAKEPEOPLE, two items summing to the total
/// 3. FAKEGOOGLE with a tampered amount, rejected at the signature stage
pub struct RequestGenerator {
    remaining: u32,
    step: u32,
    signed_at: DateTime<Utc>,
}

impl RequestGenerator {
    pub fn new(count: u32, signed_at: DateTime<Utc>) -> Self {
        Self {
            remaining: count,
            step: 0,
            signed_at,
        }
    }

    fn signed(&self, key: &str, ref_no: &str, password: &str, total: i64) -> TransactionRequest {
        let mut request = TransactionRequest {
            partner_key: key.to_string(),
            partner_ref_no: ref_no.to_string(),
            partner_password: encode_password(password),
            total_amount: Amount::from_cents(total),
            items: None,
            timestamp: self.signed_at.to_rfc3339(),
            sig: String::new(),
        };
        request.sig = SignatureVerifier::new().sign(&request).unwrap_or_default();
        request
    }
}

impl Iterator for RequestGenerator {
    type Item = TransactionRequest;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        // spread totals across the discount tiers
        let total = 10_000 + i64::from(self.step) * 7_919 % 6_000_000;
        let request = match self.step % 3 {
            0 => self.signed("FAKEGOOGLE", "FG-00001", "FAKEPASSWORD1234", total),
            1 => {
                let mut request = self.signed("FAKEPEOPLE", "FG-00002", "FAKEPASSWORD4578", 1_000);
                request.items = Some(vec![
                    Some(ItemDetail {
                        partner_item_ref: "i-00001".to_string(),
                        name: "Pen".to_string(),
                        qty: 4,
                        unit_price: Amount::from_cents(200),
                    }),
                    Some(ItemDetail {
                        partner_item_ref: "i-00002".to_string(),
                        name: "Ruler".to_string(),
                        qty: 2,
                        unit_price: Amount::from_cents(100),
                    }),
                ]);
                request.sig = SignatureVerifier::new().sign(&request).unwrap_or_default();
                request
            }
            _ => {
                let mut request = self.signed("FAKEGOOGLE", "FG-00001", "FAKEPASSWORD1234", total);
                request.total_amount = Amount::from_cents(total + 1);
                request
            }
        };

        self.step += 1;
        Some(request)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining as usize, Some(self.remaining as usize))
    }
}

impl ExactSizeIterator for RequestGenerator {}

fn bench_discount(c: &mut Criterion) {
    let mut group = c.benchmark_group("discount");
    let calculator = DiscountCalculator::new();

    // one total per tier, plus prime and trailing-five bonuses
    for total in [40_000i64, 99_700, 90_500, 750_000, 5_002_100] {
        group.bench_with_input(BenchmarkId::from_parameter(total), &total, |b, &total| {
            b.iter(|| black_box(calculator.calculate(Amount::from_cents(black_box(total)))));
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let now = Utc.with_ymd_and_hms(2024, 8, 15, 2, 11, 22).single().unwrap_or_default();
    let pipeline = Pipeline::new(Arc::new(PartnerDirectory::builtin()));

    for count in [1_000u32, 10_000] {
        let requests: Vec<_> = RequestGenerator::new(count, now).collect();
        group.bench_with_input(
            BenchmarkId::from_parameter(count),
            &requests,
            |b, requests| {
                b.iter(|| {
                    for request in requests {
                        black_box(pipeline.process_at(Some(request), now));
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_json_bodies(c: &mut Criterion) {
    let mut group = c.benchmark_group("json_bodies");
    let pipeline = Pipeline::new(Arc::new(PartnerDirectory::builtin()));

    // signed against the real clock, so these pass the freshness check
    let bodies: Vec<String> = RequestGenerator::new(1_000, Utc::now())
        .filter_map(|request| serde_json::to_string(&request).ok())
        .collect();
    group.bench_function("1k_mixed", |b| {
        b.iter(|| {
            for body in &bodies {
                black_box(pipeline.process_json(body));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_discount, bench_pipeline, bench_json_bodies);
criterion_main!(benches);

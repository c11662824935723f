use criterion::{Criterion, criterion_group, criterion_main};
use onramp_client::domain::{AmountSpec, Quote, QuoteRequest};
use onramp_client::infra::providers::onramper::{map_order_status, map_transaction_status};
use rust_decimal::Decimal;
use std::hint::black_box;
use validator::Validate;

fn bench_validation(c: &mut Criterion) {
    let request = QuoteRequest::new("USD", "BTC", AmountSpec::InFiat(Decimal::from(100)));
    let quote = Quote {
        fiat_amount: Decimal::from(100),
        crypto_amount: Decimal::new(25, 4),
        fiat_currency: "USD".to_string(),
        crypto_currency: "BTC".to_string(),
        exchange_rate: Decimal::from(40_000),
        fee: Decimal::new(25, 1),
        total_fiat_amount: Decimal::new(1025, 1),
        payment_method_id: None,
        valid_until: None,
        provider_name: "onramper".to_string(),
    };

    c.bench_function("validate_quote_request", |b| {
        b.iter(|| {
            let _ = black_box(&request).validate();
        })
    });

    c.bench_function("validate_quote", |b| {
        b.iter(|| {
            let _ = black_box(&quote).validate();
        })
    });
}

fn bench_status_mapping(c: &mut Criterion) {
    let statuses = ["pending", "Processing", "COMPLETED", "error", "foobar"];

    c.bench_function("map_order_status", |b| {
        b.iter(|| {
            for status in statuses {
                black_box(map_order_status(Some(black_box(status))));
            }
        })
    });

    c.bench_function("map_transaction_status", |b| {
        b.iter(|| {
            for status in statuses {
                black_box(map_transaction_status(Some(black_box(status))));
            }
        })
    });
}

criterion_group!(benches, bench_validation, bench_status_mapping);
criterion_main!(benches);

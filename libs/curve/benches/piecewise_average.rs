use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal_macros::dec;
use skew_curve::{Bounds, FeeCurveModel, FeeCurveParams, SwapDirection};

fn skewed_model() -> FeeCurveModel {
    let params = FeeCurveParams {
        lower_factor: dec!(0.999),
        upper_factor: dec!(0.995),
        hard_lower_factor: dec!(1.002),
        hard_upper_factor: dec!(0.95),
    };
    FeeCurveModel::new(Bounds::default(), params, params).unwrap()
}

fn bench_piecewise_average(c: &mut Criterion) {
    let model = skewed_model();
    let curve = *model.curve(SwapDirection::ToPerp);

    c.bench_function("piecewise_average_inside", |b| {
        b.iter(|| curve.average(black_box(dec!(0.8)), black_box(dec!(1.2))))
    });

    c.bench_function("piecewise_average_crossing", |b| {
        b.iter(|| curve.average(black_box(dec!(1.1)), black_box(dec!(1.7))))
    });

    c.bench_function("fee_factor_for_range", |b| {
        b.iter(|| model.fee_factor(SwapDirection::ToPerp, black_box(dec!(1.6)), black_box(dec!(0.9))))
    });
}

criterion_group!(benches, bench_piecewise_average);
criterion_main!(benches);

//! Micro-benchmarks for the three hot evaluation paths (scalar, per-axis
//! gradient via repeated `evaluate`, combined `evaluate_gradient`) across a
//! handful of representative table shapes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use splinetable::{search_centers, AxisSpec, Table, TableBuilder};

fn open_uniform_axis(
    order: usize,
    interior: usize,
    stride: u64,
) -> AxisSpec
{
    let mut visible = vec![0.0; order + 1];
    for j in 1..=interior
    {
        visible.push(j as f64 / (interior + 1) as f64);
    }
    visible.extend(std::iter::repeat(1.0).take(order + 1));

    let mut padded = Vec::with_capacity(visible.len() + 2 * order);
    padded.extend(std::iter::repeat(visible[0]).take(order));
    padded.extend_from_slice(&visible);
    padded.extend(std::iter::repeat(*visible.last().unwrap()).take(order));

    let naxes = (visible.len() + order - 1) as u64;
    AxisSpec { order, knots: padded, naxes, stride }
}

fn shape_table(
    ndim: usize,
    order: usize,
) -> Table
{
    let mut rng = StdRng::seed_from_u64(7);
    let naxes: Vec<u64> = (0..ndim).map(|_| open_uniform_axis(order, 6, 1).naxes).collect();
    let mut strides = vec![1u64; ndim];
    for i in (0..ndim.saturating_sub(1)).rev()
    {
        strides[i] = strides[i + 1] * naxes[i + 1];
    }

    let mut builder = TableBuilder::new();
    for i in 0..ndim
    {
        builder = builder.axis(open_uniform_axis(order, 6, strides[i]));
    }
    let total: usize = naxes.iter().product::<u64>() as usize;
    let coefficients: Vec<f32> = (0..total).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
    builder.coefficients(coefficients).build().unwrap()
}

fn bench_shape(
    c: &mut Criterion,
    label: &str,
    ndim: usize,
    order: usize,
)
{
    let table = shape_table(ndim, order);
    let mut rng = StdRng::seed_from_u64(99);
    let x: Vec<f64> = (0..ndim).map(|_| 0.05 + rng.gen::<f64>() * 0.9).collect();
    let centers = search_centers(&table, &x).expect("benchmark point outside support");
    let handle = table.evaluation_handle();
    let mask_none = vec![false; ndim];

    let mut group = c.benchmark_group(label);

    group.bench_with_input(BenchmarkId::new("scalar", label), &(), |b, _| {
        b.iter(|| table.evaluate(&x, &centers, &mask_none))
    });

    group.bench_with_input(BenchmarkId::new("gradient_via_repeated_evaluate", label), &(), |b, _| {
        b.iter(|| {
            let mut out = Vec::with_capacity(ndim + 1);
            out.push(table.evaluate(&x, &centers, &mask_none));
            for axis in 0..ndim
            {
                let mut mask = mask_none.clone();
                mask[axis] = true;
                out.push(table.evaluate_with_handle(handle, &x, &centers, &mask));
            }
            out
        })
    });

    group.bench_with_input(BenchmarkId::new("gradient_combined", label), &(), |b, _| {
        b.iter(|| table.evaluate_gradient(&x, &centers))
    });

    group.finish();
}

fn evaluate_benchmarks(c: &mut Criterion)
{
    bench_shape(c, "2d_order2", 2, 2);
    bench_shape(c, "3d_order3", 3, 3);
    bench_shape(c, "5d_order2", 5, 2);
    bench_shape(c, "1d_order3", 1, 3);
}

criterion_group!(benches, evaluate_benchmarks);
criterion_main!(benches);

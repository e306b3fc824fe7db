use criterion::{criterion_group, criterion_main, Criterion};

use bigbuddha::seeds::SeedSource;
use bigbuddha::{iterate, ComplexBig, RandomSource, SamplingGrid};

fn bench_escaping_orbit(c: &mut Criterion) {
    let seed = ComplexBig::with_val(128, -0.74, 0.21);
    c.bench_function("iterate_escaping_128bit", |b| b.iter(|| iterate(&seed, 1000)));
}

fn bench_cycling_orbit(c: &mut Criterion) {
    let seed = ComplexBig::with_val(128, -0.1, 0.65);
    c.bench_function("iterate_interior_128bit", |b| b.iter(|| iterate(&seed, 1000)));
}

fn bench_classify(c: &mut Criterion) {
    let grid = SamplingGrid::build(200, 100, 4, 100).unwrap();
    let seeds = RandomSource::seeded(1).draw(1000, 100).unwrap();
    c.bench_function("classify_1000_seeds", |b| {
        b.iter(|| seeds.iter().filter(|s| grid.is_near_border(s)).count())
    });
}

criterion_group!(benches, bench_escaping_orbit, bench_cycling_orbit, bench_classify);
criterion_main!(benches);

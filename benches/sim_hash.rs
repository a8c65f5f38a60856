use criterion::{criterion_group, criterion_main, Criterion};
use text_sketch::similarity::{FindOptions, SimHasher};

static TEXT: &str = "the quick brown fox jumps over the lazy dog while the cat sat on the mat \
                     and watched the birds circle slowly above the quiet village green";

fn bench_compute_from_text(c: &mut Criterion) {
    let sim_hasher = SimHasher::new(64).unwrap();
    c.bench_function("bench compute from text", |b| {
        b.iter(|| sim_hasher.compute_from_text(TEXT))
    });
}

fn bench_find_similar(c: &mut Criterion) {
    let sim_hasher = SimHasher::new(64).unwrap();
    let candidates: Vec<(usize, u64)> = (0..10_000u64)
        .map(|i| (i as usize, i.wrapping_mul(0x9E37_79B9_7F4A_7C15)))
        .collect();

    c.bench_function("bench find similar 10000", |b| {
        b.iter(|| {
            sim_hasher.find_similar(
                0x0123_4567_89AB_CDEF,
                candidates.iter().copied(),
                FindOptions::default(),
            )
        })
    });
}

criterion_group!(benches, bench_compute_from_text, bench_find_similar);
criterion_main!(benches);

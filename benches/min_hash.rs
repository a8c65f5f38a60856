use criterion::{criterion_group, criterion_main, Criterion};
use text_sketch::similarity::MinHasher;

static TEXT: &str = "the quick brown fox jumps over the lazy dog while the cat sat on the mat \
                     and watched the birds circle slowly above the quiet village green";

fn bench_compute_text_signature(c: &mut Criterion) {
    for &num_hashes in &[32, 128, 512] {
        let min_hasher = MinHasher::new(num_hashes).unwrap();
        c.bench_function(&format!("bench compute text signature {}", num_hashes), |b| {
            b.iter(|| min_hasher.compute_text_signature(TEXT))
        });
    }
}

fn bench_estimate_similarity(c: &mut Criterion) {
    let min_hasher = MinHasher::new(128).unwrap();
    let signature_1 = min_hasher.compute_text_signature(TEXT);
    let signature_2 =
        min_hasher.compute_text_signature("the quick brown fox jumps over the lazy cat");

    c.bench_function("bench estimate similarity 128", |b| {
        b.iter(|| min_hasher.estimate_similarity(&signature_1, &signature_2))
    });
}

criterion_group!(
    benches,
    bench_compute_text_signature,
    bench_estimate_similarity
);
criterion_main!(benches);

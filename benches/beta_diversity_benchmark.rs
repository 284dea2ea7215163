use criterion::{black_box, criterion_group, criterion_main, Criterion};

use betaclip::distance::{compute_matrix, jensen_shannon_distance, Metric};
use betaclip::generate_test_data::{generate_profiles, GeneratorParams};
use betaclip::{AbundanceTable, Rank};

fn benchmark_beta_diversity(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let params = GeneratorParams {
        output_dir: dir.path().to_path_buf(),
        num_samples: 20,
        num_genera: 100,
        species_per_genus: 5,
        seed: Some(1),
        ..Default::default()
    };
    let samples = generate_profiles(&params).expect("Failed to generate profiles");

    c.bench_function("build species table", |b| {
        b.iter(|| AbundanceTable::build(black_box(&samples), Rank::Species))
    });

    let table = AbundanceTable::build(&samples, Rank::Species).expect("Failed to build table");
    c.bench_function("jensen-shannon matrix", |b| {
        b.iter(|| compute_matrix(black_box(&table), Metric::JensenShannonDistance))
    });

    let p = vec![0.1; 500];
    let q: Vec<f64> = (0..500).map(|i| if i % 2 == 0 { 0.2 } else { 0.0 }).collect();
    c.bench_function("jensen-shannon pair", |b| {
        b.iter(|| jensen_shannon_distance(black_box(&p), black_box(&q)))
    });
}

criterion_group!(benches, benchmark_beta_diversity);
criterion_main!(benches);

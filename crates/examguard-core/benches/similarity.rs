use criterion::{black_box, criterion_group, criterion_main, Criterion};

use examguard_core::collusion::CollusionDetector;
use examguard_core::similarity::{pair_similarity, SimilarityEngine};

const SHORT_A: &str = "SELECT name FROM Pilots WHERE rank = 'Major'";
const SHORT_B: &str = "select p.name from pilots p where p.rank = 'Captain'";

fn long_answer(variant: usize) -> String {
    let mut text = String::new();
    for i in 0..40 {
        text.push_str(&format!(
            "SELECT p.name, s.name FROM Pilots p JOIN Squadrons s ON p.squadron_id = s.squadron_id WHERE p.pilot_id = {} ORDER BY p.name;\n",
            i + variant
        ));
    }
    text
}

fn bench_pair_similarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("pair_similarity");

    group.bench_function("short", |b| {
        b.iter(|| pair_similarity(black_box(SHORT_A), black_box(SHORT_B)))
    });

    let a = long_answer(0);
    let b_text = long_answer(1);
    group.bench_function("long", |b| {
        b.iter(|| pair_similarity(black_box(&a), black_box(&b_text)))
    });

    let capped = SimilarityEngine::default().with_max_text_chars(Some(500));
    group.bench_function("long_capped_500", |b| {
        b.iter(|| capped.compare(black_box(&a), black_box(&b_text)))
    });

    group.finish();
}

fn bench_collusion_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("collusion_scan");
    let engine = SimilarityEngine::default();

    let answers: Vec<(String, String)> = (0..30)
        .map(|i| (format!("student-{i:02}"), format!("{SHORT_A} AND squadron_id = {}", i % 4)))
        .collect();
    group.bench_function("30_students", |b| {
        let detector = CollusionDetector::new(&engine, 0.8);
        b.iter(|| detector.scan(0, black_box(&answers)))
    });

    group.finish();
}

criterion_group!(benches, bench_pair_similarity, bench_collusion_scan);
criterion_main!(benches);

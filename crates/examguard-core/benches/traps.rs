use criterion::{black_box, criterion_group, criterion_main, Criterion};

use examguard_core::aggregate::ExamAggregator;
use examguard_core::model::ExamAnswer;
use examguard_core::traps::TrapScorer;

const CLEAN: &str = "SELECT name FROM Pilots WHERE rank = 'Major'";
const PLANTED: &str = "SELECT * FROM MissionAnalytics m JOIN Weapons w ON Pilots.pilot_id = w.weapon_id \
WHERE m.duration_minutes > 30 AND status = 'active' ORDER BY weapon_effectiveness";

fn bench_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("trap_score");
    let scorer = TrapScorer::with_default_rules();

    group.bench_function("clean", |b| b.iter(|| scorer.score(black_box(CLEAN))));
    group.bench_function("planted", |b| b.iter(|| scorer.score(black_box(PLANTED))));

    let long = PLANTED.repeat(50);
    group.bench_function("planted_x50", |b| b.iter(|| scorer.score(black_box(&long))));

    group.finish();
}

fn bench_exam(c: &mut Criterion) {
    let scorer = TrapScorer::with_default_rules();
    let answers: Vec<ExamAnswer> = (0..12)
        .map(|i| ExamAnswer::new(i, if i % 3 == 0 { PLANTED } else { CLEAN }))
        .collect();

    c.bench_function("analyze_exam_12", |b| {
        let aggregator = ExamAggregator::new(&scorer, 30);
        b.iter(|| aggregator.analyze("bench", black_box(&answers)))
    });
}

criterion_group!(benches, bench_score, bench_exam);
criterion_main!(benches);

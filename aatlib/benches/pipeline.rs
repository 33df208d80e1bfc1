use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use aatlib::analysis::Analysis;
use aatlib::config::AnalysisConfig;
use aatlib::experiment::Experiment;
use aatlib::timing::TimingTable;
use aatlib::util::Fixture;

/// Benchmarks table loading and the matrix build of each experiment over a synthetic tree
pub fn criterion_benchmark(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let fixture = Fixture::write(dir.path()).unwrap();
    let config = AnalysisConfig::default();

    let mut group = c.benchmark_group("Pipeline");
    let csv = Fixture::table_csv();
    group.bench_function("Load timing table", |bench| {
        bench.iter(|| TimingTable::from_reader(csv.as_bytes()).unwrap());
    });
    for experiment in [Experiment::Associativity, Experiment::Replacement, Experiment::Inclusion] {
        group.bench_with_input(BenchmarkId::new("Build matrix", experiment), dir.path(), |bench, root| {
            bench.iter(|| {
                Analysis::new(experiment, true, &config, &fixture.table).build(root).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default().significance_level(0.1).sample_size(10);
    targets = criterion_benchmark
);
criterion_main!(benches);

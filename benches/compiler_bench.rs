use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use mgc::bootstrap::ModelBuilder;
use mgc::config::BuildConfig;
use mgc::depgraph::DependencyGraphBuilder;
use mgc::model::{ModelGraph, SourceInformation};
use mgc::naming::NamingScheme;
use mgc::navigation::Navigator;
use mgc::partition::PartitionPlan;
use mgc::pass::PassId;
use mgc::pipeline::{run_pipeline, CompilationState};
use mgc::registry::ClassifierRegistry;
use mgc::serialize::{collect_repository, PathClassifierIds, RepairOverrides};

// Synthetic models: `n` classes in a supertype chain, each with a property
// typed by its neighbour and a String property, plus one sourced function
// per ten classes returning a class through a literal.

fn generate_model(n_classes: usize) -> ModelGraph {
    let mut b = ModelBuilder::new();
    let string = b.primitive("String");
    let string_g = b.generic(string, &[]);
    let classes: Vec<_> = (0..n_classes)
        .map(|i| b.class(&format!("bench::pkg{}::C{}", i % 8, i)))
        .collect();

    for (i, &class) in classes.iter().enumerate() {
        if i > 0 {
            b.extends(class, classes[i - 1]);
        }
        let next = classes[(i + 1) % n_classes];
        let next_g = b.generic(next, &[]);
        b.property(class, "next", next_g);
        b.property(class, "label", string_g);
    }

    for (k, chunk) in classes.chunks(10).enumerate() {
        let target = chunk[0];
        let returns = b.generic(target, &[]);
        let literal = b.literal(&[target], Some(returns));
        let signature = b.function_type(&[], Some(returns));
        b.function(
            &format!("bench::functions::f{k}"),
            signature,
            &[literal],
            SourceInformation::new(format!("/bench/f{k}.pure"), 1, 3),
        );
    }
    b.finish()
}

fn bench_dependency_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("depgraph/build_for_repository");
    for n in [10_usize, 100, 1000] {
        let graph = generate_model(n);
        group.bench_with_input(BenchmarkId::from_parameter(format!("{n}classes")), &graph, |b, graph| {
            let nav = Navigator::new(graph);
            let naming = NamingScheme::default();
            let sets = ClassifierRegistry::default().resolve(&nav);
            b.iter(|| {
                let deps = DependencyGraphBuilder::new(&nav, &naming, &sets)
                    .build_for_repository()
                    .unwrap();
                black_box(deps.edge_count());
            });
        });
    }
    group.finish();
}

fn bench_partition(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition/tarjan");
    for n in [100_usize, 1000] {
        let graph = generate_model(n);
        let nav = Navigator::new(&graph);
        let naming = NamingScheme::default();
        let sets = ClassifierRegistry::default().resolve(&nav);
        let deps = DependencyGraphBuilder::new(&nav, &naming, &sets)
            .build_for_repository()
            .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(format!("{n}classes")), &deps, |b, deps| {
            b.iter(|| black_box(PartitionPlan::from_graph(black_box(deps)).len()));
        });
    }
    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize/collect_and_repair");
    for n in [100_usize, 1000] {
        let graph = generate_model(n);
        group.bench_with_input(BenchmarkId::from_parameter(format!("{n}classes")), &graph, |b, graph| {
            let nav = Navigator::new(graph);
            let sets = ClassifierRegistry::default().resolve(&nav);
            let overrides = RepairOverrides::new();
            b.iter(|| {
                let buckets = collect_repository(&nav, &sets, PathClassifierIds, None)
                    .unwrap()
                    .repair(&overrides)
                    .unwrap()
                    .finalize();
                black_box(buckets.node_count());
            });
        });
    }
    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/full");
    for (terminal, label) in [(PassId::Partition, "partition"), (PassId::Repair, "repair")] {
        group.bench_function(label, |b| {
            b.iter_batched(
                || CompilationState::new(generate_model(200), BuildConfig::default()),
                |mut state| {
                    run_pipeline(&mut state, terminal).unwrap();
                    black_box(&state.artifacts.partitions);
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_dependency_graph,
    bench_partition,
    bench_serialize,
    bench_full_pipeline,
);
criterion_main!(benches);

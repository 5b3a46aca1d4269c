//! Benchmarks for the two costs the ambient design notes call out
//! explicitly: DAG hash-consing (repeated structurally-equal `And`
//! expressions must collapse to one vertex in O(bucket size), not grow the
//! DAG) and end-to-end consistency + classification cost over a growing
//! subsumption chain.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use factpp_core::bipointer::{Bp, TOP};
use factpp_core::config::ReasoningConfig;
use factpp_core::dag::ConceptDag;
use factpp_core::session::Session;

/// Build `n` distinct primitive concepts and conjoin them pairwise,
/// re-issuing the same conjunction `repeats` times to exercise hash-consing.
fn bench_hash_consing(c: &mut Criterion) {
    let mut group = c.benchmark_group("dag_hash_consing");
    for &n in &[8usize, 32, 128] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut dag = ConceptDag::new();
                let leaves: Vec<Bp> = (0..n)
                    .map(|i| dag.add_named(factpp_core::dag::DagTag::PConcept, factpp_core::dag::NamedEntryId(i as u32)))
                    .collect();
                let mut last = TOP;
                for _ in 0..4 {
                    for w in leaves.windows(2) {
                        last = dag.get_and([w[0], w[1]], false);
                    }
                }
                std::hint::black_box((last, dag.len()));
            });
        });
    }
    group.finish();
}

/// A chain `C0 ⊑ C1 ⊑ C2 ⊑ ... ⊑ Cn`, the shape that stresses the
/// subsumption DAG and the cascaded cache builder as depth grows.
fn build_subsumption_chain(depth: usize) -> Session {
    let mut session = Session::new(ReasoningConfig::default());
    let mut concepts = Vec::with_capacity(depth);
    for i in 0..depth {
        concepts.push(session.declare_concept(&format!("C{i}")));
    }
    for w in concepts.windows(2) {
        session.add_subsumption(w[1], w[0]);
    }
    session.finalize().unwrap();
    session
}

fn bench_transitive_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("subsumption_chain_consistency");
    for &depth in &[4usize, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| {
                let mut session = build_subsumption_chain(depth);
                std::hint::black_box(session.is_consistent().unwrap());
                std::hint::black_box(session.classify().unwrap().len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_hash_consing, bench_transitive_chain);
criterion_main!(benches);

//! Criterion benchmarks for the scheduler.
//!
//! Two benchmark groups:
//! - `protoss_opener`: a gateway expand with chronoboosted probes
//! - `zerg_opener`: hatch first with queens injecting larvae

use buildcalc_core::calculator::{BuildOrder, Calculator};
use buildcalc_core::catalog::Catalog;
use buildcalc_core::job::{DependencyKind, Job};
use buildcalc_core::mutation::Mutation;
use buildcalc_core::test_utils::*;
use criterion::{Criterion, criterion_group, criterion_main};

// ===========================================================================
// Build orders
// ===========================================================================

fn protoss_opener(catalog: &Catalog) -> BuildOrder {
    let mut order = BuildOrder::new();
    order.push(job(catalog, "Pylon").at_supply(9));
    order.push(job(catalog, "Chrono Boost").at_supply(10));
    order.push(job(catalog, "Gateway").at_supply(12));
    let gas = order.push(job(catalog, "Assimilator").at_supply(13));
    order.push(Job::mutate(Mutation::shift(-3, 3)).after(gas, DependencyKind::AtCompletion));
    order.push(job(catalog, "Nexus").at_supply(17));
    order.push(job(catalog, "Cybernetics Core").at_supply(18));
    order.push(job(catalog, "Pylon").at_supply(19));
    order.push(job(catalog, "Stalker").at_supply(21).chronoboosted(1));
    order
}

fn zerg_opener(catalog: &Catalog) -> BuildOrder {
    let mut order = BuildOrder::new();
    order.push(job(catalog, "Overlord").at_supply(13));
    order.push(job(catalog, "Hatchery").at_supply(16));
    order.push(job(catalog, "Extractor").at_supply(18));
    order.push(job(catalog, "Spawning Pool").at_supply(17));
    order.push(job(catalog, "Queen").at_supply(19));
    order.push(job(catalog, "Zergling").at_supply(21));
    order.push(job(catalog, "Spawn Larvae").at_supply(23));
    order
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_protoss(c: &mut Criterion) {
    let catalog = sample_catalog();
    let order = protoss_opener(&catalog);
    let calculator = Calculator::new(&catalog);
    c.bench_function("protoss_opener", |b| {
        b.iter(|| calculator.run(&order))
    });
}

fn bench_zerg(c: &mut Criterion) {
    let catalog = sample_catalog();
    let order = zerg_opener(&catalog);
    let calculator = Calculator::new(&catalog);
    c.bench_function("zerg_opener", |b| b.iter(|| calculator.run(&order)));
}

criterion_group!(benches, bench_protoss, bench_zerg);
criterion_main!(benches);

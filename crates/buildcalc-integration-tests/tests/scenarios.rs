//! End-to-end scenarios through the calculator facade.
//!
//! Each test builds a small order, runs it against the sample catalog (plus
//! a few zero-cost products where the scenario calls for one) and checks the
//! committed timings.

use buildcalc_core::availability::Availability;
use buildcalc_core::calculator::{BuildOrder, Calculator};
use buildcalc_core::catalog::{ProductDef, ProductKind, Race};
use buildcalc_core::config::EconomyConfig;
use buildcalc_core::error::BuildError;
use buildcalc_core::fixed::{Fixed64, Time};
use buildcalc_core::job::{DependencyKind, Job, JobBook};
use buildcalc_core::test_utils::*;

fn free_upgrade(name: &str, secs: f64) -> ProductDef {
    ProductDef::new(name, Some(Race::Protoss), &[ProductKind::Upgrade]).time(secs)
}

// ===========================================================================
// Scheduling basics
// ===========================================================================

#[test]
fn free_job_without_trigger_commits_at_zero() {
    let catalog = catalog_with(vec![free_upgrade("Beacon", 10.0)]);
    let mut order = BuildOrder::new();
    order.push(job(&catalog, "Beacon"));
    let report = Calculator::new(&catalog)
        .require_triggers(false)
        .run(&order)
        .unwrap();
    let beacon = report.job("Beacon").unwrap();
    assert_eq!(beacon.started, t(0.0));
    assert_eq!(beacon.completed, t(10.0));
}

#[test]
fn dependency_at_completion_waits_for_first_job() {
    let catalog = catalog_with(vec![free_upgrade("Alpha", 10.0), free_upgrade("Beta", 5.0)]);
    let mut order = BuildOrder::new();
    let alpha = order.push(job(&catalog, "Alpha"));
    order.push(job(&catalog, "Beta").after(alpha, DependencyKind::AtCompletion));
    let report = Calculator::new(&catalog)
        .require_triggers(false)
        .run(&order)
        .unwrap();
    assert_eq!(report.job("Alpha").unwrap().started, t(0.0));
    assert!(report.job("Beta").unwrap().started >= t(10.0));
}

#[test]
fn larva_job_draws_from_starting_larvae() {
    let catalog = sample_catalog();
    let mut order = BuildOrder::new();
    order.push(job(&catalog, "Drone").at_supply(6));
    let report = Calculator::new(&catalog).run(&order).unwrap();
    assert_eq!(report.race, Race::Zerg);
    assert_eq!(report.job("Drone").unwrap().started, t(0.0));
    assert_eq!(report.events[0].larvae, vec![2]);
}

#[test]
fn mineral_trigger_waits_for_the_bank() {
    let catalog = sample_catalog();
    let mut config = EconomyConfig::default();
    config.start.minerals = 0;
    config.start.workers = 4;
    config.mining.mineral_rate = 0.5;
    let mut order = BuildOrder::new();
    order.push(job(&catalog, "Pylon").at_minerals(100));
    let report = Calculator::new(&catalog).with_config(config).run(&order).unwrap();
    assert_eq!(report.job("Pylon").unwrap().started, t(50.0));
}

#[test]
fn mineral_trigger_above_cost_squeezes_workers_first() {
    let catalog = sample_catalog();
    let mut config = EconomyConfig::default();
    config.start.minerals = 0;
    config.start.workers = 4;
    config.mining.mineral_rate = 0.5;
    let mut order = BuildOrder::new();
    order.push(job(&catalog, "Pylon").at_minerals(150));
    let report = Calculator::new(&catalog).with_config(config).run(&order).unwrap();

    let pylon = report.jobs.iter().position(|j| j.description == "Pylon").unwrap();
    let workers_first = report.jobs[..pylon]
        .iter()
        .filter(|j| j.description == "Probe")
        .count();
    assert!(workers_first > 0);
    assert!(report.jobs[pylon].started > t(75.0));
    // paid for as soon as the bank holds 150, leaving 50
    let event = report.events.iter().find(|e| e.description == "Pylon").unwrap();
    assert_eq!(event.minerals, 50);
}

#[test]
fn missing_prerequisite_is_reported_by_name() {
    let catalog = sample_catalog();
    let mut order = BuildOrder::new();
    order.push(job(&catalog, "Gateway").at_supply(6));
    let err = Calculator::new(&catalog).run(&order).unwrap_err();
    let BuildError::Unschedulable(diagnostics) = &err else {
        panic!("expected an unschedulable build, got {err}");
    };
    assert_eq!(diagnostics.len(), 1);
    assert!(matches!(
        &diagnostics[0].availability,
        Availability::MissingPrerequisite { name, .. } if name == "Pylon"
    ));
    assert!(err.is_build_invalid());
}

#[test]
fn empty_order_is_its_own_error() {
    let catalog = sample_catalog();
    let err = Calculator::new(&catalog).run(&BuildOrder::new()).unwrap_err();
    assert!(matches!(err, BuildError::EmptyBuild));
    assert!(err.is_build_invalid());
    assert_eq!(err.to_string(), "No commands found in build order!");
}

#[test]
fn population_trigger_is_exact() {
    let catalog = sample_catalog();
    let mut order = BuildOrder::new();
    order.push(job(&catalog, "Pylon").at_supply(9));
    order.push(job(&catalog, "Gateway").at_supply(11));
    let report = Calculator::new(&catalog).run(&order).unwrap();
    let pylon = report.events.iter().find(|e| e.description == "Pylon").unwrap();
    assert_eq!(pylon.supply_count, 9);
    let gateway = report.events.iter().find(|e| e.description == "Gateway").unwrap();
    assert_eq!(gateway.supply_count, 11);
}

// ===========================================================================
// Actions
// ===========================================================================

#[test]
fn chronoboost_shortens_production() {
    let catalog = sample_catalog();
    let plain = {
        let mut order = BuildOrder::new();
        order.push(job(&catalog, "Probe").at_supply(6));
        Calculator::new(&catalog).run(&order).unwrap()
    };
    let boosted = {
        let mut order = BuildOrder::new();
        order.push(job(&catalog, "Probe").at_supply(6).chronoboosted(1));
        Calculator::new(&catalog).run(&order).unwrap()
    };
    let plain = &plain.jobs[0];
    let boosted = &boosted.jobs[0];
    assert_eq!(plain.completed, t(12.0));
    assert_eq!(boosted.started, plain.started);
    assert!(boosted.completed < plain.completed);
}

#[test]
fn accelerated_queue_completes_five_seconds_after_start() {
    let catalog = catalog_with(vec![
        ProductDef::new(
            "Proxy Gate",
            Some(Race::Protoss),
            &[ProductKind::Structure, ProductKind::AcceleratedQueue],
        )
        .time(10.0),
        ProductDef::new("Adept", Some(Race::Protoss), &[ProductKind::Unit])
            .time(30.0)
            .cost(100, 0)
            .supply(2)
            .expends(&["Proxy Gate"]),
    ]);
    let mut order = BuildOrder::new();
    let gate = order.push(job(&catalog, "Proxy Gate").at_supply(6));
    order.push(job(&catalog, "Adept").after(gate, DependencyKind::AtCompletion));
    let report = Calculator::new(&catalog).run(&order).unwrap();
    let adept = report.job("Adept").unwrap();
    assert!(adept.started >= report.job("Proxy Gate").unwrap().completed);
    assert_eq!(adept.completed, adept.started.plus(Fixed64::from_num(5)));
}

#[test]
fn cancel_stops_worker_production() {
    let catalog = sample_catalog();
    let probe = catalog.id("Probe").unwrap();

    let mut order = BuildOrder::new();
    order.push(Job::cancel(probe).at_supply(7));
    order.push(job(&catalog, "Pylon").at_supply(7));
    let report = Calculator::new(&catalog).run(&order).unwrap();
    assert_eq!(report.jobs_named("Probe").count(), 1);
    assert!(report.job("Cancel Probe").is_some());

    order.push(job(&catalog, "Gateway").at_supply(9));
    let err = Calculator::new(&catalog).run(&order).unwrap_err();
    let BuildError::Unschedulable(diagnostics) = err else {
        panic!("expected an unschedulable build");
    };
    assert_eq!(
        diagnostics[0].availability,
        Availability::InsufficientSupply { count: 7, needed: 9 }
    );
}

#[test]
fn early_dispatch_sends_the_builder_before_the_bank_is_full() {
    let catalog = sample_catalog();
    let run = |pylon: Job| {
        let mut order = BuildOrder::new();
        order.push(pylon.at_supply(6));
        Calculator::new(&catalog).run(&order).unwrap()
    };
    let plain = run(job(&catalog, "Pylon"));
    let dispatched = run(job(&catalog, "Pylon").send_worker_at(Some(60), None));
    let plain = plain.job("Pylon").unwrap();
    let dispatched = dispatched.job("Pylon").unwrap();
    assert_eq!(plain.initiated, plain.started);
    assert!(dispatched.initiated < dispatched.started);
    // one miner short while the builder walks
    assert!(dispatched.started > plain.started);
}

#[test]
fn dispatched_builder_leaves_the_mineral_line_when_sent() {
    let catalog = sample_catalog();
    let mut tl = timeline(&catalog, Race::Protoss);
    let mut pylon = job(&catalog, "Pylon").send_worker_at(Some(60), None);
    tl.calculate(&mut pylon, &JobBook::new()).unwrap();
    tl.process(&mut pylon, false).unwrap();

    assert!(pylon.initiated > Time::ZERO);
    let back = pylon.started.plus(pylon.started.since(pylon.initiated));
    assert_eq!(mineral_miners_at(&tl, Time::ZERO), 6);
    assert_eq!(mineral_miners_at(&tl, pylon.initiated), 5);
    assert_eq!(mineral_miners_at(&tl, pylon.started), 5);
    assert_eq!(mineral_miners_at(&tl, back), 6);
}

#[test]
fn killing_an_overlord_removes_its_capacity() {
    let catalog = sample_catalog();
    let mut order = BuildOrder::new();
    order.push(job(&catalog, "Drone").at_supply(6));
    order.push(Job::kill(catalog.id("Overlord").unwrap()).at_supply(7));
    order.push(job(&catalog, "Spawning Pool").at_supply(7));
    let report = Calculator::new(&catalog).run(&order).unwrap();

    let capacity = |description: &str| {
        report
            .events
            .iter()
            .find(|e| e.description == description)
            .unwrap()
            .supply_capacity
    };
    assert!(report.job("Kill Overlord").is_some());
    assert_eq!(capacity("Drone"), 14);
    assert_eq!(capacity("Spawning Pool"), 6);
    assert_eq!(report.supply_count, 6);
}

#[test]
fn extractor_trick_refunds_three_quarters() {
    let catalog = sample_catalog();
    let extractor = catalog.id("Extractor").unwrap();
    let drone = catalog.id("Drone").unwrap();
    let mut order = BuildOrder::new();
    order.push(Job::trick(extractor, 1, Some((drone, 1))).at_supply(6));
    let report = Calculator::new(&catalog).run(&order).unwrap();

    let trick = report.job("Extractor Trick").unwrap();
    assert_eq!(trick.completed, trick.started.plus(Fixed64::from_num(12)));
    // 75 paid, 18 of the extractor's 25 returned
    let event = report
        .events
        .iter()
        .find(|e| e.description == "Extractor Trick")
        .unwrap();
    assert_eq!(event.minerals, 18);
    assert_eq!(report.supply_count, 7);
}

#[test]
fn extractor_trick_keeps_the_drone_mining() {
    let catalog = sample_catalog();
    let extractor = catalog.id("Extractor").unwrap();
    let drone = catalog.id("Drone").unwrap();
    let mut tl = timeline(&catalog, Race::Zerg);
    let mut trick = Job::trick(extractor, 1, Some((drone, 1)));
    tl.calculate(&mut trick, &JobBook::new()).unwrap();
    tl.process(&mut trick, false).unwrap();

    assert_eq!(mineral_miners_at(&tl, trick.started), 6);
    assert_eq!(mineral_miners_at(&tl, trick.completed), 7);
    assert_eq!(tl.income.stored().minerals, Fixed64::from_num(18));
    assert_eq!(tl.supply_count, 7);
}

#[test]
fn checkpoints_appear_in_the_log() {
    let catalog = sample_catalog();
    let mut order = BuildOrder::new();
    order.push(job(&catalog, "Pylon").at_supply(8));
    order.checkpoint(buildcalc_core::event::Checkpoint::new("Scout arrives", t(5.0), None));
    let report = Calculator::new(&catalog).run(&order).unwrap();
    let descriptions: Vec<&str> = report.events.iter().map(|e| e.description.as_str()).collect();
    let scout = descriptions.iter().position(|d| *d == "Scout arrives").unwrap();
    let pylon = descriptions.iter().position(|d| *d == "Pylon").unwrap();
    assert!(scout < pylon);
}

#[test]
fn report_serializes_to_json() {
    let catalog = sample_catalog();
    let mut order = BuildOrder::new();
    order.push(job(&catalog, "Pylon").at_supply(8));
    let report = Calculator::new(&catalog).run(&order).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["supply_count"], 8);
    assert_eq!(json["jobs"].as_array().unwrap().len(), 3);
    assert!(report.end_time > Time::ZERO);
}

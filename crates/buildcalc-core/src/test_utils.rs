//! Shared fixtures for unit and integration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so the sample
//! catalog never ships in release builds.

use crate::catalog::{Catalog, CatalogBuilder, ProductDef, ProductKind::*, Race};
use crate::config::EconomyConfig;
use crate::fixed::Time;
use crate::init::StartingScenario;
use crate::job::{Job, JobId};
use crate::timeline::Timeline;

// ===========================================================================
// Catalog
// ===========================================================================

/// A trimmed-down set of real products for all three races.
pub fn sample_defs() -> Vec<ProductDef> {
    let protoss = Some(Race::Protoss);
    let terran = Some(Race::Terran);
    let zerg = Some(Race::Zerg);
    vec![
        // -- Protoss --
        ProductDef::new("Nexus", protoss, &[Structure, Base, StartBase, Spellcaster])
            .time(71.0)
            .cost(400, 0)
            .capacity(15)
            .energy_pool(50, 200),
        ProductDef::new("Probe", protoss, &[Unit, Worker])
            .time(12.0)
            .cost(50, 0)
            .supply(1)
            .expends(&["Nexus"]),
        ProductDef::new("Pylon", protoss, &[Structure])
            .time(18.0)
            .cost(100, 0)
            .capacity(8),
        ProductDef::new("Assimilator", protoss, &[Structure, Geyser])
            .time(21.0)
            .cost(75, 0),
        ProductDef::new("Gateway", protoss, &[Structure])
            .time(46.0)
            .cost(150, 0)
            .requires(&["Pylon"]),
        ProductDef::new("Cybernetics Core", protoss, &[Structure])
            .time(36.0)
            .cost(150, 0)
            .requires(&["Gateway"]),
        ProductDef::new("Warp Gate Research", protoss, &[Upgrade])
            .time(100.0)
            .cost(50, 50)
            .requires(&["Cybernetics Core"])
            .expends(&["Cybernetics Core"]),
        ProductDef::new("Warp Gate", protoss, &[AcceleratedQueue]),
        ProductDef::new("Transform to Warp Gate", protoss, &[Morph])
            .time(7.0)
            .requires(&["Warp Gate Research"])
            .expends(&["Gateway"])
            .yields(&["Warp Gate"]),
        ProductDef::new("Zealot", protoss, &[Unit])
            .time(27.0)
            .cost(100, 0)
            .supply(2)
            .expends(&["Gateway", "Warp Gate"])
            .expends_all(false),
        ProductDef::new("Stalker", protoss, &[Unit])
            .time(30.0)
            .cost(125, 50)
            .supply(2)
            .requires(&["Cybernetics Core"])
            .expends(&["Gateway", "Warp Gate"])
            .expends_all(false),
        ProductDef::new("Chrono Boost", protoss, &[Ability, Booster])
            .time(20.0)
            .cast_by("Nexus", 50),
        // -- Terran --
        ProductDef::new("Command Center", terran, &[Structure, Base, StartBase])
            .time(71.0)
            .cost(400, 0)
            .capacity(15),
        ProductDef::new("SCV", terran, &[Unit, Worker])
            .time(12.0)
            .cost(50, 0)
            .supply(1)
            .expends(&["Command Center", "Orbital Command"])
            .expends_all(false),
        ProductDef::new("Supply Depot", terran, &[Structure])
            .time(21.0)
            .cost(100, 0)
            .capacity(8),
        ProductDef::new("Refinery", terran, &[Structure, Geyser])
            .time(21.0)
            .cost(75, 0),
        ProductDef::new("Barracks", terran, &[Structure])
            .time(46.0)
            .cost(150, 0)
            .requires(&["Supply Depot"]),
        ProductDef::new("Marine", terran, &[Unit])
            .time(18.0)
            .cost(50, 0)
            .supply(1)
            .expends(&["Barracks"]),
        ProductDef::new("Orbital Command", terran, &[Morph, Spellcaster])
            .time(25.0)
            .cost(150, 0)
            .energy_pool(50, 200)
            .requires(&["Barracks"])
            .expends(&["Command Center"])
            .yields(&["Orbital Command"]),
        ProductDef::new("Calldown: MULE", terran, &[Ability, Mule])
            .time(64.0)
            .cast_by("Orbital Command", 50),
        // -- Zerg --
        ProductDef::new("Hatchery", zerg, &[Structure, Base, StartBase])
            .time(71.0)
            .cost(300, 0)
            .supply(-1)
            .capacity(6),
        ProductDef::new("Drone", zerg, &[Unit, Worker])
            .time(12.0)
            .cost(50, 0)
            .supply(1),
        ProductDef::new("Overlord", zerg, &[Unit, StartingUnit])
            .time(18.0)
            .cost(100, 0)
            .capacity(8),
        ProductDef::new("Extractor", zerg, &[Structure, Geyser])
            .time(21.0)
            .cost(25, 0)
            .supply(-1),
        ProductDef::new("Spawning Pool", zerg, &[Structure])
            .time(46.0)
            .cost(200, 0)
            .supply(-1),
        ProductDef::new("Zergling", zerg, &[Unit])
            .time(17.0)
            .cost(50, 0)
            .supply(1)
            .requires(&["Spawning Pool"]),
        ProductDef::new("Queen", zerg, &[Unit, Spellcaster])
            .time(36.0)
            .cost(150, 0)
            .supply(2)
            .larva(0)
            .energy_pool(25, 200)
            .requires(&["Spawning Pool"])
            .expends(&["Hatchery", "Lair"])
            .expends_all(false),
        ProductDef::new("Spawn Larvae", zerg, &[Ability, SpawnLarvae])
            .time(29.0)
            .cast_by("Queen", 25),
        ProductDef::new("Lair", zerg, &[Morph])
            .time(57.0)
            .cost(150, 100)
            .requires(&["Spawning Pool"])
            .expends(&["Hatchery"])
            .yields(&["Lair"]),
        // -- Any race --
        ProductDef::new("Scouting Worker", None, &[Unit, ScoutingWorker]),
    ]
}

pub fn sample_catalog() -> Catalog {
    catalog_with(Vec::new())
}

/// The sample catalog plus `extra` products.
pub fn catalog_with(extra: Vec<ProductDef>) -> Catalog {
    let mut builder = CatalogBuilder::new();
    for def in sample_defs().into_iter().chain(extra) {
        builder.register(def).unwrap();
    }
    builder.build().unwrap()
}

// ===========================================================================
// Timelines and jobs
// ===========================================================================

/// A standard start with default economy constants.
pub fn timeline(catalog: &Catalog, race: Race) -> Timeline<'_> {
    let config = EconomyConfig::default();
    let (timeline, _worker) = StartingScenario::new(race, &config)
        .initialise(catalog)
        .unwrap();
    timeline
}

pub fn t(secs: f64) -> Time {
    Time::from_secs(secs)
}

/// A plain build job for the named product.
pub fn job(catalog: &Catalog, name: &str) -> Job {
    Job::build(catalog.id(name).unwrap())
}

/// Workers mining minerals, over all bases, at `time`.
pub fn mineral_miners_at(timeline: &Timeline<'_>, time: Time) -> i32 {
    timeline
        .income
        .slots()
        .iter()
        .find(|s| s.start <= time && time < s.end)
        .map_or(0, |s| s.mineral_miners.iter().sum())
}

/// Assign sequential ids, as a build order would.
pub fn numbered(mut jobs: Vec<Job>) -> Vec<Job> {
    for (i, job) in jobs.iter_mut().enumerate() {
        job.id = JobId(i as u32);
    }
    jobs
}

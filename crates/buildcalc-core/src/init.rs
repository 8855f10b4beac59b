//! Starting positions.
//!
//! A [`StartingScenario`] seeds an empty timeline with the state of a
//! standard 1v1 start and yields the recurring worker job every build order
//! implicitly carries.

use crate::catalog::{Catalog, CatalogError, ProductKind, Race};
use crate::config::EconomyConfig;
use crate::farm::Farm;
use crate::fixed::Time;
use crate::income::{IncomeSlot, IncomeSlots};
use crate::job::Job;
use crate::queue::ProductionQueue;
use crate::timeline::Timeline;
use tracing::debug;

/// A standard start for one race.
#[derive(Debug, Clone)]
pub struct StartingScenario<'a> {
    pub race: Race,
    pub config: &'a EconomyConfig,
}

impl<'a> StartingScenario<'a> {
    pub fn new(race: Race, config: &'a EconomyConfig) -> Self {
        Self { race, config }
    }

    /// A seeded timeline plus the recurring worker job.
    pub fn initialise<'c>(&self, catalog: &'c Catalog) -> Result<(Timeline<'c>, Job), CatalogError> {
        let start = &self.config.start;
        let mut timeline = Timeline::new(catalog, self.config, self.race);

        let mut income = IncomeSlots::new(start.minerals, start.gas, self.config.mining_rates());
        let delay = Time::from_secs(start.build_delay);
        if delay > Time::ZERO {
            income.push(IncomeSlot::new(Time::ZERO, delay));
        }
        income.push(IncomeSlot::with_base(delay, Time::NEVER, start.workers as i32));
        timeline.income = income;
        timeline.startup_build_delay = delay;

        let base = catalog.designated(self.race, ProductKind::StartBase)?;
        timeline
            .queues
            .add(ProductionQueue::new(base.id, Time::ZERO, None));
        timeline.supply_count = start.supply;
        timeline.farms.add(Farm::new(Time::ZERO, base.supply_capacity));

        match self.race {
            Race::Protoss => {
                let nexus = timeline.spellcaster(base.id, Time::ZERO, None);
                timeline.spellcasters.add(nexus);
            }
            Race::Zerg => {
                // fail early if the catalog cannot spawn larvae
                catalog.designated(self.race, ProductKind::SpawnLarvae)?;
                let hatchery = timeline.hatchery(Time::ZERO, start.larvae, None);
                timeline.hatcheries.add(hatchery);
                let starting_farms = catalog.iter().filter(|p| {
                    p.race == Some(self.race) && p.is(ProductKind::StartingUnit) && p.supply_capacity > 0
                });
                for unit in starting_farms {
                    timeline.farms.add(Farm::new(Time::ZERO, unit.supply_capacity));
                }
            }
            Race::Terran => {}
        }

        let worker = catalog.designated(self.race, ProductKind::Worker)?;
        debug!(
            race = %self.race,
            workers = start.workers,
            build_delay = start.build_delay,
            capacity = timeline.farms.surplus(Time::ZERO),
            "initialised timeline"
        );
        Ok((timeline, Job::build(worker.id).recurring()))
    }
}

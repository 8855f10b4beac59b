//! Jobs: the actions of a build order.
//!
//! A [`Job`] carries the scheduling state shared by every action (times,
//! triggers, tags, dependency) and a [`JobKind`] with the behavior of the
//! specific action. Everything a kind contributes (costs, duration, products,
//! queues, income mutations) is derived from the catalog on demand.

use crate::availability::Availability;
use crate::catalog::{Catalog, ProductId, ProductKind, Race};
use crate::error::BuildError;
use crate::fixed::{Fixed64, Time};
use crate::income::IncomeSlots;
use crate::mutation::Mutation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Identifies a job within one build order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyKind {
    /// May begin once the dependency has started.
    AtStart,
    /// May begin once the dependency has completed.
    AtCompletion,
}

/// Reference to an earlier job of the same build order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub job: JobId,
    pub kind: DependencyKind,
}

// ===========================================================================
// JobKind
// ===========================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum JobKind {
    /// Produce a unit, structure, upgrade or ability.
    Build { product: ProductId },
    /// Remove the recurring jobs building `product`.
    Cancel { product: ProductId },
    /// Lose a unit, releasing its population and capacity.
    Kill { product: ProductId },
    /// Move workers between resources.
    Mutate { mutation: Mutation },
    /// Send a worker away from mining; it returns after `delay`, or never.
    Scout {
        worker: ProductId,
        delay: Option<Fixed64>,
    },
    /// Pledge units and cancel them (optionally turning the freed larvae
    /// into something else) to bypass the population cap.
    Trick {
        pledge: ProductId,
        pledge_count: u32,
        turn: Option<ProductId>,
        turn_count: u32,
    },
}

// ===========================================================================
// Job
// ===========================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub started: Time,
    /// When resources are sent, e.g. a worker leaving to build.
    pub initiated: Time,
    pub completed: Time,
    pub dependency: Option<Dependency>,
    pub trigger_supply: Option<i32>,
    pub trigger_minerals: Option<u32>,
    pub trigger_gas: Option<u32>,
    /// Dispatch the worker once this much is banked.
    pub initiate_minerals: Option<u32>,
    pub initiate_gas: Option<u32>,
    /// Population that must not be exceeded by jobs squeezed in before this
    /// one. Derived by the scheduler for fixed jobs without a population
    /// trigger.
    pub supply_ceiling: Option<i32>,
    pub recurring: bool,
    pub tag: Option<String>,
    pub tags_required: Option<Vec<String>>,
    pub chronoboosts: u32,
    /// Additional queue type consumed, e.g. a proxy worker.
    pub extra_queue: Option<ProductId>,
    pub availability: Availability,
    /// Position in commit order, once committed.
    pub pick_order: Option<usize>,
}

impl Job {
    pub fn new(kind: JobKind) -> Self {
        Self {
            id: JobId(0),
            kind,
            started: Time::NEVER,
            initiated: Time::NEVER,
            completed: Time::NEVER,
            dependency: None,
            trigger_supply: None,
            trigger_minerals: None,
            trigger_gas: None,
            initiate_minerals: None,
            initiate_gas: None,
            supply_ceiling: None,
            recurring: false,
            tag: None,
            tags_required: None,
            chronoboosts: 0,
            extra_queue: None,
            availability: Availability::Available,
            pick_order: None,
        }
    }

    pub fn build(product: ProductId) -> Self {
        Self::new(JobKind::Build { product })
    }

    pub fn cancel(product: ProductId) -> Self {
        Self::new(JobKind::Cancel { product })
    }

    pub fn kill(product: ProductId) -> Self {
        Self::new(JobKind::Kill { product })
    }

    pub fn mutate(mutation: Mutation) -> Self {
        Self::new(JobKind::Mutate { mutation })
    }

    pub fn scout(worker: ProductId, delay: Option<Fixed64>) -> Self {
        Self::new(JobKind::Scout { worker, delay })
    }

    pub fn trick(pledge: ProductId, pledge_count: u32, turn: Option<(ProductId, u32)>) -> Self {
        Self::new(JobKind::Trick {
            pledge,
            pledge_count,
            turn: turn.map(|(p, _)| p),
            turn_count: turn.map_or(0, |(_, n)| n),
        })
    }

    // -- Builder methods --

    pub fn at_supply(mut self, supply: i32) -> Self {
        self.trigger_supply = Some(supply);
        self
    }

    pub fn at_minerals(mut self, minerals: u32) -> Self {
        self.trigger_minerals = Some(minerals);
        self
    }

    pub fn at_gas(mut self, gas: u32) -> Self {
        self.trigger_gas = Some(gas);
        self
    }

    pub fn after(mut self, job: JobId, kind: DependencyKind) -> Self {
        self.dependency = Some(Dependency { job, kind });
        self
    }

    pub fn send_worker_at(mut self, minerals: Option<u32>, gas: Option<u32>) -> Self {
        self.initiate_minerals = minerals;
        self.initiate_gas = gas;
        self
    }

    pub fn recurring(mut self) -> Self {
        self.recurring = true;
        self
    }

    pub fn tagged(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn requiring_tags(mut self, tags: &[&str]) -> Self {
        self.tags_required = Some(tags.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn chronoboosted(mut self, boosts: u32) -> Self {
        self.chronoboosts = boosts;
        self
    }

    pub fn via_queue(mut self, queue: ProductId) -> Self {
        self.extra_queue = Some(queue);
        self
    }

    pub fn has_trigger(&self) -> bool {
        self.trigger_supply.is_some() || self.trigger_minerals.is_some() || self.trigger_gas.is_some()
    }

    pub fn tags(&self) -> Option<&[String]> {
        self.tags_required.as_deref()
    }

    // -- Costs --

    pub fn mineral_cost(&self, catalog: &Catalog) -> u32 {
        match &self.kind {
            JobKind::Build { product } => catalog.get(*product).mineral_cost,
            JobKind::Trick { .. } => self.trick_sum(catalog, |p| p.mineral_cost),
            _ => 0,
        }
    }

    pub fn gas_cost(&self, catalog: &Catalog) -> u32 {
        match &self.kind {
            JobKind::Build { product } => catalog.get(*product).gas_cost,
            JobKind::Trick { .. } => self.trick_sum(catalog, |p| p.gas_cost),
            _ => 0,
        }
    }

    pub fn larva_cost(&self, catalog: &Catalog) -> u32 {
        match &self.kind {
            JobKind::Build { product } => catalog.get(*product).larva_cost,
            JobKind::Trick { .. } => self.trick_sum(catalog, |p| p.larva_cost),
            _ => 0,
        }
    }

    pub fn energy_cost(&self, catalog: &Catalog) -> u32 {
        match &self.kind {
            JobKind::Build { product } => catalog.get(*product).energy_cost,
            _ => 0,
        }
    }

    /// Net population change. With `allow_trick`, the pledged units of a
    /// trick count too; they hold population only while pledged.
    pub fn supply_cost(&self, catalog: &Catalog, allow_trick: bool) -> i32 {
        match &self.kind {
            JobKind::Build { product } => catalog.get(*product).supply_cost,
            JobKind::Kill { product } => -catalog.get(*product).supply_cost,
            JobKind::Trick {
                pledge,
                pledge_count,
                turn,
                turn_count,
            } => {
                let turned = turn.map_or(0, |t| *turn_count as i32 * catalog.get(t).supply_cost);
                if allow_trick {
                    *pledge_count as i32 * catalog.get(*pledge).supply_cost + turned
                } else {
                    turned
                }
            }
            _ => 0,
        }
    }

    /// Minerals returned when pledged units are cancelled (75%).
    pub fn mineral_refund(&self, catalog: &Catalog) -> u32 {
        match &self.kind {
            JobKind::Trick {
                pledge, pledge_count, ..
            } => pledge_count * (3 * catalog.get(*pledge).mineral_cost / 4),
            _ => 0,
        }
    }

    pub fn gas_refund(&self, catalog: &Catalog) -> u32 {
        match &self.kind {
            JobKind::Trick {
                pledge, pledge_count, ..
            } => pledge_count * (3 * catalog.get(*pledge).gas_cost / 4),
            _ => 0,
        }
    }

    fn trick_sum(&self, catalog: &Catalog, cost: impl Fn(&crate::catalog::Product) -> u32) -> u32 {
        match &self.kind {
            JobKind::Trick {
                pledge,
                pledge_count,
                turn,
                turn_count,
            } => {
                pledge_count * cost(catalog.get(*pledge))
                    + turn.map_or(0, |t| turn_count * cost(catalog.get(t)))
            }
            _ => 0,
        }
    }

    pub fn duration(&self, catalog: &Catalog) -> Fixed64 {
        match &self.kind {
            JobKind::Build { product } => catalog.get(*product).time_cost,
            JobKind::Trick { turn, .. } => turn.map_or(Fixed64::ZERO, |t| catalog.get(t).time_cost),
            JobKind::Mutate { mutation } => mutation.delay.unwrap_or(Fixed64::ZERO),
            JobKind::Scout { delay, .. } => delay.unwrap_or(Fixed64::ZERO),
            JobKind::Cancel { .. } | JobKind::Kill { .. } => Fixed64::ZERO,
        }
    }

    // -- Products and queues --

    /// The product a build job builds.
    pub fn product_built(&self) -> Option<ProductId> {
        match self.kind {
            JobKind::Build { product } => Some(product),
            _ => None,
        }
    }

    pub fn prerequisites(&self, catalog: &Catalog) -> Vec<ProductId> {
        match &self.kind {
            JobKind::Build { product } => catalog.get(*product).prerequisites.clone(),
            JobKind::Trick { pledge, turn, .. } => {
                let mut prerequisites = catalog.get(*pledge).prerequisites.clone();
                if let Some(turn) = turn {
                    prerequisites.extend_from_slice(&catalog.get(*turn).prerequisites);
                }
                prerequisites
            }
            _ => Vec::new(),
        }
    }

    pub fn products_created(&self, catalog: &Catalog) -> Vec<ProductId> {
        match &self.kind {
            JobKind::Build { product } => {
                let p = catalog.get(*product);
                if p.is(ProductKind::Morph) && !p.yields.is_empty() {
                    p.yields.clone()
                } else {
                    vec![*product]
                }
            }
            JobKind::Trick {
                turn: Some(turn),
                turn_count,
                ..
            } => vec![*turn; *turn_count as usize],
            _ => Vec::new(),
        }
    }

    pub fn products_destroyed(&self) -> Vec<ProductId> {
        match self.kind {
            JobKind::Kill { product } => vec![product],
            _ => Vec::new(),
        }
    }

    pub fn queue_types_created(&self, catalog: &Catalog) -> Vec<ProductId> {
        match &self.kind {
            JobKind::Build { product } => {
                let p = catalog.get(*product);
                if p.is(ProductKind::Structure) || p.is(ProductKind::Spellcaster) {
                    vec![*product]
                } else if p.is(ProductKind::Morph) {
                    p.yields.clone()
                } else {
                    Vec::new()
                }
            }
            JobKind::Scout { worker, .. } => vec![*worker],
            _ => Vec::new(),
        }
    }

    /// Queue types the job occupies and whether it needs all of them (as
    /// opposed to any one).
    pub fn queue_types_expended(&self, catalog: &Catalog) -> Option<(Vec<ProductId>, bool)> {
        let (mut types, all) = match &self.kind {
            JobKind::Build { product } => {
                let p = catalog.get(*product);
                (p.expends.clone(), p.expends_all)
            }
            _ => (Vec::new(), false),
        };
        types.extend(self.extra_queue);
        if types.is_empty() { None } else { Some((types, all)) }
    }

    pub fn spellcaster(&self, catalog: &Catalog) -> Option<ProductId> {
        match &self.kind {
            JobKind::Build { product } => catalog.get(*product).spellcaster,
            _ => None,
        }
    }

    /// Morphs tie up their queue without it counting as production.
    pub fn busies_queues(&self, catalog: &Catalog) -> bool {
        matches!(self.kind, JobKind::Build { .. }) && !self.morph(catalog)
    }

    pub fn morph(&self, catalog: &Catalog) -> bool {
        match &self.kind {
            JobKind::Build { product } => catalog.get(*product).is(ProductKind::Morph),
            _ => false,
        }
    }

    /// Pure income changes are committed as soon as they become feasible.
    pub fn consumptive(&self) -> bool {
        !matches!(self.kind, JobKind::Mutate { .. } | JobKind::Scout { .. })
    }

    pub fn race(&self, catalog: &Catalog) -> Option<Race> {
        match &self.kind {
            JobKind::Build { product } => catalog.get(*product).race,
            JobKind::Trick { pledge, .. } => catalog.get(*pledge).race,
            _ => None,
        }
    }

    // -- Income --

    /// Income changes caused by this job, in time order. Times are derived
    /// from the job's current `initiated`, `started` and `completed`.
    pub fn mutations(&self, catalog: &Catalog) -> Vec<Mutation> {
        let mut mutations = Vec::new();
        match &self.kind {
            JobKind::Mutate { mutation } => {
                mutations.push(mutation.clone().at(self.started));
                return mutations;
            }
            JobKind::Scout { delay, .. } => {
                mutations.push(Mutation::scout().delayed(*delay).at(self.started));
                return mutations;
            }
            JobKind::Cancel { .. } => return mutations,
            _ => {}
        }

        for product in self.products_created(catalog) {
            let p = catalog.get(product);
            if p.is(ProductKind::Worker) {
                mutations.push(Mutation::shift(1, 0).at(self.completed));
            }
            if p.is(ProductKind::Base) {
                mutations.push(Mutation::base_started().at(self.started));
                mutations.push(Mutation::base_completed().at(self.completed));
            }
            if p.is(ProductKind::Geyser) {
                mutations.push(Mutation::geyser_started().at(self.started));
                mutations.push(Mutation::geyser_completed().at(self.completed));
            }
            if p.is(ProductKind::Mule) {
                mutations.push(Mutation::mule(1).at(self.started));
                mutations.push(Mutation::mule(-1).at(self.completed));
            }
        }

        // the builder leaves the mineral line
        if let JobKind::Build { product } = self.kind {
            let p = catalog.get(product);
            if p.is(ProductKind::Structure) {
                let leaves = self.initiated;
                let travel = self.started.since(self.initiated);
                let returns = match p.race {
                    Some(Race::Protoss) => self.started.plus(travel),
                    Some(Race::Terran) => self.completed.plus(travel),
                    Some(Race::Zerg) | None => Time::NEVER,
                };
                if leaves != returns {
                    mutations.push(Mutation::shift(-1, 0).at(leaves));
                    if !returns.is_never() {
                        mutations.push(Mutation::shift(1, 0).at(returns));
                    }
                }
            }
        }

        mutations.sort_by_key(|m| m.time);
        mutations
    }

    /// Earliest start allowed by the job itself when it would otherwise
    /// start at `start`.
    pub fn when(&self, start: Time, income: &IncomeSlots) -> Option<Time> {
        match &self.kind {
            JobKind::Mutate { mutation } => mutation.when(start, income),
            _ => None,
        }
    }

    /// Remove the recurring jobs this job cancels.
    pub fn cancel_recurring(&self, recurring: &mut Vec<Job>, catalog: &Catalog) -> Result<(), BuildError> {
        let JobKind::Cancel { product } = self.kind else {
            return Ok(());
        };
        let before = recurring.len();
        recurring.retain(|job| job.product_built() != Some(product));
        if recurring.len() == before {
            return Err(BuildError::Invalid {
                message: format!(
                    "There is no recurring job for {} to be cancelled.",
                    catalog.name(product)
                ),
                hint: "The cancel command can only be used to cancel recurring jobs, \
                       like '16 Marine [auto]'."
                    .to_string(),
            });
        }
        Ok(())
    }

    // -- Rendering --

    pub fn description(&self, catalog: &Catalog) -> String {
        match &self.kind {
            JobKind::Build { product } => catalog.name(*product).to_string(),
            JobKind::Cancel { product } => format!("Cancel {}", catalog.name(*product)),
            JobKind::Kill { product } => format!("Kill {}", catalog.name(*product)),
            JobKind::Mutate { mutation } => mutation.to_string(),
            JobKind::Scout { .. } => Mutation::scout().to_string(),
            JobKind::Trick {
                pledge,
                pledge_count,
                turn,
                turn_count,
            } => {
                let mut result = match pledge_count {
                    1 => String::new(),
                    2 => "Double ".to_string(),
                    n => format!("{n}x "),
                };
                let pledge = catalog.name(*pledge);
                match turn {
                    Some(_) => {
                        let _ = write!(result, "{pledge} Trick");
                    }
                    None => {
                        let _ = write!(result, "Fake {pledge}");
                    }
                }
                if let Some(turn) = turn {
                    let turn_name = catalog.name(*turn);
                    let implied = *turn_count == 1 && catalog.get(*turn).is(ProductKind::Worker);
                    if *turn_count != 0 && !implied {
                        let _ = write!(result, " into {turn_count} {turn_name}s");
                    }
                }
                result
            }
        }
    }

    /// The job as written in a build order, triggers included.
    pub fn label(&self, catalog: &Catalog) -> String {
        let mut label = String::new();
        if let Some(gas) = self.trigger_gas {
            let _ = write!(label, "@{gas} gas ");
        }
        if let Some(minerals) = self.trigger_minerals {
            let _ = write!(label, "@{minerals} minerals ");
        }
        if let Some(supply) = self.trigger_supply {
            let _ = write!(label, "{supply} ");
        }
        label.push_str(&self.description(catalog));
        if self.recurring {
            label.push_str(" [auto]");
        }
        label
    }
}

// ===========================================================================
// JobBook
// ===========================================================================

/// Committed jobs in commit order, addressable by [`JobId`].
#[derive(Debug, Clone, Default)]
pub struct JobBook {
    jobs: Vec<Job>,
    index: HashMap<JobId, usize>,
}

impl JobBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a committed job. A recurring job committed several times keeps
    /// the index of its first commit.
    pub fn push(&mut self, job: Job) {
        self.index.entry(job.id).or_insert(self.jobs.len());
        self.jobs.push(job);
    }

    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.index.get(&id).map(|&i| &self.jobs[i])
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn into_vec(self) -> Vec<Job> {
        self.jobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::MutationKind;
    use crate::test_utils::sample_catalog;

    fn t(secs: f64) -> Time {
        Time::from_secs(secs)
    }

    #[test]
    fn build_job_reads_product_costs() {
        let catalog = sample_catalog();
        let stalker = Job::build(catalog.id("Stalker").unwrap());
        assert_eq!(stalker.mineral_cost(&catalog), 125);
        assert_eq!(stalker.gas_cost(&catalog), 50);
        assert_eq!(stalker.supply_cost(&catalog, false), 2);
        assert_eq!(stalker.race(&catalog), Some(Race::Protoss));
        let (queues, all) = stalker.queue_types_expended(&catalog).unwrap();
        assert_eq!(queues.len(), 2);
        assert!(!all);
    }

    #[test]
    fn protoss_builder_returns_after_placing() {
        let catalog = sample_catalog();
        let mut pylon = Job::build(catalog.id("Pylon").unwrap());
        pylon.initiated = t(10.0);
        pylon.started = t(14.0);
        pylon.completed = t(39.0);
        let mutations = pylon.mutations(&catalog);
        let shifts: Vec<(i32, Time)> = mutations
            .iter()
            .filter(|m| m.kind == MutationKind::Shift)
            .map(|m| (m.mineral_change, m.time))
            .collect();
        assert_eq!(shifts, vec![(-1, t(10.0)), (1, t(18.0))]);
    }

    #[test]
    fn zerg_drone_never_returns() {
        let catalog = sample_catalog();
        let mut pool = Job::build(catalog.id("Spawning Pool").unwrap());
        pool.initiated = t(30.0);
        pool.started = t(35.0);
        pool.completed = t(81.0);
        let mutations = pool.mutations(&catalog);
        assert_eq!(mutations.len(), 1);
        assert_eq!(mutations[0].mineral_change, -1);
        assert_eq!(mutations[0].time, t(30.0));
    }

    #[test]
    fn worker_joins_minerals_on_completion() {
        let catalog = sample_catalog();
        let mut probe = Job::build(catalog.id("Probe").unwrap());
        probe.started = t(0.0);
        probe.completed = t(12.0);
        let mutations = probe.mutations(&catalog);
        assert_eq!(mutations, vec![Mutation::shift(1, 0).at(t(12.0))]);
    }

    #[test]
    fn trick_costs_and_refunds() {
        let catalog = sample_catalog();
        let extractor = catalog.id("Extractor").unwrap();
        let drone = catalog.id("Drone").unwrap();
        let trick = Job::trick(extractor, 2, Some((drone, 2)));
        assert_eq!(trick.mineral_cost(&catalog), 2 * 25 + 2 * 50);
        assert_eq!(trick.mineral_refund(&catalog), 2 * 18);
        assert_eq!(trick.supply_cost(&catalog, false), 2);
        assert_eq!(trick.description(&catalog), "Double Extractor Trick into 2 Drones");
        let fake = Job::trick(extractor, 1, None);
        assert_eq!(fake.description(&catalog), "Fake Extractor");
        assert!(fake.products_created(&catalog).is_empty());
    }

    #[test]
    fn kill_releases_population() {
        let catalog = sample_catalog();
        let kill = Job::kill(catalog.id("Overlord").unwrap());
        assert_eq!(kill.products_destroyed().len(), 1);
        assert_eq!(kill.supply_cost(&catalog, true), 0);
        assert_eq!(kill.description(&catalog), "Kill Overlord");
    }

    #[test]
    fn cancel_removes_matching_recurring_jobs() {
        let catalog = sample_catalog();
        let probe = catalog.id("Probe").unwrap();
        let mut recurring = vec![Job::build(probe).recurring()];
        let cancel = Job::cancel(probe);
        cancel.cancel_recurring(&mut recurring, &catalog).unwrap();
        assert!(recurring.is_empty());
        let err = cancel.cancel_recurring(&mut recurring, &catalog).unwrap_err();
        assert!(err.to_string().contains("no recurring job for Probe"));
    }

    #[test]
    fn scout_is_not_consumptive() {
        let catalog = sample_catalog();
        let worker = catalog.id("Scouting Worker").unwrap();
        let mut scout = Job::scout(worker, Some(Fixed64::from_num(40)));
        scout.started = t(20.0);
        assert!(!scout.consumptive());
        assert_eq!(scout.duration(&catalog), Fixed64::from_num(40));
        assert_eq!(scout.queue_types_created(&catalog), vec![worker]);
        let mutations = scout.mutations(&catalog);
        assert_eq!(mutations[0].delay, Some(Fixed64::from_num(40)));
    }

    #[test]
    fn label_includes_triggers() {
        let catalog = sample_catalog();
        let job = Job::build(catalog.id("Gateway").unwrap()).at_supply(10).at_minerals(150);
        assert_eq!(job.label(&catalog), "@150 minerals 10 Gateway");
        let auto = Job::build(catalog.id("Probe").unwrap()).recurring();
        assert_eq!(auto.label(&catalog), "Probe [auto]");
    }

    #[test]
    fn book_indexes_first_commit() {
        let mut book = JobBook::new();
        let mut job = Job::build(ProductId(0));
        job.id = JobId(3);
        job.started = t(1.0);
        book.push(job.clone());
        job.started = t(2.0);
        book.push(job);
        assert_eq!(book.len(), 2);
        assert_eq!(book.get(JobId(3)).unwrap().started, t(1.0));
        assert!(!book.contains(JobId(4)));
    }
}

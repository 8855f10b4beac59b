//! The calculator facade.
//!
//! [`BuildOrder`] is the input boundary: jobs in the order they were written,
//! plus checkpoints. [`Calculator::run`] validates the order, seeds a
//! timeline for the race, schedules every job and packages the outcome as a
//! [`BuildReport`].

use crate::catalog::{Catalog, Race};
use crate::config::EconomyConfig;
use crate::error::BuildError;
use crate::event::{Checkpoint, Event};
use crate::fixed::Time;
use crate::hatchery::LarvaTimings;
use crate::income::Stock;
use crate::init::StartingScenario;
use crate::job::{Job, JobId};
use crate::queue::QueueUsage;
use crate::scheduler::Scheduler;
use serde::Serialize;
use tracing::{Dispatch, debug};

// ===========================================================================
// BuildOrder
// ===========================================================================

/// Jobs and annotations of one build, in written order.
#[derive(Debug, Clone, Default)]
pub struct BuildOrder {
    jobs: Vec<Job>,
    checkpoints: Vec<Checkpoint>,
}

impl BuildOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job, assigning the next id. Dependencies refer to these ids.
    pub fn push(&mut self, mut job: Job) -> JobId {
        let id = JobId(self.jobs.len() as u32);
        job.id = id;
        self.jobs.push(job);
        id
    }

    pub fn checkpoint(&mut self, checkpoint: Checkpoint) {
        self.checkpoints.push(checkpoint);
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

// ===========================================================================
// BuildReport
// ===========================================================================

/// One committed job, as reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledJob {
    pub id: JobId,
    pub description: String,
    pub label: String,
    pub initiated: Time,
    pub started: Time,
    pub completed: Time,
    pub recurring: bool,
}

/// Outcome of a successful calculation.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub race: Race,
    /// Committed jobs in commit order.
    pub jobs: Vec<ScheduledJob>,
    pub supply_count: i32,
    pub events: Vec<Event>,
    /// Latest completion of any job.
    pub end_time: Time,
    pub queue_usage: Vec<QueueUsage>,
    pub larva_timings: Vec<LarvaTimings>,
    /// Minerals and gas mined from the start until `end_time`.
    pub total_mined: Stock,
}

impl BuildReport {
    /// The first committed job with the given description.
    pub fn job(&self, description: &str) -> Option<&ScheduledJob> {
        self.jobs.iter().find(|j| j.description == description)
    }

    /// Every committed job with the given description.
    pub fn jobs_named<'a>(&'a self, description: &'a str) -> impl Iterator<Item = &'a ScheduledJob> {
        self.jobs.iter().filter(move |j| j.description == description)
    }

    #[cfg(feature = "json")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

// ===========================================================================
// Calculator
// ===========================================================================

/// Runs build orders against one catalog and one set of economy constants.
#[derive(Debug, Clone)]
pub struct Calculator<'c> {
    catalog: &'c Catalog,
    config: EconomyConfig,
    trace: Option<Dispatch>,
    require_triggers: bool,
}

impl<'c> Calculator<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            config: EconomyConfig::default(),
            trace: None,
            require_triggers: true,
        }
    }

    pub fn with_config(mut self, config: EconomyConfig) -> Self {
        self.config = config;
        self
    }

    /// Route this calculator's diagnostics to `dispatch` for the duration of
    /// each run. Without one, events go to whatever subscriber is current.
    pub fn with_trace(mut self, dispatch: Dispatch) -> Self {
        self.trace = Some(dispatch);
        self
    }

    /// Whether jobs without a trigger or dependency are rejected. On by
    /// default.
    pub fn require_triggers(mut self, require: bool) -> Self {
        self.require_triggers = require;
        self
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    pub fn run(&self, order: &BuildOrder) -> Result<BuildReport, BuildError> {
        match &self.trace {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, || self.calculate(order)),
            None => self.calculate(order),
        }
    }

    fn calculate(&self, order: &BuildOrder) -> Result<BuildReport, BuildError> {
        self.config.validate()?;
        if order.is_empty() {
            return Err(BuildError::EmptyBuild);
        }
        let race = self.race(order)?;
        if self.require_triggers {
            let untriggered = order
                .jobs()
                .iter()
                .find(|j| !j.recurring && !j.has_trigger() && j.dependency.is_none());
            if let Some(job) = untriggered {
                return Err(BuildError::MissingTrigger {
                    job: job.label(self.catalog),
                });
            }
        }

        let (mut timeline, mut worker) =
            StartingScenario::new(race, &self.config).initialise(self.catalog)?;
        for checkpoint in order.checkpoints() {
            timeline.add_checkpoint(checkpoint.clone());
        }
        let mut jobs = order.jobs().to_vec();
        worker.id = JobId(jobs.len() as u32);
        jobs.push(worker);

        debug!(%race, jobs = jobs.len(), "calculating build order");
        let schedule = Scheduler::new(timeline, jobs).schedule()?;
        let timeline = schedule.timeline;

        let end_time = schedule
            .jobs
            .iter()
            .map(|j| j.completed)
            .filter(|t| !t.is_never())
            .max()
            .unwrap_or(Time::ZERO);
        let jobs = schedule
            .jobs
            .iter()
            .map(|j| ScheduledJob {
                id: j.id,
                description: j.description(self.catalog),
                label: j.label(self.catalog),
                initiated: j.initiated,
                started: j.started,
                completed: j.completed,
                recurring: j.recurring,
            })
            .collect();

        debug!(%end_time, supply = timeline.supply_count, "build order calculated");
        Ok(BuildReport {
            race,
            jobs,
            supply_count: timeline.supply_count,
            events: timeline.events().to_vec(),
            end_time,
            queue_usage: timeline.queues.usage(self.catalog, end_time),
            larva_timings: timeline.hatcheries.larva_timings(),
            total_mined: timeline.income.total_mined(end_time),
        })
    }

    /// The single race of every race-specific job.
    fn race(&self, order: &BuildOrder) -> Result<Race, BuildError> {
        let mut race = None;
        for job in order.jobs() {
            let Some(current) = job.race(self.catalog) else {
                continue;
            };
            match race {
                None => race = Some(current),
                Some(first) if first != current => {
                    return Err(BuildError::MixedRaces {
                        first,
                        second: current,
                    });
                }
                Some(_) => {}
            }
        }
        race.ok_or(BuildError::NoRace)
    }
}

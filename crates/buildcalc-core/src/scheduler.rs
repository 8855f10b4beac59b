//! Order of commits.
//!
//! Jobs with an explicit trigger are *fixed* and run strictly in the order
//! given. All other jobs *float*: before each fixed job the scheduler squeezes
//! in floating and recurring jobs that fit without delaying it, and once the
//! fixed jobs are done the remaining floating jobs run earliest first.
//!
//! A squeeze candidate must survive every filter in turn: recurring copies of
//! the fixed job's product, jobs not available in time, jobs moving the
//! population the wrong way, jobs the bank cannot pay for alongside the fixed
//! job, jobs stalling the fixed job's larvae, queues or energy, and jobs that
//! overshoot the population gap or the capacity. The earliest survivor wins.

use crate::availability::Availability;
use crate::error::{BuildError, Diagnostic, InvariantViolation};
use crate::fixed::{Fixed64, Time};
use crate::job::{Job, JobBook, JobId};
use crate::snapshot::WhatIf;
use crate::timeline::Timeline;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pool {
    Floating,
    Recurring,
}

/// Position of a pending job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    pool: Pool,
    index: usize,
}

/// Committed state: the timeline plus every job committed to it.
#[derive(Debug)]
struct Ledger<'c> {
    timeline: Timeline<'c>,
    committed: JobBook,
    /// Labels of every job of the build order, for diagnostics.
    labels: HashMap<JobId, String>,
}

impl Ledger<'_> {
    fn calculate(&self, job: &mut Job) -> Result<Time, InvariantViolation> {
        let started = self.timeline.calculate(job, &self.committed)?;
        if let Availability::MissingDependency { job: target, label } = &mut job.availability {
            if let Some(name) = self.labels.get(target) {
                label.clone_from(name);
            }
        }
        Ok(started)
    }
}

/// Jobs in commit order and the timeline they were committed to.
#[derive(Debug)]
pub struct Schedule<'c> {
    pub jobs: Vec<Job>,
    pub timeline: Timeline<'c>,
}

/// Explicit population trigger, or the ceiling derived for a fixed job.
fn population_target(job: &Job) -> Option<i32> {
    job.trigger_supply.or(job.supply_ceiling)
}

#[derive(Debug)]
pub struct Scheduler<'c> {
    ledger: Ledger<'c>,
    fixed: Vec<Job>,
    /// Index of the fixed job being scheduled.
    cursor: usize,
    floating: Vec<Job>,
    recurring: Vec<Job>,
    next_id: u32,
}

impl<'c> Scheduler<'c> {
    pub fn new(timeline: Timeline<'c>, jobs: Vec<Job>) -> Self {
        let catalog = timeline.catalog();
        let labels = jobs.iter().map(|j| (j.id, j.label(catalog))).collect();
        let next_id = jobs.iter().map(|j| j.id.0 + 1).max().unwrap_or(0);
        let mut fixed = Vec::new();
        let mut floating = Vec::new();
        let mut recurring = Vec::new();
        for job in jobs {
            if job.has_trigger() {
                fixed.push(job);
            } else if job.recurring {
                recurring.push(job);
            } else {
                floating.push(job);
            }
        }
        Self {
            ledger: Ledger {
                timeline,
                committed: JobBook::new(),
                labels,
            },
            fixed,
            cursor: 0,
            floating,
            recurring,
            next_id,
        }
    }

    /// Schedule every job. Recurring jobs only run when squeezed in.
    pub fn schedule(mut self) -> Result<Schedule<'c>, BuildError> {
        debug!(
            fixed = self.fixed.len(),
            floating = self.floating.len(),
            recurring = self.recurring.len(),
            "scheduling"
        );

        while self.cursor < self.fixed.len() {
            let mut job = self.fixed[self.cursor].clone();

            // squeeze until the fixed job becomes available
            loop {
                let started = self.ledger.calculate(&mut job)?;
                if !started.is_never() || self.dead_end(&job)? || !self.squeeze(&job, None)? {
                    break;
                }
            }
            if job.started.is_never() {
                return Err(self.report_unavailable(std::slice::from_mut(&mut job)));
            }

            if job.trigger_supply.is_none() {
                job.supply_ceiling = self.ceiling(&job);
                trace!(ceiling = ?job.supply_ceiling, "derived population ceiling");
            }

            while self.squeeze(&job, None)? {
                if self.ledger.calculate(&mut job)?.is_never() {
                    return Err(self.report_unavailable(std::slice::from_mut(&mut job)));
                }
            }

            self.cursor += 1;
            self.commit(job)?;
        }

        while !self.floating.is_empty() {
            let Some(index) = self.earliest_floating()? else {
                let mut pending = std::mem::take(&mut self.floating);
                return Err(self.report_unavailable(&mut pending));
            };
            let mut job = self.floating.remove(index);
            while self.squeeze(&job, Some(Pool::Recurring))? {
                if self.ledger.calculate(&mut job)?.is_never() {
                    return Err(self.report_unavailable(std::slice::from_mut(&mut job)));
                }
            }
            self.commit(job)?;
        }

        self.ledger.timeline.process_checkpoints(Time::NEVER)?;
        Ok(Schedule {
            jobs: self.ledger.committed.into_vec(),
            timeline: self.ledger.timeline,
        })
    }

    fn job(&self, slot: Slot) -> &Job {
        match slot.pool {
            Pool::Floating => &self.floating[slot.index],
            Pool::Recurring => &self.recurring[slot.index],
        }
    }

    fn calculate_slot(&mut self, slot: Slot) -> Result<Time, InvariantViolation> {
        let job = match slot.pool {
            Pool::Floating => &mut self.floating[slot.index],
            Pool::Recurring => &mut self.recurring[slot.index],
        };
        self.ledger.calculate(job)
    }

    /// Pending jobs of `pool`, or of both pools, floating first.
    fn slots(&self, pool: Option<Pool>) -> Vec<Slot> {
        let floating = (0..self.floating.len()).map(|index| Slot {
            pool: Pool::Floating,
            index,
        });
        let recurring = (0..self.recurring.len()).map(|index| Slot {
            pool: Pool::Recurring,
            index,
        });
        match pool {
            None => floating.chain(recurring).collect(),
            Some(Pool::Floating) => floating.collect(),
            Some(Pool::Recurring) => recurring.collect(),
        }
    }

    /// Earliest available floating job; ties go to the first declared.
    fn earliest_floating(&mut self) -> Result<Option<usize>, InvariantViolation> {
        let mut best: Option<(usize, Time)> = None;
        for index in 0..self.floating.len() {
            let started = self.ledger.calculate(&mut self.floating[index])?;
            if !started.is_never() && best.is_none_or(|(_, t)| started < t) {
                best = Some((index, started));
            }
        }
        Ok(best.map(|(index, _)| index))
    }

    /// Whether no pending job could lift the block on `job`. Any available
    /// non-recurring job counts as a way out.
    fn dead_end(&mut self, job: &Job) -> Result<bool, InvariantViolation> {
        let catalog = self.ledger.timeline.catalog();
        for slot in self.slots(None) {
            if self.calculate_slot(slot)?.is_never() {
                continue;
            }
            let candidate = self.job(slot);
            if !candidate.recurring || job.availability.solved_by(candidate, catalog) {
                trace!(
                    blocked = %job.availability,
                    candidate = %candidate.label(catalog),
                    "not a dead end"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Population the fixed job may reach: the next explicit trigger minus
    /// the population added by the fixed jobs up to it.
    fn ceiling(&self, current: &Job) -> Option<i32> {
        let catalog = self.ledger.timeline.catalog();
        let mut delta = current.supply_cost(catalog, false);
        for later in self.fixed.get(self.cursor + 1..).unwrap_or_default() {
            if let Some(trigger) = later.trigger_supply {
                return Some(trigger - delta);
            }
            delta += later.supply_cost(catalog, false);
        }
        None
    }

    /// Distance to the population target of the next fixed job that has one.
    fn supply_gap(&self, current: &Job) -> Option<i32> {
        if self.cursor >= self.fixed.len() {
            return None;
        }
        let rest = self.fixed.get(self.cursor + 1..).unwrap_or_default();
        std::iter::once(current)
            .chain(rest)
            .find_map(population_target)
            .map(|target| target - self.ledger.timeline.supply_count)
    }

    /// Whether the bank covers `job` and `fixed` at the fixed job's start,
    /// counting the income changes `job` itself causes.
    fn affordable_alongside(&self, job: &Job, fixed: &Job) -> Result<bool, InvariantViolation> {
        let timeline = &self.ledger.timeline;
        let catalog = timeline.catalog();
        let minerals = job.mineral_cost(catalog);
        let gas = job.gas_cost(catalog);
        if minerals == 0 && gas == 0 {
            return Ok(true);
        }

        let mut projected = job.clone();
        projected.completed = timeline.when_complete(job)?.completed;
        let mutations = projected.mutations(catalog);
        let surplus = if mutations.is_empty() {
            timeline.income.surplus(fixed.started)
        } else {
            timeline.income.what_if(|income| {
                for mutation in mutations.iter().filter(|m| !m.time.is_never()) {
                    income.splice(mutation)?;
                }
                Ok::<_, InvariantViolation>(income.surplus(fixed.started))
            })?
        };

        let minerals_needed = Fixed64::from_num(minerals + fixed.mineral_cost(catalog));
        let gas_needed = Fixed64::from_num(gas + fixed.gas_cost(catalog));
        Ok(surplus.minerals.round() >= minerals_needed && surplus.gas.round() >= gas_needed)
    }

    /// Commit one floating or recurring job ahead of `fixed`. Squeezing is
    /// mandatory while `fixed` is unavailable; then running out of candidates
    /// is an error.
    fn squeeze(&mut self, fixed: &Job, pool: Option<Pool>) -> Result<bool, BuildError> {
        let catalog = self.ledger.timeline.catalog();
        let mandatory = !fixed.availability.is_available();
        let mut candidates = self.slots(pool);
        trace!(
            fixed = %fixed.label(catalog),
            mandatory,
            candidates = candidates.len(),
            "squeeze"
        );

        if !mandatory {
            if let Some(product) = fixed.product_built() {
                candidates.retain(|&slot| {
                    let job = self.job(slot);
                    !(job.recurring && job.product_built() == Some(product))
                });
            }
        }

        for &slot in &candidates {
            self.calculate_slot(slot)?;
        }
        candidates.retain(|&slot| {
            let started = self.job(slot).started;
            if mandatory {
                !started.is_never()
            } else {
                started <= fixed.started
            }
        });

        if let Some(target) = population_target(fixed) {
            let gap = target - self.ledger.timeline.supply_count;
            candidates.retain(|&slot| {
                let cost = self.job(slot).supply_cost(catalog, true);
                match gap.cmp(&0) {
                    Ordering::Equal => cost == 0,
                    Ordering::Greater => (0..=gap).contains(&cost),
                    Ordering::Less => (gap..=0).contains(&cost),
                }
            });
        }

        if !mandatory {
            let mut affordable = Vec::with_capacity(candidates.len());
            for slot in candidates {
                if self.affordable_alongside(self.job(slot), fixed)? {
                    affordable.push(slot);
                }
            }
            let mut accommodated = Vec::with_capacity(affordable.len());
            for slot in affordable {
                if self.ledger.timeline.can_accommodate(self.job(slot), fixed)? {
                    accommodated.push(slot);
                }
            }
            candidates = accommodated;
        }

        if let Some(gap) = self.supply_gap(fixed) {
            if gap >= 0 {
                candidates.retain(|&slot| self.job(slot).supply_cost(catalog, true) <= gap);
            }
        }

        let timeline = &self.ledger.timeline;
        candidates.retain(|&slot| {
            let cost = self.job(slot).supply_cost(catalog, true);
            if cost <= 0 {
                return true;
            }
            let needed = timeline.supply_count + fixed.supply_cost(catalog, true) + cost;
            let capacity = timeline.farms.when(needed).unwrap_or(Time::NEVER);
            if mandatory {
                !capacity.is_never()
            } else {
                capacity <= fixed.started
            }
        });

        let mut chosen: Option<Slot> = None;
        for &slot in &candidates {
            if chosen.is_none_or(|best| self.job(slot).started < self.job(best).started) {
                chosen = Some(slot);
            }
        }
        let Some(slot) = chosen else {
            trace!("every squeeze candidate eliminated");
            if mandatory {
                let mut fixed = fixed.clone();
                return Err(self.report_unavailable(std::slice::from_mut(&mut fixed)));
            }
            return Ok(false);
        };

        let job = match slot.pool {
            Pool::Floating => self.floating.remove(slot.index),
            Pool::Recurring => self.recurring.remove(slot.index),
        };
        debug!(
            job = %job.label(catalog),
            before = %fixed.label(catalog),
            started = %job.started,
            "squeezed in"
        );
        let requeue = job.recurring.then(|| {
            let mut copy = job.clone();
            copy.id = JobId(self.next_id);
            copy.pick_order = None;
            copy
        });
        if requeue.is_some() {
            self.next_id += 1;
        }
        self.commit(job)?;
        self.recurring.extend(requeue);
        Ok(true)
    }

    /// Commit `job`, apply its cancellations and commit any pure income
    /// change that has become feasible.
    fn commit(&mut self, mut job: Job) -> Result<(), BuildError> {
        let catalog = self.ledger.timeline.catalog();
        job.pick_order = Some(self.ledger.committed.len());
        self.ledger.timeline.process(&mut job, false)?;
        job.cancel_recurring(&mut self.recurring, catalog)?;
        debug!(
            job = %job.label(catalog),
            started = %job.started,
            completed = %job.completed,
            supply = self.ledger.timeline.supply_count,
            "committed"
        );
        self.ledger.committed.push(job);

        let mut index = 0;
        while index < self.floating.len() {
            if !self.floating[index].consumptive()
                && !self.ledger.calculate(&mut self.floating[index])?.is_never()
            {
                let mut pure = self.floating.remove(index);
                self.ledger.timeline.process(&mut pure, true)?;
                pure.pick_order = Some(self.ledger.committed.len());
                debug!(job = %pure.label(catalog), started = %pure.started, "committed income change");
                self.ledger.committed.push(pure);
                continue;
            }
            index += 1;
        }
        Ok(())
    }

    /// One diagnostic per blocked job, leaving out jobs that only wait on
    /// another reported job.
    fn report_unavailable(&self, jobs: &mut [Job]) -> BuildError {
        for job in jobs.iter_mut() {
            if let Err(violation) = self.ledger.calculate(job) {
                return violation.into();
            }
        }
        let catalog = self.ledger.timeline.catalog();
        let reported: HashSet<JobId> = jobs.iter().map(|j| j.id).collect();
        let diagnose = |job: &Job| Diagnostic {
            job: job.label(catalog),
            availability: job.availability.clone(),
            hint: job.availability.hint(),
        };
        let mut diagnostics: Vec<Diagnostic> = jobs
            .iter()
            .filter(|j| !j.availability.is_available())
            .filter(|j| {
                !matches!(
                    &j.availability,
                    Availability::MissingDependency { job: target, .. } if reported.contains(target)
                )
            })
            .map(diagnose)
            .collect();
        if diagnostics.is_empty() {
            diagnostics = jobs
                .iter()
                .filter(|j| !j.availability.is_available())
                .map(diagnose)
                .collect();
        }
        debug!(blocked = diagnostics.len(), "build order unschedulable");
        BuildError::Unschedulable(diagnostics)
    }
}

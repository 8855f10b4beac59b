//! Timed changes to the worker allocation.
//!
//! A [`Mutation`] moves workers on or off minerals and gas, or changes the
//! set of mining sites. Worker moves are spread over the individual sites the
//! first time the mutation meets a slot; that [`Distribution`] is then
//! replayed unchanged on every later slot so that splitting a slot never
//! changes where workers went.

use crate::error::InvariantViolation;
use crate::fixed::{Fixed64, Time};
use crate::income::{IncomeSlot, IncomeSlots};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Minerals,
    Gas,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Minerals => "minerals",
            Resource::Gas => "gas",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationKind {
    /// Put workers on, or take them off, minerals and gas.
    Shift,
    /// Move workers from the existing sites onto the newest site.
    Transfer,
    /// A worker leaves the minerals to scout.
    Scout,
    BaseStarted,
    BaseCompleted,
    GeyserStarted,
    GeyserCompleted,
    /// Add (or remove, when negative) temporary harvesters.
    Mule(i32),
}

/// A timed change in the worker allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    pub kind: MutationKind,
    pub mineral_change: i32,
    pub gas_change: i32,
    pub time: Time,
    /// When set, workers are withdrawn at `time` and only arrive at their
    /// destination `delay` seconds later.
    pub delay: Option<Fixed64>,
}

impl Mutation {
    fn new(kind: MutationKind, mineral_change: i32, gas_change: i32) -> Self {
        Self {
            kind,
            mineral_change,
            gas_change,
            time: Time::ZERO,
            delay: None,
        }
    }

    pub fn shift(mineral_change: i32, gas_change: i32) -> Self {
        Self::new(MutationKind::Shift, mineral_change, gas_change)
    }

    /// Move `count` workers to the most recently added site of `resource`.
    pub fn transfer(resource: Resource, count: i32) -> Self {
        match resource {
            Resource::Minerals => Self::new(MutationKind::Transfer, count, 0),
            Resource::Gas => Self::new(MutationKind::Transfer, 0, count),
        }
    }

    pub fn scout() -> Self {
        Self::new(MutationKind::Scout, -1, 0)
    }

    pub fn base_started() -> Self {
        Self::new(MutationKind::BaseStarted, 0, 0)
    }

    pub fn base_completed() -> Self {
        Self::new(MutationKind::BaseCompleted, 0, 0)
    }

    pub fn geyser_started() -> Self {
        Self::new(MutationKind::GeyserStarted, 0, 0)
    }

    pub fn geyser_completed() -> Self {
        Self::new(MutationKind::GeyserCompleted, 0, 0)
    }

    pub fn mule(count: i32) -> Self {
        Self::new(MutationKind::Mule(count), 0, 0)
    }

    pub fn at(mut self, time: Time) -> Self {
        self.time = time;
        self
    }

    pub fn delayed(mut self, delay: Option<Fixed64>) -> Self {
        self.delay = delay;
        self
    }

    /// Structural mutations change the set of sites rather than moving workers.
    fn is_structural(&self) -> bool {
        !matches!(
            self.kind,
            MutationKind::Shift | MutationKind::Transfer | MutationKind::Scout
        )
    }

    /// Spread the aggregate worker changes over the sites of `slot`.
    pub fn distribute(&self, slot: &IncomeSlot) -> Result<Distribution, InvariantViolation> {
        let mut distribution = Distribution::default();
        if self.is_structural() {
            return Ok(distribution);
        }
        if self.gas_change != 0 {
            let changes = match self.kind {
                MutationKind::Transfer => {
                    spread_to_newest(&slot.gas_miners, self.gas_change, Resource::Gas)?
                }
                _ => spread(&slot.gas_miners, None, self.gas_change, Resource::Gas)?,
            };
            distribution.gas = Some(SiteDeltas::from_changes(&changes));
        }
        if self.mineral_change != 0 {
            let changes = match self.kind {
                MutationKind::Transfer => spread_to_newest(
                    &slot.mineral_miners,
                    self.mineral_change,
                    Resource::Minerals,
                )?,
                _ => spread(
                    &slot.mineral_miners,
                    Some(&slot.bases_operational),
                    self.mineral_change,
                    Resource::Minerals,
                )?,
            };
            distribution.minerals = Some(SiteDeltas::from_changes(&changes));
        }
        Ok(distribution)
    }

    /// Earliest time this mutation can take effect. Putting workers on gas
    /// waits for an operational geyser with room; other mutations impose no
    /// constraint.
    pub fn when(&self, time: Time, income: &IncomeSlots) -> Option<Time> {
        if self.gas_change <= 0 || self.kind == MutationKind::Transfer {
            return None;
        }
        let saturation = income.rates().gas_saturation;
        let room = income.slots().iter().filter(|slot| slot.end > time).find(|slot| {
            slot.gas_miners
                .iter()
                .zip(&slot.geysers_operational)
                .any(|(&miners, &operational)| operational && miners < saturation)
        });
        Some(room.map_or(Time::NEVER, |slot| slot.start))
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MutationKind::Shift => {
                if self.gas_change == -self.mineral_change && self.gas_change != 0 {
                    return if self.gas_change > 0 {
                        write!(f, "Transfer {} workers to gas", self.gas_change)
                    } else {
                        write!(f, "Transfer {} workers to minerals", self.mineral_change)
                    };
                }
                let mut changes = Vec::new();
                if self.gas_change != 0 {
                    changes.push(format!("{:+} workers on gas", self.gas_change));
                }
                if self.mineral_change != 0 {
                    changes.push(format!("{:+} workers on minerals", self.mineral_change));
                }
                f.write_str(&changes.join(", "))
            }
            MutationKind::Transfer => {
                if self.mineral_change != 0 {
                    write!(f, "Transfer {} workers to new base", self.mineral_change)?;
                }
                if self.gas_change != 0 {
                    write!(f, "Transfer {} workers to new geyser", self.gas_change)?;
                }
                Ok(())
            }
            MutationKind::Scout => f.write_str("Send scout"),
            MutationKind::BaseStarted => f.write_str("New base started"),
            MutationKind::BaseCompleted => f.write_str("New base completed"),
            MutationKind::GeyserStarted => f.write_str("New geyser started"),
            MutationKind::GeyserCompleted => f.write_str("New geyser completed"),
            MutationKind::Mule(n) if n >= 0 => f.write_str("Start MULE use"),
            MutationKind::Mule(_) => f.write_str("End MULE use"),
        }
    }
}

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

/// Per-site worker changes, split into withdrawals and arrivals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteDeltas {
    pub negative: Vec<i32>,
    pub positive: Vec<i32>,
}

impl SiteDeltas {
    fn from_changes(changes: &[i32]) -> Self {
        Self {
            negative: changes.iter().map(|&c| c.min(0)).collect(),
            positive: changes.iter().map(|&c| c.max(0)).collect(),
        }
    }

    /// Signed sum of all per-site changes.
    pub fn net(&self) -> i32 {
        self.negative.iter().chain(&self.positive).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distribution {
    pub minerals: Option<SiteDeltas>,
    pub gas: Option<SiteDeltas>,
}

/// One site at a time: withdrawals come from the most saturated site,
/// arrivals go to the least saturated one. When `operational` is given only
/// operational sites (and always the first) may receive workers.
fn spread(
    miners: &[i32],
    operational: Option<&[bool]>,
    change: i32,
    resource: Resource,
) -> Result<Vec<i32>, InvariantViolation> {
    if miners.is_empty() {
        return Err(InvariantViolation::NoMiningSite(resource));
    }
    if miners.len() == 1 {
        return Ok(vec![change]);
    }
    let mut changes = vec![0; miners.len()];
    let load = |changes: &[i32], i: usize| miners[i] + changes[i];
    for _ in 0..change.unsigned_abs() {
        let mut pick = 0;
        for i in 1..miners.len() {
            let better = if change < 0 {
                load(&changes, i) > load(&changes, pick)
            } else {
                operational.is_none_or(|op| op.get(i).copied().unwrap_or(false))
                    && load(&changes, i) < load(&changes, pick)
            };
            if better {
                pick = i;
            }
        }
        changes[pick] += change.signum();
    }
    Ok(changes)
}

/// Withdraw `count` workers from the most saturated of the older sites and
/// place them all on the newest site.
fn spread_to_newest(
    miners: &[i32],
    count: i32,
    resource: Resource,
) -> Result<Vec<i32>, InvariantViolation> {
    if miners.len() < 2 {
        return Err(InvariantViolation::TransferNeedsSites(resource));
    }
    let newest = miners.len() - 1;
    let mut changes = vec![0; miners.len()];
    for _ in 0..count.max(0) {
        let mut pick = 0;
        for i in 1..newest {
            if miners[i] + changes[i] > miners[pick] + changes[pick] {
                pick = i;
            }
        }
        changes[pick] -= 1;
    }
    changes[newest] += count.max(0);
    Ok(changes)
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

/// A mutation being applied to consecutive slots. The distribution is fixed
/// by the first slot it meets.
pub(crate) struct Replay<'a> {
    mutation: &'a Mutation,
    distribution: Option<Distribution>,
}

impl<'a> Replay<'a> {
    pub(crate) fn new(mutation: &'a Mutation) -> Self {
        Self {
            mutation,
            distribution: None,
        }
    }

    pub(crate) fn apply(&mut self, slot: &mut IncomeSlot) -> Result<(), InvariantViolation> {
        if self.mutation.is_structural() {
            return self.apply_structural(slot);
        }
        self.apply_negative(slot)?;
        self.apply_positive(slot)
    }

    pub(crate) fn apply_negative(&mut self, slot: &mut IncomeSlot) -> Result<(), InvariantViolation> {
        if self.mutation.is_structural() {
            return self.apply_structural(slot);
        }
        if self.distribution.is_none() {
            self.distribution = Some(self.mutation.distribute(slot)?);
        }
        let Some(distribution) = &self.distribution else {
            return Ok(());
        };
        if let Some(gas) = &distribution.gas {
            add_to_sites(&mut slot.gas_miners, &gas.negative, Resource::Gas)?;
        }
        if let Some(minerals) = &distribution.minerals {
            add_to_sites(&mut slot.mineral_miners, &minerals.negative, Resource::Minerals)?;
        }
        Ok(())
    }

    pub(crate) fn apply_positive(&mut self, slot: &mut IncomeSlot) -> Result<(), InvariantViolation> {
        if self.mutation.is_structural() {
            return Ok(());
        }
        if self.distribution.is_none() {
            self.distribution = Some(self.mutation.distribute(slot)?);
        }
        let Some(distribution) = &self.distribution else {
            return Ok(());
        };
        if let Some(gas) = &distribution.gas {
            add_to_sites(&mut slot.gas_miners, &gas.positive, Resource::Gas)?;
        }
        if let Some(minerals) = &distribution.minerals {
            add_to_sites(&mut slot.mineral_miners, &minerals.positive, Resource::Minerals)?;
        }
        Ok(())
    }

    fn apply_structural(&self, slot: &mut IncomeSlot) -> Result<(), InvariantViolation> {
        match self.mutation.kind {
            MutationKind::BaseStarted => {
                slot.mineral_miners.push(0);
                slot.bases_operational.push(false);
            }
            MutationKind::BaseCompleted => {
                complete_site(&mut slot.bases_operational, Resource::Minerals)?;
            }
            MutationKind::GeyserStarted => {
                slot.gas_miners.push(0);
                slot.geysers_operational.push(false);
            }
            MutationKind::GeyserCompleted => {
                complete_site(&mut slot.geysers_operational, Resource::Gas)?;
            }
            MutationKind::Mule(count) => slot.mules += count,
            MutationKind::Shift | MutationKind::Transfer | MutationKind::Scout => {}
        }
        Ok(())
    }
}

fn add_to_sites(
    miners: &mut [i32],
    deltas: &[i32],
    resource: Resource,
) -> Result<(), InvariantViolation> {
    for (i, &delta) in deltas.iter().enumerate() {
        if delta == 0 {
            continue;
        }
        let site = miners
            .get_mut(i)
            .ok_or(InvariantViolation::NoMiningSite(resource))?;
        *site += delta;
        if *site < 0 {
            return Err(InvariantViolation::WorkerUnderflow(resource));
        }
    }
    Ok(())
}

fn complete_site(operational: &mut [bool], resource: Resource) -> Result<(), InvariantViolation> {
    let site = operational
        .iter_mut()
        .find(|op| !**op)
        .ok_or(InvariantViolation::NothingToComplete(resource))?;
    *site = true;
    Ok(())
}

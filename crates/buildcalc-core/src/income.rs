//! Piecewise-constant resource income.
//!
//! Income is a sequence of [`IncomeSlot`]s partitioning `[0, NEVER)`. Inside a
//! slot the worker allocation, and therefore the mining rate, is constant.
//! Every [`Mutation`] splits the slot it falls in and is replayed on all
//! later slots.

use crate::config::MiningRates;
use crate::error::InvariantViolation;
use crate::fixed::{Fixed64, Time, checked_div_64};
use crate::mutation::{Mutation, Replay};
use serde::Serialize;

/// A quantity of both resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stock {
    pub minerals: Fixed64,
    pub gas: Fixed64,
}

/// `rate * secs`, saturating for unbounded intervals.
fn accrue(rate: Fixed64, secs: Fixed64) -> Fixed64 {
    rate.saturating_mul(secs)
}

// ===========================================================================
// IncomeSlot
// ===========================================================================

/// A half-open interval `[start, end)` of constant mining rate.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeSlot {
    pub start: Time,
    pub end: Time,
    /// Income up to this instant has been banked. `start <= last_updated <= end`.
    pub last_updated: Time,
    pub mineral_miners: Vec<i32>,
    pub bases_operational: Vec<bool>,
    pub gas_miners: Vec<i32>,
    pub geysers_operational: Vec<bool>,
    pub mules: i32,
}

impl IncomeSlot {
    pub fn new(start: Time, end: Time) -> Self {
        Self {
            start,
            end,
            last_updated: start,
            mineral_miners: Vec::new(),
            bases_operational: Vec::new(),
            gas_miners: Vec::new(),
            geysers_operational: Vec::new(),
            mules: 0,
        }
    }

    /// A slot with one operational base mined by `workers`.
    pub fn with_base(start: Time, end: Time, workers: i32) -> Self {
        let mut slot = Self::new(start, end);
        slot.mineral_miners.push(workers);
        slot.bases_operational.push(true);
        slot
    }

    pub fn gas_rate(&self, rates: &MiningRates) -> Fixed64 {
        self.gas_miners
            .iter()
            .zip(&self.geysers_operational)
            .filter(|(_, operational)| **operational)
            .map(|(&miners, _)| rates.gas_rate * Fixed64::from_num(miners.min(rates.gas_saturation)))
            .sum()
    }

    pub fn mineral_rate(&self, rates: &MiningRates) -> Fixed64 {
        let bases: Fixed64 = self
            .mineral_miners
            .iter()
            .zip(&self.bases_operational)
            .filter(|(_, operational)| **operational)
            .map(|(&miners, _)| {
                let saturated = miners.min(rates.mineral_saturation);
                let extra = (miners - rates.mineral_saturation).clamp(0, rates.oversaturation_cap);
                rates.mineral_rate * Fixed64::from_num(saturated)
                    + rates.oversaturated_rate * Fixed64::from_num(extra)
            })
            .sum();
        bases + rates.mule_rate * Fixed64::from_num(self.mules)
    }

    /// Seconds of this slot not yet banked.
    pub fn remaining(&self) -> Fixed64 {
        self.end.since(self.last_updated)
    }

    /// Income accrued between `last_updated` and `time`.
    pub fn surplus(&self, time: Time, rates: &MiningRates) -> Stock {
        if self.last_updated > time {
            return Stock::default();
        }
        let secs = time.min(self.end).since(self.last_updated);
        Stock {
            minerals: accrue(self.mineral_rate(rates), secs),
            gas: accrue(self.gas_rate(rates), secs),
        }
    }

    /// Bank income up to `time`. Never moves backwards.
    pub fn update(&mut self, time: Time) {
        self.last_updated = self.last_updated.max(time.min(self.end));
    }

    /// When, within this slot, `minerals` and `gas` more will have been mined.
    /// Each component is `NEVER` if it is not reached before the slot ends.
    pub fn when(&self, minerals: Fixed64, gas: Fixed64, rates: &MiningRates) -> (Time, Time) {
        if self.remaining() == Fixed64::ZERO {
            return (Time::NEVER, Time::NEVER);
        }
        let reach = |needed: Fixed64, rate: Fixed64| {
            if needed <= Fixed64::ZERO {
                return self.last_updated;
            }
            match checked_div_64(needed, rate) {
                Some(secs) if rate > Fixed64::ZERO => {
                    let at = self.last_updated.plus(secs);
                    if at > self.end { Time::NEVER } else { at }
                }
                _ => Time::NEVER,
            }
        };
        (
            reach(minerals, self.mineral_rate(rates)),
            reach(gas, self.gas_rate(rates)),
        )
    }
}

// ===========================================================================
// IncomeSlots
// ===========================================================================

/// Banked resources plus the projected income of every slot.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeSlots {
    slots: Vec<IncomeSlot>,
    stored: Stock,
    initial: Stock,
    last_updated: Time,
    rates: MiningRates,
}

impl IncomeSlots {
    pub fn new(minerals: u32, gas: u32, rates: MiningRates) -> Self {
        let initial = Stock {
            minerals: Fixed64::from_num(minerals),
            gas: Fixed64::from_num(gas),
        };
        Self {
            slots: Vec::new(),
            stored: initial,
            initial,
            last_updated: Time::ZERO,
            rates,
        }
    }

    /// Append a slot. Slots must be pushed in chronological order.
    pub fn push(&mut self, slot: IncomeSlot) {
        self.slots.push(slot);
    }

    pub fn slots(&self) -> &[IncomeSlot] {
        &self.slots
    }

    pub fn rates(&self) -> &MiningRates {
        &self.rates
    }

    pub fn stored(&self) -> Stock {
        self.stored
    }

    pub fn last_updated(&self) -> Time {
        self.last_updated
    }

    /// Pay (or with negative amounts, receive) resources. The bank is kept
    /// at whole units.
    pub fn expend(&mut self, minerals: Fixed64, gas: Fixed64) {
        self.stored.minerals = (self.stored.minerals - minerals).round();
        self.stored.gas = (self.stored.gas - gas).round();
    }

    /// Split `slots` so that a slot starts exactly at `time`; returns its index.
    fn split_at(slots: &mut Vec<IncomeSlot>, time: Time) -> Result<usize, InvariantViolation> {
        if time.is_never() {
            return Err(InvariantViolation::NoSpliceSlot(time));
        }
        let index = slots
            .iter()
            .position(|slot| slot.end > time)
            .ok_or(InvariantViolation::NoSpliceSlot(time))?;
        if slots[index].start >= time {
            return Ok(index);
        }
        let head = &mut slots[index];
        let mut tail = head.clone();
        tail.start = time;
        tail.last_updated = head.last_updated.max(time);
        head.end = time;
        head.last_updated = head.last_updated.min(time);
        slots.insert(index + 1, tail);
        Ok(index + 1)
    }

    /// Apply `mutation` from its time onwards. On error nothing is changed.
    pub fn splice(&mut self, mutation: &Mutation) -> Result<(), InvariantViolation> {
        let mut slots = self.slots.clone();
        let mut replay = Replay::new(mutation);
        let first = Self::split_at(&mut slots, mutation.time)?;
        match mutation.delay {
            Some(delay) => {
                for slot in &mut slots[first..] {
                    replay.apply_negative(slot)?;
                }
                let back = Self::split_at(&mut slots, mutation.time.plus(delay))?;
                for slot in &mut slots[back..] {
                    replay.apply_positive(slot)?;
                }
            }
            None => {
                for slot in &mut slots[first..] {
                    replay.apply(slot)?;
                }
            }
        }
        self.slots = slots;
        Ok(())
    }

    /// Resources in the bank at `time`, assuming nothing is spent meanwhile.
    pub fn surplus(&self, time: Time) -> Stock {
        self.slots.iter().fold(self.stored, |acc, slot| {
            let gain = slot.surplus(time, &self.rates);
            Stock {
                minerals: acc.minerals.saturating_add(gain.minerals),
                gas: acc.gas.saturating_add(gain.gas),
            }
        })
    }

    /// Everything mined from the start of the game until `time`, including
    /// the starting bank.
    pub fn total_mined(&self, time: Time) -> Stock {
        self.slots.iter().fold(self.initial, |acc, slot| {
            let secs = time.min(slot.end).since(time.min(slot.start));
            Stock {
                minerals: acc
                    .minerals
                    .saturating_add(accrue(slot.mineral_rate(&self.rates), secs)),
                gas: acc.gas.saturating_add(accrue(slot.gas_rate(&self.rates), secs)),
            }
        })
    }

    /// Bank all income up to `time`.
    pub fn update(&mut self, time: Time) {
        let gain = self.surplus(time);
        self.stored = gain;
        for slot in &mut self.slots {
            slot.update(time);
        }
        self.last_updated = self.last_updated.max(time);
    }

    /// Earliest time at which `minerals` and `gas` are both in the bank.
    pub fn when(&self, minerals: Fixed64, gas: Fixed64) -> Time {
        let mut minerals_needed = minerals - self.stored.minerals;
        let mut gas_needed = gas - self.stored.gas;
        let mut minerals_at = None;
        let mut gas_at = None;
        for slot in &self.slots {
            let (m, g) = slot.when(minerals_needed, gas_needed, &self.rates);
            if m.is_never() {
                minerals_needed =
                    minerals_needed.saturating_sub(accrue(slot.mineral_rate(&self.rates), slot.remaining()));
            } else if minerals_at.is_none() {
                minerals_at = Some(m);
            }
            if g.is_never() {
                gas_needed = gas_needed.saturating_sub(accrue(slot.gas_rate(&self.rates), slot.remaining()));
            } else if gas_at.is_none() {
                gas_at = Some(g);
            }
            if minerals_at.is_some() && gas_at.is_some() {
                break;
            }
        }
        minerals_at
            .unwrap_or(Time::NEVER)
            .max(gas_at.unwrap_or(Time::NEVER))
    }
}

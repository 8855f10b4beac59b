//! Larva generators.
//!
//! A [`Hatchery`] regenerates one larva per interval while it holds fewer than
//! the natural cap, and receives bursts of larvae when a queen spawns larvae
//! on it. Bursts can push the pool up to the hard cap.

use crate::config::LarvaRules;
use crate::error::InvariantViolation;
use crate::fixed::{Fixed64, Time};
use serde::Serialize;
use slotmap::{SlotMap, new_key_type};
use std::cmp::Reverse;

new_key_type! {
    /// Identifies a hatchery within a [`HatcherySet`].
    pub struct HatcheryId;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hatchery {
    pub created: Time,
    pub larvae: u32,
    /// Next natural larva, meaningful while `larvae` is below the natural cap.
    pub next_larva: Time,
    /// One-based position in creation order.
    pub order: usize,
    pub tag: Option<String>,
    /// Time already served towards the next larva when the pool drops back
    /// below the natural cap.
    pub rebate: Fixed64,
    /// Expiry times of pending bursts, ascending.
    pub burst_expiries: Vec<Time>,
    generated: Vec<Time>,
    last_updated: Time,
    rules: LarvaRules,
    burst_duration: Fixed64,
}

impl Hatchery {
    pub fn new(
        created: Time,
        initial_larvae: u32,
        tag: Option<String>,
        rules: LarvaRules,
        burst_duration: Fixed64,
    ) -> Self {
        let mut hatchery = Self {
            created,
            larvae: 0,
            next_larva: Time::NEVER,
            order: 0,
            tag,
            rebate: Fixed64::ZERO,
            burst_expiries: Vec::new(),
            generated: Vec::new(),
            last_updated: created,
            rules,
            burst_duration,
        };
        hatchery.generate(created, initial_larvae, true);
        hatchery
    }

    fn generate(&mut self, time: Time, count: u32, reset: bool) {
        self.generated
            .extend(std::iter::repeat_n(time, count as usize));
        self.larvae = (self.larvae + count).min(self.rules.hard_cap);
        if reset {
            self.next_larva = time.plus(self.rules.interval);
            self.rebate = Fixed64::ZERO;
        } else if self.larvae + 1 > self.rules.natural_cap {
            self.rebate = time.since(self.next_larva.minus(self.rules.interval));
        }
    }

    /// Every instant a larva appeared, in order.
    pub fn generated(&self) -> &[Time] {
        &self.generated
    }

    pub fn last_updated(&self) -> Time {
        self.last_updated
    }

    pub fn next_generated(&self) -> Time {
        if self.larvae < self.rules.natural_cap {
            self.next_larva
        } else {
            Time::NEVER
        }
    }

    pub fn next_burst(&self) -> Time {
        self.burst_expiries.first().copied().unwrap_or(Time::NEVER)
    }

    /// Larvae available at `time`.
    pub fn surplus(&self, time: Time) -> u32 {
        let mut snapshot = self.clone();
        snapshot.update(time);
        snapshot.larvae
    }

    pub fn update(&mut self, time: Time) {
        while self.next_generated() <= time || self.next_burst() <= time {
            let horizon = time.min(self.next_generated());
            while let Some(&expiry) = self.burst_expiries.first() {
                if expiry > horizon {
                    break;
                }
                self.burst_expiries.remove(0);
                self.generate(expiry, self.rules.burst_size, false);
            }
            if self.next_generated() <= time {
                self.generate(self.next_larva, 1, true);
            }
        }
        self.last_updated = self.created.max(time).max(self.last_updated);
    }

    /// Start a larva burst at `time`.
    pub fn burst(&mut self, time: Time) {
        let expiry = time.plus(self.burst_duration);
        let index = self.burst_expiries.partition_point(|&e| e <= expiry);
        self.burst_expiries.insert(index, expiry);
    }

    /// Earliest time a larva is available.
    pub fn when(&self) -> Time {
        if self.larvae > 0 {
            self.last_updated
        } else {
            self.next_larva.min(self.next_burst())
        }
    }

    /// Earliest time a new burst can start without overlapping a pending one.
    pub fn when_burst(&self) -> Time {
        self.burst_expiries.last().copied().unwrap_or(self.created)
    }
}

// ===========================================================================
// HatcherySet
// ===========================================================================

/// Larva timings of one hatchery, for reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LarvaTimings {
    pub order: usize,
    pub created: Time,
    pub generated: Vec<Time>,
}

#[derive(Debug, Clone)]
pub struct HatcherySet {
    hatcheries: SlotMap<HatcheryId, Hatchery>,
    last_updated: Time,
}

impl Default for HatcherySet {
    fn default() -> Self {
        Self::new()
    }
}

impl HatcherySet {
    pub fn new() -> Self {
        Self {
            hatcheries: SlotMap::with_key(),
            last_updated: Time::ZERO,
        }
    }

    pub fn add(&mut self, mut hatchery: Hatchery) -> HatcheryId {
        hatchery.order = self.hatcheries.len() + 1;
        self.hatcheries.insert(hatchery)
    }

    pub fn get(&self, id: HatcheryId) -> Option<&Hatchery> {
        self.hatcheries.get(id)
    }

    pub fn len(&self) -> usize {
        self.hatcheries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hatcheries.is_empty()
    }

    /// Hatcheries carrying one of `tags`, or all of them when `tags` is `None`.
    pub fn select<'a>(
        &'a self,
        tags: Option<&'a [String]>,
    ) -> impl Iterator<Item = (HatcheryId, &'a Hatchery)> + 'a {
        self.hatcheries.iter().filter(move |(_, h)| match tags {
            None => true,
            Some(tags) => h.tag.as_ref().is_some_and(|tag| tags.contains(tag)),
        })
    }

    pub fn update(&mut self, time: Time) -> Result<(), InvariantViolation> {
        if time < self.last_updated {
            return Err(InvariantViolation::LarvaeInPast {
                requested: time,
                last_updated: self.last_updated,
            });
        }
        for hatchery in self.hatcheries.values_mut() {
            hatchery.update(time);
        }
        self.last_updated = time;
        Ok(())
    }

    /// Consume `count` larvae at `time`, one at a time from the best candidate.
    pub fn expend(
        &mut self,
        time: Time,
        count: u32,
        tags: Option<&[String]>,
    ) -> Result<(), InvariantViolation> {
        self.update(time)?;
        for _ in 0..count {
            let mut candidate: Option<(HatcheryId, &Hatchery)> = None;
            for (id, hatchery) in self.select(tags) {
                if hatchery.larvae == 0 || hatchery.created > time {
                    continue;
                }
                let better = match candidate {
                    None => true,
                    Some((_, best)) => {
                        (hatchery.larvae, Reverse(hatchery.next_burst()), Reverse(hatchery.next_larva))
                            > (best.larvae, Reverse(best.next_burst()), Reverse(best.next_larva))
                    }
                };
                if better {
                    candidate = Some((id, hatchery));
                }
            }
            let id = candidate
                .map(|(id, _)| id)
                .ok_or(InvariantViolation::NoLarva(time))?;
            let natural_cap = self.hatcheries[id].rules.natural_cap;
            let interval = self.hatcheries[id].rules.interval;
            let hatchery = &mut self.hatcheries[id];
            if hatchery.larvae == natural_cap {
                hatchery.next_larva = time.plus(interval).minus(hatchery.rebate);
            }
            hatchery.larvae -= 1;
        }
        Ok(())
    }

    /// Larvae per hatchery existing at `time`.
    pub fn surplus(&self, time: Time, tags: Option<&[String]>) -> Vec<u32> {
        self.select(tags)
            .filter(|(_, h)| h.created <= time)
            .map(|(_, h)| h.surplus(time))
            .collect()
    }

    /// Start a larva burst on the hatchery that is free of bursts soonest.
    pub fn burst(&mut self, time: Time) -> Result<(), InvariantViolation> {
        let mut candidate: Option<(HatcheryId, Time)> = None;
        for (id, hatchery) in self.hatcheries.iter() {
            if hatchery.created > time {
                continue;
            }
            let free = hatchery.when_burst();
            if candidate.is_none_or(|(_, best)| free < best) {
                candidate = Some((id, free));
            }
        }
        let (id, _) = candidate.ok_or(InvariantViolation::NoBurstTarget(time))?;
        self.hatcheries[id].burst(time);
        Ok(())
    }

    /// Earliest time `count` larvae can have been consumed.
    pub fn when(&self, count: u32, tags: Option<&[String]>) -> Result<Time, InvariantViolation> {
        if count <= 1 {
            return Ok(self
                .select(tags)
                .map(|(_, h)| h.when())
                .min()
                .unwrap_or(Time::NEVER));
        }
        let mut snapshot = self.clone();
        let mut time = Time::NEVER;
        for _ in 0..count {
            time = snapshot.when(1, tags)?;
            if time.is_never() {
                return Ok(time);
            }
            snapshot.expend(time, 1, tags)?;
        }
        Ok(time)
    }

    /// Earliest time any hatchery is free of pending bursts.
    pub fn when_burst(&self) -> Time {
        self.hatcheries
            .values()
            .map(Hatchery::when_burst)
            .min()
            .unwrap_or(Time::NEVER)
    }

    pub fn larva_timings(&self) -> Vec<LarvaTimings> {
        self.hatcheries
            .values()
            .map(|h| LarvaTimings {
                order: h.order,
                created: h.created,
                generated: h.generated.clone(),
            })
            .collect()
    }
}

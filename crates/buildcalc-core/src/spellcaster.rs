//! Energy pools of casters (Nexus, Orbital Command, Queen, ...).
//!
//! Energy regenerates linearly up to the caster's maximum. A future ability
//! use is recorded as an [`EnergyReservation`]: it already counts against the
//! free energy, and is deducted from the pool once the clock passes it.

use crate::catalog::ProductId;
use crate::error::InvariantViolation;
use crate::fixed::{Fixed64, Time, checked_div_64};
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Identifies a caster within a [`SpellcasterSet`].
    pub struct CasterId;
}

/// Energy earmarked for use at `time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnergyReservation {
    pub time: Time,
    pub energy: Fixed64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spellcaster {
    pub caster_type: ProductId,
    pub created: Time,
    pub destroyed: Option<Time>,
    pub energy: Fixed64,
    pub energy_max: Fixed64,
    pub tag: Option<String>,
    reservations: Vec<EnergyReservation>,
    last_updated: Time,
    regen_rate: Fixed64,
}

impl Spellcaster {
    pub fn new(
        caster_type: ProductId,
        created: Time,
        energy_start: u32,
        energy_max: u32,
        tag: Option<String>,
        regen_rate: Fixed64,
    ) -> Self {
        Self {
            caster_type,
            created,
            destroyed: None,
            energy: Fixed64::from_num(energy_start),
            energy_max: Fixed64::from_num(energy_max),
            tag,
            reservations: Vec::new(),
            last_updated: created,
            regen_rate,
        }
    }

    /// Energy in the pool; with `only_free`, minus pending reservations.
    pub fn energy(&self, only_free: bool) -> Fixed64 {
        if !only_free {
            return self.energy;
        }
        self.reservations
            .iter()
            .fold(self.energy, |acc, r| acc - r.energy)
    }

    pub fn reservations(&self) -> &[EnergyReservation] {
        &self.reservations
    }

    fn alive_at(&self, time: Time) -> bool {
        self.created <= time && self.destroyed.is_none_or(|d| d >= time)
    }

    /// Energy in the pool at `time`.
    pub fn surplus(&self, time: Time) -> Fixed64 {
        let mut snapshot = self.clone();
        snapshot.update(time);
        snapshot.energy(false)
    }

    pub fn update(&mut self, time: Time) {
        let last_updated = self.last_updated;
        let (due, pending): (Vec<_>, Vec<_>) = self
            .reservations
            .iter()
            .copied()
            .partition(|r| r.time <= last_updated);
        self.energy -= due.iter().map(|r| r.energy).sum::<Fixed64>();
        self.reservations = pending;
        if time > self.last_updated {
            let gained = self.regen_rate.saturating_mul(time.since(self.last_updated));
            self.energy = self.energy.saturating_add(gained).min(self.energy_max);
            self.last_updated = time;
        }
    }

    /// Earliest time `energy` is free.
    pub fn when(&self, energy: Fixed64) -> Time {
        if energy > self.energy_max {
            return Time::NEVER;
        }
        let missing = (energy - self.energy(true)).max(Fixed64::ZERO);
        let when = match checked_div_64(missing, self.regen_rate) {
            Some(secs) => self.last_updated.plus(secs),
            None => Time::NEVER,
        };
        match self.destroyed {
            Some(destroyed) if when > destroyed => Time::NEVER,
            _ => when,
        }
    }
}

// ===========================================================================
// SpellcasterSet
// ===========================================================================

#[derive(Debug, Clone, Default)]
pub struct SpellcasterSet {
    casters: SlotMap<CasterId, Spellcaster>,
}

impl SpellcasterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, caster: Spellcaster) -> CasterId {
        self.casters.insert(caster)
    }

    pub fn get(&self, id: CasterId) -> Option<&Spellcaster> {
        self.casters.get(id)
    }

    pub fn len(&self) -> usize {
        self.casters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.casters.is_empty()
    }

    /// Casters of `caster_type` (any type when `None`) carrying one of `tags`.
    pub fn select<'a>(
        &'a self,
        caster_type: Option<ProductId>,
        tags: Option<&'a [String]>,
    ) -> impl Iterator<Item = (CasterId, &'a Spellcaster)> + 'a {
        self.casters.iter().filter(move |(_, c)| {
            caster_type.is_none_or(|t| c.caster_type == t)
                && match tags {
                    None => true,
                    Some(tags) => c.tag.as_ref().is_some_and(|tag| tags.contains(tag)),
                }
        })
    }

    /// The living caster with the most free energy at `time`.
    pub fn choose(
        &self,
        caster_type: ProductId,
        time: Time,
        tags: Option<&[String]>,
    ) -> Option<CasterId> {
        let mut candidate: Option<(CasterId, Fixed64)> = None;
        for (id, caster) in self.select(Some(caster_type), tags) {
            if !caster.alive_at(time) {
                continue;
            }
            let free = caster.energy(true);
            if candidate.is_none_or(|(_, best)| free > best) {
                candidate = Some((id, free));
            }
        }
        candidate.map(|(id, _)| id)
    }

    /// Spend `energy` at `time` from the best caster.
    pub fn expend(
        &mut self,
        caster_type: ProductId,
        caster_name: &str,
        energy: u32,
        time: Time,
        tags: Option<&[String]>,
    ) -> Result<CasterId, InvariantViolation> {
        let id = self
            .choose(caster_type, time, tags)
            .ok_or_else(|| InvariantViolation::NoCaster {
                caster: caster_name.to_string(),
                time,
            })?;
        let caster = &mut self.casters[id];
        let free = caster.energy(true).round();
        if free < Fixed64::from_num(energy) {
            return Err(InvariantViolation::InsufficientEnergy {
                available: free.to_num(),
                needed: energy,
            });
        }
        caster.energy -= Fixed64::from_num(energy);
        Ok(id)
    }

    /// Earmark `energy` for use at `time`.
    pub fn reserve(
        &mut self,
        caster_type: ProductId,
        caster_name: &str,
        energy: u32,
        time: Time,
        tags: Option<&[String]>,
    ) -> Result<CasterId, InvariantViolation> {
        let id = self
            .choose(caster_type, time, tags)
            .ok_or_else(|| InvariantViolation::NoCaster {
                caster: caster_name.to_string(),
                time,
            })?;
        self.casters[id].reservations.push(EnergyReservation {
            time,
            energy: Fixed64::from_num(energy),
        });
        Ok(id)
    }

    /// Mark the existing caster of `caster_type` with the least free energy
    /// as destroyed at `time`.
    pub fn remove(
        &mut self,
        caster_type: ProductId,
        caster_name: &str,
        time: Time,
    ) -> Result<CasterId, InvariantViolation> {
        let mut candidate: Option<(CasterId, Fixed64)> = None;
        for (id, caster) in self.select(Some(caster_type), None) {
            if caster.created > time || caster.destroyed.is_some() {
                continue;
            }
            let free = caster.energy(true);
            if candidate.is_none_or(|(_, least)| free < least) {
                candidate = Some((id, free));
            }
        }
        let (id, _) = candidate.ok_or_else(|| InvariantViolation::NoCaster {
            caster: caster_name.to_string(),
            time,
        })?;
        self.casters[id].destroyed = Some(time);
        Ok(id)
    }

    /// Rounded energy of every living caster at `time`.
    pub fn surplus(&self, caster_type: Option<ProductId>, time: Time, tags: Option<&[String]>) -> Vec<i64> {
        self.select(caster_type, tags)
            .filter(|(_, c)| c.alive_at(time))
            .map(|(_, c)| c.surplus(time).round().to_num())
            .collect()
    }

    pub fn update(&mut self, time: Time) {
        for caster in self.casters.values_mut() {
            caster.update(time);
        }
    }

    /// Earliest time any matching caster has `energy` free.
    pub fn when(&self, caster_type: ProductId, energy: u32, tags: Option<&[String]>) -> Time {
        let energy = Fixed64::from_num(energy);
        self.select(Some(caster_type), tags)
            .map(|(_, c)| c.when(energy))
            .min()
            .unwrap_or(Time::NEVER)
    }
}

//! Production queues.
//!
//! Every structure that produces something owns one [`ProductionQueue`]; work
//! on a queue is serialized. Morphing a structure (Gateway into Warp Gate,
//! Command Center into Orbital Command) tombstones the old queue and creates a
//! new one, so that utilization of the old queue stays reportable.

use crate::catalog::{Catalog, ProductId};
use crate::error::InvariantViolation;
use crate::fixed::{Fixed64, Time, checked_div_64, fixed64_to_f64};
use serde::Serialize;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Identifies a queue within a [`ProductionQueueSet`].
    pub struct QueueId;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductionQueue {
    pub structure: ProductId,
    /// Next instant the queue is free.
    pub available: Time,
    pub busy_time: Fixed64,
    /// Time of the most recent chronoboost on this queue.
    pub chronoboosted: Option<Time>,
    pub created: Time,
    pub destroyed: Option<Time>,
    pub tag: Option<String>,
}

impl ProductionQueue {
    pub fn new(structure: ProductId, available: Time, tag: Option<String>) -> Self {
        Self {
            structure,
            available,
            busy_time: Fixed64::ZERO,
            chronoboosted: None,
            created: available,
            destroyed: None,
            tag,
        }
    }

    /// Occupy the queue from `start` until `end`. Only `busy` work counts
    /// towards utilization.
    pub fn busy(&mut self, start: Time, end: Time, busy: bool) {
        self.available = end;
        if busy {
            self.busy_time += end.since(start);
        }
    }
}

/// Utilization of one queue over its lifetime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueUsage {
    pub structure: String,
    pub created: Time,
    pub destroyed: Option<Time>,
    pub busy_time: Time,
    /// Fraction of the queue's lifetime spent busy, in `[0, 1]`.
    pub busy_ratio: f64,
}

// ===========================================================================
// ProductionQueueSet
// ===========================================================================

/// Result of [`ProductionQueueSet::when`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueAvailability {
    pub time: Time,
    /// Queue types with no live queue at all; empty unless `time` is `NEVER`.
    pub missing: Vec<ProductId>,
}

#[derive(Debug, Clone)]
pub struct ProductionQueueSet {
    queues: SlotMap<QueueId, ProductionQueue>,
    last_updated: Time,
}

impl Default for ProductionQueueSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductionQueueSet {
    pub fn new() -> Self {
        Self {
            queues: SlotMap::with_key(),
            last_updated: Time::ZERO,
        }
    }

    pub fn add(&mut self, queue: ProductionQueue) -> QueueId {
        self.queues.insert(queue)
    }

    pub fn get(&self, id: QueueId) -> Option<&ProductionQueue> {
        self.queues.get(id)
    }

    pub fn get_mut(&mut self, id: QueueId) -> Option<&mut ProductionQueue> {
        self.queues.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Live queues of `structure` carrying one of `tags`.
    pub fn select<'a>(
        &'a self,
        structure: ProductId,
        tags: Option<&'a [String]>,
    ) -> impl Iterator<Item = (QueueId, &'a ProductionQueue)> + 'a {
        self.queues.iter().filter(move |(_, q)| {
            q.structure == structure
                && q.destroyed.is_none()
                && match tags {
                    None => true,
                    Some(tags) => q.tag.as_ref().is_some_and(|tag| tags.contains(tag)),
                }
        })
    }

    /// Pick queues free at `time`: one per type when `all`, otherwise a single
    /// queue of any of the types. An unboosted queue is preferred, then the
    /// one boosted earliest.
    pub fn choose(
        &self,
        catalog: &Catalog,
        time: Time,
        expends: &[ProductId],
        all: bool,
        tags: Option<&[String]>,
    ) -> Result<Vec<QueueId>, InvariantViolation> {
        let mut chosen = Vec::new();
        let mut candidate: Option<(QueueId, Option<Time>)> = None;
        for &structure in expends {
            if all {
                candidate = None;
            }
            for (id, queue) in self.select(structure, tags) {
                if queue.available > time {
                    continue;
                }
                if candidate.is_none_or(|(_, best)| queue.chronoboosted < best) {
                    candidate = Some((id, queue.chronoboosted));
                }
            }
            if all {
                let (id, _) = candidate.ok_or_else(|| InvariantViolation::NoQueue {
                    queue: catalog.name(structure).to_string(),
                    time,
                })?;
                chosen.push(id);
            }
        }
        if !all {
            let (id, _) = candidate.ok_or_else(|| InvariantViolation::NoQueue {
                queue: expends
                    .iter()
                    .map(|&s| catalog.name(s))
                    .collect::<Vec<_>>()
                    .join("' or '"),
                time,
            })?;
            chosen.push(id);
        }
        Ok(chosen)
    }

    /// Tombstone `destroyed` and create queues of `created_types`. A new queue
    /// inherits the tag of the destroyed queue at the same position.
    pub fn morph(
        &mut self,
        destroyed: &[QueueId],
        time_destroyed: Time,
        created_types: &[ProductId],
        time_created: Time,
    ) {
        for &id in destroyed {
            if let Some(queue) = self.queues.get_mut(id) {
                queue.destroyed = Some(time_destroyed);
            }
        }
        let mut tag = None;
        for (i, &structure) in created_types.iter().enumerate() {
            if let Some(queue) = destroyed.get(i).and_then(|&id| self.queues.get(id)) {
                tag = queue.tag.clone();
            }
            self.queues
                .insert(ProductionQueue::new(structure, time_created, tag.clone()));
        }
    }

    pub fn update(&mut self, time: Time) {
        self.last_updated = self.last_updated.max(time);
    }

    /// Earliest time queues of `types` are free (all of them when `all`).
    pub fn when(&self, types: &[ProductId], all: bool, tags: Option<&[String]>) -> QueueAvailability {
        if types.is_empty() {
            return QueueAvailability {
                time: self.last_updated,
                missing: Vec::new(),
            };
        }
        let mut missing = Vec::new();
        let mut combined = if all { Time::ZERO } else { Time::NEVER };
        for &structure in types {
            let available = self
                .select(structure, tags)
                .map(|(_, q)| q.available)
                .min()
                .unwrap_or(Time::NEVER);
            if available.is_never() {
                missing.push(structure);
            }
            combined = if all {
                combined.max(available)
            } else {
                combined.min(available)
            };
        }
        if combined.is_never() {
            QueueAvailability {
                time: combined,
                missing,
            }
        } else {
            QueueAvailability {
                time: self.last_updated.max(combined),
                missing: Vec::new(),
            }
        }
    }

    /// Utilization of every queue that did any work, up to `end`.
    pub fn usage(&self, catalog: &Catalog, end: Time) -> Vec<QueueUsage> {
        self.queues
            .values()
            .filter_map(|q| {
                let existed = q.destroyed.unwrap_or(end).since(q.created);
                if q.busy_time == Fixed64::ZERO || existed <= Fixed64::ZERO {
                    return None;
                }
                let ratio = checked_div_64(q.busy_time, existed).unwrap_or(Fixed64::ZERO);
                Some(QueueUsage {
                    structure: catalog.name(q.structure).to_string(),
                    created: q.created,
                    destroyed: q.destroyed,
                    busy_time: Time::from_fixed(q.busy_time),
                    busy_ratio: fixed64_to_f64(ratio),
                })
            })
            .collect()
    }
}

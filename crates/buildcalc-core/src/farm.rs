//! Population capacity providers.

use crate::fixed::Time;

/// A contribution to population capacity during `[created, destroyed)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Farm {
    pub created: Time,
    pub capacity: i32,
    pub destroyed: Option<Time>,
}

impl Farm {
    pub fn new(created: Time, capacity: i32) -> Self {
        Self {
            created,
            capacity,
            destroyed: None,
        }
    }

    fn alive_at(&self, time: Time) -> bool {
        self.created <= time && self.destroyed.is_none_or(|d| d >= time)
    }
}

/// Farms ordered by creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FarmSet {
    farms: Vec<Farm>,
}

impl FarmSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert keeping creation order; equal times keep insertion order.
    pub fn add(&mut self, farm: Farm) {
        let index = self.farms.partition_point(|f| f.created <= farm.created);
        self.farms.insert(index, farm);
    }

    pub fn farms(&self) -> &[Farm] {
        &self.farms
    }

    /// Destroy the oldest living farm of the given capacity that exists at `time`.
    /// Returns false when there is none.
    pub fn remove(&mut self, capacity: i32, time: Time) -> bool {
        match self
            .farms
            .iter_mut()
            .find(|f| f.capacity == capacity && f.created <= time && f.destroyed.is_none())
        {
            Some(farm) => {
                farm.destroyed = Some(time);
                true
            }
            None => false,
        }
    }

    /// Total capacity at `time`.
    pub fn surplus(&self, time: Time) -> i32 {
        self.farms
            .iter()
            .filter(|f| f.alive_at(time))
            .map(|f| f.capacity)
            .sum()
    }

    /// Earliest time total capacity reaches `capacity`, or `None` if the
    /// existing and planned farms never provide it.
    pub fn when(&self, capacity: i32) -> Option<Time> {
        if capacity <= 0 {
            return Some(Time::ZERO);
        }
        let mut needed = capacity;
        for farm in self.farms.iter().filter(|f| f.destroyed.is_none()) {
            needed -= farm.capacity;
            if needed <= 0 {
                return Some(farm.created);
            }
        }
        None
    }
}

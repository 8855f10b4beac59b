//! Log rows of a calculated build.

use crate::fixed::Time;
use serde::Serialize;
use std::fmt;

/// An annotation at a fixed time, replayed into the log once the clock
/// passes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checkpoint {
    pub description: String,
    pub started: Time,
    pub completed: Time,
}

impl Checkpoint {
    pub fn new(description: impl Into<String>, started: Time, completed: Option<Time>) -> Self {
        Self {
            description: description.into(),
            started,
            completed: completed.unwrap_or(started),
        }
    }
}

/// A committed job or checkpoint together with the state of every
/// subsystem at its start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub order: usize,
    pub description: String,
    pub started: Time,
    pub completed: Time,
    pub supply_count: i32,
    pub supply_capacity: i32,
    /// Larvae per hatchery.
    pub larvae: Vec<u32>,
    pub minerals: i64,
    pub gas: i64,
    /// Energy per caster.
    pub energy: Vec<i64>,
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "|{:>5}|{:>5}|{:>5}|{:>7}|{:>5}| {} |{:>5}|{:>5}|{:>5}|",
            self.order,
            self.started,
            self.completed,
            format!("{} / {}", self.supply_count, self.supply_capacity),
            join(&self.larvae),
            self.description,
            self.minerals,
            self.gas,
            join(&self.energy),
        )
    }
}

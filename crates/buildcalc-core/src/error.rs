//! Error types.
//!
//! Two classes exist. Build-invalid errors describe a build order that cannot
//! be realised and carry remediation hints for the user. Invariant violations
//! signal internal bookkeeping that went wrong; they abort the calculation.

use crate::availability::Availability;
use crate::catalog::{CatalogError, Race};
use crate::config::ConfigError;
use crate::fixed::Time;
use crate::mutation::Resource;
use std::fmt;

// ===========================================================================
// Invariant violations
// ===========================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("attempting to take workers off {0} where there were none")]
    WorkerUnderflow(Resource),

    #[error("no {0} site to move workers to or from")]
    NoMiningSite(Resource),

    #[error("no {0} site under construction to complete")]
    NothingToComplete(Resource),

    #[error("transferring workers requires at least two {0} sites")]
    TransferNeedsSites(Resource),

    #[error("no income slot covers {0}")]
    NoSpliceSlot(Time),

    #[error("cannot generate larvae in the past ({requested} is before {last_updated})")]
    LarvaeInPast { requested: Time, last_updated: Time },

    #[error("no hatchery has larvae available at {0}")]
    NoLarva(Time),

    #[error("no hatchery can receive a larva burst at {0}")]
    NoBurstTarget(Time),

    #[error("no caster of type '{caster}' is alive at {time}")]
    NoCaster { caster: String, time: Time },

    #[error("caster has {available} free energy, {needed} needed")]
    InsufficientEnergy { available: i64, needed: u32 },

    #[error("no production queue of type '{queue}' is available at {time}")]
    NoQueue { queue: String, time: Time },
}

// ===========================================================================
// Diagnostics
// ===========================================================================

/// Why one job could not be scheduled.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// The job as written in the build order.
    pub job: String,
    pub availability: Availability,
    pub hint: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Job '{}' could not be scheduled. {}",
            self.job, self.availability
        )
    }
}

fn render(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

// ===========================================================================
// BuildError
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("No commands found in build order!")]
    EmptyBuild,

    #[error("build order mixes {first} and {second} jobs")]
    MixedRaces { first: Race, second: Race },

    #[error("build order contains no race-specific jobs")]
    NoRace,

    #[error("There is no trigger to job '{job}'")]
    MissingTrigger { job: String },

    #[error("{}", render(.0))]
    Unschedulable(Vec<Diagnostic>),

    #[error("{message}")]
    Invalid { message: String, hint: String },

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BuildError {
    /// True for errors caused by the build order itself rather than by
    /// internal bookkeeping.
    pub fn is_build_invalid(&self) -> bool {
        !matches!(
            self,
            BuildError::Invariant(_) | BuildError::Catalog(_) | BuildError::Config(_)
        )
    }

    /// Remediation advice for the user, when there is any.
    pub fn hint(&self) -> Option<String> {
        match self {
            BuildError::EmptyBuild => Some("Your build order is empty.".to_string()),
            BuildError::MixedRaces { .. } => Some(
                "Every job in a build order must belong to the same race.".to_string(),
            ),
            BuildError::NoRace => Some(
                "Add at least one unit, structure or upgrade so the race can be determined."
                    .to_string(),
            ),
            BuildError::MissingTrigger { .. } => Some(
                "Every job must be given a supply count, a resource trigger, or follow another job."
                    .to_string(),
            ),
            BuildError::Unschedulable(diagnostics) => Some(
                diagnostics
                    .iter()
                    .map(|d| d.hint.as_str())
                    .filter(|h| !h.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            BuildError::Invalid { hint, .. } => Some(hint.clone()),
            BuildError::Invariant(_) | BuildError::Catalog(_) | BuildError::Config(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unschedulable_renders_one_line_per_job() {
        let err = BuildError::Unschedulable(vec![
            Diagnostic {
                job: "14 Gateway".to_string(),
                availability: Availability::InsufficientSupplyCapacity,
                hint: "Add a Pylon.".to_string(),
            },
            Diagnostic {
                job: "@100 gas Lair".to_string(),
                availability: Availability::NoGasIncome,
                hint: String::new(),
            },
        ]);
        let text = err.to_string();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("Job '14 Gateway' could not be scheduled."));
        assert_eq!(err.hint().unwrap(), "Add a Pylon.");
        assert!(err.is_build_invalid());
    }

    #[test]
    fn invariant_is_not_build_invalid() {
        let err: BuildError = InvariantViolation::NoLarva(Time::ZERO).into();
        assert!(!err.is_build_invalid());
        assert!(err.hint().is_none());
    }

    #[test]
    fn empty_build_is_distinct() {
        let err = BuildError::EmptyBuild;
        assert!(err.is_build_invalid());
        assert_eq!(err.hint().unwrap(), "Your build order is empty.");
    }
}

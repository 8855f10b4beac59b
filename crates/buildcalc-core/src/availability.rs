//! Why a job cannot run yet.
//!
//! [`Availability`] is recomputed by every timeline query. Besides rendering
//! a message for the user it answers whether some other job could lift the
//! block, which the scheduler uses to detect dead ends.

use crate::catalog::{Catalog, ProductId};
use crate::job::{Job, JobId};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Availability {
    #[default]
    Available,
    /// The population trigger does not match the running population.
    InsufficientSupply { count: i32, needed: i32 },
    InsufficientSupplyCapacity,
    NoGasIncome,
    NoMineralIncome,
    NoLarvaProduction { tags: Option<Vec<String>> },
    /// The job this one depends on has not been committed.
    MissingDependency { job: JobId, label: String },
    MissingPrerequisite { product: ProductId, name: String },
    /// Names of the queue types without any live queue.
    MissingProductionQueue {
        queues: Vec<String>,
        tags: Option<Vec<String>>,
    },
    MissingCaster {
        caster: String,
        tags: Option<Vec<String>>,
    },
}

/// ` with tag #a` or ` with tags #a or #b`.
fn with_tags(f: &mut fmt::Formatter<'_>, prefix: &str, tags: &Option<Vec<String>>) -> fmt::Result {
    if let Some(tags) = tags {
        let plural = if tags.len() > 1 { "s" } else { "" };
        write!(f, "{prefix} with tag{plural} #{}", tags.join(" or #"))?;
    }
    Ok(())
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Available => Ok(()),
            Availability::InsufficientSupply { count, needed } => {
                let amount = if count > needed { "too much" } else { "insufficient" };
                write!(f, "There is {amount} supply.")
            }
            Availability::InsufficientSupplyCapacity => {
                f.write_str("There is insufficient supply capacity.")
            }
            Availability::NoGasIncome => f.write_str("No gas is being mined."),
            Availability::NoMineralIncome => f.write_str("No minerals are being mined."),
            Availability::NoLarvaProduction { tags } => {
                f.write_str("No larva are being generated")?;
                with_tags(f, " from a hatchery", tags)?;
                f.write_str(".")
            }
            Availability::MissingDependency { label, .. } => write!(
                f,
                "The job '{label}' on which it depends could not be scheduled."
            ),
            Availability::MissingPrerequisite { name, .. } => {
                write!(f, "The prerequisite '{name}' does not exist.")
            }
            Availability::MissingProductionQueue { queues, tags } => {
                let plural = queues.len() > 1;
                write!(f, "No production queue{} of type ", if plural { "s" } else { "" })?;
                for (i, queue) in queues.iter().enumerate() {
                    if i > 0 {
                        f.write_str(if i == queues.len() - 1 { " and " } else { ", " })?;
                    }
                    write!(f, "'{queue}'")?;
                }
                f.write_str(if plural { " exist" } else { " exists" })?;
                with_tags(f, "", tags)?;
                f.write_str(".")
            }
            Availability::MissingCaster { caster, tags } => {
                write!(f, "No spellcasters of type '{caster}' exist")?;
                with_tags(f, "", tags)?;
                f.write_str(".")
            }
        }
    }
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }

    /// Remediation advice for the user.
    pub fn hint(&self) -> String {
        match self {
            Availability::Available | Availability::MissingDependency { .. } => String::new(),
            Availability::InsufficientSupply { count, needed } => format!(
                "The trigger supply count for this job is {needed}, but at this point in the \
                 build order the achieved supply count is {} {count}.",
                if count > needed { "already" } else { "only" }
            ),
            Availability::InsufficientSupplyCapacity => {
                "You may need to add some Overlords, Supply Depots or Pylons to accommodate it."
                    .to_string()
            }
            Availability::NoGasIncome => "Usually, this means that you didn't put workers on gas. \
                It could also be that you took workers off gas before enough gas was gathered. \
                To put workers on gas when you build an assimilator, write \
                '12 Assimilator > transfer 3 workers' or '12 Assimilator > +3'. \
                Similarly for a Refinery or an Extractor."
                .to_string(),
            Availability::NoLarvaProduction { .. } => {
                "Make sure a hatchery carrying the required tag exists before this job.".to_string()
            }
            Availability::NoMineralIncome => "You may have taken all remaining workers off \
                minerals, or used up all your Drones to build structures."
                .to_string(),
            Availability::MissingPrerequisite { .. } => "You must ensure that the prerequisite \
                structure or upgrade can be scheduled before this job."
                .to_string(),
            Availability::MissingProductionQueue { .. } => {
                "You must ensure that the required production queue exists before this job."
                    .to_string()
            }
            Availability::MissingCaster { .. } => {
                "You must ensure that the required spellcaster exists before this job.".to_string()
            }
        }
    }

    /// Whether committing `job` could lift this block.
    pub fn solved_by(&self, job: &Job, catalog: &Catalog) -> bool {
        match self {
            Availability::Available => true,
            Availability::InsufficientSupply { count, needed } => {
                let gap = needed - count;
                let cost = job.supply_cost(catalog, true);
                match gap.signum() {
                    1 => cost > 0 && cost <= gap,
                    -1 => cost < 0 && cost >= gap,
                    _ => true,
                }
            }
            Availability::InsufficientSupplyCapacity => job
                .products_created(catalog)
                .iter()
                .any(|&p| catalog.get(p).supply_capacity > 0),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_catalog;

    fn tags(names: &[&str]) -> Option<Vec<String>> {
        Some(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn renders_supply_direction() {
        let short = Availability::InsufficientSupply { count: 10, needed: 12 };
        assert_eq!(short.to_string(), "There is insufficient supply.");
        assert!(short.hint().contains("only 10"));
        let over = Availability::InsufficientSupply { count: 14, needed: 12 };
        assert_eq!(over.to_string(), "There is too much supply.");
        assert!(over.hint().contains("already 14"));
    }

    #[test]
    fn renders_queue_lists() {
        let one = Availability::MissingProductionQueue {
            queues: vec!["Gateway".into()],
            tags: None,
        };
        assert_eq!(one.to_string(), "No production queue of type 'Gateway' exists.");
        let many = Availability::MissingProductionQueue {
            queues: vec!["Gateway".into(), "Warp Gate".into(), "Robotics Facility".into()],
            tags: tags(&["main", "proxy"]),
        };
        assert_eq!(
            many.to_string(),
            "No production queues of type 'Gateway', 'Warp Gate' and 'Robotics Facility' \
             exist with tags #main or #proxy."
        );
    }

    #[test]
    fn renders_tagged_larvae_and_casters() {
        let larvae = Availability::NoLarvaProduction { tags: tags(&["nat"]) };
        assert_eq!(
            larvae.to_string(),
            "No larva are being generated from a hatchery with tag #nat."
        );
        let caster = Availability::MissingCaster {
            caster: "Queen".into(),
            tags: None,
        };
        assert_eq!(caster.to_string(), "No spellcasters of type 'Queen' exist.");
    }

    #[test]
    fn available_renders_empty() {
        assert_eq!(Availability::Available.to_string(), "");
        assert!(Availability::default().is_available());
    }

    #[test]
    fn supply_gap_solved_by_matching_direction() {
        let catalog = sample_catalog();
        let probe = Job::build(catalog.id("Probe").unwrap());
        let pylon = Job::build(catalog.id("Pylon").unwrap());
        let short = Availability::InsufficientSupply { count: 9, needed: 10 };
        assert!(short.solved_by(&probe, &catalog));
        assert!(!short.solved_by(&pylon, &catalog));
        let over = Availability::InsufficientSupply { count: 11, needed: 10 };
        assert!(!over.solved_by(&probe, &catalog));
    }

    #[test]
    fn capacity_solved_by_farm() {
        let catalog = sample_catalog();
        let pylon = Job::build(catalog.id("Pylon").unwrap());
        let probe = Job::build(catalog.id("Probe").unwrap());
        let capacity = Availability::InsufficientSupplyCapacity;
        assert!(capacity.solved_by(&pylon, &catalog));
        assert!(!capacity.solved_by(&probe, &catalog));
        assert!(!Availability::NoGasIncome.solved_by(&pylon, &catalog));
    }
}

//! Buildcalc Core -- a timing engine for StarCraft II build orders.
//!
//! Given a catalog of products and a build order, the engine computes when
//! every job can start and complete under the economy's rules: worker
//! income over time, larva generation, caster energy, production queues,
//! chronoboosts and supply capacity.
//!
//! # Scheduling
//!
//! Jobs fall into three pools:
//!
//! 1. **Fixed** -- jobs with a population or resource trigger, scheduled in
//!    written order.
//! 2. **Floating** -- jobs without a trigger that follow another job; each is
//!    committed as early as possible once the fixed jobs are placed.
//! 3. **Recurring** -- automatic jobs such as continuous worker production.
//!    They run only when squeezed in ahead of a fixed or floating job
//!    without delaying it.
//!
//! Committing a job debits its costs from every subsystem at its start time
//! and logs an [`event::Event`] with the state of the economy.
//!
//! ```rust,ignore
//! let mut order = BuildOrder::new();
//! order.push(Job::build(catalog.id("Pylon").unwrap()).at_supply(9));
//! let report = Calculator::new(&catalog).run(&order)?;
//! ```
//!
//! # Key Types
//!
//! - [`calculator::Calculator`] -- Validates and runs a build order.
//! - [`timeline::Timeline`] -- All resource subsystems plus the event log.
//! - [`scheduler::Scheduler`] -- Orders jobs and squeezes recurring ones.
//! - [`job::Job`] -- One action of a build order.
//! - [`catalog::Catalog`] -- Immutable product definitions (frozen at startup).
//! - [`fixed::Time`] -- Fixed-point game time with a `NEVER` sentinel.

pub mod availability;
pub mod calculator;
pub mod catalog;
pub mod config;
pub mod error;
pub mod event;
pub mod farm;
pub mod fixed;
pub mod hatchery;
pub mod income;
pub mod init;
pub mod job;
pub mod mutation;
pub mod queue;
pub mod scheduler;
pub mod snapshot;
pub mod spellcaster;
pub mod timeline;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use calculator::{BuildOrder, BuildReport, Calculator};
pub use error::BuildError;

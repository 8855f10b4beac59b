//! Property-based tests for the buildcalc engine.
//!
//! Uses proptest to generate worker allocations, larva usage, caster timings
//! and small build orders, then verifies the accounting invariants hold.

use buildcalc_core::calculator::{BuildOrder, Calculator};
use buildcalc_core::catalog::{Catalog, ProductId};
use buildcalc_core::config::LarvaRules;
use buildcalc_core::fixed::{Fixed64, Time};
use buildcalc_core::hatchery::Hatchery;
use buildcalc_core::income::IncomeSlot;
use buildcalc_core::job::Job;
use buildcalc_core::mutation::Mutation;
use buildcalc_core::spellcaster::Spellcaster;
use buildcalc_core::test_utils::*;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

/// A slot with one to four mineral lines and up to two geysers.
fn arb_slot() -> impl Strategy<Value = IncomeSlot> {
    (
        proptest::collection::vec(0..24i32, 1..=4),
        proptest::collection::vec(0..=3i32, 1..=2),
    )
        .prop_map(|(minerals, gas)| {
            let mut slot = IncomeSlot::new(Time::ZERO, Time::NEVER);
            slot.bases_operational = vec![true; minerals.len()];
            slot.mineral_miners = minerals;
            slot.geysers_operational = vec![true; gas.len()];
            slot.gas_miners = gas;
            slot
        })
}

/// Increasing times between 0 and 300 seconds.
fn arb_times(max: usize) -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(0.0..300.0f64, 1..=max).prop_map(|mut times| {
        times.sort_by(f64::total_cmp);
        times
    })
}

/// Population triggers for a handful of pylons, in written order.
fn arb_pylon_triggers() -> impl Strategy<Value = Vec<i32>> {
    proptest::collection::vec(0..4i32, 1..=3).prop_map(|gaps| {
        let mut supply = 7;
        gaps.into_iter()
            .map(|gap| {
                supply += gap;
                supply
            })
            .collect()
    })
}

fn pylon_order(catalog: &Catalog, triggers: &[i32]) -> BuildOrder {
    let pylon = catalog.id("Pylon").unwrap();
    let mut order = BuildOrder::new();
    for &supply in triggers {
        order.push(Job::build(pylon).at_supply(supply));
    }
    order
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Every worker a shift asks for lands on some site, and no site goes
    /// negative.
    #[test]
    fn distribution_sums_to_requested_change(slot in arb_slot(), change in -3..=3i32) {
        let total: i32 = slot.mineral_miners.iter().sum();
        prop_assume!(total + change >= 0);
        let distribution = Mutation::shift(change, 0).distribute(&slot).unwrap();
        let minerals = distribution.minerals.unwrap_or_default();
        prop_assert_eq!(minerals.net(), change);
        for (i, delta) in minerals.negative.iter().enumerate() {
            prop_assert!(slot.mineral_miners[i] + delta >= 0);
        }
    }

    /// Larvae never exceed the hard cap, however they are spent.
    #[test]
    fn larvae_stay_within_hard_cap(times in arb_times(12), bursts in 0..4usize) {
        let rules = LarvaRules::default();
        let mut hatchery = Hatchery::new(Time::ZERO, 3, None, rules, Fixed64::from_num(29));
        for i in 0..bursts {
            hatchery.burst(Time::from_secs(10.0 * i as f64));
        }
        for secs in times {
            let time = Time::from_secs(secs);
            hatchery.update(time);
            prop_assert!(hatchery.larvae <= rules.hard_cap);
            if hatchery.larvae > 0 && secs as usize % 2 == 0 {
                hatchery.larvae -= 1;
            }
        }
    }

    /// Without spending, caster energy never decreases and never exceeds the
    /// maximum.
    #[test]
    fn energy_is_monotone_until_spent(times in arb_times(10)) {
        let mut caster = Spellcaster::new(
            ProductId(0),
            Time::ZERO,
            50,
            200,
            None,
            Fixed64::from_num(0.5625),
        );
        let mut previous = caster.energy(false);
        for secs in times {
            caster.update(Time::from_secs(secs));
            let energy = caster.energy(false);
            prop_assert!(energy >= previous);
            prop_assert!(energy <= caster.energy_max);
            previous = energy;
        }
    }

    /// The same build order always produces the same schedule.
    #[test]
    fn calculation_is_deterministic(triggers in arb_pylon_triggers()) {
        let catalog = sample_catalog();
        let order = pylon_order(&catalog, &triggers);
        let calculator = Calculator::new(&catalog);
        let first = calculator.run(&order);
        let second = calculator.run(&order);
        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.jobs, b.jobs);
                prop_assert_eq!(a.events, b.events);
            }
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "runs disagree"),
        }
    }

    /// Committed jobs never start before the game does and never complete
    /// before they start.
    #[test]
    fn committed_jobs_are_well_ordered(triggers in arb_pylon_triggers()) {
        let catalog = sample_catalog();
        let order = pylon_order(&catalog, &triggers);
        if let Ok(report) = Calculator::new(&catalog).run(&order) {
            for job in &report.jobs {
                prop_assert!(job.started >= Time::ZERO);
                prop_assert!(job.completed >= job.started);
                prop_assert!(!job.started.is_never());
            }
            prop_assert_eq!(report.supply_count, *triggers.last().unwrap());
        }
    }
}

//! Loading economy constants from disk and running builds under them.

use buildcalc_core::calculator::{BuildOrder, Calculator};
use buildcalc_core::config::{ConfigError, EconomyConfig};
use buildcalc_core::test_utils::*;
use std::path::PathBuf;

fn scratch_file(name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("buildcalc-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn ron_file_round_trips() {
    let mut original = EconomyConfig::default();
    original.larva.interval = 11.0;
    original.chrono.rate = 1.5;
    let text = ron::ser::to_string_pretty(&original, ron::ser::PrettyConfig::default()).unwrap();
    let path = scratch_file("economy.ron", &text);
    assert_eq!(EconomyConfig::load(&path).unwrap(), original);
}

#[test]
fn toml_file_round_trips() {
    let mut original = EconomyConfig::default();
    original.start.build_delay = 1.5;
    let text = toml::to_string(&original).unwrap();
    let path = scratch_file("economy.toml", &text);
    assert_eq!(EconomyConfig::load(&path).unwrap(), original);
}

#[test]
fn parse_errors_name_the_file() {
    let path = scratch_file("broken.toml", "[start\nworkers = 6\n");
    let err = EconomyConfig::load(&path).unwrap_err();
    let ConfigError::Parse { origin, .. } = err else {
        panic!("expected a parse error");
    };
    assert!(origin.ends_with("broken.toml"));
}

#[test]
fn build_delay_pushes_the_first_purchase_back() {
    let catalog = sample_catalog();
    let mut order = BuildOrder::new();
    order.push(job(&catalog, "Pylon").at_supply(6));

    let standard = Calculator::new(&catalog).run(&order).unwrap();
    let delayed_config =
        EconomyConfig::from_toml_str("[start]\nbuild_delay = 3.0\n").unwrap();
    let delayed = Calculator::new(&catalog)
        .with_config(delayed_config)
        .run(&order)
        .unwrap();

    let standard = standard.job("Pylon").unwrap().started;
    let delayed = delayed.job("Pylon").unwrap().started;
    assert!(delayed > standard);
}

//! Game constants for the economy model.
//!
//! Every rate, cap and delay the engine uses lives in [`EconomyConfig`].
//! The defaults reproduce the standard 1v1 ladder economy; a config can be
//! loaded from a TOML or RON document (detected from the file extension) to
//! model other patches or game modes.

use crate::fixed::{Fixed64, f64_to_fixed64};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading or validating a config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file has an extension we don't support.
    #[error("unsupported config format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {origin}: {detail}")]
    Parse { origin: String, detail: String },

    /// A value is outside its allowed range.
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Sections
// ===========================================================================

/// Harvest rates and saturation thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Minerals per second per worker up to `mineral_saturation` workers.
    pub mineral_rate: f64,
    pub mineral_saturation: u32,
    /// Minerals per second per worker beyond saturation.
    pub oversaturated_rate: f64,
    /// How many oversaturated workers still contribute.
    pub oversaturation_cap: u32,
    pub gas_rate: f64,
    pub gas_saturation: u32,
    pub mule_rate: f64,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            mineral_rate: 0.7,
            mineral_saturation: 16,
            oversaturated_rate: 0.3,
            oversaturation_cap: 8,
            gas_rate: 0.63,
            gas_saturation: 3,
            mule_rate: 2.9,
        }
    }
}

/// Larva generation rules for hatcheries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LarvaConfig {
    /// Seconds between naturally generated larvae.
    pub interval: f64,
    /// Natural generation stops at this many larvae.
    pub natural_cap: u32,
    /// Absolute larva cap per hatchery, bursts included.
    pub hard_cap: u32,
    /// Larvae delivered by one burst.
    pub burst_size: u32,
}

impl Default for LarvaConfig {
    fn default() -> Self {
        Self {
            interval: 15.0,
            natural_cap: 3,
            hard_cap: 19,
            burst_size: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    /// Energy regenerated per second by every caster.
    pub regen_rate: f64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self { regen_rate: 0.5625 }
    }
}

/// Production acceleration rules (chronoboost and warp gates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChronoConfig {
    /// Speed multiplier while a queue is boosted.
    pub rate: f64,
    /// Reaction delay before a boost lands after work starts.
    pub human_delay: f64,
    /// Seconds shaved off work planned on an accelerated queue.
    pub accelerated_reduction: f64,
    /// Completion delay of work committed on an accelerated queue.
    pub accelerated_completion: f64,
}

impl Default for ChronoConfig {
    fn default() -> Self {
        Self {
            rate: 1.5,
            human_delay: 0.1,
            accelerated_reduction: 10.0,
            accelerated_completion: 5.0,
        }
    }
}

/// Starting position of a standard game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartConfig {
    pub workers: u32,
    pub minerals: u32,
    pub gas: u32,
    pub supply: i32,
    pub larvae: u32,
    /// Seconds of idle time before workers start mining.
    pub build_delay: f64,
}

impl Default for StartConfig {
    fn default() -> Self {
        Self {
            workers: 6,
            minerals: 50,
            gas: 0,
            supply: 6,
            larvae: 3,
            build_delay: 0.0,
        }
    }
}

// ===========================================================================
// EconomyConfig
// ===========================================================================

/// All game constants used by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub mining: MiningConfig,
    pub larva: LarvaConfig,
    pub energy: EnergyConfig,
    pub chrono: ChronoConfig,
    pub start: StartConfig,
}

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
}

/// Detect the format of a config file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        _ => Err(ConfigError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

impl EconomyConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            origin: "toml".to_string(),
            detail: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(content).map_err(|e| ConfigError::Parse {
            origin: "ron".to_string(),
            detail: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file, choosing the parser from its extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        match format {
            Format::Ron => Self::from_ron_str(&content),
            Format::Toml => Self::from_toml_str(&content),
        }
        .map_err(|e| match e {
            ConfigError::Parse { detail, .. } => ConfigError::Parse {
                origin: path.display().to_string(),
                detail,
            },
            other => other,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("mining.mineral_rate", self.mining.mineral_rate),
            ("mining.gas_rate", self.mining.gas_rate),
            ("larva.interval", self.larva.interval),
            ("energy.regen_rate", self.energy.regen_rate),
            ("chrono.rate", self.chrono.rate),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be positive, got {value}"),
                });
            }
        }
        let non_negative = [
            ("mining.oversaturated_rate", self.mining.oversaturated_rate),
            ("mining.mule_rate", self.mining.mule_rate),
            ("chrono.human_delay", self.chrono.human_delay),
            ("chrono.accelerated_reduction", self.chrono.accelerated_reduction),
            ("chrono.accelerated_completion", self.chrono.accelerated_completion),
            ("start.build_delay", self.start.build_delay),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must not be negative, got {value}"),
                });
            }
        }
        if self.larva.natural_cap == 0 || self.larva.natural_cap > self.larva.hard_cap {
            return Err(ConfigError::Invalid {
                field: "larva.natural_cap",
                reason: format!(
                    "must be between 1 and hard_cap ({}), got {}",
                    self.larva.hard_cap, self.larva.natural_cap
                ),
            });
        }
        if self.mining.gas_saturation == 0 {
            return Err(ConfigError::Invalid {
                field: "mining.gas_saturation",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn mining_rates(&self) -> MiningRates {
        MiningRates {
            mineral_rate: f64_to_fixed64(self.mining.mineral_rate),
            mineral_saturation: self.mining.mineral_saturation as i32,
            oversaturated_rate: f64_to_fixed64(self.mining.oversaturated_rate),
            oversaturation_cap: self.mining.oversaturation_cap as i32,
            gas_rate: f64_to_fixed64(self.mining.gas_rate),
            gas_saturation: self.mining.gas_saturation as i32,
            mule_rate: f64_to_fixed64(self.mining.mule_rate),
        }
    }

    pub fn larva_rules(&self) -> LarvaRules {
        LarvaRules {
            interval: f64_to_fixed64(self.larva.interval),
            natural_cap: self.larva.natural_cap,
            hard_cap: self.larva.hard_cap,
            burst_size: self.larva.burst_size,
        }
    }

    pub fn energy_rate(&self) -> Fixed64 {
        f64_to_fixed64(self.energy.regen_rate)
    }
}

// ---------------------------------------------------------------------------
// Resolved rule sets
// ---------------------------------------------------------------------------

/// [`MiningConfig`] converted to fixed point for use by income slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiningRates {
    pub mineral_rate: Fixed64,
    pub mineral_saturation: i32,
    pub oversaturated_rate: Fixed64,
    pub oversaturation_cap: i32,
    pub gas_rate: Fixed64,
    pub gas_saturation: i32,
    pub mule_rate: Fixed64,
}

impl Default for MiningRates {
    fn default() -> Self {
        EconomyConfig::default().mining_rates()
    }
}

/// [`LarvaConfig`] converted to fixed point for use by hatcheries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LarvaRules {
    pub interval: Fixed64,
    pub natural_cap: u32,
    pub hard_cap: u32,
    pub burst_size: u32,
}

impl Default for LarvaRules {
    fn default() -> Self {
        EconomyConfig::default().larva_rules()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(EconomyConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EconomyConfig::from_toml_str(
            r#"
            [mining]
            mineral_rate = 0.9

            [start]
            build_delay = 2.5
            "#,
        )
        .unwrap();
        assert_eq!(config.mining.mineral_rate, 0.9);
        assert_eq!(config.mining.gas_rate, 0.63);
        assert_eq!(config.start.build_delay, 2.5);
        assert_eq!(config.start.workers, 6);
    }

    #[test]
    fn ron_document_parses() {
        let config =
            EconomyConfig::from_ron_str("(larva: (interval: 11.0), energy: (regen_rate: 0.7875))")
                .unwrap();
        assert_eq!(config.larva.interval, 11.0);
        assert_eq!(config.larva.hard_cap, 19);
        assert_eq!(config.energy.regen_rate, 0.7875);
    }

    #[test]
    fn toml_round_trip() {
        let original = EconomyConfig::default();
        let text = toml::to_string(&original).unwrap();
        assert_eq!(EconomyConfig::from_toml_str(&text).unwrap(), original);
    }

    #[test]
    fn rejects_non_positive_rate() {
        let err = EconomyConfig::from_toml_str("[mining]\ngas_rate = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "mining.gas_rate", .. }));
    }

    #[test]
    fn rejects_natural_cap_above_hard_cap() {
        let mut config = EconomyConfig::default();
        config.larva.natural_cap = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_input_is_parse_error() {
        let err = EconomyConfig::from_toml_str("[mining\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn unsupported_extension() {
        let err = detect_format(Path::new("economy.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }

    #[test]
    fn rates_convert_to_fixed() {
        let rates = EconomyConfig::default().mining_rates();
        assert_eq!(rates.mineral_saturation, 16);
        assert_eq!(rates.gas_saturation, 3);
        assert_eq!(rates.mineral_rate, f64_to_fixed64(0.7));
    }
}

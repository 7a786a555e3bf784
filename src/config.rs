//! # Engine Configuration
//!
//! Loads and parses the engine's own `astro-events.toml`, covering the
//! year range default, orb policy, detector scan constants, and the
//! store's batch size and database path.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    pub range: RangeConfig,
    pub orbs: OrbConfig,
    pub scan: ScanConfig,
    pub store: StoreConfig,
}

/// Default year span used when a caller doesn't pin one explicitly.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RangeConfig {
    pub default_start_year: i32,
    pub default_end_year: i32,
}

/// Aspect orb policy. Fixed as compile-time configuration rather than
/// runtime reflection parameters (§9 Open Question resolution).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrbConfig {
    pub major_orb_deg: f64,
    pub minor_orb_deg: f64,
    pub include_minor: bool,
    pub min_strength_pct: f64,
}

/// Detector scan/debounce constants.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    pub aspect_step_hours: i64,
    pub planet_phase_debounce_days: i64,
    pub eclipse_advance_days: i64,
}

/// Store write-path tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub batch_size: usize,
    pub database_path: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            range: RangeConfig {
                default_start_year: 1900,
                default_end_year: 2100,
            },
            orbs: OrbConfig {
                major_orb_deg: 6.0,
                minor_orb_deg: 2.0,
                include_minor: true,
                min_strength_pct: 0.0,
            },
            scan: ScanConfig {
                aspect_step_hours: 6,
                planet_phase_debounce_days: 10,
                eclipse_advance_days: 10,
            },
            store: StoreConfig {
                batch_size: 100,
                database_path: "astro-events.sqlite3".to_string(),
            },
        }
    }
}

impl EngineConfig {
    /// Load configuration from `astro-events.toml`.
    /// Falls back to default configuration if the file doesn't exist or is invalid.
    pub fn load() -> Self {
        Self::load_from_path("astro-events.toml")
    }

    /// Load configuration from the given path.
    /// Falls back to default configuration if the file doesn't exist or is invalid.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<EngineConfig>(&contents) {
                Ok(config) => {
                    log::info!(
                        "loaded engine configuration for range {}-{}",
                        config.range.default_start_year,
                        config.range.default_end_year
                    );
                    config
                }
                Err(e) => {
                    log::warn!("invalid config file format: {e}; using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("no config file found; using default configuration");
                Self::default()
            }
        }
    }

    /// Save the current configuration to `astro-events.toml`.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write("astro-events.toml", contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.range.default_start_year, 1900);
        assert_eq!(config.range.default_end_year, 2100);
        assert_eq!(config.orbs.major_orb_deg, 6.0);
        assert_eq!(config.orbs.minor_orb_deg, 2.0);
        assert_eq!(config.store.batch_size, 100);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = EngineConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: EngineConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.range.default_start_year, parsed.range.default_start_year);
        assert_eq!(config.store.database_path, parsed.store.database_path);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = EngineConfig::load_from_path("/nonexistent/path");
        assert_eq!(config.range.default_start_year, 1900);
    }
}

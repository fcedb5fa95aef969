use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::Deserialize;
use temporal_bot_core::SimulationConfig;

/// Timing overrides read from a TOML file. Missing fields keep their defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    tick_period_ms: Option<u64>,
    animation_length_ms: Option<u64>,
    particle_lifetime_ms: Option<u64>,
}

impl ConfigFile {
    fn into_simulation(self) -> Result<SimulationConfig> {
        let millis = |value: Option<u64>, fallback: Duration| {
            value.map_or(fallback, Duration::from_millis)
        };
        let config = SimulationConfig::new(
            millis(self.tick_period_ms, SimulationConfig::DEFAULT_TICK_PERIOD),
            millis(
                self.animation_length_ms,
                SimulationConfig::DEFAULT_ANIMATION_LENGTH,
            ),
            millis(
                self.particle_lifetime_ms,
                SimulationConfig::DEFAULT_PARTICLE_LIFETIME,
            ),
        )?;
        Ok(config)
    }
}

/// Parses simulation timing from TOML text.
pub(crate) fn parse(contents: &str) -> Result<SimulationConfig> {
    let file: ConfigFile = toml::from_str(contents).context("invalid configuration file")?;
    file.into_simulation()
}

/// Loads simulation timing from the provided path, or the defaults when absent.
pub(crate) fn load(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    parse(&contents).with_context(|| format!("failed to load configuration {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_uses_defaults() {
        assert_eq!(load(None).expect("defaults"), SimulationConfig::default());
    }

    #[test]
    fn fields_override_defaults_individually() {
        let config = parse("animation_length_ms = 250").expect("valid config");

        assert_eq!(config.animation_length(), Duration::from_millis(250));
        assert_eq!(config.tick_period(), SimulationConfig::DEFAULT_TICK_PERIOD);
        assert_eq!(
            config.particle_lifetime(),
            SimulationConfig::DEFAULT_PARTICLE_LIFETIME
        );
    }

    #[test]
    fn zero_tick_period_is_rejected() {
        assert!(parse("tick_period_ms = 0").is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(parse("tick_rate = 5").is_err());
    }
}

//! Optional TOML run configuration for the CLI.
//!
//! Every field mirrors a command-line flag; flags win when both are given.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// Run parameters loadable from a TOML file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RunConfig {
    /// RNG seed shared by the seeder and the AI.
    pub(crate) seed: Option<u64>,
    /// Number of simulation ticks to run.
    pub(crate) ticks: Option<u32>,
    /// Simulated minutes that elapse per tick.
    pub(crate) minutes_per_tick: Option<u32>,
    /// Fixed per-tick path budget override.
    pub(crate) path_budget: Option<u32>,
}

impl RunConfig {
    /// Loads a run configuration from the provided TOML file.
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading run config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing run config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_configs() {
        let config: RunConfig = toml::from_str("seed = 42\nticks = 100\n").expect("parses");
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.ticks, Some(100));
        assert_eq!(config.minutes_per_tick, None);
        assert_eq!(config.path_budget, None);
    }

    #[test]
    fn rejects_unknown_fields() {
        let result: Result<RunConfig, _> = toml::from_str("speed = 9\n");
        assert!(result.is_err());
    }
}

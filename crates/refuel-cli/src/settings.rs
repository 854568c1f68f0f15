//! Run settings taken from the environment and the command line.

use refuel_core::SimulationConfig;
use std::env;

/// Overrides applied on top of a scenario file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSettings {
    pub time_step_s: Option<f64>,
    pub max_time_step_s: Option<f64>,
    /// Keep a snapshot every this many steps; 0 keeps none
    pub trace_every: usize,
}

impl RunSettings {
    pub fn from_env() -> Self {
        Self {
            time_step_s: env::var("REFUEL_TIME_STEP_S")
                .ok()
                .and_then(|s| s.parse().ok()),
            max_time_step_s: env::var("REFUEL_MAX_TIME_STEP_S")
                .ok()
                .and_then(|s| s.parse().ok()),
            trace_every: env::var("REFUEL_TRACE_EVERY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
        }
    }

    /// Command line values win over the environment.
    pub fn merged(
        self,
        time_step_s: Option<f64>,
        max_time_step_s: Option<f64>,
        trace_every: Option<usize>,
    ) -> Self {
        Self {
            time_step_s: time_step_s.or(self.time_step_s),
            max_time_step_s: max_time_step_s.or(self.max_time_step_s),
            trace_every: trace_every.unwrap_or(self.trace_every),
        }
    }

    /// Write the overrides into `config` and re-check it.
    pub fn apply(&self, config: &mut SimulationConfig) -> Result<(), refuel_core::ConfigError> {
        if let Some(step) = self.time_step_s {
            config.simulation.time_step_s = step;
        }
        if let Some(max) = self.max_time_step_s {
            config.simulation.max_time_step_s = max;
        }
        config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_wins() {
        let env = RunSettings {
            time_step_s: Some(5.0),
            max_time_step_s: Some(30.0),
            trace_every: 3,
        };
        let merged = env.merged(Some(2.0), None, Some(0));
        assert_eq!(merged.time_step_s, Some(2.0));
        assert_eq!(merged.max_time_step_s, Some(30.0));
        assert_eq!(merged.trace_every, 0);
    }

    #[test]
    fn test_apply_rejects_step_above_maximum() {
        let mut config = SimulationConfig::default();
        let settings = RunSettings {
            time_step_s: Some(120.0),
            ..RunSettings::default()
        };
        assert!(settings.apply(&mut config).is_err());

        let settings = RunSettings {
            time_step_s: Some(120.0),
            max_time_step_s: Some(120.0),
            trace_every: 0,
        };
        settings.apply(&mut config).unwrap();
        assert_eq!(config.simulation.time_step_s, 120.0);
    }
}

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::generator::{SchemaGenerator, DEFAULT_SAMPLE_LINES};
use crate::validator::{SchemaValidator, DEFAULT_MATCH_THRESHOLD, DEFAULT_MIN_SAMPLE_SIZE};

pub const ENV_PREFIX: &str = "TASKSCHEMA";
pub const CONFIG_FILE: &str = "taskschema";

/// Tunables, layered as defaults < `taskschema.{toml,json,yaml}` < `TASKSCHEMA_*` env vars.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub sample_lines: usize,
    pub match_threshold: f64,
    pub min_sample_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sample_lines: DEFAULT_SAMPLE_LINES,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            min_sample_size: DEFAULT_MIN_SAMPLE_SIZE,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("sample_lines", DEFAULT_SAMPLE_LINES as i64)?
            .set_default("match_threshold", DEFAULT_MATCH_THRESHOLD)?
            .set_default("min_sample_size", DEFAULT_MIN_SAMPLE_SIZE as i64)?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn generator(&self) -> SchemaGenerator {
        SchemaGenerator::new(self.sample_lines)
    }

    pub fn validator(&self) -> SchemaValidator {
        SchemaValidator::new(self.match_threshold, self.min_sample_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.sample_lines, 500);
        assert_eq!(s.match_threshold, 0.95);
        assert_eq!(s.min_sample_size, 10);
        assert_eq!(s.generator().sample_lines(), 500);
    }

    #[test]
    fn env_overrides_defaults() {
        std::env::set_var("TASKSCHEMA_MIN_SAMPLE_SIZE", "3");
        let s = Settings::load().unwrap();
        std::env::remove_var("TASKSCHEMA_MIN_SAMPLE_SIZE");
        assert_eq!(s.min_sample_size, 3);
        assert_eq!(s.sample_lines, 500);
    }
}

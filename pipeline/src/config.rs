//! Pipeline configuration.
//!
//! Values come from, in increasing priority: built-in defaults, environment
//! variables (a `.env` file is loaded by the binary), then CLI flags.
//!
//! | Variable               | Field        |
//! |------------------------|--------------|
//! | `HEARTPREP_INPUT`      | `input`      |
//! | `HEARTPREP_OUTPUT`     | `output`     |
//! | `HEARTPREP_PARTITIONS` | `partitions` |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_INPUT: &str = "data/heart_disease_data.csv";
pub const DEFAULT_OUTPUT: &str = "output/processed_heart_disease_data.csv";

/// Options for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Input dataset
    pub input: PathBuf,

    /// Export target
    pub output: PathBuf,

    /// Input delimiter (auto-detect if `None`); also used for the export
    pub delimiter: Option<char>,

    /// Number of row partitions processed concurrently
    pub partitions: usize,

    /// Drop the last-ranked category from the one-hot vector
    pub drop_last: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            delimiter: None,
            partitions: default_partitions(),
            drop_last: true,
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by `HEARTPREP_*` variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    /// Unparseable partition counts are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(input) = lookup("HEARTPREP_INPUT").filter(|v| !v.is_empty()) {
            config.input = PathBuf::from(input);
        }
        if let Some(output) = lookup("HEARTPREP_OUTPUT").filter(|v| !v.is_empty()) {
            config.output = PathBuf::from(output);
        }
        if let Some(n) = lookup("HEARTPREP_PARTITIONS").and_then(|v| v.trim().parse::<usize>().ok()) {
            config.partitions = n.max(1);
        }
        config
    }

    /// Delimiter for the export: the forced input delimiter, or a comma.
    pub fn output_delimiter(&self) -> u8 {
        match self.delimiter {
            Some(d) if d.is_ascii() => d as u8,
            _ => b',',
        }
    }
}

fn default_partitions() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.input, PathBuf::from(DEFAULT_INPUT));
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT));
        assert!(config.drop_last);
        assert!(config.partitions >= 1);
        assert_eq!(config.output_delimiter(), b',');
    }

    #[test]
    fn test_env_overrides() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("HEARTPREP_INPUT", "in.csv"),
            ("HEARTPREP_OUTPUT", "out/result.csv"),
            ("HEARTPREP_PARTITIONS", "3"),
        ]));

        assert_eq!(config.input, PathBuf::from("in.csv"));
        assert_eq!(config.output, PathBuf::from("out/result.csv"));
        assert_eq!(config.partitions, 3);
    }

    #[test]
    fn test_invalid_partitions_ignored() {
        let config = PipelineConfig::from_lookup(lookup(&[("HEARTPREP_PARTITIONS", "many")]));
        assert_eq!(config.partitions, PipelineConfig::default().partitions);

        let config = PipelineConfig::from_lookup(lookup(&[("HEARTPREP_PARTITIONS", "0")]));
        assert_eq!(config.partitions, 1);
    }

    #[test]
    fn test_output_delimiter_follows_input() {
        let config = PipelineConfig {
            delimiter: Some(';'),
            ..PipelineConfig::default()
        };
        assert_eq!(config.output_delimiter(), b';');
    }
}

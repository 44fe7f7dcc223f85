use std::path::PathBuf;

use crate::direction::PRESENCE_THRESHOLD;
use crate::error::CoreError;

/// Pipeline configuration loaded from environment variables.
///
/// CLI flags override these values after loading.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Store file (default: `poseaxis.db`).
    pub database_path: PathBuf,
    /// Presence needed for a landmark to qualify for torso/spine inference.
    pub presence_threshold: f64,
    /// Concurrent detector invocations during ingestion.
    pub max_workers: usize,
    /// Recreate missing tables on open instead of failing.
    pub repair_missing_tables: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("poseaxis.db"),
            presence_threshold: PRESENCE_THRESHOLD,
            max_workers: default_workers(),
            repair_missing_tables: true,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default               |
    /// |----------------------------------|-----------------------|
    /// | `POSEAXIS_DATABASE_PATH`         | `poseaxis.db`         |
    /// | `POSEAXIS_PRESENCE_THRESHOLD`    | `0.9`                 |
    /// | `POSEAXIS_MAX_WORKERS`           | available parallelism |
    /// | `POSEAXIS_REPAIR_MISSING_TABLES` | `true`                |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let defaults = Self::default();

        let database_path = lookup("POSEAXIS_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let presence_threshold = match lookup("POSEAXIS_PRESENCE_THRESHOLD") {
            Some(raw) => {
                let value: f64 = raw.trim().parse().map_err(|_| {
                    CoreError::Validation(format!(
                        "POSEAXIS_PRESENCE_THRESHOLD must be a number, got '{raw}'"
                    ))
                })?;
                if !(0.0..=1.0).contains(&value) {
                    return Err(CoreError::Validation(format!(
                        "POSEAXIS_PRESENCE_THRESHOLD must be within [0, 1], got {value}"
                    )));
                }
                value
            }
            None => defaults.presence_threshold,
        };

        let max_workers = match lookup("POSEAXIS_MAX_WORKERS") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(CoreError::Validation(format!(
                        "POSEAXIS_MAX_WORKERS must be a positive integer, got '{raw}'"
                    )))
                }
            },
            None => defaults.max_workers,
        };

        let repair_missing_tables = match lookup("POSEAXIS_REPAIR_MISSING_TABLES") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                CoreError::Validation(format!(
                    "POSEAXIS_REPAIR_MISSING_TABLES must be a boolean, got '{raw}'"
                ))
            })?,
            None => defaults.repair_missing_tables,
        };

        Ok(Self {
            database_path,
            presence_threshold,
            max_workers,
            repair_missing_tables,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

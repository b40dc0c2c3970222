//! Host configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use humantime_serde::re::humantime;
use serde::{Deserialize, Serialize};

use logsweep_retention::{CleanerConfig, DEFAULT_RESERVE, DEFAULT_SCAN_INTERVAL};

/// Top-level configuration file.
///
/// ```toml
/// [[cleaners]]
/// path = "/var/log/myapp"
/// prefix = "myapp"
/// interval = "1m"
/// reserve = "72h"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    /// One entry per managed directory/prefix pair.
    #[serde(default)]
    pub cleaners: Vec<CleanerConfig>,
}

impl HostConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        if config.cleaners.is_empty() {
            bail!("{} defines no [[cleaners]]", path.display());
        }

        Ok(config)
    }

    /// Build a single cleaner from `LOGSWEEP_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let path = var("LOGSWEEP_PATH").context("LOGSWEEP_PATH is not set")?;
        let prefix = var("LOGSWEEP_PREFIX").context("LOGSWEEP_PREFIX is not set")?;
        let interval = duration_var(&var, "LOGSWEEP_INTERVAL")?.unwrap_or(DEFAULT_SCAN_INTERVAL);
        let reserve = duration_var(&var, "LOGSWEEP_RESERVE")?.unwrap_or(DEFAULT_RESERVE);

        Ok(Self {
            cleaners: vec![CleanerConfig::new(
                PathBuf::from(path),
                prefix,
                interval,
                reserve,
            )],
        })
    }
}

fn duration_var(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> anyhow::Result<Option<Duration>> {
    var(key)
        .map(|value| {
            humantime::parse_duration(&value)
                .with_context(|| format!("{} is not a valid duration: {:?}", key, value))
        })
        .transpose()
}

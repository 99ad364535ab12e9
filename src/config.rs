use crate::{evaluate::Thresholds, Args};
use anyhow::{anyhow, bail, Result};
use serde::Deserialize;
use std::{fs, path::Path};

/// Hard cap on worker threads, whatever the hardware reports
pub const MAX_THREADS: usize = 64;

/// Settings that may come from a TOML file. Command-line values win.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub distance: Option<f64>,
    pub abundance: Option<f64>,
    pub pvalue: Option<f64>,
    pub threads: Option<usize>,
}

impl ConfigFile {
    pub fn from_path(path: &Path) -> Result<ConfigFile> {
        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow!("Cannot read {}: {e}", path.display()))?;
        toml::from_str(&contents)
            .map_err(|e| anyhow!("Cannot parse {}: {e}", path.display()))
    }
}

/// Resolved run settings
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub thresholds: Thresholds,
    pub threads: usize,
}

impl Config {
    pub fn from_args(args: &Args) -> Result<Config> {
        let file = match &args.config {
            Some(path) => ConfigFile::from_path(path)?,
            _ => ConfigFile::default(),
        };
        let defaults = Thresholds::default();

        Ok(Config {
            thresholds: Thresholds {
                distance: args
                    .distance
                    .or(file.distance)
                    .unwrap_or(defaults.distance),
                abundance_ratio: args
                    .abundance
                    .or(file.abundance)
                    .unwrap_or(defaults.abundance_ratio),
                pvalue: args.pvalue.or(file.pvalue).unwrap_or(defaults.pvalue),
            },
            threads: args.threads.or(file.threads).unwrap_or(1),
        })
    }

    // --------------------------------------------------
    /// Reject thresholds out of range and more threads than `available`
    /// cores (when more than one is reported) or `MAX_THREADS`
    pub fn validate(&self, available: usize) -> Result<()> {
        let Thresholds {
            distance,
            abundance_ratio,
            pvalue,
        } = self.thresholds;

        if !distance.is_finite() || distance < 0. {
            bail!("-d/--distance must be greater or equal to 0");
        }
        if !abundance_ratio.is_finite() || abundance_ratio < 0. {
            bail!("-a/--abundance must be greater or equal to 0");
        }
        if !(0. ..=1.).contains(&pvalue) {
            bail!("-p/--pvalue must be between 0.0 and 1.0");
        }

        if self.threads < 1 {
            bail!("Must specify at least 1 thread");
        }
        if available > 1 && self.threads > available {
            bail!("Only {available} threads are available");
        }
        if self.threads > MAX_THREADS {
            bail!("Cannot use more than {MAX_THREADS} threads");
        }

        Ok(())
    }
}

use std::{fs, path::Path};

use color_eyre::eyre::{self, WrapErr};
use orbcalc::bodies::Body;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::environment::Environment;

pub const DEFAULT_CONFIG_PATH: &str = "orbcalc.toml";

/// Startup settings, read from a TOML file.
///
/// ```toml
/// time_step = 10.0
/// final_time = 6000.0
///
/// [central_body]
/// mu = 398600.4418
/// # J2, J3, ...
/// jeffery_constants = [1.75553e10, -2.61913e11]
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub central_body: Option<BodyConfig>,
    pub time_step: Option<f64>,
    pub final_time: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BodyConfig {
    /// Standard gravitational parameter (`km^3/s^2`).
    pub mu: f64,
    /// Jeffery constants, starting at `J2`.
    #[serde(default)]
    pub jeffery_constants: Vec<f64>,
}

impl BodyConfig {
    pub fn to_body(&self) -> orbcalc::Result<Body> {
        Body::with_jeffery_constants(self.mu, &self.jeffery_constants)
    }
}

impl Config {
    /// Read the configuration at `path`. A missing file gives the
    /// default configuration.
    pub fn load(path: &Path) -> eyre::Result<Self> {
        if !path.exists() {
            info!("no configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text).wrap_err_with(|| format!("invalid configuration in {}", path.display()))
    }

    pub fn parse(text: &str) -> eyre::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn apply(&self, env: &mut Environment) -> eyre::Result<()> {
        if let Some(body) = &self.central_body {
            env.set_central_body(body.to_body()?);
        }
        if let Some(dt) = self.time_step {
            env.set_time_step(dt)?;
        }
        if let Some(tf) = self.final_time {
            env.set_final_time(tf)?;
        }
        Ok(())
    }
}

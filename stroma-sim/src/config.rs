use std::{fs, path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {reason}")]
    Invalid { reason: &'static str },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read config file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Constants of the steady-state response function.
///
/// The defaults were tuned so the chart reacts visibly to the two drivers.
/// They are teaching values in arbitrary units, not fitted Calvin-cycle
/// kinetics, and should be kept as-is unless matching real kinetics is an
/// explicit goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Light intensity of the reference operating point, in lux.
    pub standard_light: f64,
    /// CO₂ level of the reference operating point, in µL/L.
    pub standard_co2: f64,
    /// Half-saturation constant for light.
    pub k_light: f64,
    /// Factor mapping the CO₂ control range onto the internal range.
    pub co2_scale: f64,
    /// Half-saturation constant for internal CO₂.
    pub k_co2: f64,
    /// Exponent applied to the CO₂ saturation factor.
    pub co2_amplify: f64,
    /// Net production rate at full saturation.
    pub rate_max: f64,
    /// Energy pool at full light saturation with no consumption.
    pub energy_max: f64,
    /// Conserved total of the energy and precursor pools.
    pub precursor_total: f64,
    /// Fraction of the energy pool consumed by carbon fixation.
    pub energy_consumption: f64,
    /// Scales how much of `energy_consumption` actually applies.
    pub partial_factor: f64,
    /// Offset that keeps the intermediate ratios finite.
    ///
    /// Smaller values allow larger swings of C3 and C5 when a driver drops to zero.
    pub epsilon: f64,
    /// C3 level at the reference operating point.
    pub fixation_base: f64,
    /// C5 level at the reference operating point.
    pub regeneration_base: f64,
    /// Upper clamp for every absolute output.
    pub absolute_max: f64,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            standard_light: 12_000.0,
            standard_co2: 420.0,
            k_light: 12_000.0,
            co2_scale: 5.0,
            k_co2: 60.0,
            co2_amplify: 3.8,
            rate_max: 200.0,
            energy_max: 200.0,
            precursor_total: 200.0,
            energy_consumption: 0.7,
            partial_factor: 0.8,
            epsilon: 0.003,
            fixation_base: 200.0,
            regeneration_base: 120.0,
            absolute_max: 1000.0,
        }
    }
}

impl ResponseConfig {
    /// Validates that all constants are finite and within their valid ranges.
    ///
    /// # Errors
    ///
    /// Returns a static reason describing the first invalid constant.
    pub fn validate(&self) -> Result<(), &'static str> {
        let all = [
            self.standard_light,
            self.standard_co2,
            self.k_light,
            self.co2_scale,
            self.k_co2,
            self.co2_amplify,
            self.rate_max,
            self.energy_max,
            self.precursor_total,
            self.energy_consumption,
            self.partial_factor,
            self.epsilon,
            self.fixation_base,
            self.regeneration_base,
            self.absolute_max,
        ];
        if all.iter().any(|value| !value.is_finite()) {
            return Err("response constants must be finite");
        }
        if self.standard_light < 0.0 || self.standard_co2 < 0.0 {
            return Err("reference operating point must be non-negative");
        }
        if self.k_light <= 0.0 || self.k_co2 <= 0.0 {
            return Err("half-saturation constants must be positive");
        }
        if self.co2_scale <= 0.0 || self.co2_amplify <= 0.0 {
            return Err("co2_scale and co2_amplify must be positive");
        }
        if self.epsilon <= 0.0 {
            return Err("epsilon must be positive");
        }
        if self.rate_max < 0.0 || self.energy_max < 0.0 || self.precursor_total < 0.0 {
            return Err("pool sizes must be non-negative");
        }
        if self.fixation_base < 0.0 || self.regeneration_base < 0.0 {
            return Err("intermediate baselines must be non-negative");
        }
        if self.absolute_max <= 0.0 {
            return Err("absolute_max must be positive");
        }
        if self.energy_max > self.precursor_total {
            return Err("energy_max must not exceed precursor_total");
        }
        if self.precursor_total > self.absolute_max {
            return Err("precursor_total must not exceed absolute_max");
        }
        Ok(())
    }
}

/// Configuration of a simulation [`Engine`](crate::Engine).
///
/// Every field has a documented default, and any subset can be overridden
/// from TOML:
///
/// ```
/// use stroma_sim::SimulationConfig;
///
/// let config = SimulationConfig::from_toml_str(
///     r#"
///     history_capacity = 600
///
///     [response]
///     co2_amplify = 2.0
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(config.history_capacity, 600);
/// assert_eq!(config.response.co2_amplify, 2.0);
/// assert_eq!(config.lag_rate, 0.005);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub response: ResponseConfig,
    /// Fraction of the remaining gap a smoothed driver closes each tick.
    pub lag_rate: f64,
    /// Number of rows kept in the rolling history.
    pub history_capacity: usize,
    /// Simulated seconds per tick.
    pub time_step: f64,
    /// Upper bound of the light intensity control, in lux.
    pub light_max: f64,
    /// Upper bound of the CO₂ control, in µL/L.
    pub co2_max: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            response: ResponseConfig::default(),
            lag_rate: 0.005,
            history_capacity: 1200,
            time_step: 0.1,
            light_max: 50_000.0,
            co2_max: 1000.0,
        }
    }
}

impl SimulationConfig {
    /// Parses a configuration from TOML text and validates it.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this structure or
    /// if validation fails.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config
            .validate()
            .map_err(|reason| ConfigError::Invalid { reason })?;
        Ok(config)
    }

    /// Reads, parses, and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its contents are invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded simulation config from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a static reason describing the first invalid value.
    pub fn validate(&self) -> Result<(), &'static str> {
        self.response.validate()?;
        if !self.lag_rate.is_finite() || self.lag_rate <= 0.0 || self.lag_rate > 1.0 {
            return Err("lag_rate must be in (0, 1]");
        }
        if self.history_capacity == 0 {
            return Err("history_capacity must be at least 1");
        }
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err("time_step must be finite and positive");
        }
        if !self.light_max.is_finite() || self.light_max <= 0.0 {
            return Err("light_max must be finite and positive");
        }
        if !self.co2_max.is_finite() || self.co2_max <= 0.0 {
            return Err("co2_max must be finite and positive");
        }
        Ok(())
    }

    /// Returns the time step as a [`Duration`].
    ///
    /// Assumes a validated configuration.
    #[must_use]
    pub fn time_step_duration(&self) -> Duration {
        Duration::from_secs_f64(self.time_step)
    }
}

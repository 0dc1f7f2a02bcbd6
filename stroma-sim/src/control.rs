use serde::{Deserialize, Serialize};

use crate::{Drivers, ResponseConfig};

/// Marker recorded when the light is switched on.
pub const LIGHT_ON_MARKER: &str = "开灯";

/// Marker recorded when the light is switched off.
pub const LIGHT_OFF_MARKER: &str = "关灯";

/// The control panel state sampled by the engine on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlInputs {
    /// Light intensity setting, in lux.
    pub light_intensity: f64,
    /// CO₂ level setting, in µL/L.
    pub co2_level: f64,
    /// Whether the light source is switched on.
    pub light_on: bool,
    /// Whether the simulation is paused.
    pub paused: bool,
}

impl ControlInputs {
    /// Returns running inputs at the reference operating point of `config`.
    #[must_use]
    pub fn standard(config: &ResponseConfig) -> Self {
        Self {
            light_intensity: config.standard_light,
            co2_level: config.standard_co2,
            light_on: true,
            paused: false,
        }
    }

    /// Returns the raw driver targets, with light counted as zero when off.
    #[must_use]
    pub fn target_drivers(&self) -> Drivers {
        let light = if self.light_on {
            self.light_intensity
        } else {
            0.0
        };
        Drivers::new(light, self.co2_level)
    }

    /// Returns `self` with the given light intensity, keeping other fields unchanged.
    #[must_use]
    pub fn with_light_intensity(self, light_intensity: f64) -> Self {
        Self {
            light_intensity,
            ..self
        }
    }

    /// Returns `self` with the given CO₂ level, keeping other fields unchanged.
    #[must_use]
    pub fn with_co2_level(self, co2_level: f64) -> Self {
        Self { co2_level, ..self }
    }

    /// Returns `self` with the light switched on or off, keeping other fields unchanged.
    #[must_use]
    pub fn with_light_on(self, light_on: bool) -> Self {
        Self { light_on, ..self }
    }

    /// Returns `self` paused or running, keeping other fields unchanged.
    #[must_use]
    pub fn with_paused(self, paused: bool) -> Self {
        Self { paused, ..self }
    }

    /// Flips the light switch and marks the transition in the history.
    ///
    /// The marker is scheduled before the switch flips, so it lands on the
    /// first row computed under the new setting. Returns the marker used.
    pub fn toggle_light(&mut self, surface: &mut impl ControlSurface) -> &'static str {
        let marker = if self.light_on {
            LIGHT_OFF_MARKER
        } else {
            LIGHT_ON_MARKER
        };
        surface.set_marker(marker.to_owned());
        self.light_on = !self.light_on;
        marker
    }

    /// Restores the reference controls and restarts the simulation there.
    ///
    /// The light is switched on, the simulation resumes, and the engine is
    /// reset directly at the reference point rather than lagging toward it.
    pub fn restore_defaults(&mut self, config: &ResponseConfig, surface: &mut impl ControlSurface) {
        *self = Self::standard(config);
        surface.reset(Some(self.light_intensity), Some(self.co2_level));
    }
}

impl Default for ControlInputs {
    fn default() -> Self {
        Self::standard(&ResponseConfig::default())
    }
}

/// The mutating entry points a host may call between ticks.
pub trait ControlSurface {
    /// Schedules a marker for the next appended history row.
    fn set_marker(&mut self, label: String);

    /// Restarts the simulation at a steady operating point.
    fn reset(&mut self, light: Option<f64>, co2: Option<f64>);
}

/// A source of control inputs, sampled once per tick.
pub trait InputSource {
    fn sample(&self) -> ControlInputs;
}

impl InputSource for ControlInputs {
    fn sample(&self) -> ControlInputs {
        *self
    }
}

/// Closures returning inputs act as sources, e.g. to script a scenario.
impl<F> InputSource for F
where
    F: Fn() -> ControlInputs,
{
    fn sample(&self) -> ControlInputs {
        self()
    }
}

use serde::{Deserialize, Serialize};

use crate::{Drivers, SimulationConfig, SteadyState};

/// Upper bound of every display value.
const DISPLAY_MAX: f64 = 100.0;

/// Display value of an intermediate sitting exactly at its baseline.
const DISPLAY_BASELINE: f64 = 50.0;

/// Instantaneous levels on a `[0, 100]` display scale.
///
/// This is the projection that 3D views and gauges read. The absolute values
/// live in the history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    /// ATP/NADPH intensity, proportional to smoothed light.
    pub energy_carrier: f64,
    /// C3 level, 50 at its baseline.
    pub fixation: f64,
    /// C5 level, 50 at its baseline.
    pub regeneration: f64,
    /// Net production rate as a percentage of its maximum.
    pub net_production_rate: f64,
}

impl SimulationState {
    /// The state shown before the first tick and after every reset.
    pub const INITIAL: Self = Self {
        energy_carrier: DISPLAY_BASELINE,
        fixation: DISPLAY_BASELINE,
        regeneration: DISPLAY_BASELINE,
        net_production_rate: 0.0,
    };

    /// Projects smoothed drivers and absolute pools onto the display scale.
    #[must_use]
    pub fn project(smoothed: Drivers, pools: &SteadyState, config: &SimulationConfig) -> Self {
        let response = &config.response;
        Self {
            energy_carrier: display(smoothed.light / config.light_max * DISPLAY_MAX),
            fixation: display(scaled(pools.fixation, response.fixation_base)),
            regeneration: display(scaled(pools.regeneration, response.regeneration_base)),
            net_production_rate: display(
                ratio(pools.net_rate, response.rate_max) * DISPLAY_MAX,
            ),
        }
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::INITIAL
    }
}

fn scaled(value: f64, base: f64) -> f64 {
    ratio(value, base) * DISPLAY_BASELINE
}

fn ratio(value: f64, base: f64) -> f64 {
    if base > 0.0 { value / base } else { 0.0 }
}

fn display(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, DISPLAY_MAX) }
}

use serde::{Deserialize, Serialize};

/// The two exogenous drivers of the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Drivers {
    /// Light intensity, in lux.
    pub light: f64,
    /// CO₂ level, in µL/L.
    pub co2: f64,
}

impl Drivers {
    /// Creates a new pair of drivers.
    #[must_use]
    pub fn new(light: f64, co2: f64) -> Self {
        Self { light, co2 }
    }

    /// Returns the drivers clamped into `[0, light_max]` and `[0, co2_max]`.
    ///
    /// A NaN driver becomes zero and an infinite one takes the nearest bound,
    /// so the result is always finite.
    #[must_use]
    pub fn clamped(self, light_max: f64, co2_max: f64) -> Self {
        Self {
            light: clamp_to_domain(self.light, light_max, "light"),
            co2: clamp_to_domain(self.co2, co2_max, "co2"),
        }
    }
}

fn clamp_to_domain(value: f64, max: f64, name: &str) -> f64 {
    if value.is_nan() {
        log::warn!("{name} driver is NaN, using 0");
        return 0.0;
    }
    if value.is_infinite() {
        log::warn!("{name} driver is infinite, clamping to domain");
    }
    value.clamp(0.0, max)
}

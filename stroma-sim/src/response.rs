use std::convert::Infallible;

use serde::{Deserialize, Serialize};
use stroma_core::Model;

use crate::{Drivers, ResponseConfig};

/// Absolute pool levels at steady state for a given pair of drivers.
///
/// All values are in arbitrary teaching units and lie in `[0, absolute_max]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SteadyState {
    /// Carbon-fixation intermediate (C3).
    pub fixation: f64,
    /// Regeneration intermediate (C5).
    pub regeneration: f64,
    /// Net production rate (P total).
    pub net_rate: f64,
    /// Energy carrier pool (ATP + NADPH).
    pub energy: f64,
    /// Precursor pool (ADP + NADP⁺), the conserved complement of `energy`.
    pub precursor: f64,
}

/// Saturation factors for one operating point.
#[derive(Debug, Clone, Copy)]
struct Saturation {
    light: f64,
    co2: f64,
}

impl Saturation {
    fn at(config: &ResponseConfig, light: f64, co2: f64) -> Self {
        let co2_internal = co2 * config.co2_scale;
        Self {
            light: saturate(light, config.k_light),
            co2: saturate(co2_internal, config.k_co2).powf(config.co2_amplify),
        }
    }

    /// Returns the raw C3 and C5 ratios.
    ///
    /// Each intermediate is inversely proportional to the driver that consumes it.
    fn ratios(self, epsilon: f64) -> [f64; 2] {
        [
            self.co2 / (self.light + epsilon),
            self.light / (self.co2 + epsilon),
        ]
    }
}

/// Michaelis-Menten style saturation `x / (x + k)`, zero for `x <= 0`.
fn saturate(x: f64, k: f64) -> f64 {
    if x <= 0.0 {
        0.0
    } else if x.is_infinite() {
        1.0
    } else {
        x / (x + k)
    }
}

/// Maps NaN and negatives to zero.
fn non_negative(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.max(0.0) }
}

/// The steady-state response of the chloroplast to light and CO₂.
///
/// This is a pure function of its drivers. Intermediate levels are reported
/// relative to the reference operating point, so evaluating at
/// `(standard_light, standard_co2)` yields exactly `fixation_base` and
/// `regeneration_base`.
///
/// # Examples
///
/// ```
/// use stroma_sim::{Drivers, ResponseConfig, ResponseFunction};
///
/// let config = ResponseConfig::default();
/// let response = ResponseFunction::new(config);
///
/// let reference = response.evaluate(Drivers::new(12_000.0, 420.0));
/// assert_eq!(reference.fixation, config.fixation_base);
/// assert_eq!(reference.regeneration, config.regeneration_base);
///
/// let dark = response.evaluate(Drivers::new(0.0, 420.0));
/// assert_eq!(dark.net_rate, 0.0);
/// assert_eq!(dark.regeneration, 0.0);
/// assert_eq!(dark.fixation, config.absolute_max);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseFunction {
    config: ResponseConfig,
    reference: [f64; 2],
}

impl ResponseFunction {
    /// Creates a response function, precomputing the reference ratios.
    #[must_use]
    pub fn new(config: ResponseConfig) -> Self {
        let reference = Saturation::at(&config, config.standard_light, config.standard_co2)
            .ratios(config.epsilon);
        Self { config, reference }
    }

    /// Returns the constants this function was built with.
    #[must_use]
    pub fn config(&self) -> &ResponseConfig {
        &self.config
    }

    /// Evaluates the steady state for the given drivers.
    ///
    /// Negative or NaN drivers are treated as zero.
    #[must_use]
    pub fn evaluate(&self, drivers: Drivers) -> SteadyState {
        let ResponseConfig {
            rate_max,
            energy_max,
            precursor_total,
            energy_consumption,
            partial_factor,
            epsilon,
            fixation_base,
            regeneration_base,
            absolute_max,
            ..
        } = self.config;

        let saturation = Saturation::at(
            &self.config,
            non_negative(drivers.light),
            non_negative(drivers.co2),
        );

        let net_rate = rate_max * saturation.light * saturation.co2;
        // The pair is conserved, so energy is bounded by the shared total.
        let energy = (energy_max
            * saturation.light
            * (1.0 - energy_consumption * saturation.co2 * partial_factor))
            .clamp(0.0, precursor_total);
        let precursor = precursor_total - energy;

        let [c3_raw, c5_raw] = saturation.ratios(epsilon);
        let [c3_ref, c5_ref] = self.reference;
        let fixation = fixation_base * relative(c3_raw, c3_ref);
        let regeneration = regeneration_base * relative(c5_raw, c5_ref);

        let clamp = |value: f64| value.clamp(0.0, absolute_max);
        SteadyState {
            fixation: clamp(fixation),
            regeneration: clamp(regeneration),
            net_rate: clamp(net_rate),
            energy: clamp(energy),
            precursor: clamp(precursor),
        }
    }
}

fn relative(raw: f64, reference: f64) -> f64 {
    if reference > 0.0 { raw / reference } else { 0.0 }
}

impl Model for ResponseFunction {
    type Input = Drivers;
    type Output = SteadyState;
    type Error = Infallible;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        Ok(self.evaluate(*input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use stroma_core::Snapshot;

    fn response() -> ResponseFunction {
        ResponseFunction::new(ResponseConfig::default())
    }

    fn assert_in_range(state: &SteadyState) {
        for value in [
            state.fixation,
            state.regeneration,
            state.net_rate,
            state.energy,
            state.precursor,
        ] {
            assert!(value.is_finite(), "{state:?} has a non-finite value");
            assert!((0.0..=1000.0).contains(&value), "{state:?} is out of range");
        }
    }

    #[test]
    fn reference_point_yields_baselines() {
        let state = response().evaluate(Drivers::new(12_000.0, 420.0));

        assert_relative_eq!(state.fixation, 200.0);
        assert_relative_eq!(state.regeneration, 120.0);
    }

    #[test]
    fn reference_point_rates_match_hand_calculation() {
        let state = response().evaluate(Drivers::new(12_000.0, 420.0));

        let f_light = 0.5;
        let f_co2 = (2100.0_f64 / 2160.0).powf(3.8);

        assert_relative_eq!(state.net_rate, 200.0 * f_light * f_co2, epsilon = 1e-12);
        assert_relative_eq!(
            state.energy,
            200.0 * f_light * (1.0 - 0.7 * f_co2 * 0.8),
            epsilon = 1e-12
        );
    }

    #[test]
    fn energy_and_precursor_are_conserved() {
        let response = response();
        for light in [0.0, 1.0, 500.0, 12_000.0, 30_000.0, 50_000.0] {
            for co2 in [0.0, 10.0, 200.0, 420.0, 1000.0] {
                let state = response.evaluate(Drivers::new(light, co2));
                assert_abs_diff_eq!(state.energy + state.precursor, 200.0, epsilon = 1e-9);
                assert_in_range(&state);
            }
        }
    }

    #[test]
    fn conservation_holds_for_a_resized_pool() {
        let config = ResponseConfig {
            energy_max: 500.0,
            precursor_total: 500.0,
            energy_consumption: 1.5,
            ..ResponseConfig::default()
        };
        assert!(config.validate().is_ok());

        let response = ResponseFunction::new(config);
        for light in [0.0, 12_000.0, 50_000.0, f64::INFINITY] {
            for co2 in [0.0, 420.0, 1000.0] {
                let state = response.evaluate(Drivers::new(light, co2));
                assert_abs_diff_eq!(state.energy + state.precursor, 500.0, epsilon = 1e-9);
                assert!((0.0..=500.0).contains(&state.energy), "{state:?}");
            }
        }
    }

    #[test]
    fn darkness_stops_production_and_drains_c5() {
        let state = response().evaluate(Drivers::new(0.0, 420.0));

        assert_eq!(state.net_rate, 0.0);
        assert_eq!(state.energy, 0.0);
        assert_eq!(state.precursor, 200.0);
        assert_eq!(state.regeneration, 0.0);
        assert_eq!(state.fixation, 1000.0);
    }

    #[test]
    fn no_co2_drains_c3_and_builds_c5() {
        let state = response().evaluate(Drivers::new(12_000.0, 0.0));

        assert_eq!(state.net_rate, 0.0);
        assert_eq!(state.fixation, 0.0);
        assert_eq!(state.regeneration, 1000.0);
        assert_relative_eq!(state.energy, 100.0);
    }

    #[test]
    fn dimming_raises_c3_and_lowers_c5() {
        let response = response();
        let bright = response.evaluate(Drivers::new(12_000.0, 420.0));
        let dim = response.evaluate(Drivers::new(6_000.0, 420.0));

        assert!(dim.fixation > bright.fixation);
        assert!(dim.regeneration < bright.regeneration);
        assert!(dim.net_rate < bright.net_rate);
    }

    #[test]
    fn lowering_co2_lowers_c3_and_raises_c5() {
        let response = response();
        let normal = response.evaluate(Drivers::new(12_000.0, 420.0));
        let low = response.evaluate(Drivers::new(12_000.0, 100.0));

        assert!(low.fixation < normal.fixation);
        assert!(low.regeneration > normal.regeneration);
        assert!(low.energy > normal.energy);
    }

    #[test]
    fn invalid_drivers_are_treated_as_zero() {
        let response = response();
        let dark = response.evaluate(Drivers::new(0.0, 420.0));

        assert_eq!(response.evaluate(Drivers::new(-100.0, 420.0)), dark);
        assert_eq!(response.evaluate(Drivers::new(f64::NAN, 420.0)), dark);
    }

    #[test]
    fn infinite_drivers_stay_finite() {
        let state = response().evaluate(Drivers::new(f64::INFINITY, f64::INFINITY));
        assert_in_range(&state);
    }

    #[test]
    fn non_default_reference_point_is_honored() {
        let config = ResponseConfig {
            standard_light: 30_000.0,
            standard_co2: 800.0,
            fixation_base: 75.0,
            regeneration_base: 310.0,
            ..ResponseConfig::default()
        };
        let state = ResponseFunction::new(config).evaluate(Drivers::new(30_000.0, 800.0));

        assert_relative_eq!(state.fixation, 75.0);
        assert_relative_eq!(state.regeneration, 310.0);
    }

    #[test]
    fn acts_as_a_model() {
        let response = response();
        let drivers = Drivers::new(20_000.0, 300.0);
        let snapshot = Snapshot::capture(&response, drivers).unwrap();

        assert_eq!(snapshot.input, drivers);
        assert_eq!(snapshot.output, response.evaluate(drivers));
    }
}

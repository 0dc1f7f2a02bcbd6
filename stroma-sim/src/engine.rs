use std::{num::NonZeroUsize, time::Duration};

use stroma_core::DurationExt;
use uom::si::{f64::Time, time::second};

use crate::{
    ConfigError, ControlInputs, ControlSurface, DriverSmoother, Drivers, HistoryBuffer, HistoryRow,
    ResponseFunction, SimulationConfig, SimulationState, SteadyState,
};

/// Result of a single [`Engine::tick`].
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The engine was paused; nothing changed.
    Paused,
    /// Simulated time advanced and a row was appended to the history.
    Advanced {
        /// Simulated time of the appended row.
        time: Time,
        /// Pools recorded in the appended row.
        pools: SteadyState,
        /// Marker delivered with the appended row, if any.
        marker: Option<String>,
    },
}

impl TickOutcome {
    #[must_use]
    pub fn is_advanced(&self) -> bool {
        matches!(self, Self::Advanced { .. })
    }
}

/// The photosynthesis simulation engine.
///
/// The engine owns all mutable simulation state: smoothed drivers, the
/// display projection, the rolling history, and the pending marker.
/// Everything else reads it through shared borrows or snapshots.
///
/// Each call to [`tick`](Self::tick) samples a set of [`ControlInputs`]. When
/// not paused it advances simulated time by one fixed step, smooths the
/// drivers, evaluates the [`ResponseFunction`], and appends a row to the
/// history carrying any pending marker.
///
/// # Examples
///
/// ```
/// use stroma_sim::{ControlInputs, Engine, SimulationConfig};
///
/// let mut engine = Engine::new(SimulationConfig::default()).unwrap();
/// let inputs = ControlInputs::default();
///
/// engine.set_marker("start");
/// engine.tick(&inputs);
/// engine.tick(&inputs);
///
/// let markers: Vec<_> = engine.history().markers().collect();
/// assert_eq!(markers, [(1198, "start")]);
/// assert_eq!(engine.tick_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    config: SimulationConfig,
    response: ResponseFunction,
    smoother: DriverSmoother,
    state: SimulationState,
    history: HistoryBuffer,
    pending_marker: Option<String>,
    ticks: u64,
    reported: ControlInputs,
}

impl Engine {
    /// Creates an engine settled at the configured reference operating point.
    ///
    /// Every history slot holds the steady state at that point, at time zero.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration fails validation.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config
            .validate()
            .map_err(|reason| ConfigError::Invalid { reason })?;
        let capacity =
            NonZeroUsize::new(config.history_capacity).ok_or(ConfigError::Invalid {
                reason: "history_capacity must be at least 1",
            })?;

        let reported = ControlInputs::standard(&config.response);
        let initial = reported.target_drivers().clamped(config.light_max, config.co2_max);
        let response = ResponseFunction::new(config.response);
        let history = HistoryBuffer::new(
            capacity,
            HistoryRow::new(0.0, response.evaluate(initial), None),
        );

        log::debug!(
            "engine created with {} history slots at {initial:?}",
            capacity.get()
        );

        Ok(Self {
            config,
            response,
            smoother: DriverSmoother::new(config.lag_rate, initial),
            state: SimulationState::INITIAL,
            history,
            pending_marker: None,
            ticks: 0,
            reported,
        })
    }

    /// Runs one tick against the given inputs.
    ///
    /// The inputs are remembered as the most recently reported controls even
    /// when paused, so a later [`reset`](Self::reset) without targets uses them.
    pub fn tick(&mut self, inputs: &ControlInputs) -> TickOutcome {
        self.reported = *inputs;
        if inputs.paused {
            return TickOutcome::Paused;
        }

        self.ticks += 1;
        let time = self.elapsed_seconds();

        let target = inputs
            .target_drivers()
            .clamped(self.config.light_max, self.config.co2_max);
        let smoothed = self.smoother.update(target);
        let pools = self.response.evaluate(smoothed);
        self.state = SimulationState::project(smoothed, &pools, &self.config);

        let marker = self.pending_marker.take();
        if let Some(label) = &marker {
            log::debug!("marker {label:?} recorded at t = {time:.1} s");
        }
        self.history
            .append(HistoryRow::new(time, pools, marker.clone()));

        log::trace!("tick {} at t = {time:.1} s: {pools:?}", self.ticks);

        TickOutcome::Advanced {
            time: Time::new::<second>(time),
            pools,
            marker,
        }
    }

    /// Runs `ticks` ticks against the same inputs.
    ///
    /// Returns the number of ticks that advanced simulated time.
    pub fn advance(&mut self, inputs: &ControlInputs, ticks: usize) -> usize {
        (0..ticks)
            .filter(|_| self.tick(inputs).is_advanced())
            .count()
    }

    /// Runs as many whole fixed steps as fit into `duration`.
    ///
    /// Returns the number of ticks that advanced simulated time.
    pub fn advance_for(&mut self, inputs: &ControlInputs, duration: Duration) -> usize {
        let steps = duration.as_time().get::<second>() / self.config.time_step;
        // Tolerate rounding so that e.g. 1 s at 0.1 s per step is ten ticks.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let ticks = (steps + 1e-9).floor() as usize;
        self.advance(inputs, ticks)
    }

    /// Schedules a marker for the next appended row.
    ///
    /// A marker that has not been delivered yet is replaced.
    pub fn set_marker(&mut self, label: impl Into<String>) {
        let label = label.into();
        log::debug!("marker {label:?} pending");
        if let Some(previous) = self.pending_marker.replace(label) {
            log::debug!("undelivered marker {previous:?} replaced");
        }
    }

    /// Restarts the simulation at a steady operating point.
    ///
    /// Missing targets fall back to the most recently reported inputs, with
    /// light counted as zero when it is switched off. Simulated time returns
    /// to zero, the display state to [`SimulationState::INITIAL`], the smoothed
    /// drivers jump to the target without lag, any pending marker is dropped,
    /// and every history slot is refilled with the steady state at the target.
    ///
    /// The result depends only on the target, so repeated calls are harmless.
    pub fn reset(&mut self, light: Option<f64>, co2: Option<f64>) {
        let reported = self.reported.target_drivers();
        let target = Drivers::new(light.unwrap_or(reported.light), co2.unwrap_or(reported.co2))
            .clamped(self.config.light_max, self.config.co2_max);

        self.ticks = 0;
        self.state = SimulationState::INITIAL;
        self.smoother.snap_to(target);
        self.pending_marker = None;

        let pools = self.response.evaluate(target);
        self.history.reset(HistoryRow::new(0.0, pools, None));

        log::debug!("simulation reset to {target:?}");
    }

    /// Returns the display state after the latest tick.
    #[must_use]
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Returns the rolling history.
    #[must_use]
    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Returns the simulated time elapsed since creation or the last reset.
    #[must_use]
    pub fn simulated_time(&self) -> Time {
        Time::new::<second>(self.elapsed_seconds())
    }

    /// Returns the number of advancing ticks since creation or the last reset.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Returns the current smoothed drivers.
    #[must_use]
    pub fn smoothed_drivers(&self) -> Drivers {
        self.smoother.current()
    }

    /// Returns the marker waiting for the next row, if any.
    #[must_use]
    pub fn pending_marker(&self) -> Option<&str> {
        self.pending_marker.as_deref()
    }

    /// Returns the most recently reported control inputs.
    #[must_use]
    pub fn reported_inputs(&self) -> &ControlInputs {
        &self.reported
    }

    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[must_use]
    pub fn response_function(&self) -> &ResponseFunction {
        &self.response
    }

    /// Time is derived from the tick count so it does not drift with repeated addition.
    #[allow(clippy::cast_precision_loss)]
    fn elapsed_seconds(&self) -> f64 {
        self.ticks as f64 * self.config.time_step
    }
}

impl ControlSurface for Engine {
    fn set_marker(&mut self, label: String) {
        Engine::set_marker(self, label);
    }

    fn reset(&mut self, light: Option<f64>, co2: Option<f64>) {
        Engine::reset(self, light, co2);
    }
}

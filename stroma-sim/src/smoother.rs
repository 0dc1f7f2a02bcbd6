use crate::Drivers;

/// Lags the drivers behind their targets to model a sluggish biological response.
///
/// Each update closes a fixed fraction (`lag_rate`) of the remaining gap:
///
/// ```text
/// smoothed += (target - smoothed) * lag_rate
/// ```
///
/// With `lag_rate` in `(0, 1]` the smoothed value approaches its target
/// monotonically and never overshoots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverSmoother {
    lag_rate: f64,
    current: Drivers,
}

impl DriverSmoother {
    /// Creates a smoother that starts settled at `initial`.
    #[must_use]
    pub fn new(lag_rate: f64, initial: Drivers) -> Self {
        Self {
            lag_rate,
            current: initial,
        }
    }

    /// Moves the smoothed drivers one step toward `target` and returns them.
    pub fn update(&mut self, target: Drivers) -> Drivers {
        self.current.light += (target.light - self.current.light) * self.lag_rate;
        self.current.co2 += (target.co2 - self.current.co2) * self.lag_rate;
        self.current
    }

    /// Jumps directly to `target` without lag.
    pub fn snap_to(&mut self, target: Drivers) {
        self.current = target;
    }

    /// Returns the current smoothed drivers.
    #[must_use]
    pub fn current(&self) -> Drivers {
        self.current
    }

    #[must_use]
    pub fn lag_rate(&self) -> f64 {
        self.lag_rate
    }
}

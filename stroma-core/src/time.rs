use std::time::Duration;

use uom::si::{f64::Time, time::second};

/// Extension trait for converting a [`Duration`] into a `uom` [`Time`].
///
/// Simulation steps are configured as plain durations, while simulated time
/// is reported as a dimensioned quantity.
pub trait DurationExt {
    /// Returns the duration as a [`Time`] in seconds.
    fn as_time(&self) -> Time;
}

impl DurationExt for Duration {
    fn as_time(&self) -> Time {
        Time::new::<second>(self.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::time::millisecond;

    #[test]
    fn converts_fractional_seconds() {
        let time = Duration::from_millis(100).as_time();
        assert_relative_eq!(time.get::<second>(), 0.1);
        assert_relative_eq!(time.get::<millisecond>(), 100.0);
    }
}

//! A deterministic simulation engine for a teaching model of photosynthesis.
//!
//! Two drivers, light intensity and CO₂ level, are smoothed toward their
//! targets and fed through a saturating steady-state [`ResponseFunction`].
//! Each tick of the [`Engine`] appends the resulting pools to a fixed-length
//! [`HistoryBuffer`], which charts and exporters read as a rolling window.
//!
//! The [`scheduler`] module decides *when* ticks happen; the engine decides
//! *what* a tick does. Tests drive the engine directly, while interactive
//! hosts run a [`scheduler::Scheduler`] on a frame clock, optionally on a
//! background thread through [`shared`].

mod config;
mod control;
mod drivers;
mod engine;
pub mod export;
mod history;
mod response;
pub mod scheduler;
pub mod shared;
mod smoother;
mod state;

pub use config::{ConfigError, ResponseConfig, SimulationConfig};
pub use control::{
    ControlInputs, ControlSurface, InputSource, LIGHT_OFF_MARKER, LIGHT_ON_MARKER,
};
pub use drivers::Drivers;
pub use engine::{Engine, TickOutcome};
pub use history::{HistoryBuffer, HistoryRow, HistorySeries, Series};
pub use response::{ResponseFunction, SteadyState};
pub use smoother::DriverSmoother;
pub use state::SimulationState;

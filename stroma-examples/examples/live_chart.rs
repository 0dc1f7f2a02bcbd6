//! # Live Chart
//!
//! Runs the simulation on a background thread at 60 ticks per second and
//! charts P total, C3, and C5 as they evolve. Sliders set light and CO₂, the
//! light switch records a marker on the chart, and the history can be
//! exported as CSV to the system temporary directory.
//!
//! ## Running the Example
//!
//! ```sh
//! cargo run --example live_chart
//! ```

use std::{env, error::Error};

use stroma_plot::ChartApp;
use stroma_sim::{
    ControlInputs, Engine, SimulationConfig,
    scheduler::FrameClock,
    shared::{self, SharedEngine, SharedInputs},
};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = SimulationConfig::default();
    let engine = SharedEngine::new(Engine::new(config)?);
    let inputs = SharedInputs::new(ControlInputs::standard(&config.response));

    let simulation = shared::spawn(engine.clone(), inputs.clone(), FrameClock::default())?;
    log::info!("simulation running");

    ChartApp::new(engine, inputs)
        .with_loop(simulation)
        .with_export_dir(env::temp_dir())
        .run("Chloroplast")?;

    Ok(())
}

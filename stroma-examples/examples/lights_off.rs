//! # Lights-Off Experiment
//!
//! Runs the chloroplast at the reference operating point until it is steady,
//! switches the light off, and follows the intermediates for one simulated
//! minute of darkness.
//!
//! - Net production collapses with the light.
//! - C5 drains because regeneration needs ATP and NADPH.
//! - C3 accumulates because fixation continues without consumers.
//!
//! The full history is written as CSV to the system temporary directory.
//!
//! ## Running the Example
//!
//! ```sh
//! cargo run --example lights_off
//! cargo run --example lights_off -- stroma-examples/config/fast_response.toml
//! ```
//!
//! Set `RUST_LOG=debug` to see marker and reset messages.

use std::{env, error::Error, time::Duration};

use stroma_sim::{ControlInputs, Engine, SimulationConfig, export::export_csv};
use uom::si::time::second;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = match env::args().nth(1) {
        Some(path) => SimulationConfig::from_path(path)?,
        None => SimulationConfig::default(),
    };
    println!(
        "time step: {:?}, history: {} rows",
        config.time_step_duration(),
        config.history_capacity
    );

    let mut engine = Engine::new(config)?;
    let mut inputs = ControlInputs::standard(&config.response);

    engine.advance_for(&inputs, Duration::from_secs(30));
    report(&engine);

    let marker = inputs.toggle_light(&mut engine);
    println!("-- {marker} --");

    for _ in 0..6 {
        engine.advance_for(&inputs, Duration::from_secs(10));
        report(&engine);
    }

    let path = export_csv(engine.history(), env::temp_dir())?;
    println!("history written to {}", path.display());

    Ok(())
}

fn report(engine: &Engine) {
    let row = engine.history().latest();
    println!(
        "t = {:>5.1} s   P = {:>7.3}   C3 = {:>8.3}   C5 = {:>7.3}   ATP+NADPH = {:>7.3}",
        engine.simulated_time().get::<second>(),
        row.net_rate,
        row.fixation,
        row.regeneration,
        row.energy,
    );
}

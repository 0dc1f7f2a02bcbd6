//! # CO₂ Drop Experiment
//!
//! The mirror image of the lights-off experiment: the light stays on while
//! the CO₂ supply is cut. C3 drains, C5 piles up, and production stops.
//!
//! The run is driven by a [`Scheduler`] with a fixed number of ticks, and an
//! observer prints the pools every ten simulated seconds.
//!
//! ## Running the Example
//!
//! ```sh
//! cargo run --example co2_drop
//! ```

use std::error::Error;

use stroma_sim::{
    ControlInputs, Engine, SimulationConfig, TickOutcome,
    scheduler::{FixedTicks, LoopAction, Scheduler, TickEvent},
};
use uom::si::time::second;

const TICKS_PER_REPORT: u64 = 100;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut engine = Engine::new(SimulationConfig::default())?;
    let inputs = ControlInputs::default();

    Scheduler::new(FixedTicks::new(300)).run(&mut engine, &inputs, ());
    println!(
        "steady after {:.1} s: {:?}",
        engine.simulated_time().get::<second>(),
        engine.history().latest().pools()
    );

    engine.set_marker("CO₂ 0");
    let without_co2 = inputs.with_co2_level(0.0);

    let summary = Scheduler::new(FixedTicks::new(1200)).run(
        &mut engine,
        &without_co2,
        |event: &TickEvent| {
            if let TickOutcome::Advanced {
                time,
                pools,
                marker,
            } = &event.outcome
            {
                if let Some(label) = marker {
                    println!("-- {label} --");
                }
                if event.iteration % TICKS_PER_REPORT == 0 {
                    println!(
                        "t = {:>5.1} s   P = {:>7.3}   C3 = {:>7.3}   C5 = {:>8.3}",
                        time.get::<second>(),
                        pools.net_rate,
                        pools.fixation,
                        pools.regeneration,
                    );
                }
                if pools.fixation < 0.01 {
                    return Some(LoopAction::Stop);
                }
            }
            None
        },
    );

    println!("{summary:?}");
    Ok(())
}

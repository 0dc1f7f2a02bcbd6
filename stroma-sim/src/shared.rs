//! Running the engine on a background thread.
//!
//! A [`SharedEngine`] puts the engine behind a mutex. The loop thread holds
//! the lock for one tick at a time; readers lock briefly and copy what they
//! need, so they never observe a half-written history.
//!
//! Control inputs live in a separate [`SharedInputs`]. The loop samples them
//! before locking the engine, so the two locks are never held together.

use std::{
    io,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
};

use uom::si::f64::Time;

use crate::{
    ControlInputs, ControlSurface, Engine, HistorySeries, InputSource, SimulationState,
    TickOutcome,
    scheduler::{CancelToken, RunSummary, Scheduler, Tick, TickSource},
};

/// An engine that can be ticked and read from several threads.
///
/// Clones share the same engine.
#[derive(Debug, Clone)]
pub struct SharedEngine(Arc<Mutex<Engine>>);

impl SharedEngine {
    #[must_use]
    pub fn new(engine: Engine) -> Self {
        Self(Arc::new(Mutex::new(engine)))
    }

    /// Runs `f` with shared access to the engine.
    pub fn read<R>(&self, f: impl FnOnce(&Engine) -> R) -> R {
        f(&self.lock())
    }

    /// Runs `f` with exclusive access to the engine, between ticks.
    pub fn write<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        f(&mut self.lock())
    }

    /// Copies the history out as parallel series.
    #[must_use]
    pub fn history_snapshot(&self) -> HistorySeries {
        self.read(|engine| engine.history().snapshot())
    }

    #[must_use]
    pub fn state(&self) -> SimulationState {
        self.read(|engine| *engine.state())
    }

    #[must_use]
    pub fn simulated_time(&self) -> Time {
        self.read(Engine::simulated_time)
    }

    pub fn set_marker(&self, label: impl Into<String>) {
        let label = label.into();
        self.write(|engine| engine.set_marker(label));
    }

    pub fn reset(&self, light: Option<f64>, co2: Option<f64>) {
        self.write(|engine| engine.reset(light, co2));
    }

    /// A panicking reader cannot leave the engine half-updated, since every
    /// write is a whole tick or reset, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Engine> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Tick for SharedEngine {
    fn tick(&mut self, inputs: &ControlInputs) -> TickOutcome {
        self.write(|engine| engine.tick(inputs))
    }
}

impl ControlSurface for SharedEngine {
    fn set_marker(&mut self, label: String) {
        SharedEngine::set_marker(self, label);
    }

    fn reset(&mut self, light: Option<f64>, co2: Option<f64>) {
        SharedEngine::reset(self, light, co2);
    }
}

/// Control inputs written by a user interface and sampled by the loop.
#[derive(Debug, Clone, Default)]
pub struct SharedInputs(Arc<Mutex<ControlInputs>>);

impl SharedInputs {
    #[must_use]
    pub fn new(inputs: ControlInputs) -> Self {
        Self(Arc::new(Mutex::new(inputs)))
    }

    #[must_use]
    pub fn get(&self) -> ControlInputs {
        *self.lock()
    }

    pub fn set(&self, inputs: ControlInputs) {
        *self.lock() = inputs;
    }

    /// Updates the inputs in place and returns whatever `f` returns.
    pub fn update<R>(&self, f: impl FnOnce(&mut ControlInputs) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, ControlInputs> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InputSource for SharedInputs {
    fn sample(&self) -> ControlInputs {
        self.get()
    }
}

/// Handle to a loop running on a background thread.
///
/// Dropping the handle cancels the loop and waits for it to finish.
#[derive(Debug)]
pub struct LoopHandle {
    cancel: CancelToken,
    thread: Option<JoinHandle<RunSummary>>,
}

impl LoopHandle {
    /// Asks the loop to stop before its next tick without waiting.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Cancels the loop and waits for it to finish.
    ///
    /// Returns `None` if the loop thread panicked.
    pub fn stop(mut self) -> Option<RunSummary> {
        self.join()
    }

    fn join(&mut self) -> Option<RunSummary> {
        self.cancel.cancel();
        let thread = self.thread.take()?;
        match thread.join() {
            Ok(summary) => Some(summary),
            Err(_) => {
                log::error!("simulation loop thread panicked");
                None
            }
        }
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        self.join();
    }
}

/// Spawns a thread that ticks `engine` from `source` with `inputs`.
///
/// # Errors
///
/// Returns an error if the thread cannot be spawned.
pub fn spawn<S>(engine: SharedEngine, inputs: SharedInputs, source: S) -> io::Result<LoopHandle>
where
    S: TickSource + Send + 'static,
{
    let cancel = CancelToken::new();
    let mut scheduler = Scheduler::with_cancel(source, cancel.clone());
    let mut engine = engine;

    let thread = thread::Builder::new()
        .name("stroma-loop".into())
        .spawn(move || scheduler.run(&mut engine, &inputs, ()))?;

    Ok(LoopHandle {
        cancel,
        thread: Some(thread),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::{
        SimulationConfig,
        scheduler::{FixedTicks, FrameClock, StopReason},
    };

    fn shared_engine() -> SharedEngine {
        SharedEngine::new(
            Engine::new(SimulationConfig {
                history_capacity: 32,
                ..SimulationConfig::default()
            })
            .unwrap(),
        )
    }

    #[test]
    fn loop_runs_fixed_ticks_on_a_thread() {
        let engine = shared_engine();
        let inputs = SharedInputs::new(ControlInputs::default().with_light_on(false));

        let handle = spawn(engine.clone(), inputs, FixedTicks::new(50)).unwrap();
        let summary = handle.stop();

        // Stopping may cancel the loop before it finishes all ticks.
        let summary = summary.unwrap();
        assert_eq!(engine.read(Engine::tick_count), summary.advanced);
        assert_eq!(engine.history_snapshot().len(), 32);
    }

    #[test]
    fn exhausted_loop_reports_every_tick() {
        let engine = shared_engine();
        let inputs = SharedInputs::default();

        let handle = spawn(engine.clone(), inputs, FixedTicks::new(40)).unwrap();
        while !handle.is_finished() {
            thread::sleep(Duration::from_millis(1));
        }

        let summary = handle.stop().unwrap();
        assert_eq!(summary.stopped, StopReason::Exhausted);
        assert_eq!(summary.advanced, 40);
        assert_eq!(engine.read(Engine::tick_count), 40);
    }

    #[test]
    fn dropping_the_handle_stops_an_endless_loop() {
        let engine = shared_engine();
        let inputs = SharedInputs::default();

        let handle = spawn(
            engine.clone(),
            inputs,
            FrameClock::new(Duration::from_millis(1)),
        )
        .unwrap();
        thread::sleep(Duration::from_millis(20));
        drop(handle);

        let ticks = engine.read(Engine::tick_count);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(engine.read(Engine::tick_count), ticks);
    }

    #[test]
    fn pausing_a_running_loop_freezes_the_engine() {
        let engine = shared_engine();
        let inputs = SharedInputs::default();
        let ticks = || engine.read(Engine::tick_count);
        let wait_for_ticks = |after: u64| {
            while ticks() <= after {
                thread::sleep(Duration::from_millis(1));
            }
        };

        let handle = spawn(
            engine.clone(),
            inputs.clone(),
            FrameClock::new(Duration::from_millis(1)),
        )
        .unwrap();
        wait_for_ticks(0);

        inputs.update(|inputs| inputs.paused = true);
        // A tick sampled before the update may still be in flight.
        thread::sleep(Duration::from_millis(10));
        let frozen = ticks();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(ticks(), frozen);

        inputs.update(|inputs| inputs.paused = false);
        wait_for_ticks(frozen);

        let summary = handle.stop().unwrap();
        assert_eq!(summary.stopped, StopReason::Cancelled);
        assert!(summary.iterations > summary.advanced);
    }

    #[test]
    fn toggle_light_through_shared_engine() {
        let mut engine = shared_engine();
        let inputs = SharedInputs::default();

        inputs.update(|controls| controls.toggle_light(&mut engine));
        engine.tick(&inputs.get());

        let markers: Vec<_> = engine.read(|engine| {
            engine
                .history()
                .markers()
                .map(|(index, label)| (index, label.to_owned()))
                .collect()
        });
        assert_eq!(markers, [(31, crate::LIGHT_OFF_MARKER.to_owned())]);
        assert!(!inputs.get().light_on);
    }
}

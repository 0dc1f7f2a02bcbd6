//! Drives an [`Engine`] from a source of ticks.
//!
//! The engine never decides when to tick. A [`Scheduler`] pulls ticks from a
//! [`TickSource`], samples an [`InputSource`] for each one, and reports every
//! outcome to an [`Observer`] that may stop the loop early.
//!
//! Interactive hosts use a [`FrameClock`], which paces ticks at the display
//! refresh rate. Tests and headless runs use [`FixedTicks`], which yields a
//! fixed number of ticks as fast as possible.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use stroma_core::Observer;

use crate::{ControlInputs, Engine, InputSource, TickOutcome};

/// Default frame period, matching a 60 Hz display.
pub const DEFAULT_FRAME_PERIOD: Duration = Duration::from_micros(16_667);

/// Something that can be ticked against control inputs.
pub trait Tick {
    fn tick(&mut self, inputs: &ControlInputs) -> TickOutcome;
}

impl Tick for Engine {
    fn tick(&mut self, inputs: &ControlInputs) -> TickOutcome {
        Engine::tick(self, inputs)
    }
}

/// Decides when the next tick happens.
pub trait TickSource {
    /// Waits for the next tick.
    ///
    /// Returns `false` once the source is exhausted.
    fn next_tick(&mut self) -> bool;
}

/// Yields a fixed number of ticks without waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTicks {
    remaining: u64,
}

impl FixedTicks {
    #[must_use]
    pub fn new(count: u64) -> Self {
        Self { remaining: count }
    }

    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl TickSource for FixedTicks {
    fn next_tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// Yields one tick per frame period, indefinitely.
///
/// Deadlines advance by whole periods from the first tick, so a slow frame
/// does not shift later ones. After a stall longer than one period the clock
/// resynchronizes instead of bursting to catch up.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    period: Duration,
    deadline: Option<Instant>,
}

impl FrameClock {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            deadline: None,
        }
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_PERIOD)
    }
}

impl TickSource for FrameClock {
    fn next_tick(&mut self) -> bool {
        let now = Instant::now();
        let Some(deadline) = self.deadline else {
            self.deadline = Some(now + self.period);
            return true;
        };

        if let Some(wait) = deadline.checked_duration_since(now) {
            thread::sleep(wait);
            self.deadline = Some(deadline + self.period);
        } else {
            self.deadline = Some(now + self.period);
        }
        true
    }
}

/// A shared flag that asks a running loop to stop.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Reported to the observer after every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickEvent {
    /// One-based count of ticks run by this call to [`Scheduler::run`].
    pub iteration: u64,
    pub outcome: TickOutcome,
}

/// Actions an observer may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    Stop,
}

/// Why a loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The tick source ran out of ticks.
    Exhausted,
    /// The cancel token was triggered.
    Cancelled,
    /// The observer returned [`LoopAction::Stop`].
    Observer,
}

/// Summary of a finished loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks run, paused or not.
    pub iterations: u64,
    /// Ticks that advanced simulated time.
    pub advanced: u64,
    pub stopped: StopReason,
}

/// Runs ticks from a [`TickSource`] until exhausted, cancelled, or stopped.
#[derive(Debug)]
pub struct Scheduler<S> {
    source: S,
    cancel: CancelToken,
}

impl<S: TickSource> Scheduler<S> {
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::with_cancel(source, CancelToken::new())
    }

    /// Creates a scheduler that stops when `cancel` is triggered.
    #[must_use]
    pub fn with_cancel(source: S, cancel: CancelToken) -> Self {
        Self { source, cancel }
    }

    /// Returns a token that cancels this scheduler.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs the loop.
    ///
    /// Inputs are sampled once per tick, immediately before it runs, so
    /// changes made between ticks are picked up on the next one.
    /// Cancellation is checked on both sides of the wait for the next tick.
    pub fn run<T, I, O>(&mut self, target: &mut T, inputs: &I, mut observer: O) -> RunSummary
    where
        T: Tick + ?Sized,
        I: InputSource + ?Sized,
        O: Observer<TickEvent, LoopAction>,
    {
        log::info!("simulation loop started");

        let mut iterations = 0;
        let mut advanced = 0;

        let stopped = loop {
            if self.cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            if !self.source.next_tick() {
                break StopReason::Exhausted;
            }
            if self.cancel.is_cancelled() {
                break StopReason::Cancelled;
            }

            let outcome = target.tick(&inputs.sample());
            iterations += 1;
            if outcome.is_advanced() {
                advanced += 1;
            }

            let event = TickEvent {
                iteration: iterations,
                outcome,
            };
            if let Some(LoopAction::Stop) = observer.observe(&event) {
                break StopReason::Observer;
            }
        };

        log::info!(
            "simulation loop stopped ({stopped:?}) after {iterations} ticks, {advanced} advanced"
        );

        RunSummary {
            iterations,
            advanced,
            stopped,
        }
    }
}

//! Background thread that advances the world on an adjustable interval.
//!
//! The ticker starts paused. While running it locks the shared world once
//! per tick, so sensor injection and snapshot reads from other threads
//! serialize cleanly against the tick. Pause, delay, and step-count
//! controls all take effect on the next tick boundary.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use crate::SharedWorld;

/// Sleep quantum while paused, so a resume is picked up promptly.
const PAUSE_POLL: Duration = Duration::from_millis(5);

#[derive(Debug)]
struct TickerState {
    paused: AtomicBool,
    stopped: AtomicBool,
    delay_ms: AtomicU64,
    steps: AtomicU64,
}

/// Owning handle for the tick thread. Dropping it stops the thread.
#[derive(Debug)]
pub struct Ticker {
    state: Arc<TickerState>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Ticker {
    /// Start a paused tick thread over `world`, stepping at most
    /// `max_steps` times with `delay_ms` between ticks.
    #[must_use]
    pub fn spawn(world: SharedWorld, delay_ms: u64, max_steps: u64) -> Self {
        let state = Arc::new(TickerState {
            paused: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
            delay_ms: AtomicU64::new(delay_ms),
            steps: AtomicU64::new(0),
        });
        let thread_state = Arc::clone(&state);
        let handle = thread::Builder::new()
            .name("glowgrid-ticker".into())
            .spawn(move || run_loop(&world, &thread_state, max_steps))
            .expect("spawn ticker thread");
        Self {
            state,
            handle: Some(handle),
        }
    }

    /// Flip between paused and running.
    pub fn toggle_pause(&self) {
        self.state.paused.fetch_xor(true, Ordering::SeqCst);
    }

    /// Leave the paused state.
    pub fn resume(&self) {
        self.state.paused.store(false, Ordering::SeqCst);
    }

    /// Enter the paused state.
    pub fn pause(&self) {
        self.state.paused.store(true, Ordering::SeqCst);
    }

    /// Whether the ticker is currently paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state.paused.load(Ordering::SeqCst)
    }

    /// Whether the tick thread has finished (step budget spent or stopped).
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state.stopped.load(Ordering::SeqCst)
    }

    /// Change the inter-tick delay, effective from the next tick.
    pub fn set_delay(&self, delay_ms: u64) {
        self.state.delay_ms.store(delay_ms, Ordering::SeqCst);
    }

    /// Ticks performed since the last reset.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.state.steps.load(Ordering::SeqCst)
    }

    /// Reset the step counter (the driver's restart control).
    pub fn reset_steps(&self) {
        self.state.steps.store(0, Ordering::SeqCst);
    }

    /// Stop the tick thread and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.state.stopped.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_loop(world: &SharedWorld, state: &TickerState, max_steps: u64) {
    while !state.stopped.load(Ordering::SeqCst) {
        if state.steps.load(Ordering::SeqCst) >= max_steps {
            break;
        }
        if state.paused.load(Ordering::SeqCst) {
            thread::sleep(PAUSE_POLL);
            continue;
        }
        {
            let Ok(mut world) = world.lock() else {
                break;
            };
            world.advance_tick();
        }
        state.steps.fetch_add(1, Ordering::SeqCst);
        let delay = state.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            thread::sleep(Duration::from_millis(delay));
        }
    }
    state.stopped.store(true, Ordering::SeqCst);
}

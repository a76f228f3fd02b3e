//! Time source and the sleep-then-spin wait used between pulses.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Coarse sleeps are only worth it when more than this remains.
pub const COARSE_SLEEP_THRESHOLD: Duration = Duration::from_millis(1);
/// Left over after a coarse sleep and closed by polling.
pub const SPIN_MARGIN: Duration = Duration::from_micros(500);
/// Longest single coarse sleep; long waits are split into chunks of this.
pub const MAX_COARSE_SLEEP: Duration = Duration::from_millis(10);

pub trait Clock: Send {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration);

    /// Called once per busy-poll iteration.
    fn relax(&self) {
        std::hint::spin_loop();
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Virtual clock for tests. Time only moves when someone sleeps, polls or
/// calls [`ManualClock::advance`]; clones share the same timeline.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed_nanos: Arc<AtomicU64>,
    spin_step: Duration,
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Duration::from_micros(1))
    }
}

impl ManualClock {
    /// `spin_step` is how far time moves on each busy-poll iteration.
    pub fn new(spin_step: Duration) -> Self {
        Self {
            origin: Instant::now(),
            elapsed_nanos: Arc::new(AtomicU64::new(0)),
            spin_step,
            sleeps: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn origin(&self) -> Instant {
        self.origin
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos.load(Ordering::SeqCst))
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed_nanos
            .fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Every coarse sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
        self.advance(duration);
    }

    fn relax(&self) {
        self.advance(self.spin_step);
    }
}

/// Busy-polls `clock` until `deadline` has passed. Returns the number of polls.
pub fn spin_until<C: Clock + ?Sized>(clock: &C, deadline: Instant) -> u64 {
    let mut polls = 0;
    while clock.now() < deadline {
        clock.relax();
        polls += 1;
    }
    polls
}

/// Sleeps coarsely until shortly before `deadline`, then spins the rest.
///
/// `interrupted` is checked before every coarse sleep chunk; once it returns
/// `true` the wait is abandoned and `false` is returned.
pub fn wait_until<C, F>(clock: &C, deadline: Instant, mut interrupted: F) -> bool
where
    C: Clock + ?Sized,
    F: FnMut() -> bool,
{
    loop {
        let slack = deadline.saturating_duration_since(clock.now());
        if slack <= COARSE_SLEEP_THRESHOLD {
            break;
        }
        if interrupted() {
            return false;
        }
        clock.sleep((slack - SPIN_MARGIN).min(MAX_COARSE_SLEEP));
    }
    spin_until(clock, deadline);
    true
}

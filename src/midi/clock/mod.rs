//! Outgoing MIDI clock generation
//!
//! The [`PulseScheduler`] loop reads the shared transport once per iteration
//! and, while running, emits one timing clock per deadline on a grid that
//! advances from the previous deadline rather than from the actual emission
//! time. Waiting is a coarse sleep followed by a short busy-poll.
pub mod core;
pub mod timing;

use crate::midi::{MidiMessage, MidiSink};
use crate::shutdown::CancellationToken;
use crate::state::{SharedState, TransportState};
use self::core::{Advance, PulseCursor};
use self::timing::{Clock, SystemClock};
use log::{debug, info, trace};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const PULSES_PER_QUARTER_NOTE: u32 = 24;
/// Poll period while the transport is stopped.
pub const IDLE_POLL: Duration = Duration::from_millis(10);

/// Time between two clock pulses at `bpm`, or `None` for a tempo that has
/// no meaningful interval (zero, negative, non-finite, absurdly slow).
pub fn pulse_interval(bpm: f64) -> Option<Duration> {
    if !(bpm.is_finite() && bpm > 0.0) {
        return None;
    }
    Duration::try_from_secs_f64(60.0 / (bpm * PULSES_PER_QUARTER_NOTE as f64)).ok()
}

/// Counters shared with whoever wants to inspect the clock while it runs.
#[derive(Debug, Default)]
pub struct ClockDiagnostics {
    pulses_sent: AtomicU64,
    send_failures: AtomicU64,
    missed_deadlines: AtomicU64,
    lateness_nanos: AtomicU64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    pub pulses_sent: u64,
    pub send_failures: u64,
    pub missed_deadlines: u64,
    /// Accumulated since the transport last went idle.
    pub lateness: Duration,
}

impl ClockDiagnostics {
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            pulses_sent: self.pulses_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            missed_deadlines: self.missed_deadlines.load(Ordering::Relaxed),
            lateness: Duration::from_nanos(self.lateness_nanos.load(Ordering::Relaxed)),
        }
    }

    fn record_send(&self, ok: bool) {
        if ok {
            self.pulses_sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.send_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_miss(&self, late_by: Duration) {
        self.missed_deadlines.fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(late_by.as_nanos()).unwrap_or(u64::MAX);
        self.lateness_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    fn reset_lateness(&self) {
        self.lateness_nanos.store(0, Ordering::Relaxed);
    }
}

/// What a single scheduler iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseOutcome {
    /// Transport stopped; slept for [`IDLE_POLL`].
    Idle,
    Pulsed,
    /// A pulse went out but the next deadline had already passed.
    Resynced { late_by: Duration },
}

pub struct PulseScheduler<S: MidiSink, C: Clock = SystemClock> {
    state: SharedState,
    sink: S,
    clock: C,
    cursor: PulseCursor,
    diagnostics: Arc<ClockDiagnostics>,
}

impl<S: MidiSink> PulseScheduler<S, SystemClock> {
    pub fn new(state: SharedState, sink: S) -> Self {
        Self::with_clock(state, sink, SystemClock)
    }
}

impl<S: MidiSink, C: Clock> PulseScheduler<S, C> {
    pub fn with_clock(state: SharedState, sink: S, clock: C) -> Self {
        Self {
            state,
            sink,
            clock,
            cursor: PulseCursor::new(),
            diagnostics: Arc::new(ClockDiagnostics::default()),
        }
    }

    pub fn diagnostics(&self) -> Arc<ClockDiagnostics> {
        self.diagnostics.clone()
    }

    pub fn cursor(&self) -> PulseCursor {
        self.cursor
    }

    /// Runs until `cancel` fires. The wait between pulses is abandoned as
    /// soon as cancellation is noticed, so shutdown latency stays around
    /// [`IDLE_POLL`] at any tempo.
    pub fn run(&mut self, cancel: &CancellationToken) {
        info!("Pulse scheduler started");
        while !cancel.is_cancelled() {
            self.iterate(Some(cancel));
        }
        let stats = self.diagnostics.snapshot();
        info!(
            "Pulse scheduler stopped: {} pulses sent, {} send failures, {} missed deadlines",
            stats.pulses_sent, stats.send_failures, stats.missed_deadlines
        );
    }

    /// One loop iteration: idle, or emit a pulse and wait for the next deadline.
    /// Stopping the transport cuts the wait short.
    pub fn step(&mut self) -> PulseOutcome {
        self.iterate(None)
    }

    fn iterate(&mut self, cancel: Option<&CancellationToken>) -> PulseOutcome {
        let TransportState { tempo_bpm, running } = self.state.read();

        let interval = match pulse_interval(tempo_bpm) {
            Some(interval) if running => interval,
            _ => {
                self.go_idle();
                self.clock.sleep(IDLE_POLL);
                return PulseOutcome::Idle;
            }
        };

        if !self.cursor.is_set() {
            debug!("Clock running at {} BPM", tempo_bpm);
        }
        self.cursor.anchor(self.clock.now(), interval);

        // Dropped pulses are acceptable, a stalled loop is not.
        let sent = self.sink.send(MidiMessage::TimingClock).is_ok();
        self.diagnostics.record_send(sent);

        let outcome = match self.cursor.advance(interval, self.clock.now()) {
            Advance::OnTime { .. } => PulseOutcome::Pulsed,
            Advance::Resynced { late_by, .. } => {
                trace!("Pulse deadline missed by {:?}, resynchronizing", late_by);
                self.diagnostics.record_miss(late_by);
                PulseOutcome::Resynced { late_by }
            }
        };

        if let Some(deadline) = self.cursor.next_deadline() {
            let state = &self.state;
            let interrupted =
                || !state.is_running() || cancel.map_or(false, CancellationToken::is_cancelled);
            if !timing::wait_until(&self.clock, deadline, interrupted) {
                debug!("Wait for next pulse interrupted");
            }
        }
        outcome
    }

    fn go_idle(&mut self) {
        if self.cursor.is_set() {
            debug!("Clock stopped");
            self.cursor.clear();
            self.diagnostics.reset_lateness();
        }
    }
}

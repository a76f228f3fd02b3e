//! Turns Control Change traffic and console commands into transport changes.
use crate::midi::ControlEvent;
use crate::shutdown::CancellationToken;
use crate::state::SharedState;
use crate::tap_tempo::TapTempo;
use crossbeam::channel::{Receiver, RecvTimeoutError};
use log::{debug, error, info};
use std::time::{Duration, Instant};
use thiserror::Error;

pub const TRANSPORT_START_VALUE: u8 = 0;
pub const TRANSPORT_STOP_VALUE: u8 = 1;
pub const TAP_PRESS_VALUE: u8 = 127;

/// How often the listener wakes up to check for shutdown.
pub const LISTENER_POLL: Duration = Duration::from_millis(100);

/// Which controllers on which channel drive the transport. Fixed for the
/// lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlBinding {
    pub channel: u8,
    pub transport_cc: u8,
    pub tap_cc: u8,
}

impl Default for ControlBinding {
    fn default() -> Self {
        Self {
            channel: 0,
            transport_cc: 20,
            tap_cc: 21,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportCommand {
    Start,
    Stop,
    SetTempo(f64),
    Tap(Instant),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlOutcome {
    Started,
    Stopped,
    TempoSet(f64),
    /// `bpm` is `None` when the tap did not complete an estimate.
    Tapped { bpm: Option<f64> },
    Ignored,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Invalid BPM '{0}'. Tempo must be a number greater than 0.")]
    InvalidTempo(f64),

    #[error("Invalid input '{0}'. Enter a number for BPM, 'start', 'stop', or 'quit'.")]
    Unrecognized(String),
}

pub struct ControlInterpreter {
    binding: ControlBinding,
    state: SharedState,
    tap: TapTempo,
}

impl ControlInterpreter {
    pub fn new(binding: ControlBinding, state: SharedState) -> Self {
        Self::with_tap_tempo(binding, state, TapTempo::new())
    }

    pub fn with_tap_tempo(binding: ControlBinding, state: SharedState, tap: TapTempo) -> Self {
        Self {
            binding,
            state,
            tap,
        }
    }

    pub fn binding(&self) -> ControlBinding {
        self.binding
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn handle_event(&self, event: &ControlEvent) -> ControlOutcome {
        self.handle_control_change_at(
            event.channel,
            event.controller,
            event.value,
            event.received_at,
        )
    }

    pub fn handle_control_change(&self, channel: u8, controller: u8, value: u8) -> ControlOutcome {
        self.handle_control_change_at(channel, controller, value, Instant::now())
    }

    /// Like [`handle_control_change`](Self::handle_control_change) with an
    /// explicit receipt time for tap events.
    ///
    /// Anything that does not match the binding is ignored: unmapped CC
    /// traffic is expected and harmless.
    pub fn handle_control_change_at(
        &self,
        channel: u8,
        controller: u8,
        value: u8,
        received_at: Instant,
    ) -> ControlOutcome {
        if channel != self.binding.channel {
            return ControlOutcome::Ignored;
        }

        let command = if controller == self.binding.transport_cc {
            match value {
                TRANSPORT_START_VALUE => TransportCommand::Start,
                TRANSPORT_STOP_VALUE => TransportCommand::Stop,
                _ => return ControlOutcome::Ignored,
            }
        } else if controller == self.binding.tap_cc && value == TAP_PRESS_VALUE {
            TransportCommand::Tap(received_at)
        } else {
            return ControlOutcome::Ignored;
        };

        // Commands built above are always valid.
        self.apply(command).unwrap_or(ControlOutcome::Ignored)
    }

    /// Applies a command to the transport. A tempo that is not a positive
    /// finite number is rejected without touching state.
    pub fn apply(&self, command: TransportCommand) -> Result<ControlOutcome, CommandError> {
        match command {
            TransportCommand::Start => {
                self.state.set_running(true);
                info!("Transport started");
                Ok(ControlOutcome::Started)
            }
            TransportCommand::Stop => {
                self.state.set_running(false);
                info!("Transport stopped");
                Ok(ControlOutcome::Stopped)
            }
            TransportCommand::SetTempo(bpm) => {
                if !(bpm.is_finite() && bpm > 0.0) {
                    return Err(CommandError::InvalidTempo(bpm));
                }
                self.state.set_tempo(bpm);
                info!("Tempo set to {} BPM", bpm);
                Ok(ControlOutcome::TempoSet(bpm))
            }
            TransportCommand::Tap(at) => {
                let bpm = self.tap.tap(at);
                match bpm {
                    Some(bpm) => {
                        self.state.set_tempo(bpm);
                        info!("Tap tempo: BPM updated to {}", bpm);
                    }
                    None => debug!("Tap registered, waiting for more taps"),
                }
                Ok(ControlOutcome::Tapped { bpm })
            }
        }
    }
}

/// Feeds received Control Change events to `interpreter` until `cancel`
/// fires or every sender has gone away.
pub fn run_listener(
    interpreter: &ControlInterpreter,
    events: &Receiver<ControlEvent>,
    cancel: &CancellationToken,
) {
    info!("MIDI control listener started");
    while !cancel.is_cancelled() {
        match events.recv_timeout(LISTENER_POLL) {
            Ok(event) => report(interpreter.handle_event(&event)),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                error!("MIDI control channel disconnected");
                break;
            }
        }
    }
    info!("MIDI control listener stopped");
}

fn report(outcome: ControlOutcome) {
    match outcome {
        ControlOutcome::Started => println!("[CC] CLOCK START"),
        ControlOutcome::Stopped => println!("[CC] CLOCK STOP"),
        ControlOutcome::Tapped { bpm: Some(bpm) } => {
            println!("[CC] TAP tempo -> BPM updated to {}", bpm)
        }
        ControlOutcome::TempoSet(_)
        | ControlOutcome::Tapped { bpm: None }
        | ControlOutcome::Ignored => {}
    }
}

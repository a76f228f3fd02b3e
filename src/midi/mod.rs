//! MIDI side of the clock
//!
//! This module provides:
//! - The message subset and error type shared by every MIDI collaborator
//! - The pulse scheduler that drives the outgoing clock
//! - midir-backed output and input ports
//! - A recording sink for tests
//!
pub mod clock;
mod engine;
pub mod midir_engine;
pub mod mock_engine;

pub use engine::{ControlEvent, MidiError, MidiMessage, MidiSink, Result, TIMING_CLOCK};

pub use midir_engine::{list_ports, MidirInput, MidirOutput, PortListing};
pub use mock_engine::MockMidiEngine;

pub use clock::{ClockDiagnostics, DiagnosticsSnapshot, PulseOutcome, PulseScheduler};

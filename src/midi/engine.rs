use std::time::Instant;
use thiserror::Error;

/// MIDI real-time timing clock status byte.
pub const TIMING_CLOCK: u8 = 0xF8;
const CONTROL_CHANGE: u8 = 0xB0;

#[derive(Error, Debug)]
pub enum MidiError {
    #[error("MIDI init error: {0}")]
    Init(String),

    #[error("MIDI connection error: {0}")]
    Connect(String),

    #[error("MIDI port '{wanted}' not found (available: {available:?})")]
    PortNotFound {
        wanted: String,
        available: Vec<String>,
    },

    #[error("MIDI send error: {0}")]
    Send(String),

    #[error("virtual MIDI ports are not supported here and no output matches '{0}'")]
    VirtualPortsUnsupported(String),
}

pub type Result<T> = std::result::Result<T, MidiError>;

/// The subset of MIDI this program speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    /// Real-time clock pulse, 24 per quarter note.
    TimingClock,
    ControlChange {
        channel: u8,
        controller: u8,
        value: u8,
    },
}

impl MidiMessage {
    /// Parses raw bytes, returning `None` for anything that is not a
    /// timing clock or a complete Control Change.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let status = *data.first()?;
        match status {
            TIMING_CLOCK => Some(MidiMessage::TimingClock),
            s if s & 0xF0 == CONTROL_CHANGE && data.len() == 3 => {
                if data[1] > 0x7F || data[2] > 0x7F {
                    return None;
                }
                Some(MidiMessage::ControlChange {
                    channel: s & 0x0F,
                    controller: data[1],
                    value: data[2],
                })
            }
            _ => None,
        }
    }

    pub fn to_bytes(self) -> Vec<u8> {
        match self {
            MidiMessage::TimingClock => vec![TIMING_CLOCK],
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => vec![CONTROL_CHANGE | (channel & 0x0F), controller & 0x7F, value & 0x7F],
        }
    }
}

/// An incoming Control Change, stamped when it reached us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEvent {
    pub channel: u8,
    pub controller: u8,
    pub value: u8,
    pub received_at: Instant,
}

impl ControlEvent {
    pub fn from_bytes(data: &[u8], received_at: Instant) -> Option<Self> {
        match MidiMessage::parse(data)? {
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => Some(ControlEvent {
                channel,
                controller,
                value,
                received_at,
            }),
            MidiMessage::TimingClock => None,
        }
    }
}

/// Destination for outgoing MIDI. Owned by exactly one execution context.
pub trait MidiSink: Send {
    fn send(&mut self, msg: MidiMessage) -> Result<()>;
}

impl<S: MidiSink + ?Sized> MidiSink for Box<S> {
    fn send(&mut self, msg: MidiMessage) -> Result<()> {
        (**self).send(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_control_change() {
        assert_eq!(
            MidiMessage::parse(&[0xB3, 20, 127]),
            Some(MidiMessage::ControlChange {
                channel: 3,
                controller: 20,
                value: 127
            })
        );
    }

    #[test]
    fn test_parse_filters_other_messages() {
        assert_eq!(MidiMessage::parse(&[]), None);
        assert_eq!(MidiMessage::parse(&[0x90, 60, 100]), None);
        assert_eq!(MidiMessage::parse(&[0xB0, 20]), None);
        assert_eq!(MidiMessage::parse(&[0xFA]), None);
    }

    #[test]
    fn test_timing_clock_is_single_byte() {
        assert_eq!(MidiMessage::TimingClock.to_bytes(), vec![0xF8]);
    }

    #[test]
    fn test_control_event_skips_clock() {
        let now = Instant::now();
        assert_eq!(ControlEvent::from_bytes(&[0xF8], now), None);
        let event = ControlEvent::from_bytes(&[0xB0, 21, 127], now).unwrap();
        assert_eq!((event.channel, event.controller, event.value), (0, 21, 127));
    }
}

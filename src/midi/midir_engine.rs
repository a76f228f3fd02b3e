use crate::midi::{ControlEvent, MidiError, MidiMessage, MidiSink, Result};
use crossbeam::channel::{Sender, TrySendError};
use log::{debug, info, warn};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use std::time::Instant;

const CLIENT_NAME: &str = "midiclockrs";

/// Output sink backed by a midir connection.
pub struct MidirOutput {
    connection: MidiOutputConnection,
    port_name: String,
}

impl MidirOutput {
    /// Publishes a virtual output port other applications can subscribe to.
    #[cfg(unix)]
    pub fn open(port_name: &str) -> Result<Self> {
        use midir::os::unix::VirtualOutput;

        let midi_out = MidiOutput::new(CLIENT_NAME).map_err(|e| MidiError::Init(e.to_string()))?;
        let connection = midi_out
            .create_virtual(port_name)
            .map_err(|e| MidiError::Connect(e.to_string()))?;
        info!("Created virtual MIDI output port: {}", port_name);

        Ok(Self {
            connection,
            port_name: port_name.to_string(),
        })
    }

    /// Without virtual ports, fall back to an existing output whose name matches.
    #[cfg(not(unix))]
    pub fn open(port_name: &str) -> Result<Self> {
        Self::connect_to_device(port_name).map_err(|e| match e {
            MidiError::PortNotFound { wanted, .. } => MidiError::VirtualPortsUnsupported(wanted),
            other => other,
        })
    }

    pub fn connect_to_device(device_name: &str) -> Result<Self> {
        let midi_out = MidiOutput::new(CLIENT_NAME).map_err(|e| MidiError::Init(e.to_string()))?;

        let out_ports = midi_out.ports();
        let available: Vec<String> = out_ports
            .iter()
            .filter_map(|p| midi_out.port_name(p).ok())
            .collect();
        debug!("Available MIDI output ports: {:?}", available);

        let port = out_ports
            .iter()
            .find(|p| {
                midi_out
                    .port_name(p)
                    .unwrap_or_default()
                    .contains(device_name)
            })
            .ok_or_else(|| MidiError::PortNotFound {
                wanted: device_name.to_string(),
                available: available.clone(),
            })?;

        let port_name = midi_out
            .port_name(port)
            .map_err(|e| MidiError::Connect(e.to_string()))?;
        info!("Connecting to MIDI output port: {}", port_name);

        let connection = midi_out
            .connect(port, "midiclockrs-output")
            .map_err(|e| MidiError::Connect(e.to_string()))?;

        Ok(Self {
            connection,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl MidiSink for MidirOutput {
    fn send(&mut self, msg: MidiMessage) -> Result<()> {
        self.connection
            .send(&msg.to_bytes())
            .map_err(|e| MidiError::Send(e.to_string()))
    }
}

/// Live input connection forwarding Control Change events into a channel.
/// Dropping it closes the port.
pub struct MidirInput {
    connection: MidiInputConnection<()>,
    port_name: String,
}

impl MidirInput {
    /// Opens the first input port whose name contains `device_name`.
    ///
    /// Everything except complete Control Change messages is dropped in the
    /// callback. The callback never blocks: if the listener falls behind, new
    /// events are discarded.
    pub fn open(device_name: &str, events: Sender<ControlEvent>) -> Result<Self> {
        let mut midi_in = MidiInput::new(CLIENT_NAME).map_err(|e| MidiError::Init(e.to_string()))?;
        midi_in.ignore(Ignore::All);

        let in_ports = midi_in.ports();
        let available: Vec<String> = in_ports
            .iter()
            .filter_map(|p| midi_in.port_name(p).ok())
            .collect();
        debug!("Available MIDI input ports: {:?}", available);

        let port = in_ports
            .iter()
            .find(|p| midi_in.port_name(p).unwrap_or_default().contains(device_name))
            .ok_or_else(|| MidiError::PortNotFound {
                wanted: device_name.to_string(),
                available: available.clone(),
            })?;
        let port_name = midi_in
            .port_name(port)
            .map_err(|e| MidiError::Connect(e.to_string()))?;

        let connection = midi_in
            .connect(
                port,
                "midiclockrs-input",
                move |_stamp, message, _| {
                    let Some(event) = ControlEvent::from_bytes(message, Instant::now()) else {
                        return;
                    };
                    match events.try_send(event) {
                        Ok(()) => {}
                        Err(TrySendError::Full(dropped)) => {
                            warn!("Control event queue full, dropping {:?}", dropped)
                        }
                        Err(TrySendError::Disconnected(_)) => {}
                    }
                },
                (),
            )
            .map_err(|e| MidiError::Connect(e.to_string()))?;
        info!("Opened MIDI input port: {}", port_name);

        Ok(Self {
            connection,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn close(self) {
        info!("Closing MIDI input port: {}", self.port_name);
        let _ = self.connection.close();
    }
}

/// Names of the ports currently visible to the MIDI backend.
#[derive(Debug, Default, Clone)]
pub struct PortListing {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

pub fn list_ports() -> Result<PortListing> {
    let midi_in = MidiInput::new("midiclockrs-list").map_err(|e| MidiError::Init(e.to_string()))?;
    let midi_out =
        MidiOutput::new("midiclockrs-list").map_err(|e| MidiError::Init(e.to_string()))?;

    let inputs = midi_in
        .ports()
        .iter()
        .filter_map(|p| midi_in.port_name(p).ok())
        .collect();
    let outputs = midi_out
        .ports()
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect();

    Ok(PortListing { inputs, outputs })
}

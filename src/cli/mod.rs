use crate::config::DEFAULT_CONFIG_FILE;
use clap::Parser;
use std::path::PathBuf;

/// Master MIDI clock generator with CC start/stop and tap tempo
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// CC number for clock control (value 0 = start, 1 = stop)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=127))]
    pub clock_control_cc: Option<u8>,

    /// CC number for tap tempo (momentary, value 127)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=127))]
    pub tap_cc: Option<u8>,

    /// MIDI channel, zero-based (0 = channel 1)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=15))]
    pub channel: Option<u8>,

    /// Initial BPM
    #[arg(long)]
    pub bpm: Option<f64>,

    /// Delay in milliseconds between opening the output and the first pulse
    #[arg(long)]
    pub warmup_ms: Option<u64>,

    /// MIDI input port to listen on for control messages (substring match)
    #[arg(long)]
    pub input: Option<String>,

    /// Name of the virtual MIDI output port
    #[arg(long, default_value = "midiclockrs")]
    pub port_name: String,

    /// Settings file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Do not save overrides to the settings file
    #[arg(long)]
    pub no_save: bool,

    /// List available MIDI ports and exit
    #[arg(long)]
    pub list: bool,
}

pub fn validate_device(device_name: &str, devices: &[String]) -> Result<(), String> {
    if !devices.iter().any(|d| d.contains(device_name)) {
        let mut error_msg = format!(
            "Error: Input port '{}' not found in available ports:\n",
            device_name
        );
        for device in devices {
            error_msg.push_str(&format!("  - {}\n", device));
        }
        return Err(error_msg);
    }
    Ok(())
}

/// Formats a port listing the way `--list` prints it.
pub fn format_port_listing(inputs: &[String], outputs: &[String]) -> String {
    let mut out = String::from("\nAvailable MIDI Input Ports:\n");
    for (i, name) in inputs.iter().enumerate() {
        out.push_str(&format!("  [{}] [IN]  {}\n", i, name));
    }
    out.push_str("\nAvailable MIDI Output Ports:\n");
    for (i, name) in outputs.iter().enumerate() {
        out.push_str(&format!("  [{}] [OUT] {}\n", i, name));
    }
    out
}

//! Line-based local control.
//!
//! Accepts `start`, `stop`, `quit`/`exit` or a decimal tempo. The loop
//! blocks on input and never holds a shared lock while doing so.
use crate::control::{CommandError, ControlInterpreter, TransportCommand};
use crate::shutdown::CancellationToken;
use dialoguer::Input;
use log::{info, warn};
use std::io::BufRead;

pub const HELP: &str = "MIDI clock ready. Commands: enter BPM number, 'start', 'stop', or 'quit'.";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleCommand {
    Start,
    Stop,
    Quit,
    SetTempo(f64),
}

/// What the console should do after handling one line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleReply {
    Message(String),
    Silent,
    Quit,
}

pub fn parse_command(input: &str) -> Result<ConsoleCommand, CommandError> {
    let trimmed = input.trim();
    match trimmed.to_lowercase().as_str() {
        "quit" | "exit" => Ok(ConsoleCommand::Quit),
        "start" => Ok(ConsoleCommand::Start),
        "stop" => Ok(ConsoleCommand::Stop),
        other => match other.parse::<f64>() {
            Ok(bpm) if bpm.is_finite() && bpm > 0.0 => Ok(ConsoleCommand::SetTempo(bpm)),
            Ok(bpm) => Err(CommandError::InvalidTempo(bpm)),
            Err(_) => Err(CommandError::Unrecognized(trimmed.to_string())),
        },
    }
}

pub fn handle_line(line: &str, interpreter: &ControlInterpreter) -> ConsoleReply {
    if line.trim().is_empty() {
        return ConsoleReply::Silent;
    }

    let (command, confirmation) = match parse_command(line) {
        Ok(ConsoleCommand::Quit) => return ConsoleReply::Quit,
        Ok(ConsoleCommand::Start) => (
            TransportCommand::Start,
            "Clock START from console.".to_string(),
        ),
        Ok(ConsoleCommand::Stop) => (
            TransportCommand::Stop,
            "Clock STOP from console.".to_string(),
        ),
        Ok(ConsoleCommand::SetTempo(bpm)) => {
            (TransportCommand::SetTempo(bpm), format!("BPM updated to {}", bpm))
        }
        Err(e) => {
            warn!("Rejected console input {:?}: {}", line.trim(), e);
            return ConsoleReply::Message(e.to_string());
        }
    };

    match interpreter.apply(command) {
        Ok(_) => ConsoleReply::Message(confirmation),
        Err(e) => ConsoleReply::Message(e.to_string()),
    }
}

/// Source of console lines. `None` means input is exhausted.
pub trait LineSource {
    fn next_line(&mut self) -> Option<String>;
}

impl<L: LineSource + ?Sized> LineSource for Box<L> {
    fn next_line(&mut self) -> Option<String> {
        (**self).next_line()
    }
}

/// Lines from any buffered reader (piped stdin, tests).
pub struct ReaderLines<R> {
    reader: R,
}

impl<R: BufRead> ReaderLines<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderLines<R> {
    fn next_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(e) => {
                warn!("Console read failed: {}", e);
                None
            }
        }
    }
}

/// Interactive prompt for a real terminal.
pub struct PromptLines {
    prompt: String,
}

impl PromptLines {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

impl Default for PromptLines {
    fn default() -> Self {
        Self::new(">")
    }
}

impl LineSource for PromptLines {
    fn next_line(&mut self) -> Option<String> {
        match Input::<String>::new()
            .with_prompt(self.prompt.as_str())
            .allow_empty(true)
            .report(false)
            .interact_text()
        {
            Ok(line) => Some(line),
            Err(e) => {
                warn!("Console prompt failed: {}", e);
                None
            }
        }
    }
}

/// Reads commands until `quit`, end of input, or cancellation, then cancels
/// `cancel` so the other loops wind down too.
pub fn run_console<L: LineSource>(
    lines: &mut L,
    interpreter: &ControlInterpreter,
    cancel: &CancellationToken,
) {
    println!("{}", HELP);
    while !cancel.is_cancelled() {
        let Some(line) = lines.next_line() else {
            info!("Console input closed");
            break;
        };
        match handle_line(&line, interpreter) {
            ConsoleReply::Message(text) => println!("{}", text),
            ConsoleReply::Silent => {}
            ConsoleReply::Quit => {
                info!("Quit requested from console");
                break;
            }
        }
    }
    cancel.cancel();
}

pub mod cli;
pub mod config;
pub mod console;
pub mod control;
pub mod logging;
pub mod midi;
pub mod shutdown;
pub mod spawn;
pub mod state;
pub mod tap_tempo;
pub mod warmup;

pub use cli::Args;
pub use control::{ControlBinding, ControlInterpreter, ControlOutcome, TransportCommand};
pub use shutdown::CancellationToken;
pub use spawn::{Spawner, ThreadSpawner};
pub use state::{SharedState, TransportState, TransportStore};

use std::sync::Arc;

pub fn create_spawner() -> ThreadSpawner {
    ThreadSpawner::new()
}

pub fn create_shared_state(initial_bpm: f64) -> SharedState {
    Arc::new(TransportStore::with_tempo(initial_bpm))
}

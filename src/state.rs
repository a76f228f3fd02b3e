use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const DEFAULT_BPM: f64 = 120.0;

/// A consistent view of the transport at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportState {
    pub tempo_bpm: f64,
    pub running: bool,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            tempo_bpm: DEFAULT_BPM,
            running: false,
        }
    }
}

/// Single authoritative home of tempo and the running flag.
///
/// Both fields sit behind one lock so a reader always gets a matching pair.
/// The lock is only ever held for the field copy itself, never across a sleep
/// or an I/O call, so writers cannot stall the pulse loop.
#[derive(Debug, Default)]
pub struct TransportStore {
    inner: Mutex<TransportState>,
}

pub type SharedState = Arc<TransportStore>;

impl TransportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tempo(bpm: f64) -> Self {
        Self {
            inner: Mutex::new(TransportState {
                tempo_bpm: bpm,
                running: false,
            }),
        }
    }

    // A poisoned lock still guards two plain values, so keep going with them.
    fn guard(&self) -> MutexGuard<'_, TransportState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Callers are responsible for passing a positive tempo.
    pub fn set_tempo(&self, bpm: f64) {
        self.guard().tempo_bpm = bpm;
    }

    pub fn set_running(&self, running: bool) {
        self.guard().running = running;
    }

    pub fn read(&self) -> TransportState {
        *self.guard()
    }

    pub fn tempo(&self) -> f64 {
        self.read().tempo_bpm
    }

    pub fn is_running(&self) -> bool {
        self.read().running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_tempo_starts_stopped() {
        let store = TransportStore::with_tempo(98.5);
        assert_eq!(
            store.read(),
            TransportState {
                tempo_bpm: 98.5,
                running: false
            }
        );
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let store = Arc::new(TransportStore::new());
        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.lock().unwrap();
            panic!("poison the transport lock");
        })
        .join();

        store.set_tempo(90.0);
        assert_eq!(store.tempo(), 90.0);
    }
}

use std::io;
use std::thread::{self, JoinHandle};

/// Starts the long-lived execution contexts (pulse loop, MIDI listener).
pub trait Spawner {
    fn spawn<F>(&self, name: &str, f: F) -> io::Result<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static;
}

pub struct ThreadSpawner;

impl ThreadSpawner {
    pub fn new() -> Self {
        ThreadSpawner
    }
}

impl Default for ThreadSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl Spawner for ThreadSpawner {
    fn spawn<F>(&self, name: &str, f: F) -> io::Result<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        log::debug!("Spawning thread '{}'", name);
        thread::Builder::new().name(name.to_string()).spawn(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_thread_spawner_names_thread() {
        let spawner = ThreadSpawner::new();
        let flag = Arc::new(AtomicBool::new(false));
        let flag_clone = flag.clone();

        let handle = spawner
            .spawn("pulse-test", move || {
                assert_eq!(thread::current().name(), Some("pulse-test"));
                flag_clone.store(true, Ordering::SeqCst);
            })
            .unwrap();

        handle.join().unwrap();
        assert!(flag.load(Ordering::SeqCst));
    }
}

use midiclockrs::state::{TransportState, TransportStore, DEFAULT_BPM};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_initialization() {
        let state = TransportStore::new();
        assert_eq!(state.tempo(), DEFAULT_BPM);
        assert!(!state.is_running());
        assert_eq!(state.read(), TransportState::default());
    }

    #[test]
    fn test_tempo_management() {
        let state = TransportStore::new();

        state.set_tempo(140.0);
        assert_eq!(state.tempo(), 140.0);

        state.set_tempo(30.0);
        assert_eq!(state.tempo(), 30.0);

        state.set_tempo(300.0);
        assert_eq!(state.tempo(), 300.0);
    }

    #[test]
    fn test_running_state() {
        let state = TransportStore::new();
        assert!(!state.is_running());

        state.set_running(true);
        assert!(state.is_running());

        state.set_running(false);
        assert!(!state.is_running());
    }

    #[test]
    fn test_writes_do_not_disturb_other_field() {
        let state = TransportStore::with_tempo(100.0);
        state.set_running(true);
        state.set_tempo(101.0);
        assert_eq!(
            state.read(),
            TransportState {
                tempo_bpm: 101.0,
                running: true
            }
        );
    }

    #[test]
    fn test_concurrent_readers_see_written_values() {
        let state = Arc::new(TransportStore::with_tempo(100.0));
        let mut handles = vec![];

        for writer in 0..4 {
            let state_clone = state.clone();
            handles.push(thread::spawn(move || {
                for i in 0..500 {
                    state_clone.set_tempo(100.0 + writer as f64);
                    state_clone.set_running(i % 2 == 0);
                }
            }));
        }

        let reader_state = state.clone();
        let reader = thread::spawn(move || {
            for _ in 0..2000 {
                let snapshot = reader_state.read();
                assert!((100.0..104.0).contains(&snapshot.tempo_bpm));
            }
        });

        for handle in handles {
            handle.join().unwrap();
        }
        reader.join().unwrap();
    }

    #[test]
    fn test_rapid_start_stop() {
        let state = Arc::new(TransportStore::new());
        let state_clone = state.clone();

        let toggle_handle = thread::spawn(move || {
            for _ in 0..100 {
                state_clone.set_running(true);
                state_clone.set_running(false);
            }
        });

        for _ in 0..100 {
            let _ = state.read();
            thread::sleep(Duration::from_micros(1));
        }

        toggle_handle.join().unwrap();
        assert!(!state.is_running());
    }
}

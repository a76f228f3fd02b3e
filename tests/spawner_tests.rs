#[cfg(test)]
mod tests {
    use midiclockrs::{create_shared_state, create_spawner, Spawner};
    use std::{
        sync::atomic::{AtomicBool, Ordering},
        sync::Arc,
    };

    #[test]
    fn test_spawner_with_transport() {
        let spawner = create_spawner();
        let shared_state = create_shared_state(120.0);
        let task_completed = Arc::new(AtomicBool::new(false));
        let task_completed_clone = task_completed.clone();

        let state = shared_state.clone();
        let handle = spawner
            .spawn("tempo-writer", move || {
                state.set_tempo(133.0);
                task_completed_clone.store(true, Ordering::SeqCst);
            })
            .unwrap();
        handle.join().unwrap();

        assert!(
            task_completed.load(Ordering::SeqCst),
            "Task should have completed"
        );
        assert_eq!(shared_state.tempo(), 133.0);
    }

    #[test]
    fn test_multiple_spawned_tasks() {
        let spawner = create_spawner();
        let shared_state = create_shared_state(120.0);

        let state1 = shared_state.clone();
        let first = spawner
            .spawn("tempo", move || state1.set_tempo(90.0))
            .unwrap();

        let state2 = shared_state.clone();
        let second = spawner
            .spawn("transport", move || state2.set_running(true))
            .unwrap();

        first.join().unwrap();
        second.join().unwrap();

        let transport = shared_state.read();
        assert_eq!(transport.tempo_bpm, 90.0);
        assert!(transport.running);
    }
}

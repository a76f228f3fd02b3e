use midiclockrs::console::{run_console, LineSource, ReaderLines};
use midiclockrs::{create_shared_state, CancellationToken, ControlBinding, ControlInterpreter};

fn interpreter() -> ControlInterpreter {
    ControlInterpreter::new(ControlBinding::default(), create_shared_state(120.0))
}

/// Counts how many lines were pulled so tests can see where the loop stopped.
struct CountingLines<L> {
    inner: L,
    pulled: usize,
}

impl<L: LineSource> LineSource for CountingLines<L> {
    fn next_line(&mut self) -> Option<String> {
        self.pulled += 1;
        self.inner.next_line()
    }
}

#[test]
fn test_script_drives_transport() {
    let interp = interpreter();
    let cancel = CancellationToken::new();
    let mut lines = ReaderLines::new("start\n140\nbogus\n-5\n".as_bytes());

    run_console(&mut lines, &interp, &cancel);

    let transport = interp.state().read();
    assert!(transport.running);
    assert_eq!(transport.tempo_bpm, 140.0);
    // End of input behaves like quit.
    assert!(cancel.is_cancelled());
}

#[test]
fn test_quit_stops_reading() {
    let interp = interpreter();
    let cancel = CancellationToken::new();
    let mut lines = CountingLines {
        inner: ReaderLines::new("stop\nquit\nstart\n".as_bytes()),
        pulled: 0,
    };

    run_console(&mut lines, &interp, &cancel);

    assert_eq!(lines.pulled, 2);
    assert!(!interp.state().is_running());
    assert!(cancel.is_cancelled());
}

#[test]
fn test_cancelled_before_start_reads_nothing() {
    let interp = interpreter();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut lines = CountingLines {
        inner: ReaderLines::new("start\n".as_bytes()),
        pulled: 0,
    };

    run_console(&mut lines, &interp, &cancel);

    assert_eq!(lines.pulled, 0);
    assert!(!interp.state().is_running());
}

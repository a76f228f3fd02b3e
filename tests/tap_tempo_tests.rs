use midiclockrs::tap_tempo::{TapTempo, TAP_RESET};
use std::time::{Duration, Instant};

fn at(base: Instant, seconds: f64) -> Instant {
    base + Duration::from_secs_f64(seconds)
}

#[test]
fn test_steady_taps_give_120() {
    let tapper = TapTempo::new();
    let base = Instant::now();

    assert_eq!(tapper.tap(at(base, 0.0)), None);
    assert_eq!(tapper.tap(at(base, 0.5)), Some(120.0));
    assert_eq!(tapper.tap(at(base, 1.0)), Some(120.0));
    assert_eq!(tapper.tap(at(base, 1.5)), Some(120.0));
}

#[test]
fn test_stale_gap_restarts_sequence() {
    let tapper = TapTempo::new();
    let base = Instant::now();

    tapper.tap(at(base, 0.0));
    tapper.tap(at(base, 0.5));
    assert_eq!(tapper.tap(at(base, 3.0)), None);
    assert_eq!(tapper.len(), 1);

    // The fresh sequence estimates from its own taps only.
    assert_eq!(tapper.tap(at(base, 3.6)), Some(100.0));
}

#[test]
fn test_gap_equal_to_threshold_is_kept() {
    let tapper = TapTempo::new();
    let base = Instant::now();

    tapper.tap(base);
    assert_eq!(tapper.tap(base + TAP_RESET), Some(30.0));
}

#[test]
fn test_estimate_is_rounded() {
    let tapper = TapTempo::new();
    let base = Instant::now();

    tapper.tap(at(base, 0.0));
    tapper.tap(at(base, 0.45));
    // 60 / 0.45 = 133.33
    assert_eq!(tapper.tap(at(base, 0.9)), Some(133.0));
}

#[test]
fn test_clear_forgets_taps() {
    let tapper = TapTempo::new();
    let base = Instant::now();
    tapper.tap(base);
    tapper.clear();
    assert!(tapper.is_empty());
    assert_eq!(tapper.tap(at(base, 0.5)), None);
}

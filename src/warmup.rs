use crate::shutdown::CancellationToken;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::thread;
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_millis(50);

fn create_warmup_progress(total: Duration, target: ProgressDrawTarget) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(total.as_millis() as u64), target);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{prefix:.bold} [{bar:40.cyan}] {pos}/{len} ms")
    {
        pb.set_style(style.progress_chars("█▊ "));
    }
    pb.set_prefix("Warm-up");
    pb
}

/// Gives subscribers time to connect to a freshly published port before the
/// first pulse. Returns `false` if cancelled part-way.
pub fn run_warmup(total: Duration, cancel: &CancellationToken) -> bool {
    run_warmup_with_target(total, cancel, ProgressDrawTarget::stderr())
}

pub fn run_warmup_with_target(
    total: Duration,
    cancel: &CancellationToken,
    target: ProgressDrawTarget,
) -> bool {
    if total.is_zero() {
        return true;
    }

    log::info!("Warming up output for {:?}", total);
    let pb = create_warmup_progress(total, target);
    let started = Instant::now();

    loop {
        if cancel.is_cancelled() {
            pb.abandon();
            return false;
        }
        let elapsed = started.elapsed();
        if elapsed >= total {
            break;
        }
        pb.set_position(elapsed.as_millis() as u64);
        thread::sleep(TICK.min(total - elapsed));
    }

    pb.finish_and_clear();
    true
}

use std::time::{Duration, Instant};

/// Where the pulse grid currently stands. Unset whenever the transport is
/// stopped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PulseCursor {
    next_deadline: Option<Instant>,
}

/// Result of moving the cursor past an emitted pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    OnTime { next: Instant },
    /// The loop fell behind and the grid was rebuilt from `now`.
    Resynced { next: Instant, late_by: Duration },
}

impl Advance {
    pub fn next(self) -> Instant {
        match self {
            Advance::OnTime { next } | Advance::Resynced { next, .. } => next,
        }
    }
}

impl PulseCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_deadline
    }

    pub fn is_set(&self) -> bool {
        self.next_deadline.is_some()
    }

    pub fn clear(&mut self) {
        self.next_deadline = None;
    }

    /// Returns the current deadline, anchoring a fresh grid at
    /// `now + interval` if the cursor was unset.
    pub fn anchor(&mut self, now: Instant, interval: Duration) -> Instant {
        *self.next_deadline.get_or_insert(now + interval)
    }

    /// Steps the grid forward by one interval from the previous deadline.
    /// If that is already in the past, no catch-up pulses are scheduled: the
    /// next deadline becomes `now + interval`.
    pub fn advance(&mut self, interval: Duration, now: Instant) -> Advance {
        let previous = self.next_deadline.unwrap_or(now);
        let next = previous + interval;

        let advance = if next < now {
            Advance::Resynced {
                next: now + interval,
                late_by: now - next,
            }
        } else {
            Advance::OnTime { next }
        };
        self.next_deadline = Some(advance.next());
        advance
    }
}

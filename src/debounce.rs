use std::time::{Duration, Instant};

/// Per-button quiet-window gate.
///
/// A single physical press makes the contacts oscillate for a few
/// milliseconds, so the hardware reports a burst of edges. The gate accepts
/// the first edge of a burst and ignores the rest until the quiet window has
/// elapsed. Ignored edges are dropped, never queued.
pub struct Debouncer {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Debouncer {
            window,
            last_accepted: None,
        }
    }

    /// True while `now` falls strictly inside the quiet window opened by the
    /// last accepted edge.
    pub fn is_suppressed(&self, now: Instant) -> bool {
        match self.last_accepted {
            Some(last) => now.saturating_duration_since(last) < self.window,
            None => false,
        }
    }

    /// Gate one raw edge. Accepted edges are recorded and open a fresh quiet
    /// window; suppressed edges leave the window untouched. An edge exactly
    /// at the boundary counts as outside the window.
    pub fn accept(&mut self, now: Instant) -> bool {
        if self.is_suppressed(now) {
            return false;
        }
        self.last_accepted = Some(now);
        true
    }

    pub fn last_accepted(&self) -> Option<Instant> {
        self.last_accepted
    }
}

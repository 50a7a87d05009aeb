use std::time::{Duration, Instant};

/// Limits host refreshes while a command streams output.
#[derive(Clone, Copy, Debug)]
pub struct RefreshThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl RefreshThrottle {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Whether a refresh is due now.
    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    /// The first tick of a run only starts the clock.
    pub fn tick_at(&mut self, now: Instant) -> bool {
        match self.last {
            None => {
                self.last = Some(now);
                false
            }
            Some(last) if now.saturating_duration_since(last) > self.interval => {
                self.last = Some(now);
                true
            }
            Some(_) => false,
        }
    }

    /// Forget the last refresh, at the start and end of each run.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

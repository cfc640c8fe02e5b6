//! Time budget shared by every puzzle.
//!
//! Like the rest of the engine there is no internal timer: the owner calls
//! [`Countdown::advance`] with the wall-clock delta since the last call.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    limit: Duration,
    remaining: Duration,
    elapsed: Duration,
    running: bool,
}

impl Countdown {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            remaining: limit,
            elapsed: Duration::ZERO,
            running: false,
        }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn start(&mut self) {
        self.running = !self.is_exhausted();
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Restore the full budget and stop.
    pub fn reset(&mut self) {
        self.remaining = self.limit;
        self.elapsed = Duration::ZERO;
        self.running = false;
    }

    /// Consume `dt`. Returns `true` on the call that exhausts the budget;
    /// the countdown stops itself at that point.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if !self.running {
            return false;
        }
        let step = dt.min(self.remaining);
        self.remaining -= step;
        self.elapsed += step;
        if self.remaining.is_zero() {
            self.running = false;
            return true;
        }
        false
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Time spent while running.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn does_not_move_until_started() {
        let mut c = Countdown::from_secs(10);
        assert!(!c.advance(Duration::from_secs(3)));
        assert_eq!(c.remaining(), Duration::from_secs(10));
    }

    #[test]
    fn exhausts_once_and_stops() {
        let mut c = Countdown::from_secs(2);
        c.start();
        assert!(!c.advance(Duration::from_secs(1)));
        assert!(c.advance(Duration::from_secs(5)));
        assert!(c.is_exhausted());
        assert!(!c.is_running());
        assert_eq!(c.elapsed(), Duration::from_secs(2));
        assert!(!c.advance(Duration::from_secs(1)));
    }

    #[test]
    fn reset_restores_budget() {
        let mut c = Countdown::from_secs(5);
        c.start();
        c.advance(Duration::from_secs(4));
        c.reset();
        assert_eq!(c.remaining(), Duration::from_secs(5));
        assert_eq!(c.elapsed(), Duration::ZERO);
        assert!(!c.is_running());
    }

    #[test]
    fn zero_limit_never_runs() {
        let mut c = Countdown::from_secs(0);
        c.start();
        assert!(!c.is_running());
        assert!(c.is_exhausted());
    }
}

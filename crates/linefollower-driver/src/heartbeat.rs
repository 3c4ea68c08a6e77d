//! Liveness Monitor - tracks the last time bytes arrived from the robot
//!
//! The read loop registers every successful receive (and every correct PING echo).
//! When nothing has arrived for longer than the threshold (`timeout × 1.1`),
//! the loop sends an active PING probe.
//!
//! Timestamps are monotonic micros anchored at first use, stored in an
//! `AtomicU64` so other threads can read the link age without locking.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

static APP_START: OnceLock<Instant> = OnceLock::new();

/// Monotonic time as microseconds since first use
fn get_monotonic_micros() -> u64 {
    let start = APP_START.get_or_init(Instant::now);
    start.elapsed().as_micros() as u64
}

/// Link liveness monitor
#[derive(Debug)]
pub struct LivenessMonitor {
    last_receive: AtomicU64,
    threshold: Duration,
}

impl LivenessMonitor {
    /// Create a monitor; the link counts as fresh at creation time
    ///
    /// # Example
    /// ```
    /// # use linefollower_driver::heartbeat::LivenessMonitor;
    /// # use std::time::Duration;
    /// let monitor = LivenessMonitor::new(Duration::from_millis(1100));
    /// assert!(!monitor.needs_probe());
    /// ```
    pub fn new(threshold: Duration) -> Self {
        Self {
            last_receive: AtomicU64::new(get_monotonic_micros()),
            threshold,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Record that bytes were received (or a PING echo matched)
    pub fn register_receive(&self) {
        self.last_receive
            .store(get_monotonic_micros(), Ordering::Relaxed);
    }

    /// Time since the last registered receive
    pub fn time_since_last_receive(&self) -> Duration {
        let last_us = self.last_receive.load(Ordering::Relaxed);
        let now_us = get_monotonic_micros();
        Duration::from_micros(now_us.saturating_sub(last_us))
    }

    /// True once the silence exceeds the threshold
    pub fn needs_probe(&self) -> bool {
        self.time_since_last_receive() > self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_monotonic_time_always_increases() {
        let t1 = get_monotonic_micros();
        thread::sleep(Duration::from_millis(5));
        let t2 = get_monotonic_micros();
        assert!(t2 > t1);
    }

    #[test]
    fn test_fresh_monitor_needs_no_probe() {
        let monitor = LivenessMonitor::new(Duration::from_secs(1));
        assert!(!monitor.needs_probe());
    }

    #[test]
    fn test_probe_needed_after_silence() {
        let monitor = LivenessMonitor::new(Duration::from_millis(30));
        thread::sleep(Duration::from_millis(60));
        assert!(monitor.needs_probe());
    }

    #[test]
    fn test_receive_resets_timer() {
        let monitor = LivenessMonitor::new(Duration::from_millis(100));
        thread::sleep(Duration::from_millis(60));
        monitor.register_receive();
        thread::sleep(Duration::from_millis(60));
        assert!(!monitor.needs_probe());
        assert!(monitor.time_since_last_receive() >= Duration::from_millis(60));
    }
}

use tokio::time::Duration;

use crate::device::constants::{BACKOFF_FACTOR, DISCOVERY_BASE_DELAY, DISCOVERY_MAX_DELAY, DISCOVERY_MAX_EXPONENT, OUTER_INITIAL_DELAY, OUTER_MAX_DELAY};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryBudget {
    pub consecutive_failures: u32,
    pub base_delay: Duration,
}

impl RetryBudget {
    pub fn new() -> Self {
        RetryBudget {
            consecutive_failures: 0,
            base_delay: Duration::from_millis(DISCOVERY_BASE_DELAY),
        }
    }

    pub fn delay(&self) -> Duration {
        let exponent = self.consecutive_failures.min(DISCOVERY_MAX_EXPONENT as u32) as i32;
        let delay = self.base_delay.as_secs_f64() * BACKOFF_FACTOR.powi(exponent);
        Duration::from_secs_f64(delay.min(Duration::from_millis(DISCOVERY_MAX_DELAY).as_secs_f64()))
    }

    pub fn record_failure(&mut self) -> Duration {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.delay()
    }

    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        RetryBudget::new()
    }
}

// faults outside discovery
#[derive(Debug, Clone, PartialEq)]
pub struct OuterBackoff {
    delay: Duration,
}

impl OuterBackoff {
    pub fn new() -> Self {
        OuterBackoff { delay: Duration::from_millis(OUTER_INITIAL_DELAY) }
    }

    pub fn current(&self) -> Duration {
        self.delay
    }

    pub fn record_fault(&mut self) -> Duration {
        let next = self.delay.mul_f64(BACKOFF_FACTOR);
        self.delay = next.min(Duration::from_millis(OUTER_MAX_DELAY));
        self.delay
    }

    pub fn reset(&mut self) {
        self.delay = Duration::from_millis(OUTER_INITIAL_DELAY);
    }
}

impl Default for OuterBackoff {
    fn default() -> Self {
        OuterBackoff::new()
    }
}

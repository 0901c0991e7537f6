//! Jittered exponential backoff between connection attempts

use rand::Rng;
use std::time::Duration;

/// Shape of the retry schedule
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Upper bound for any single delay, before jitter
    pub max_delay: Duration,
    /// Growth factor per attempt
    pub multiplier: f64,
    /// Attempts allowed before giving up (None = unlimited)
    pub max_retries: Option<usize>,
    /// Fraction of the delay randomised around its nominal value (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_retries: Some(10),
            jitter_factor: 0.1,
        }
    }
}

impl BackoffConfig {
    /// Schedule used while waiting for the game server at startup
    ///
    /// A headless server can take minutes to load a large save, so this
    /// never gives up.
    pub fn startup() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_retries: None,
            jitter_factor: 0.2,
        }
    }

    /// Millisecond-scale schedule for tests
    pub fn fast() -> Self {
        Self {
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(50),
            multiplier: 2.0,
            max_retries: Some(5),
            jitter_factor: 0.0,
        }
    }
}

/// Retry schedule state
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    config: BackoffConfig,
    attempt: usize,
}

impl ExponentialBackoff {
    pub fn new() -> Self {
        Self::with_config(BackoffConfig::default())
    }

    pub fn with_config(config: BackoffConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Delay before the next attempt, or None once retries are exhausted
    pub fn next_delay(&mut self) -> Option<Duration> {
        if !self.can_retry() {
            return None;
        }
        let delay = self.jittered(self.nominal_delay(self.attempt));
        self.attempt += 1;
        Some(delay)
    }

    /// Un-jittered delay for a given attempt number
    pub fn nominal_delay(&self, attempt: usize) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.config.initial_delay.as_secs_f64() * self.config.multiplier.powi(exponent);
        let max = self.config.max_delay.as_secs_f64();
        if secs.is_finite() && secs < max {
            Duration::from_secs_f64(secs)
        } else {
            self.config.max_delay
        }
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.config.jitter_factor <= 0.0 {
            return delay;
        }
        let spread = self.config.jitter_factor;
        let factor = 1.0 + rand::thread_rng().gen_range(-spread / 2.0..=spread / 2.0);
        Duration::from_secs_f64(delay.as_secs_f64() * factor)
    }

    /// Start the schedule over after a success
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt_number(&self) -> usize {
        self.attempt
    }

    pub fn can_retry(&self) -> bool {
        self.config
            .max_retries
            .map_or(true, |max| self.attempt < max)
    }

    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new()
    }
}

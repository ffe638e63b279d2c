//! Retry policy owned by the transport.
//!
//! Resolvers never retry on their own; [`crate::http_client::ReqwestHttpClient`]
//! consults a [`RetryConfig`] after every attempt.

use std::time::Duration;

use crate::http_client::HttpError;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    Fixed(Duration),
    /// `base * factor^attempt`, capped at `max`. With `jitter` the delay is
    /// drawn from `[delay / 2, delay]`.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(2),
            jitter: true,
        }
    }
}

impl Backoff {
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(delay) => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let seconds = (base.as_secs_f64() * factor.powi(exponent)).min(max.as_secs_f64());
                let capped = Duration::from_secs_f64(seconds.max(0.0));
                if !jitter {
                    return capped;
                }

                let full_ms = u64::try_from(capped.as_millis()).unwrap_or(u64::MAX);
                let half_ms = full_ms / 2;
                Duration::from_millis(half_ms + fastrand::u64(0..=full_ms - half_ms))
            }
        }
    }
}

/// Which failures the transport retries and how often.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    max_retries: u32,
    backoff: Backoff,
    retry_on_status: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Backoff::default(),
            retry_on_status: vec![408, 429, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, backoff: Backoff) -> Self {
        Self {
            max_retries,
            backoff,
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self::new(0, Backoff::Fixed(Duration::ZERO))
    }

    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.max_retries > 0 && self.retry_on_status.contains(&status)
    }

    pub fn should_retry_error(&self, error: &HttpError) -> bool {
        self.max_retries > 0 && error.retryable()
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}

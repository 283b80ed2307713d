// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use dd_trace::utils::lock_unpoisoned;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::constants::window::ONE_SECOND;

/// A fixed window rate limiter
///
/// Each window hands out `max(1, floor(max_per_second))` tokens. The window lasts
/// `tokens / max_per_second` seconds, which is exactly one second for integral limits.
/// A new window starts with the first request made after the previous one expired.
///
/// Clones share their state.
#[derive(Clone)]
pub struct RateLimiter {
    max_per_second: f64,
    policy: LimitPolicy,
    inner: Arc<Mutex<RateLimiterState>>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum LimitPolicy {
    AllowAll,
    DenyAll,
    Window { allowance: u64, window: Duration },
}

#[derive(Default)]
struct RateLimiterState {
    current_window_start: Option<Instant>,

    /// Number of requests allowed in the current window
    tokens_allowed: u64,

    /// Total number of requests in the current window
    tokens_total: u64,

    /// Rate from the previous window for calculating effective rate
    prev_window_rate: Option<f64>,
}

impl RateLimiterState {
    fn current_window_rate(&self) -> f64 {
        // No requests seen, effectively 100% sample rate
        if self.tokens_total == 0 {
            return 1.0;
        }
        self.tokens_allowed as f64 / self.tokens_total as f64
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_per_second", &self.max_per_second)
            .field("effective_rate", &self.effective_rate())
            .finish()
    }
}

impl RateLimiter {
    /// Creates a new RateLimiter
    ///
    /// * max_per_second > 0: max number of requests to allow per second
    /// * max_per_second == 0: disallow all requests
    /// * max_per_second < 0 or not finite: allow all requests
    pub fn new(max_per_second: f64) -> Self {
        let policy = if !max_per_second.is_finite() || max_per_second < 0.0 {
            LimitPolicy::AllowAll
        } else if max_per_second == 0.0 {
            LimitPolicy::DenyAll
        } else {
            // float to int casts saturate
            let allowance = (max_per_second.floor() as u64).max(1);
            let window = Duration::try_from_secs_f64(allowance as f64 / max_per_second)
                .unwrap_or(Duration::MAX);
            LimitPolicy::Window { allowance, window }
        };

        RateLimiter {
            max_per_second,
            policy,
            inner: Arc::new(Mutex::new(RateLimiterState::default())),
        }
    }

    pub fn max_per_second(&self) -> f64 {
        self.max_per_second
    }

    /// Checks if the current request is allowed and consumes a token if it is.
    pub fn is_allowed(&self) -> bool {
        self.is_allowed_at(Instant::now())
    }

    /// Same as [`RateLimiter::is_allowed`] with an explicit clock reading
    pub fn is_allowed_at(&self, now: Instant) -> bool {
        let (allowance, window) = match self.policy {
            LimitPolicy::AllowAll => return true,
            LimitPolicy::DenyAll => return false,
            LimitPolicy::Window { allowance, window } => (allowance, window),
        };

        let mut state = lock_unpoisoned(&self.inner);
        match state.current_window_start {
            Some(start) if now.saturating_duration_since(start) < window => {}
            Some(_) => {
                state.prev_window_rate = Some(state.current_window_rate());
                state.tokens_allowed = 0;
                state.tokens_total = 0;
                state.current_window_start = Some(now);
            }
            None => state.current_window_start = Some(now),
        }

        state.tokens_total += 1;
        if state.tokens_allowed < allowance {
            state.tokens_allowed += 1;
            true
        } else {
            false
        }
    }

    /// Returns the effective sample rate of this rate limiter (between 0.0 and 1.0),
    /// averaged over the current and the previous window
    pub fn effective_rate(&self) -> f64 {
        match self.policy {
            LimitPolicy::AllowAll => 1.0,
            LimitPolicy::DenyAll => 0.0,
            LimitPolicy::Window { .. } => {
                let state = lock_unpoisoned(&self.inner);
                match state.prev_window_rate {
                    Some(prev_rate) => (state.current_window_rate() + prev_rate) / 2.0,
                    None => state.current_window_rate(),
                }
            }
        }
    }
}

impl Default for RateLimiter {
    /// A limiter of 100 requests per second
    fn default() -> Self {
        RateLimiter::new(100.0)
    }
}

// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::cell::RefCell;

use crate::constants::rate::{DEFAULT_SAMPLE_RATE, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};

thread_local! {
    static DRAWS: RefCell<SmallRng> = RefCell::new(SmallRng::from_entropy());
}

/// Probabilistic keep/drop decision: a draw is kept with probability
/// `sample_rate`.
///
/// Draws are independent of any span or trace identifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSampler {
    sample_rate: f64,
}

impl RateSampler {
    /// Rates outside of `[0, 1]` are clamped, NaN drops everything
    pub fn new(sample_rate: f64) -> Self {
        let sample_rate = if sample_rate.is_nan() {
            MIN_SAMPLE_RATE
        } else {
            sample_rate.clamp(MIN_SAMPLE_RATE, MAX_SAMPLE_RATE)
        };
        RateSampler { sample_rate }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn is_sampled(&self) -> bool {
        if let Some(decision) = self.certain() {
            return decision;
        }
        DRAWS
            .try_with(|rng| self.is_sampled_with(&mut *rng.borrow_mut()))
            .unwrap_or_else(|_| self.is_sampled_with(&mut rand::thread_rng()))
    }

    /// Same as [`RateSampler::is_sampled`], drawing from `rng`
    pub fn is_sampled_with<R: Rng>(&self, rng: &mut R) -> bool {
        match self.certain() {
            Some(decision) => decision,
            None => rng.gen::<f64>() < self.sample_rate,
        }
    }

    fn certain(&self) -> Option<bool> {
        if self.sample_rate >= MAX_SAMPLE_RATE {
            Some(true)
        } else if self.sample_rate <= MIN_SAMPLE_RATE {
            Some(false)
        } else {
            None
        }
    }
}

impl Default for RateSampler {
    fn default() -> Self {
        RateSampler::new(DEFAULT_SAMPLE_RATE)
    }
}

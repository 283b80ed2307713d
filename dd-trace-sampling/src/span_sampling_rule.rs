// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Instant;

use dd_trace::SpanSamplingRuleConfig;

use crate::constants::pattern::NO_RULE;
use crate::glob_matcher::GlobMatcher;
use crate::rate_limiter::RateLimiter;
use crate::rate_sampler::RateSampler;
use crate::span_sampler::SpanSamplingDecision;

/// One span sampling rule: glob patterns on the service and the name of a span,
/// a sample rate and an optional per second ceiling.
#[derive(Debug, Clone)]
pub struct SpanSamplingRule {
    service_matcher: Option<GlobMatcher>,
    name_matcher: Option<GlobMatcher>,
    sampler: RateSampler,
    max_per_second: Option<f64>,
    limiter: Option<RateLimiter>,
}

impl SpanSamplingRule {
    /// An absent or empty pattern matches every span. A limiter is only created
    /// for a finite `max_per_second`.
    pub fn new(
        service: Option<&str>,
        name: Option<&str>,
        sample_rate: f64,
        max_per_second: Option<f64>,
    ) -> Self {
        let matcher = |pattern: Option<&str>| {
            pattern
                .filter(|pattern| *pattern != NO_RULE)
                .map(GlobMatcher::new)
        };
        SpanSamplingRule {
            service_matcher: matcher(service),
            name_matcher: matcher(name),
            sampler: RateSampler::new(sample_rate),
            max_per_second,
            limiter: max_per_second
                .filter(|limit| limit.is_finite())
                .map(RateLimiter::new),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sampler.sample_rate()
    }

    pub fn max_per_second(&self) -> Option<f64> {
        self.max_per_second
    }

    pub fn service_pattern(&self) -> Option<&str> {
        self.service_matcher.as_ref().map(GlobMatcher::pattern)
    }

    pub fn name_pattern(&self) -> Option<&str> {
        self.name_matcher.as_ref().map(GlobMatcher::pattern)
    }

    /// Both patterns must match
    pub fn matches(&self, service: &str, name: &str) -> bool {
        let matches = |matcher: &Option<GlobMatcher>, subject: &str| {
            matcher
                .as_ref()
                .map_or(true, |matcher| matcher.matches(subject))
        };
        matches(&self.service_matcher, service) && matches(&self.name_matcher, name)
    }

    /// Draws against the sample rate, then consumes a limiter token
    pub fn sample(&self) -> bool {
        self.sample_at(Instant::now())
    }

    pub fn sample_at(&self, now: Instant) -> bool {
        if !self.sampler.is_sampled() {
            return false;
        }
        self.limiter
            .as_ref()
            .map_or(true, |limiter| limiter.is_allowed_at(now))
    }

    /// The provenance attached to the spans retained by this rule
    pub fn decision(&self) -> SpanSamplingDecision {
        SpanSamplingDecision {
            sample_rate: self.sample_rate(),
            max_per_second: self.max_per_second,
        }
    }
}

impl From<&SpanSamplingRuleConfig> for SpanSamplingRule {
    fn from(config: &SpanSamplingRuleConfig) -> Self {
        SpanSamplingRule::new(
            config.service.as_deref(),
            config.name.as_deref(),
            config.sample_rate,
            config.max_per_second,
        )
    }
}

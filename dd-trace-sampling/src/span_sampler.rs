// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Instant;

use dd_trace::constants::{
    SPAN_SAMPLING_MAX_PER_SECOND_TAG_KEY, SPAN_SAMPLING_MECHANISM_TAG_KEY,
    SPAN_SAMPLING_RULE_RATE_TAG_KEY,
};
use dd_trace::sampling::SPAN_SAMPLING_MECHANISM;
use dd_trace::{catch_panic, dd_debug, Config, SpanSamplingRuleConfig};

use crate::span_sampling_rule::SpanSamplingRule;
use crate::types::{SpanLike, TraceSegment};

/// Provenance of a span retained by a span sampling rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanSamplingDecision {
    pub sample_rate: f64,
    pub max_per_second: Option<f64>,
}

impl SpanSamplingDecision {
    /// Numeric tags set on a retained span
    pub fn tags(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            Some((
                SPAN_SAMPLING_MECHANISM_TAG_KEY,
                f64::from(SPAN_SAMPLING_MECHANISM),
            )),
            Some((SPAN_SAMPLING_RULE_RATE_TAG_KEY, self.sample_rate)),
            self.max_per_second
                .map(|limit| (SPAN_SAMPLING_MAX_PER_SECOND_TAG_KEY, limit)),
        ]
        .into_iter()
        .flatten()
    }
}

/// Decides which spans of a dropped trace are individually retained.
///
/// Rules are evaluated in order and the first rule matching the service and the name
/// of a span decides for it.
#[derive(Debug, Clone, Default)]
pub struct SpanSampler {
    rules: Vec<SpanSamplingRule>,
}

impl SpanSampler {
    pub fn new(rules: Vec<SpanSamplingRule>) -> Self {
        SpanSampler { rules }
    }

    pub fn from_rule_configs(configs: &[SpanSamplingRuleConfig]) -> Self {
        let rules: Vec<SpanSamplingRule> = configs.iter().map(SpanSamplingRule::from).collect();
        dd_debug!("SpanSampler: loaded {} span sampling rules", rules.len());
        SpanSampler::new(rules)
    }

    pub fn from_config(config: &Config) -> Self {
        Self::from_rule_configs(config.span_sampling_rules())
    }

    pub fn rules(&self) -> &[SpanSamplingRule] {
        &self.rules
    }

    /// Returns the first rule matching the service and the name
    pub fn find_rule(&self, service: &str, name: &str) -> Option<&SpanSamplingRule> {
        self.rules.iter().find(|rule| rule.matches(service, name))
    }

    /// Runs span sampling on the started spans of the trace, and returns how many
    /// spans were retained.
    ///
    /// Traces already kept are skipped entirely.
    pub fn sample<T: TraceSegment>(&self, trace: &mut T) -> usize {
        catch_panic!(self.sample_at(trace, Instant::now()), 0)
    }

    pub fn sample_at<T: TraceSegment>(&self, trace: &mut T, now: Instant) -> usize {
        if trace
            .sampling_priority()
            .is_some_and(|priority| priority.is_keep())
        {
            return 0;
        }
        if self.rules.is_empty() {
            return 0;
        }

        let mut retained = 0;
        for span in trace.started_spans_mut() {
            let decision = {
                let service = span.service();
                let name = span.name();
                match self.find_rule(&service, &name) {
                    Some(rule) if rule.sample_at(now) => Some(rule.decision()),
                    _ => None,
                }
            };
            if let Some(decision) = decision {
                span.set_span_sampling(decision);
                retained += 1;
            }
        }
        retained
    }
}

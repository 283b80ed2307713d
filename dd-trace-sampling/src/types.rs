// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Traits through which the span sampler reads and marks the spans of a trace.
//!
//! The sampler is independent of any span representation: the tracer implements
//! [`TraceSegment`] for its trace and [`SpanLike`] for its spans.

use std::borrow::Cow;

use dd_trace::constants::SERVICE_TAG_KEYS;
use dd_trace::sampling::SamplingPriority;

use crate::span_sampler::SpanSamplingDecision;

/// A span the span sampler can evaluate and mark as retained.
pub trait SpanLike {
    /// Returns the operation name of the span.
    fn name(&self) -> Cow<'_, str>;

    /// Returns the value of a string tag of the span, if set.
    fn tag(&self, key: &str) -> Option<Cow<'_, str>>;

    /// Returns the service configured on the tracer that created the span.
    fn default_service(&self) -> Cow<'_, str>;

    /// Records that the span is retained by a span sampling rule.
    ///
    /// Implementations usually store the decision on the span context and set the
    /// tags of [`SpanSamplingDecision::tags`] when the span is exported.
    fn set_span_sampling(&mut self, decision: SpanSamplingDecision);

    /// Resolves the service of the span: the `service` tag, else the `service.name`
    /// tag, else the tracer default service. Empty tags are ignored.
    fn service(&self) -> Cow<'_, str> {
        SERVICE_TAG_KEYS
            .iter()
            .find_map(|key| self.tag(key).filter(|service| !service.is_empty()))
            .unwrap_or_else(|| self.default_service())
    }
}

/// The part of a trace handled by one span sampling pass.
pub trait TraceSegment {
    /// The type of span that implements `SpanLike`.
    type Span: SpanLike;

    /// The type of iterator over the started spans of the trace.
    type StartedSpans<'a>: Iterator<Item = &'a mut Self::Span>
    where
        Self: 'a;

    /// Returns the trace sampling priority, if a decision was already made.
    fn sampling_priority(&self) -> Option<SamplingPriority>;

    /// Returns the spans started so far in the trace.
    fn started_spans_mut(&mut self) -> Self::StartedSpans<'_>;
}

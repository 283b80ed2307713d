// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::{borrow::Cow, hint::black_box, time::Duration};

use criterion::{criterion_group, criterion_main, Criterion, PlottingBackend};
use dd_trace::sampling::SamplingPriority;
use dd_trace_sampling::{
    GlobMatcher, SpanLike, SpanSampler, SpanSamplingDecision, SpanSamplingRule, TraceSegment,
};

struct BenchSpan {
    name: &'static str,
    service: &'static str,
    retained: bool,
}

impl SpanLike for BenchSpan {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.name)
    }

    fn tag(&self, key: &str) -> Option<Cow<'_, str>> {
        (key == "service").then_some(Cow::Borrowed(self.service))
    }

    fn default_service(&self) -> Cow<'_, str> {
        Cow::Borrowed("bench")
    }

    fn set_span_sampling(&mut self, _decision: SpanSamplingDecision) {
        self.retained = true;
    }
}

struct BenchTrace(Vec<BenchSpan>);

impl TraceSegment for BenchTrace {
    type Span = BenchSpan;
    type StartedSpans<'a> = std::slice::IterMut<'a, BenchSpan>;

    fn sampling_priority(&self) -> Option<SamplingPriority> {
        None
    }

    fn started_spans_mut(&mut self) -> Self::StartedSpans<'_> {
        self.0.iter_mut()
    }
}

fn benchmark(c: &mut Criterion) {
    let sampler = SpanSampler::new(vec![
        SpanSamplingRule::new(Some("db-*"), Some("query"), 0.5, Some(1000.0)),
        SpanSamplingRule::new(Some("web-*"), Some("http.*"), 1.0, Some(100.0)),
    ]);
    c.bench_function("span_sampler/sample_trace", |b| {
        b.iter(|| {
            let mut trace = BenchTrace(vec![
                BenchSpan {
                    name: "http.request",
                    service: "web-frontend",
                    retained: false,
                },
                BenchSpan {
                    name: "render",
                    service: "web-frontend",
                    retained: false,
                },
            ]);
            black_box(sampler.sample(&mut trace))
        })
    });

    let matcher = GlobMatcher::new("web-*-api?");
    c.bench_function("glob_matcher/cached", |b| {
        b.iter(|| black_box(matcher.matches(black_box("web-billing-api2"))))
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(1))
        .warm_up_time(Duration::from_millis(100))
        .plotting_backend(PlottingBackend::None);
    targets = benchmark
);
criterion_main!(benches);

// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Span sampling: spans of traces that are not kept can still be retained
//! individually when they match a span sampling rule.
//!
//! ```
//! use dd_trace_sampling::{SpanSampler, SpanSamplingRule};
//!
//! let sampler = SpanSampler::new(vec![SpanSamplingRule::new(
//!     Some("web-*"),
//!     None,
//!     1.0,
//!     Some(100.0),
//! )]);
//! assert!(sampler.find_rule("web-frontend", "http.request").is_some());
//! ```

pub mod constants;
pub mod glob_matcher;
pub mod rate_limiter;
pub mod rate_sampler;
pub mod span_sampler;
pub mod span_sampling_rule;
pub mod types;

pub use glob_matcher::GlobMatcher;
pub use rate_limiter::RateLimiter;
pub use rate_sampler::RateSampler;
pub use span_sampler::{SpanSampler, SpanSamplingDecision};
pub use span_sampling_rule::SpanSamplingRule;
pub use types::{SpanLike, TraceSegment};

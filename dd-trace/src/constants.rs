// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Set on spans retained by a span sampling rule, value is the mechanism (8)
pub const SPAN_SAMPLING_MECHANISM_TAG_KEY: &str = "_dd.span_sampling.mechanism";

pub const SPAN_SAMPLING_RULE_RATE_TAG_KEY: &str = "_dd.span_sampling.rule_rate";

pub const SPAN_SAMPLING_MAX_PER_SECOND_TAG_KEY: &str = "_dd.span_sampling.max_per_second";

/// Span tags consulted, in order, to resolve the service of a span
pub const SERVICE_TAG_KEYS: [&str; 2] = ["service", "service.name"];

pub const TRACER_LANGUAGE: &str = "rust";

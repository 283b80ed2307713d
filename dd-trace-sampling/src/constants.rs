// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Shared constants for the dd-trace-sampling crate

/// Sampling rate limits
pub mod rate {
    /// Default sampling rate of a span sampling rule
    pub const DEFAULT_SAMPLE_RATE: f64 = 1.0;
    /// Maximum sampling rate
    pub const MAX_SAMPLE_RATE: f64 = 1.0;
    /// Minimum sampling rate
    pub const MIN_SAMPLE_RATE: f64 = 0.0;
}

/// Pattern matching constants
pub mod pattern {
    /// An empty pattern is the same as no pattern, it matches everything
    pub const NO_RULE: &str = "";
}

/// Rate limiter window
pub mod window {
    use std::time::Duration;

    /// Length of the window of an integral `max_per_second` limit
    pub const ONE_SECOND: Duration = Duration::from_secs(1);
}

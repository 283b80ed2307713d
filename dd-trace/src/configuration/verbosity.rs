// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::{convert::Infallible, fmt, str::FromStr};

/// How much optional telemetry is collected. Ordered from least to most verbose.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TelemetryVerbosity {
    Off = 0,
    Mandatory = 1,
    #[default]
    Information = 2,
    Debug = 3,
}

impl TelemetryVerbosity {
    /// Case insensitive. Unknown values map to [`TelemetryVerbosity::Mandatory`].
    pub fn parse_verbosity(verbosity: &str) -> Self {
        let verbosity = verbosity.trim();
        if verbosity.eq_ignore_ascii_case("off") {
            Self::Off
        } else if verbosity.eq_ignore_ascii_case("mandatory") {
            Self::Mandatory
        } else if verbosity.eq_ignore_ascii_case("information") {
            Self::Information
        } else if verbosity.eq_ignore_ascii_case("debug") {
            Self::Debug
        } else {
            Self::Mandatory
        }
    }

    pub fn is_debug_allowed(self) -> bool {
        self >= Self::Debug
    }
}

impl FromStr for TelemetryVerbosity {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_verbosity(s))
    }
}

impl fmt::Display for TelemetryVerbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verbosity = match self {
            Self::Off => "OFF",
            Self::Mandatory => "MANDATORY",
            Self::Information => "INFORMATION",
            Self::Debug => "DEBUG",
        };
        write!(f, "{verbosity}")
    }
}

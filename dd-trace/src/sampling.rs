// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Trace level sampling vocabulary. Span sampling only runs for traces whose
//! priority is not already a keep.

use std::{fmt, str::FromStr};

use crate::Error;

/// Value of the `_dd.span_sampling.mechanism` tag on spans kept by a span
/// sampling rule
pub const SPAN_SAMPLING_MECHANISM: u8 = 8;

/// Sampling priority of a trace, as propagated between services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum SamplingPriority {
    UserReject = -1,
    AutoReject = 0,
    AutoKeep = 1,
    UserKeep = 2,
}

impl SamplingPriority {
    pub fn as_i8(self) -> i8 {
        self as i8
    }

    pub fn is_keep(self) -> bool {
        matches!(self, SamplingPriority::AutoKeep | SamplingPriority::UserKeep)
    }
}

impl TryFrom<i8> for SamplingPriority {
    type Error = Error;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(SamplingPriority::UserReject),
            0 => Ok(SamplingPriority::AutoReject),
            1 => Ok(SamplingPriority::AutoKeep),
            2 => Ok(SamplingPriority::UserKeep),
            other => Err(Error::msg(format!("unknown sampling priority {other}"))),
        }
    }
}

impl FromStr for SamplingPriority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<i8>()
            .map_err(|_| Error::msg(format!("invalid sampling priority {s:?}")))?;
        SamplingPriority::try_from(value)
    }
}

impl fmt::Display for SamplingPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::ops::Deref;
use std::str::FromStr;

/// Configuration for a single span sampling rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpanSamplingRuleConfig {
    /// Optional service name glob pattern
    #[serde(default)]
    pub service: Option<String>,

    /// Optional span name glob pattern
    #[serde(default)]
    pub name: Option<String>,

    /// The sample rate to apply (0.0-1.0)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,

    /// Maximum number of spans retained per second by this rule
    #[serde(default)]
    pub max_per_second: Option<f64>,
}

impl Default for SpanSamplingRuleConfig {
    fn default() -> Self {
        Self {
            service: None,
            name: None,
            sample_rate: default_sample_rate(),
            max_per_second: None,
        }
    }
}

impl Display for SpanSamplingRuleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", serde_json::json!(self))
    }
}

fn default_sample_rate() -> f64 {
    1.0
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedSpanSamplingRules {
    pub rules: Vec<SpanSamplingRuleConfig>,
}

impl Deref for ParsedSpanSamplingRules {
    type Target = [SpanSamplingRuleConfig];

    fn deref(&self) -> &Self::Target {
        &self.rules
    }
}

impl From<ParsedSpanSamplingRules> for Vec<SpanSamplingRuleConfig> {
    fn from(parsed: ParsedSpanSamplingRules) -> Self {
        parsed.rules
    }
}

impl FromStr for ParsedSpanSamplingRules {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(ParsedSpanSamplingRules::default());
        }
        // DD_SPAN_SAMPLING_RULES is expected to be a JSON array of SpanSamplingRuleConfig objects.
        let rules: Vec<SpanSamplingRuleConfig> = serde_json::from_str(s)?;
        Ok(ParsedSpanSamplingRules { rules })
    }
}

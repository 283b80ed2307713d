// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Payloads handed to the sender

use std::fmt;

use serde::Serialize;

use crate::metrics::Point;

pub const DEFAULT_NAMESPACE: &str = "tracers";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MetricType {
    #[serde(rename = "COUNT")]
    Count,
}

/// Points of one metric, and one tag for tagged metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Series {
    pub name: String,
    pub common: bool,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    pub points: Vec<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsPayload {
    pub namespace: String,
    pub series: Vec<Series>,
}

impl MetricsPayload {
    /// No payload is produced for an empty series
    pub fn from_series(namespace: impl Into<String>, series: Vec<Series>) -> Option<Self> {
        if series.is_empty() {
            return None;
        }
        Some(MetricsPayload {
            namespace: namespace.into(),
            series,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Warn,
    Error,
}

impl From<dd_trace::log::Level> for LogLevel {
    fn from(level: dd_trace::log::Level) -> Self {
        use dd_trace::log::Level;
        match level {
            Level::Error => LogLevel::Error,
            Level::Warn => LogLevel::Warn,
            Level::Info | Level::Debug => LogLevel::Debug,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        write!(f, "{level}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LogEntry {
    pub message: String,
    pub level: LogLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

/// Kind of payload sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RequestType {
    #[serde(rename = "generate-metrics")]
    Metrics,
    #[serde(rename = "logs")]
    Logs,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Metrics => "generate-metrics",
            RequestType::Logs => "logs",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let request_type = match self {
            RequestType::Metrics => "metrics",
            RequestType::Logs => "logs",
        };
        write!(f, "{request_type}")
    }
}

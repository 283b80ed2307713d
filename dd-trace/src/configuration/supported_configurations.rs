// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Every configuration key read from the configuration sources
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedConfigurations {
    DD_SERVICE,
    DD_ENV,
    DD_VERSION,
    DD_LOG_LEVEL,
    DD_INSTRUMENTATION_TELEMETRY_ENABLED,
    DD_INSTRUMENTATION_TELEMETRY_LOG_COLLECTION_ENABLED,
    TELEMETRY_DEBUG_ENABLED,
    DD_TELEMETRY_HEARTBEAT_INTERVAL,
    DD_IAST_TELEMETRY_VERBOSITY,
    DD_SPAN_SAMPLING_RULES,
}

impl SupportedConfigurations {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DD_SERVICE => "DD_SERVICE",
            Self::DD_ENV => "DD_ENV",
            Self::DD_VERSION => "DD_VERSION",
            Self::DD_LOG_LEVEL => "DD_LOG_LEVEL",
            Self::DD_INSTRUMENTATION_TELEMETRY_ENABLED => "DD_INSTRUMENTATION_TELEMETRY_ENABLED",
            Self::DD_INSTRUMENTATION_TELEMETRY_LOG_COLLECTION_ENABLED => {
                "DD_INSTRUMENTATION_TELEMETRY_LOG_COLLECTION_ENABLED"
            }
            Self::TELEMETRY_DEBUG_ENABLED => "TELEMETRY_DEBUG_ENABLED",
            Self::DD_TELEMETRY_HEARTBEAT_INTERVAL => "DD_TELEMETRY_HEARTBEAT_INTERVAL",
            Self::DD_IAST_TELEMETRY_VERBOSITY => "DD_IAST_TELEMETRY_VERBOSITY",
            Self::DD_SPAN_SAMPLING_RULES => "DD_SPAN_SAMPLING_RULES",
        }
    }
}

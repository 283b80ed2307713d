// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Built-in metrics

use crate::metrics::{HandlerKind, MetricDefinition, MetricScope};
use crate::registry::MetricId;

/// What the tag of a tagged metric describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricTagKind {
    SourceType,
    VulnerabilityType,
}

impl MetricTagKind {
    pub fn name(&self) -> &'static str {
        match self {
            MetricTagKind::SourceType => "source_type",
            MetricTagKind::VulnerabilityType => "vulnerability_type",
        }
    }
}

macro_rules! telemetry_metrics {
    ($($variant:ident => ($name:expr, $common:expr, $scope:ident, $kind:ident),)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum TelemetryMetric {
            $(
                $variant,
            )*
        }

        impl TelemetryMetric {
            /// Every built-in metric, in registration order
            pub const ALL: &'static [TelemetryMetric] = &[$(TelemetryMetric::$variant,)*];

            fn info(&self) -> (&'static str, bool, MetricScope, HandlerKind) {
                match self {
                    $(
                        TelemetryMetric::$variant => (
                            $name,
                            $common,
                            MetricScope::$scope,
                            HandlerKind::$kind,
                        ),
                    )*
                }
            }
        }
    };
}

telemetry_metrics!(
    InstrumentedPropagation => ("instrumented.propagation", true, Single, Conflated),
    InstrumentedSource => ("instrumented.source", true, Tagged, Conflated),
    InstrumentedSink => ("instrumented.sink", true, Tagged, Conflated),
    InstrumentationTime => ("instrumentation.time", true, Single, Conflated),
    ExecutedPropagation => ("executed.propagation", true, Single, Conflated),
    ExecutedSource => ("executed.source", true, Tagged, Conflated),
    ExecutedSink => ("executed.sink", true, Tagged, Conflated),
    ExecutedTainted => ("executed.tainted", true, Single, Conflated),
    ExecutionTime => ("execution.time", true, Single, Conflated),
    RequestTainted => ("request.tainted", true, Single, Aggregated),
);

impl TelemetryMetric {
    pub fn name(&self) -> &'static str {
        self.info().0
    }

    pub fn definition(&self) -> MetricDefinition {
        let (name, common, scope, kind) = self.info();
        MetricDefinition {
            name: name.to_string(),
            common,
            scope,
            kind,
        }
    }

    /// Handle of the metric in a registry created by
    /// [`MetricRegistry::with_catalog`](crate::registry::MetricRegistry::with_catalog)
    pub fn id(&self) -> MetricId {
        MetricId(*self as usize)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|metric| metric.name() == name)
    }
}

/// Metric counting executions of sinks or sources, depending on the tag kind
pub fn executed_metric(tag_kind: MetricTagKind) -> TelemetryMetric {
    match tag_kind {
        MetricTagKind::VulnerabilityType => TelemetryMetric::ExecutedSink,
        MetricTagKind::SourceType => TelemetryMetric::ExecutedSource,
    }
}

/// Metric counting instrumented sinks or sources, depending on the tag kind
pub fn instrumented_metric(tag_kind: MetricTagKind) -> TelemetryMetric {
    match tag_kind {
        MetricTagKind::VulnerabilityType => TelemetryMetric::InstrumentedSink,
        MetricTagKind::SourceType => TelemetryMetric::InstrumentedSource,
    }
}

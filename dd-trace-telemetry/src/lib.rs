// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Telemetry of the library itself: counters and distributions recorded by
//! instrumentation code, and the library's own warnings and errors, drained
//! periodically and handed to a [`TelemetrySender`].

pub mod catalog;
pub mod collector;
pub mod log_collector;
pub mod metrics;
pub mod payload;
pub mod plugins;
pub mod registry;
pub mod sender;
pub mod telemetry;
pub mod worker;

pub use catalog::{MetricTagKind, TelemetryMetric};
pub use collector::TelemetryCollector;
pub use log_collector::LogDeduplicator;
pub use metrics::{HandlerKind, MetricDefinition, MetricScope, Point};
pub use payload::{LogEntry, LogLevel, MetricsPayload, RequestType, Series};
pub use plugins::{LogsPlugin, MetricSource, MetricsPlugin, PayloadProvider};
pub use registry::{MetricId, MetricRef, MetricRegistry};
pub use sender::{ApplicationMetadata, HostMetadata, TelemetrySender};
pub use telemetry::Telemetry;
pub use worker::{TelemetryWorker, TelemetryWorkerHandle};

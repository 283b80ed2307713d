// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Producers of the payloads sent by the worker

use std::sync::{Arc, Mutex};

use dd_trace::dd_log_local;
use dd_trace::log::Level;
use dd_trace::utils::lock_unpoisoned;

use crate::collector::TelemetryCollector;
use crate::log_collector::LogDeduplicator;
use crate::payload::{MetricsPayload, RequestType, Series, DEFAULT_NAMESPACE};

/// Called by the worker on every interval. Returning `None` skips the send.
pub trait PayloadProvider: Send + Sync {
    fn request_type(&self) -> RequestType;

    fn payload(&self) -> Option<serde_json::Value>;
}

/// Anything able to hand over the series recorded since its last drain
pub trait MetricSource: Send + Sync {
    fn drain_series(&self) -> Vec<Series>;
}

impl MetricSource for TelemetryCollector {
    fn drain_series(&self) -> Vec<Series> {
        self.drain()
    }
}

impl<F> MetricSource for F
where
    F: Fn() -> Vec<Series> + Send + Sync,
{
    fn drain_series(&self) -> Vec<Series> {
        self()
    }
}

fn to_json<T: serde::Serialize>(
    request_type: RequestType,
    payload: &T,
) -> Option<serde_json::Value> {
    match serde_json::to_value(payload) {
        Ok(value) => Some(value),
        Err(err) => {
            dd_log_local!(
                Level::Error,
                "Telemetry: failed to serialize {} payload: {}",
                request_type,
                err
            );
            None
        }
    }
}

/// Merges the series of every registered source into one metrics payload
pub struct MetricsPlugin {
    namespace: String,
    providers: Mutex<Vec<Arc<dyn MetricSource>>>,
}

impl Default for MetricsPlugin {
    fn default() -> Self {
        MetricsPlugin::new(DEFAULT_NAMESPACE)
    }
}

impl MetricsPlugin {
    pub fn new(namespace: impl Into<String>) -> Self {
        MetricsPlugin {
            namespace: namespace.into(),
            providers: Mutex::new(Vec::new()),
        }
    }

    /// Plugin draining the collector, in the collector's namespace
    pub fn for_collector(collector: Arc<TelemetryCollector>) -> Self {
        let plugin = MetricsPlugin::new(collector.namespace());
        plugin.register_provider(collector);
        plugin
    }

    pub fn register_provider(&self, provider: Arc<dyn MetricSource>) {
        lock_unpoisoned(&self.providers).push(provider);
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Drains every source, in registration order
    pub fn metrics_payload(&self) -> Option<MetricsPayload> {
        let providers = lock_unpoisoned(&self.providers).clone();
        let series = providers
            .iter()
            .flat_map(|provider| provider.drain_series())
            .collect();
        MetricsPayload::from_series(self.namespace.as_str(), series)
    }
}

impl PayloadProvider for MetricsPlugin {
    fn request_type(&self) -> RequestType {
        RequestType::Metrics
    }

    fn payload(&self) -> Option<serde_json::Value> {
        let payload = self.metrics_payload()?;
        to_json(self.request_type(), &payload)
    }
}

/// Sends the entries collected by the log deduplicator
pub struct LogsPlugin {
    logs: Arc<LogDeduplicator>,
}

impl LogsPlugin {
    pub fn new(logs: Arc<LogDeduplicator>) -> Self {
        LogsPlugin { logs }
    }
}

impl PayloadProvider for LogsPlugin {
    fn request_type(&self) -> RequestType {
        RequestType::Logs
    }

    fn payload(&self) -> Option<serde_json::Value> {
        let entries = self.logs.drain()?;
        to_json(self.request_type(), &entries)
    }
}

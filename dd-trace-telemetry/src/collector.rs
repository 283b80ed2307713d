// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Mutex;

use dd_trace::utils::lock_unpoisoned;
use dd_trace::{catch_panic, Config, TelemetryVerbosity};
use num_bigint::BigInt;

use crate::metrics::MetricDefinition;
use crate::payload::{Series, DEFAULT_NAMESPACE};
use crate::registry::{MetricId, MetricRef, MetricRegistry};

/// Entry point of instrumentation code into the metric registry.
///
/// None of the recording methods return errors or panic: unknown metrics are
/// ignored and internal failures are logged and swallowed.
#[derive(Debug)]
pub struct TelemetryCollector {
    registry: Mutex<MetricRegistry>,
    enabled: AtomicBool,
    verbosity: AtomicU8,
    namespace: String,
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        TelemetryCollector::new(MetricRegistry::with_catalog())
    }
}

impl TelemetryCollector {
    pub fn new(registry: MetricRegistry) -> Self {
        TelemetryCollector {
            registry: Mutex::new(registry),
            enabled: AtomicBool::new(true),
            verbosity: AtomicU8::new(TelemetryVerbosity::default() as u8),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// A collector with the built-in metrics, configured from `config`
    pub fn from_config(config: &Config) -> Self {
        let registry =
            MetricRegistry::with_catalog().with_max_tags(config.telemetry_metric_max_tags());
        let collector = TelemetryCollector::new(registry);
        collector.configure(config);
        collector
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn configure(&self, config: &Config) {
        self.set_enabled(config.telemetry_enabled());
        self.set_verbosity(config.telemetry_verbosity());
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_verbosity(&self, verbosity: TelemetryVerbosity) {
        self.verbosity.store(verbosity as u8, Ordering::Relaxed);
    }

    pub fn verbosity(&self) -> TelemetryVerbosity {
        match self.verbosity.load(Ordering::Relaxed) {
            0 => TelemetryVerbosity::Off,
            1 => TelemetryVerbosity::Mandatory,
            2 => TelemetryVerbosity::Information,
            _ => TelemetryVerbosity::Debug,
        }
    }

    pub fn is_debug_enabled(&self) -> bool {
        self.is_enabled() && self.verbosity().is_debug_allowed()
    }

    pub fn register(&self, definition: MetricDefinition) -> MetricId {
        lock_unpoisoned(&self.registry).register(definition)
    }

    pub fn lookup(&self, name: &str) -> Option<MetricId> {
        lock_unpoisoned(&self.registry).lookup(name)
    }

    /// Adds one to the metric
    pub fn increase<'a>(&self, metric: impl Into<MetricRef<'a>>, tag: Option<&str>) {
        self.add(metric, 1, tag)
    }

    /// Records `value` for the metric. Does nothing while the collector is disabled.
    pub fn add<'a>(
        &self,
        metric: impl Into<MetricRef<'a>>,
        value: impl Into<BigInt>,
        tag: Option<&str>,
    ) {
        if !self.is_enabled() {
            return;
        }
        let metric = metric.into();
        catch_panic!({
            let value = value.into();
            lock_unpoisoned(&self.registry).add(metric, &value, tag);
        })
    }

    /// Returns the series of every metric with points since the last drain
    pub fn drain(&self) -> Vec<Series> {
        catch_panic!(lock_unpoisoned(&self.registry).drain(), Vec::new())
    }

    /// Wraps `f` so that every call increases the metric first
    pub fn wrap<'a, A, R>(
        &'a self,
        metric: impl Into<MetricRef<'a>>,
        tag: Option<&'a str>,
        f: impl Fn(A) -> R + 'a,
    ) -> impl Fn(A) -> R + 'a {
        let metric = metric.into();
        move |args| {
            self.increase(metric, tag);
            f(args)
        }
    }
}

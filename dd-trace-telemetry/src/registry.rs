// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use num_bigint::BigInt;

use crate::catalog::TelemetryMetric;
use crate::metrics::{Metric, MetricDefinition};
use crate::payload::{MetricType, Series};

/// Direct handle to a registered metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetricId(pub(crate) usize);

/// How a caller designates a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricRef<'a> {
    ByName(&'a str),
    ById(MetricId),
}

impl<'a> From<&'a str> for MetricRef<'a> {
    fn from(name: &'a str) -> Self {
        MetricRef::ByName(name)
    }
}

impl From<MetricId> for MetricRef<'_> {
    fn from(id: MetricId) -> Self {
        MetricRef::ById(id)
    }
}

impl From<TelemetryMetric> for MetricRef<'_> {
    fn from(metric: TelemetryMetric) -> Self {
        MetricRef::ById(metric.id())
    }
}

/// Registered metrics, in registration order
#[derive(Debug, Default)]
pub struct MetricRegistry {
    metrics: Vec<Metric>,
    by_name: HashMap<String, MetricId>,
    max_tags: Option<usize>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every metric of the catalog, so that
    /// [`TelemetryMetric::id`] is valid for it
    pub fn with_catalog() -> Self {
        let mut registry = Self::new();
        for metric in TelemetryMetric::ALL {
            registry.register(metric.definition());
        }
        registry
    }

    /// Bounds the number of tags tracked by each tagged metric registered afterwards
    pub fn with_max_tags(mut self, max_tags: Option<usize>) -> Self {
        self.max_tags = max_tags;
        for metric in &mut self.metrics {
            *metric = Metric::new(metric.definition().clone(), max_tags);
        }
        self
    }

    /// Registering a name twice returns the handle of the first registration
    pub fn register(&mut self, definition: MetricDefinition) -> MetricId {
        if let Some(id) = self.by_name.get(&definition.name) {
            return *id;
        }
        let id = MetricId(self.metrics.len());
        self.by_name.insert(definition.name.clone(), id);
        self.metrics.push(Metric::new(definition, self.max_tags));
        id
    }

    pub fn lookup(&self, name: &str) -> Option<MetricId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: MetricId) -> Option<&Metric> {
        self.metrics.get(id.0)
    }

    fn resolve(&mut self, metric: MetricRef<'_>) -> Option<&mut Metric> {
        let id = match metric {
            MetricRef::ById(id) => id,
            MetricRef::ByName(name) => self.lookup(name)?,
        };
        self.metrics.get_mut(id.0)
    }

    /// Unknown metrics are ignored. Returns whether the value was recorded.
    pub fn add(&mut self, metric: MetricRef<'_>, value: &BigInt, tag: Option<&str>) -> bool {
        match self.resolve(metric) {
            Some(metric) => metric.add(value, tag),
            None => false,
        }
    }

    /// Drains every metric. Metrics without points are omitted and tagged metrics
    /// give one series per tag with points.
    pub fn drain(&mut self) -> Vec<Series> {
        let mut series = Vec::new();
        for metric in &mut self.metrics {
            for (tag, points) in metric.drain() {
                series.push(Series {
                    name: metric.name().to_string(),
                    common: metric.common(),
                    metric_type: MetricType::Count,
                    points,
                    tag,
                });
            }
        }
        series
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Storage of the values of one metric between two drains.
//!
//! Values are arbitrary precision integers: counters are summed over arbitrarily
//! long intervals and must not drift.

use std::collections::{HashMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use serde::{Serialize, Serializer};

/// Capacity of an aggregated handler, older points are evicted first
pub const MAX_QUEUE_SIZE: usize = 1000;

/// Tag used when a tagged metric is updated without a tag
pub const EMPTY_TAG: &str = "";

/// Milliseconds since the unix epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A drained value and the time it was recorded (or drained, for conflated metrics)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Point {
    pub value: BigInt,
    pub timestamp: u64,
}

impl Point {
    pub fn new(value: BigInt) -> Self {
        Point {
            value,
            timestamp: now_millis(),
        }
    }
}

impl Serialize for Point {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut point = serializer.serialize_struct("Point", 2)?;
        match self.value.to_i64() {
            Some(value) => point.serialize_field("value", &value)?,
            None => point.serialize_field("value", &self.value.to_string())?,
        }
        point.serialize_field("timestamp", &self.timestamp)?;
        point.end()
    }
}

/// How the values of a metric are kept between drains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Running sum, a single point per drain
    Conflated,
    /// Every value, up to [`MAX_QUEUE_SIZE`] points
    Aggregated,
}

/// Whether a metric is split by tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricScope {
    Single,
    Tagged,
}

#[derive(Debug, Default, Clone)]
pub struct ConflatedHandler {
    sum: BigInt,
}

impl ConflatedHandler {
    pub fn add(&mut self, value: &BigInt) {
        self.sum += value;
    }

    /// Zero sums are never reported
    pub fn drain(&mut self) -> Vec<Point> {
        let sum = std::mem::take(&mut self.sum);
        if sum.is_zero() {
            Vec::new()
        } else {
            vec![Point::new(sum)]
        }
    }
}

#[derive(Debug, Clone)]
pub struct AggregatedHandler {
    points: VecDeque<Point>,
    capacity: usize,
}

impl Default for AggregatedHandler {
    fn default() -> Self {
        AggregatedHandler::with_capacity(MAX_QUEUE_SIZE)
    }
}

impl AggregatedHandler {
    pub fn with_capacity(capacity: usize) -> Self {
        AggregatedHandler {
            points: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn add(&mut self, value: &BigInt) {
        if self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(Point::new(value.clone()));
    }

    pub fn drain(&mut self) -> Vec<Point> {
        std::mem::take(&mut self.points).into()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum MetricHandler {
    Conflated(ConflatedHandler),
    Aggregated(AggregatedHandler),
}

impl MetricHandler {
    pub fn new(kind: HandlerKind) -> Self {
        match kind {
            HandlerKind::Conflated => MetricHandler::Conflated(ConflatedHandler::default()),
            HandlerKind::Aggregated => MetricHandler::Aggregated(AggregatedHandler::default()),
        }
    }

    pub fn add(&mut self, value: &BigInt) {
        match self {
            MetricHandler::Conflated(handler) => handler.add(value),
            MetricHandler::Aggregated(handler) => handler.add(value),
        }
    }

    pub fn drain(&mut self) -> Vec<Point> {
        match self {
            MetricHandler::Conflated(handler) => handler.drain(),
            MetricHandler::Aggregated(handler) => handler.drain(),
        }
    }
}

/// Static description of a metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDefinition {
    pub name: String,
    pub common: bool,
    pub scope: MetricScope,
    pub kind: HandlerKind,
}

impl MetricDefinition {
    pub fn single(name: impl Into<String>, common: bool, kind: HandlerKind) -> Self {
        MetricDefinition {
            name: name.into(),
            common,
            scope: MetricScope::Single,
            kind,
        }
    }

    pub fn tagged(name: impl Into<String>, common: bool, kind: HandlerKind) -> Self {
        MetricDefinition {
            name: name.into(),
            common,
            scope: MetricScope::Tagged,
            kind,
        }
    }
}

#[derive(Debug)]
enum MetricValues {
    Single(MetricHandler),
    Tagged {
        handlers: HashMap<String, MetricHandler>,
        max_tags: Option<usize>,
    },
}

/// Points drained for one tag of a metric, `None` for single metrics
pub type DrainedPoints = (Option<String>, Vec<Point>);

/// A registered metric and its handler, or handlers per tag
#[derive(Debug)]
pub struct Metric {
    definition: MetricDefinition,
    values: MetricValues,
}

impl Metric {
    /// `max_tags` bounds the number of distinct tags of a tagged metric. Values for
    /// new tags past that bound are dropped.
    pub fn new(definition: MetricDefinition, max_tags: Option<usize>) -> Self {
        let values = match definition.scope {
            MetricScope::Single => MetricValues::Single(MetricHandler::new(definition.kind)),
            MetricScope::Tagged => MetricValues::Tagged {
                handlers: HashMap::new(),
                max_tags,
            },
        };
        Metric { definition, values }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn common(&self) -> bool {
        self.definition.common
    }

    pub fn definition(&self) -> &MetricDefinition {
        &self.definition
    }

    /// Single metrics ignore the tag. Tagged metrics create the handler of a tag on
    /// first use. Returns false if the value was dropped.
    pub fn add(&mut self, value: &BigInt, tag: Option<&str>) -> bool {
        match &mut self.values {
            MetricValues::Single(handler) => {
                handler.add(value);
                true
            }
            MetricValues::Tagged { handlers, max_tags } => {
                let tag = tag.unwrap_or(EMPTY_TAG);
                if let Some(handler) = handlers.get_mut(tag) {
                    handler.add(value);
                    return true;
                }
                if max_tags.is_some_and(|max| handlers.len() >= max) {
                    return false;
                }
                let mut handler = MetricHandler::new(self.definition.kind);
                handler.add(value);
                handlers.insert(tag.to_string(), handler);
                true
            }
        }
    }

    /// Drains every handler. Tagged metrics keep their (now empty) handlers, and only
    /// tags with points are returned.
    pub fn drain(&mut self) -> Vec<DrainedPoints> {
        match &mut self.values {
            MetricValues::Single(handler) => {
                let points = handler.drain();
                if points.is_empty() {
                    Vec::new()
                } else {
                    vec![(None, points)]
                }
            }
            MetricValues::Tagged { handlers, .. } => {
                let mut drained: Vec<DrainedPoints> = handlers
                    .iter_mut()
                    .filter_map(|(tag, handler)| {
                        let points = handler.drain();
                        (!points.is_empty()).then(|| (Some(tag.clone()), points))
                    })
                    .collect();
                drained.sort_by(|a, b| a.0.cmp(&b.0));
                drained
            }
        }
    }

    /// Number of tags with a handler
    pub fn tag_count(&self) -> usize {
        match &self.values {
            MetricValues::Single(_) => 0,
            MetricValues::Tagged { handlers, .. } => handlers.len(),
        }
    }
}

// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The immutable metric envelope and its construction options.
//!
//! A [`Metric`] is created once, by a producer or by a node's ad-hoc entry
//! points, and is never mutated afterwards except for the single `source`
//! stamp written by the routing layer at local ingress. Producers hand the
//! envelope to a sink by value, so ownership enforces the immutability
//! contract after emission.

use crate::error::{MetricsError, MetricsResult};
use crate::label::{merge_labels, Label};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// The fundamental type of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricKind {
    /// A value that only ever increases (e.g. total requests).
    Counter,
    /// A value that can go up or down (e.g. current memory usage).
    Gauge,
    /// A sampled distribution carried with opaque bucket configuration.
    Histogram,
    /// A sampled distribution carried with opaque quantile configuration.
    Summary,
    /// An elapsed-seconds reading produced by a timer.
    Timer,
}

/// Returns true when `name` matches the allowed pattern `[A-Za-z0-9_-]+`.
pub fn is_valid_metric_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Wall-clock seconds since the Unix epoch.
fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Options used to build a [`Metric`].
///
/// Timers keep a base set of options at creation and merge an override set at
/// end time, so every field is optional here; [`Metric::new`] validates that
/// the merged result carries a valid name and description.
#[derive(Debug, Clone, Default)]
pub struct MetricOptions {
    name: Option<String>,
    description: Option<String>,
    kind: Option<MetricKind>,
    value: Option<f64>,
    elapsed: Option<f64>,
    labels: Vec<Label>,
    meta: serde_json::Map<String, serde_json::Value>,
}

impl MetricOptions {
    /// Creates an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the metric name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the metric description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the metric kind.
    pub fn with_kind(mut self, kind: MetricKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Sets the kind only when none is set yet.
    pub fn or_kind(mut self, kind: MetricKind) -> Self {
        self.kind.get_or_insert(kind);
        self
    }

    /// Sets the metric value.
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Sets the elapsed-seconds reading. Written by timers.
    pub fn with_elapsed(mut self, elapsed: f64) -> Self {
        self.elapsed = Some(elapsed);
        self
    }

    /// Replaces the ordered label sequence.
    pub fn with_labels(mut self, labels: Vec<Label>) -> Self {
        self.labels = labels;
        self
    }

    /// Adds one auxiliary meta entry (e.g. histogram buckets).
    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    /// Merges `overrides` into `self`: override fields win field-by-field,
    /// `meta` merges key-by-key, labels merge key-wise.
    pub fn merge(mut self, overrides: MetricOptions) -> MetricOptions {
        if overrides.name.is_some() {
            self.name = overrides.name;
        }
        if overrides.description.is_some() {
            self.description = overrides.description;
        }
        if overrides.kind.is_some() {
            self.kind = overrides.kind;
        }
        if overrides.value.is_some() {
            self.value = overrides.value;
        }
        if overrides.elapsed.is_some() {
            self.elapsed = overrides.elapsed;
        }
        if !overrides.labels.is_empty() {
            self.labels = merge_labels(&self.labels, &overrides.labels);
        }
        for (key, value) in overrides.meta {
            self.meta.insert(key, value);
        }
        self
    }
}

/// The immutable envelope carrying one reading and its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    name: String,
    description: String,
    kind: Option<MetricKind>,
    value: Option<f64>,
    elapsed: Option<f64>,
    timestamp: f64,
    labels: Vec<Label>,
    meta: serde_json::Map<String, serde_json::Value>,
    source: Option<String>,
}

impl Metric {
    /// Builds a metric from options, stamping the creation timestamp.
    ///
    /// Fails with [`MetricsError::MissingName`], [`MetricsError::InvalidName`]
    /// or [`MetricsError::InvalidDescription`] when the options are
    /// incomplete.
    pub fn new(options: MetricOptions) -> MetricsResult<Self> {
        let name = options.name.ok_or(MetricsError::MissingName)?;
        if !is_valid_metric_name(&name) {
            return Err(MetricsError::InvalidName(name));
        }
        let description = match options.description {
            Some(description) if !description.is_empty() => description,
            _ => return Err(MetricsError::InvalidDescription),
        };

        Ok(Self {
            name,
            description,
            kind: options.kind,
            value: options.value,
            elapsed: options.elapsed,
            timestamp: unix_timestamp(),
            labels: options.labels,
            meta: options.meta,
            source: None,
        })
    }

    /// The metric name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The metric kind, `None` for ad-hoc metrics routed without one.
    pub fn kind(&self) -> Option<MetricKind> {
        self.kind
    }

    /// The numeric reading, `None` when unset.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Elapsed seconds, set only by timers.
    pub fn elapsed(&self) -> Option<f64> {
        self.elapsed
    }

    /// Wall-clock seconds at creation.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// The ordered label sequence, declaration order preserved.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Auxiliary configuration (histogram buckets, summary quantiles).
    /// Empty when none was supplied.
    pub fn meta(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.meta
    }

    /// Identity of the node that stamped this metric at local ingress.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Stamps the origin identity. Reserved for the routing layer; written
    /// once, at the node where the metric entered the fabric.
    pub fn set_source(&mut self, identity: impl Into<String>) {
        self.source = Some(identity.into());
    }
}

// Canonical ordered snapshot structure: {name, description, timestamp,
// value, elapsed, meta}. Labels, kind and source are routing concerns and
// stay out of the snapshot.
impl Serialize for Metric {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Metric", 6)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("timestamp", &self.timestamp)?;
        state.serialize_field("value", &self.value)?;
        state.serialize_field("elapsed", &self.elapsed)?;
        state.serialize_field("meta", &self.meta)?;
        state.end()
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "Metric {json}"),
            Err(_) => write!(f, "Metric {{\"name\":\"{}\"}}", self.name),
        }
    }
}

/// A metric is deliberately not a number. Converting one to `f64` always
/// fails so misuse surfaces at the call site instead of corrupting a
/// computation; read [`Metric::value`] or [`Metric::elapsed`] instead.
impl TryFrom<&Metric> for f64 {
    type Error = MetricsError;

    fn try_from(_: &Metric) -> Result<Self, Self::Error> {
        Err(MetricsError::NotNumeric)
    }
}

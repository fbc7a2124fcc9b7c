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

use super::{emit_to, ProducerOptions};
use std::sync::Arc;
use tributary_core::{
    resolve_labels, LabelSet, Metric, MetricKind, MetricOptions, MetricSink, MetricsError,
    MetricsResult,
};

/// A monotonically increasing count.
///
/// `inc()` with no arguments emits 1 — the labels-only convenience
/// ([`Counter::inc_with`]) keeps that default, mirroring the ergonomics of
/// passing a labels object in place of the amount.
pub struct Counter {
    options: ProducerOptions,
    sinks: Vec<Arc<dyn MetricSink>>,
}

impl Counter {
    /// Validates the options and creates an unconnected counter.
    pub fn new(options: ProducerOptions) -> MetricsResult<Self> {
        options.validate()?;
        Ok(Self {
            options,
            sinks: Vec::new(),
        })
    }

    /// Connects a sink; every increment is delivered to all connected sinks.
    pub fn connect(&mut self, sink: Arc<dyn MetricSink>) {
        self.sinks.push(sink);
    }

    /// Increments by 1.
    pub fn inc(&self) -> MetricsResult<()> {
        self.emit(1.0, None)
    }

    /// Increments by `value`.
    pub fn inc_by(&self, value: f64) -> MetricsResult<()> {
        self.emit(value, None)
    }

    /// Increments by 1 with call-time labels.
    pub fn inc_with(&self, labels: LabelSet) -> MetricsResult<()> {
        self.emit(1.0, Some(&labels))
    }

    /// Increments by `value` with call-time labels.
    pub fn inc_by_with(&self, value: f64, labels: LabelSet) -> MetricsResult<()> {
        self.emit(value, Some(&labels))
    }

    fn emit(&self, value: f64, labels: Option<&LabelSet>) -> MetricsResult<()> {
        if !value.is_finite() {
            return Err(MetricsError::InvalidValue("inc"));
        }
        let labels = resolve_labels(self.options.labels(), labels)?;
        let metric = Metric::new(
            MetricOptions::new()
                .with_name(self.options.name())
                .with_description(self.options.description())
                .with_kind(MetricKind::Counter)
                .with_value(value)
                .with_labels(labels),
        )?;
        emit_to(&self.sinks, metric);
        Ok(())
    }
}

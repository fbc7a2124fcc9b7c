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
use std::time::Instant;
use tributary_core::{
    resolve_labels, LabelSet, Metric, MetricKind, MetricOptions, MetricSink, MetricsError,
    MetricsResult,
};

/// A sampled distribution.
///
/// The histogram computes no statistics itself; configured buckets ride
/// through as `meta.buckets` for whatever sits at the end of the pipe graph.
pub struct Histogram {
    options: ProducerOptions,
    sinks: Vec<Arc<dyn MetricSink>>,
}

impl Histogram {
    /// Validates the options and creates an unconnected histogram.
    pub fn new(options: ProducerOptions) -> MetricsResult<Self> {
        options.validate()?;
        Ok(Self {
            options,
            sinks: Vec::new(),
        })
    }

    /// Connects a sink.
    pub fn connect(&mut self, sink: Arc<dyn MetricSink>) {
        self.sinks.push(sink);
    }

    /// Records one sample.
    pub fn observe(&self, value: f64) -> MetricsResult<()> {
        self.emit(value, None)
    }

    /// Records one sample with call-time labels.
    pub fn observe_with(&self, value: f64, labels: LabelSet) -> MetricsResult<()> {
        self.emit(value, Some(&labels))
    }

    /// Starts a timer; stopping it observes the elapsed seconds.
    pub fn timer(&self) -> HistogramTimer<'_> {
        HistogramTimer {
            histogram: self,
            labels: None,
            start: Instant::now(),
        }
    }

    /// Starts a timer carrying start-time labels.
    pub fn timer_with(&self, labels: LabelSet) -> HistogramTimer<'_> {
        HistogramTimer {
            histogram: self,
            labels: Some(labels),
            start: Instant::now(),
        }
    }

    fn emit(&self, value: f64, labels: Option<&LabelSet>) -> MetricsResult<()> {
        if !value.is_finite() {
            return Err(MetricsError::InvalidValue("observe"));
        }
        let labels = resolve_labels(self.options.labels(), labels)?;
        let mut options = MetricOptions::new()
            .with_name(self.options.name())
            .with_description(self.options.description())
            .with_kind(MetricKind::Histogram)
            .with_value(value)
            .with_labels(labels);
        if let Some(buckets) = self.options.buckets() {
            options = options.with_meta("buckets", serde_json::Value::from(buckets.to_vec()));
        }
        emit_to(&self.sinks, Metric::new(options)?);
        Ok(())
    }
}

/// A running measurement against a [`Histogram`].
///
/// End-time labels merge key-by-key over the start-time labels; end values
/// win per key, the rest of the start set is kept.
pub struct HistogramTimer<'a> {
    histogram: &'a Histogram,
    labels: Option<LabelSet>,
    start: Instant,
}

impl HistogramTimer<'_> {
    /// Observes the elapsed seconds with the start-time labels.
    pub fn stop(self) -> MetricsResult<()> {
        let elapsed = self.start.elapsed().as_secs_f64();
        self.histogram.emit(elapsed, self.labels.as_ref())
    }

    /// Observes the elapsed seconds with start and end labels merged.
    pub fn stop_with(self, labels: LabelSet) -> MetricsResult<()> {
        let elapsed = self.start.elapsed().as_secs_f64();
        let merged = LabelSet::merge(self.labels, Some(labels))?;
        self.histogram.emit(elapsed, merged.as_ref())
    }
}

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

/// A value that can go up or down.
///
/// Unlike [`Counter`](super::Counter) there is no default amount: `set`
/// requires a finite value and rejects anything else before any emission.
pub struct Gauge {
    options: ProducerOptions,
    sinks: Vec<Arc<dyn MetricSink>>,
}

impl Gauge {
    /// Validates the options and creates an unconnected gauge.
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

    /// Sets the gauge to `value`.
    pub fn set(&self, value: f64) -> MetricsResult<()> {
        self.emit(value, None)
    }

    /// Sets the gauge to `value` with call-time labels.
    pub fn set_with(&self, value: f64, labels: LabelSet) -> MetricsResult<()> {
        self.emit(value, Some(&labels))
    }

    fn emit(&self, value: f64, labels: Option<&LabelSet>) -> MetricsResult<()> {
        if !value.is_finite() {
            return Err(MetricsError::InvalidValue("set"));
        }
        let labels = resolve_labels(self.options.labels(), labels)?;
        let metric = Metric::new(
            MetricOptions::new()
                .with_name(self.options.name())
                .with_description(self.options.description())
                .with_kind(MetricKind::Gauge)
                .with_value(value)
                .with_labels(labels),
        )?;
        emit_to(&self.sinks, metric);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gauge() -> (Gauge, flume::Receiver<Metric>) {
        let (tx, rx) = flume::unbounded();
        let mut gauge = Gauge::new(ProducerOptions::new("heap_bytes", "Heap usage")).unwrap();
        gauge.connect(Arc::new(move |metric: Metric| {
            tx.send(metric).ok();
        }));
        (gauge, rx)
    }

    #[test]
    fn set_emits_the_value() {
        let (gauge, rx) = gauge();
        gauge.set(512.5).unwrap();

        let metric = rx.try_recv().unwrap();
        assert_eq!(metric.kind(), Some(MetricKind::Gauge));
        assert_eq!(metric.value(), Some(512.5));
    }

    #[test]
    fn missing_value_fails_before_any_emission() {
        let (gauge, rx) = gauge();
        assert_eq!(gauge.set(f64::NAN), Err(MetricsError::InvalidValue("set")));
        assert_eq!(
            gauge.set(f64::INFINITY),
            Err(MetricsError::InvalidValue("set"))
        );
        assert!(rx.try_recv().is_err());
    }
}

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

/// A sampled distribution carried with quantile configuration.
///
/// The counterpart of [`Histogram`](super::Histogram): identical emission
/// contract, with `meta.quantiles` instead of `meta.buckets`.
pub struct Summary {
    options: ProducerOptions,
    sinks: Vec<Arc<dyn MetricSink>>,
}

impl Summary {
    /// Validates the options and creates an unconnected summary.
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
    pub fn timer(&self) -> SummaryTimer<'_> {
        SummaryTimer {
            summary: self,
            labels: None,
            start: Instant::now(),
        }
    }

    /// Starts a timer carrying start-time labels.
    pub fn timer_with(&self, labels: LabelSet) -> SummaryTimer<'_> {
        SummaryTimer {
            summary: self,
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
            .with_kind(MetricKind::Summary)
            .with_value(value)
            .with_labels(labels);
        if let Some(quantiles) = self.options.quantiles() {
            options = options.with_meta("quantiles", serde_json::Value::from(quantiles.to_vec()));
        }
        emit_to(&self.sinks, Metric::new(options)?);
        Ok(())
    }
}

/// A running measurement against a [`Summary`]; see
/// [`HistogramTimer`](super::HistogramTimer) for the label-merge contract.
pub struct SummaryTimer<'a> {
    summary: &'a Summary,
    labels: Option<LabelSet>,
    start: Instant,
}

impl SummaryTimer<'_> {
    /// Observes the elapsed seconds with the start-time labels.
    pub fn stop(self) -> MetricsResult<()> {
        let elapsed = self.start.elapsed().as_secs_f64();
        self.summary.emit(elapsed, self.labels.as_ref())
    }

    /// Observes the elapsed seconds with start and end labels merged.
    pub fn stop_with(self, labels: LabelSet) -> MetricsResult<()> {
        let elapsed = self.start.elapsed().as_secs_f64();
        let merged = LabelSet::merge(self.labels, Some(labels))?;
        self.summary.emit(elapsed, merged.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_carries_quantile_configuration() {
        let (tx, rx) = flume::unbounded();
        let mut summary = Summary::new(
            ProducerOptions::new("response_seconds", "Response duration")
                .with_quantiles([0.5, 0.9, 0.99]),
        )
        .unwrap();
        summary.connect(Arc::new(move |metric: Metric| {
            tx.send(metric).ok();
        }));

        summary.observe(0.05).unwrap();

        let metric = rx.try_recv().unwrap();
        assert_eq!(metric.kind(), Some(MetricKind::Summary));
        assert_eq!(
            metric.meta().get("quantiles").unwrap(),
            &serde_json::json!([0.5, 0.9, 0.99])
        );
    }

    #[test]
    fn observe_rejects_non_finite_samples() {
        let summary =
            Summary::new(ProducerOptions::new("response_seconds", "Response duration")).unwrap();
        assert_eq!(
            summary.observe(f64::NEG_INFINITY),
            Err(MetricsError::InvalidValue("observe"))
        );
    }
}

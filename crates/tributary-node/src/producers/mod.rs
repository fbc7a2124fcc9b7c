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

//! Typed metric producers.
//!
//! Producers are stateless apart from their declared configuration: each
//! call builds one [`Metric`](tributary_core::Metric) and hands it to the
//! connected sinks. Constructing one through the node
//! (`node.counter(...)` etc.) wires it to that node; standalone producers
//! can be connected to any sink afterwards.

pub mod counter;
pub mod gauge;
pub mod histogram;
pub mod summary;

pub use counter::Counter;
pub use gauge::Gauge;
pub use histogram::{Histogram, HistogramTimer};
pub use summary::{Summary, SummaryTimer};

use std::sync::Arc;
use tributary_core::{
    is_valid_metric_name, LabelBinding, LabelValue, Metric, MetricSink, MetricsError,
    MetricsResult,
};

/// Shared construction options for the four producer types.
///
/// `buckets` applies to histograms and `quantiles` to summaries; both ride
/// through as opaque meta configuration, the producer computes no
/// statistics.
#[derive(Debug, Clone)]
pub struct ProducerOptions {
    name: String,
    description: String,
    labels: LabelBinding,
    buckets: Option<Vec<f64>>,
    quantiles: Option<Vec<f64>>,
}

impl ProducerOptions {
    /// Creates options with the mandatory name and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            labels: LabelBinding::None,
            buckets: None,
            quantiles: None,
        }
    }

    /// Declares labels as an ordered list of names; values are supplied
    /// positionally at emission time.
    pub fn with_label_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = LabelBinding::Positional(names.into_iter().map(Into::into).collect());
        self
    }

    /// Declares labels as a mapping of name to default value; call-time
    /// overrides merge key-wise.
    pub fn with_label_defaults<I, S>(mut self, defaults: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<LabelValue>)>,
        S: Into<String>,
    {
        self.labels = LabelBinding::Defaults(
            defaults
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        );
        self
    }

    /// Attaches opaque histogram bucket configuration.
    pub fn with_buckets<I>(mut self, buckets: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        self.buckets = Some(buckets.into_iter().collect());
        self
    }

    /// Attaches opaque summary quantile configuration.
    pub fn with_quantiles<I>(mut self, quantiles: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        self.quantiles = Some(quantiles.into_iter().collect());
        self
    }

    /// The metric name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The metric description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The declared label binding.
    pub fn labels(&self) -> &LabelBinding {
        &self.labels
    }

    /// Configured histogram buckets, if any.
    pub fn buckets(&self) -> Option<&[f64]> {
        self.buckets.as_deref()
    }

    /// Configured summary quantiles, if any.
    pub fn quantiles(&self) -> Option<&[f64]> {
        self.quantiles.as_deref()
    }

    pub(crate) fn validate(&self) -> MetricsResult<()> {
        if self.name.is_empty() {
            return Err(MetricsError::MissingName);
        }
        if !is_valid_metric_name(&self.name) {
            return Err(MetricsError::InvalidName(self.name.clone()));
        }
        if self.description.is_empty() {
            return Err(MetricsError::InvalidDescription);
        }
        Ok(())
    }
}

/// Hands one metric to every connected sink, cloning for all but the last.
pub(crate) fn emit_to(sinks: &[Arc<dyn MetricSink>], metric: Metric) {
    match sinks.split_last() {
        Some((last, rest)) => {
            for sink in rest {
                sink.accept(metric.clone());
            }
            last.accept(metric);
        }
        None => {
            log::trace!("No sink connected; metric '{}' discarded.", metric.name());
        }
    }
}

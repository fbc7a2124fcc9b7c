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

//! The routing layer of the Tributary metrics fabric.
//!
//! This crate provides the aggregation [`MetricsNode`], the typed producers
//! that feed it, and the pull-side [`Collector`]. Nodes compose into
//! arbitrary directed graphs via [`MetricsNode::pipe`]; the fabric never
//! blocks an emitter, never buffers without bound, and makes every loss
//! observable.
//!
//! ```
//! use tributary_node::{MetricsNode, ProducerOptions};
//!
//! let app = MetricsNode::default();
//! let hub = MetricsNode::default();
//! app.pipe(&hub);
//! let collector = hub.collector().unwrap();
//!
//! let requests = app
//!     .counter(ProducerOptions::new("requests_total", "Handled requests"))
//!     .unwrap();
//! requests.inc().unwrap();
//!
//! assert_eq!(collector.try_next().unwrap().name(), "requests_total");
//! ```

#![warn(missing_docs)]

pub mod node;
pub mod producers;
pub mod timer;

pub use node::collector::Collector;
pub use node::queue::{BoundedQueue, Enqueue, OverflowPolicy};
pub use node::{
    DeliveryState, MetricsNode, NodeOptions, DEFAULT_BUFFER_CAPACITY, DEFAULT_LISTENER_CAPACITY,
};
pub use producers::{
    Counter, Gauge, Histogram, HistogramTimer, ProducerOptions, Summary, SummaryTimer,
};
pub use timer::Timer;

pub use tributary_core::{
    is_valid_metric_name, merge_labels, resolve_labels, Label, LabelBinding, LabelSet, LabelValue,
    Metric, MetricKind, MetricOptions, MetricSink, MetricsError, MetricsResult,
};

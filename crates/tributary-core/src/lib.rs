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

//! # Tributary Core
//!
//! Foundational crate for the Tributary metrics fabric: the immutable
//! [`Metric`] envelope, the label machinery with its two binding modes, the
//! error taxonomy, the [`MetricSink`] capability seam, and the lazily
//! subscribed event bus used for drop notification.

#![warn(missing_docs)]

pub mod error;
pub mod event;
pub mod label;
pub mod metric;
pub mod sink;

pub use error::{MetricsError, MetricsResult};
pub use event::EventBus;
pub use label::{merge_labels, resolve_labels, Label, LabelBinding, LabelSet, LabelValue};
pub use metric::{is_valid_metric_name, Metric, MetricKind, MetricOptions};
pub use sink::MetricSink;

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

//! The node-owned ad-hoc timer.

use std::sync::Arc;
use std::time::Instant;
use tributary_core::{Metric, MetricKind, MetricOptions, MetricSink, MetricsResult};

/// A running measurement routed through a node when stopped.
///
/// The metric's details can be supplied at creation, at the end, or split
/// between the two: end-time options override the base field-by-field, meta
/// entries merge key-by-key, and the elapsed seconds are written by the
/// timer itself. No background task runs between creation and the stop call.
pub struct Timer {
    sink: Arc<dyn MetricSink>,
    base: MetricOptions,
    start: Instant,
}

impl Timer {
    pub(crate) fn new(sink: Arc<dyn MetricSink>, base: MetricOptions) -> Self {
        Self {
            sink,
            base,
            start: Instant::now(),
        }
    }

    /// Stops the timer and routes the resulting metric.
    pub fn stop(self) -> MetricsResult<()> {
        self.stop_with(MetricOptions::new())
    }

    /// Stops the timer, merging `overrides` into the base options before
    /// routing. Fails when the merged options still lack a valid name or
    /// description.
    pub fn stop_with(self, overrides: MetricOptions) -> MetricsResult<()> {
        let elapsed = self.start.elapsed().as_secs_f64();
        let options = self
            .base
            .merge(overrides)
            .with_elapsed(elapsed)
            .or_kind(MetricKind::Timer);
        let metric = Metric::new(options)?;
        self.sink.accept(metric);
        Ok(())
    }
}

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

//! The capability seam between producers and the routing layer.

use crate::metric::Metric;

/// Anything that can accept an emitted metric.
///
/// Producers hold zero-or-more sink references and hand each emitted metric
/// over by value; there is no hidden event bus between a producer and the
/// node it is wired to. Acceptance is infallible: a sink that cannot deliver
/// a metric reports the loss through its own drop channel instead of failing
/// the producer call.
pub trait MetricSink: Send + Sync {
    /// Accepts one emitted metric.
    fn accept(&self, metric: Metric);
}

impl<F> MetricSink for F
where
    F: Fn(Metric) + Send + Sync,
{
    fn accept(&self, metric: Metric) {
        self(metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::MetricOptions;

    #[test]
    fn closures_are_sinks() {
        let (tx, rx) = flume::unbounded();
        let sink = move |metric: Metric| {
            tx.send(metric).ok();
        };

        let metric = Metric::new(
            MetricOptions::new()
                .with_name("valid_name")
                .with_description("Valid description"),
        )
        .unwrap();
        sink.accept(metric);

        assert_eq!(rx.recv().unwrap().name(), "valid_name");
    }
}

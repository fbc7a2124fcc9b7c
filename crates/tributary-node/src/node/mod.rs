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

//! The aggregation node: a bounded, backpressure-respecting, loop-safe
//! junction through which metrics flow toward a collector.
//!
//! A node accepts metrics from local producers and from upstream peers, and
//! forwards them downstream without ever blocking the caller: a routed
//! metric is delivered, buffered (up to the configured capacity), or dropped
//! with an observable `drop` notification. Nodes chain via [`MetricsNode::pipe`]
//! into arbitrary directed graphs; cycles are safe because each node
//! suppresses exactly the metrics that carry its own origin stamp.

pub mod collector;
pub mod queue;

use crate::producers::{Counter, Gauge, Histogram, ProducerOptions, Summary};
use crate::timer::Timer;
use collector::Collector;
use queue::{BoundedQueue, Enqueue, OverflowPolicy};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tributary_core::{Metric, MetricOptions, MetricSink, MetricsResult};
use tributary_core::{EventBus, MetricsError};

/// Default output buffer capacity of a node.
pub const DEFAULT_BUFFER_CAPACITY: usize = 100;

/// Default fan-in threshold before a node raises its listener capacity.
pub const DEFAULT_LISTENER_CAPACITY: usize = 10;

/// Delivery state of a node's output side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// No consumer attached; every routed metric is dropped immediately.
    Idle,
    /// A consumer is attached and pulling; metrics flow downstream.
    Flowing,
    /// A consumer is attached but applying backpressure; metrics buffer up
    /// to capacity, then overflow per policy.
    Paused,
}

/// Construction options for a [`MetricsNode`].
#[derive(Debug, Clone)]
pub struct NodeOptions {
    identity: Option<String>,
    buffer_capacity: usize,
    overflow_policy: OverflowPolicy,
}

impl NodeOptions {
    /// Creates the default option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Supplies the node identity instead of generating one.
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Sets the output buffer capacity (minimum 1).
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Selects the overflow policy applied when the buffer is full.
    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            identity: None,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            overflow_policy: OverflowPolicy::default(),
        }
    }
}

#[derive(Debug)]
struct NodeState {
    mode: DeliveryState,
    queue: BoundedQueue<Metric>,
    pipes: Vec<Weak<NodeInner>>,
    collector_attached: bool,
    upstreams: usize,
    listener_capacity: usize,
}

#[derive(Debug)]
pub(crate) struct NodeInner {
    identity: String,
    state: Mutex<NodeState>,
    drops: EventBus<Metric>,
    dropped_total: AtomicU64,
}

impl NodeInner {
    fn lock_state(&self) -> MutexGuard<'_, NodeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Local ingress: stamp the origin identity, then dispatch.
    pub(crate) fn route_local(&self, mut metric: Metric) {
        metric.set_source(self.identity.clone());
        self.dispatch(metric);
    }

    /// Upstream delivery. A metric carrying this node's own origin stamp has
    /// completed a cycle through the pipe graph; it is reported and
    /// discarded instead of circulating forever. Pass-through metrics keep
    /// their origin stamp so the cycle drains at the metric's origin, not
    /// anywhere else.
    pub(crate) fn ingest(&self, metric: Metric) {
        if metric.source() == Some(self.identity.as_str()) {
            log::trace!(
                "Node '{}' suppressing metric '{}' returning from a cycle.",
                self.identity,
                metric.name()
            );
            self.report_drop(metric);
            return;
        }
        self.dispatch(metric);
    }

    fn dispatch(&self, metric: Metric) {
        let mut lost: Vec<Metric> = Vec::new();
        let (targets, batch) = {
            let mut state = self.lock_state();
            match state.mode {
                DeliveryState::Idle => {
                    drop(state);
                    self.report_drop(metric);
                    return;
                }
                DeliveryState::Paused => {
                    Self::buffer(&mut state, metric, &mut lost);
                    (Vec::new(), Vec::new())
                }
                DeliveryState::Flowing => {
                    Self::buffer(&mut state, metric, &mut lost);
                    let targets = Self::live_pipes(&mut state);
                    if targets.is_empty() {
                        if !state.collector_attached {
                            // Every piped consumer is gone; go idle and
                            // discard rather than hold metrics forever.
                            state.mode = DeliveryState::Idle;
                            lost.extend(state.queue.drain_all());
                        }
                        (Vec::new(), Vec::new())
                    } else {
                        let batch = state.queue.drain_all();
                        (targets, batch)
                    }
                }
            }
        };
        for metric in lost {
            self.report_drop(metric);
        }
        for metric in batch {
            Self::fan_out(&targets, metric);
        }
    }

    fn buffer(state: &mut NodeState, metric: Metric, lost: &mut Vec<Metric>) {
        match state.queue.push(metric) {
            Enqueue::Accepted => {}
            Enqueue::Displaced(evicted) => lost.push(evicted),
            Enqueue::Rejected(incoming) => lost.push(incoming),
        }
    }

    fn live_pipes(state: &mut NodeState) -> Vec<Arc<NodeInner>> {
        state.pipes.retain(|pipe| pipe.strong_count() > 0);
        state.pipes.iter().filter_map(Weak::upgrade).collect()
    }

    /// Delivers one metric to every target, cloning for all but the last.
    fn fan_out(targets: &[Arc<NodeInner>], metric: Metric) {
        if let Some((last, rest)) = targets.split_last() {
            for target in rest {
                target.ingest(metric.clone());
            }
            last.ingest(metric);
        }
    }

    /// Pushes any backlog out to the attached pipes. No-op unless flowing.
    pub(crate) fn drain_to_pipes(&self) {
        let (targets, batch) = {
            let mut state = self.lock_state();
            if state.mode != DeliveryState::Flowing || state.queue.is_empty() {
                return;
            }
            let targets = Self::live_pipes(&mut state);
            if targets.is_empty() {
                return;
            }
            let batch = state.queue.drain_all();
            (targets, batch)
        };
        for metric in batch {
            Self::fan_out(&targets, metric);
        }
    }

    fn report_drop(&self, metric: Metric) {
        self.dropped_total.fetch_add(1, Ordering::Relaxed);
        log::trace!(
            "Node '{}' dropping metric '{}'.",
            self.identity,
            metric.name()
        );
        self.drops.publish(metric);
    }

    fn add_upstream(&self) {
        let mut state = self.lock_state();
        state.upstreams += 1;
        if state.upstreams > state.listener_capacity {
            state.listener_capacity = state.upstreams;
            log::debug!(
                "Node '{}' raised listener capacity to {} for fan-in.",
                self.identity,
                state.listener_capacity
            );
        }
    }

    fn remove_upstream(&self) {
        let mut state = self.lock_state();
        state.upstreams = state.upstreams.saturating_sub(1);
        state.listener_capacity = state.upstreams.max(DEFAULT_LISTENER_CAPACITY);
    }

    pub(crate) fn attach_collector(&self) -> MetricsResult<()> {
        let mut state = self.lock_state();
        if state.collector_attached {
            return Err(MetricsError::CollectorAttached(self.identity.clone()));
        }
        state.collector_attached = true;
        if state.mode == DeliveryState::Idle {
            state.mode = DeliveryState::Flowing;
        }
        Ok(())
    }

    pub(crate) fn detach_collector(&self) {
        {
            let mut state = self.lock_state();
            state.collector_attached = false;
            if state.mode == DeliveryState::Paused {
                // Backpressure belonged to the departing collector; any
                // remaining pipes resume pulling.
                state.mode = DeliveryState::Flowing;
            }
        }
        self.settle_after_detach();
        self.drain_to_pipes();
    }

    /// Re-evaluates consumer attachment after a detach; with no consumers
    /// left the node goes idle and reports the buffered metrics as dropped.
    pub(crate) fn settle_after_detach(&self) {
        let lost = {
            let mut state = self.lock_state();
            state.pipes.retain(|pipe| pipe.strong_count() > 0);
            if state.pipes.is_empty() && !state.collector_attached {
                state.mode = DeliveryState::Idle;
                state.queue.drain_all()
            } else {
                Vec::new()
            }
        };
        for metric in lost {
            self.report_drop(metric);
        }
    }

    pub(crate) fn mode(&self) -> DeliveryState {
        self.lock_state().mode
    }

    pub(crate) fn pop_buffered(&self) -> Option<Metric> {
        let mut state = self.lock_state();
        match state.mode {
            DeliveryState::Paused => None,
            _ => state.queue.pop(),
        }
    }

    pub(crate) fn drain_buffered(&self) -> Vec<Metric> {
        let mut state = self.lock_state();
        match state.mode {
            DeliveryState::Paused => Vec::new(),
            _ => state.queue.drain_all(),
        }
    }
}

impl MetricSink for NodeInner {
    fn accept(&self, metric: Metric) {
        self.route_local(metric);
    }
}

/// The aggregation node (client) of the metrics fabric.
///
/// Cloning a `MetricsNode` yields another handle onto the same node; all
/// ingress operations are synchronous and non-blocking.
#[derive(Debug, Clone)]
pub struct MetricsNode {
    inner: Arc<NodeInner>,
}

impl MetricsNode {
    /// Creates a node from options. The identity defaults to a random UUID,
    /// unique within a running process with high probability.
    pub fn new(options: NodeOptions) -> Self {
        let identity = options
            .identity
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        log::debug!("Metrics node '{identity}' initialized.");
        Self {
            inner: Arc::new(NodeInner {
                identity,
                state: Mutex::new(NodeState {
                    mode: DeliveryState::Idle,
                    queue: BoundedQueue::new(options.buffer_capacity, options.overflow_policy),
                    pipes: Vec::new(),
                    collector_attached: false,
                    upstreams: 0,
                    listener_capacity: DEFAULT_LISTENER_CAPACITY,
                }),
                drops: EventBus::new(),
                dropped_total: AtomicU64::new(0),
            }),
        }
    }

    /// The node identity used for loop suppression.
    pub fn identity(&self) -> &str {
        &self.inner.identity
    }

    /// Builds a metric from `options` and routes it through this node.
    pub fn metric(&self, options: MetricOptions) -> MetricsResult<()> {
        let metric = Metric::new(options)?;
        self.inner.route_local(metric);
        Ok(())
    }

    /// Starts a timer whose end routes an elapsed-seconds metric through
    /// this node; `base` options merge with whatever the end call supplies.
    pub fn timer(&self, base: MetricOptions) -> Timer {
        Timer::new(self.sink(), base)
    }

    /// Constructs a counter wired to this node.
    pub fn counter(&self, options: ProducerOptions) -> MetricsResult<Counter> {
        let mut counter = Counter::new(options)?;
        counter.connect(self.sink());
        Ok(counter)
    }

    /// Constructs a gauge wired to this node.
    pub fn gauge(&self, options: ProducerOptions) -> MetricsResult<Gauge> {
        let mut gauge = Gauge::new(options)?;
        gauge.connect(self.sink());
        Ok(gauge)
    }

    /// Constructs a histogram wired to this node.
    pub fn histogram(&self, options: ProducerOptions) -> MetricsResult<Histogram> {
        let mut histogram = Histogram::new(options)?;
        histogram.connect(self.sink());
        Ok(histogram)
    }

    /// Constructs a summary wired to this node.
    pub fn summary(&self, options: ProducerOptions) -> MetricsResult<Summary> {
        let mut summary = Summary::new(options)?;
        summary.connect(self.sink());
        Ok(summary)
    }

    /// This node as a sink for standalone producers. Accepted metrics are
    /// stamped with this node's identity and routed like local ingress.
    pub fn sink(&self) -> Arc<dyn MetricSink> {
        self.inner.clone()
    }

    /// Delivers a metric from an upstream peer, applying loop suppression.
    pub fn ingest(&self, metric: Metric) {
        self.inner.ingest(metric);
    }

    /// Attaches `downstream` so metrics flowing through this node are
    /// delivered to it. Idempotent per target; attaching the first consumer
    /// moves the node out of `Idle`.
    pub fn pipe(&self, downstream: &MetricsNode) {
        let attached = {
            let mut state = self.inner.lock_state();
            let already = state.pipes.iter().any(|pipe| {
                pipe.upgrade()
                    .is_some_and(|target| Arc::ptr_eq(&target, &downstream.inner))
            });
            if already {
                false
            } else {
                state.pipes.push(Arc::downgrade(&downstream.inner));
                if state.mode == DeliveryState::Idle {
                    state.mode = DeliveryState::Flowing;
                }
                true
            }
        };
        if attached {
            log::debug!(
                "Node '{}' piped into node '{}'.",
                self.identity(),
                downstream.identity()
            );
            downstream.inner.add_upstream();
            self.inner.drain_to_pipes();
        }
    }

    /// Detaches a previously piped downstream. Returns whether a pipe was
    /// removed. When the last consumer detaches, buffered metrics are
    /// discarded and reported via the drop channel.
    pub fn unpipe(&self, downstream: &MetricsNode) -> bool {
        let removed = {
            let mut state = self.inner.lock_state();
            let before = state.pipes.len();
            state.pipes.retain(|pipe| {
                !pipe
                    .upgrade()
                    .is_some_and(|target| Arc::ptr_eq(&target, &downstream.inner))
            });
            state.pipes.len() != before
        };
        if removed {
            downstream.inner.remove_upstream();
            self.inner.settle_after_detach();
        }
        removed
    }

    /// Attaches the pull-side consumer. At most one collector may be
    /// attached at a time.
    pub fn collector(&self) -> MetricsResult<Collector> {
        self.inner.attach_collector()?;
        Ok(Collector::new(self.inner.clone()))
    }

    /// Subscribes to the metrics this node will never deliver downstream.
    /// One event is published per dropped metric; without a live subscriber
    /// nothing is buffered.
    pub fn drops(&self) -> flume::Receiver<Metric> {
        self.inner.drops.subscribe()
    }

    /// Total number of metrics dropped since construction, independent of
    /// drop subscriptions.
    pub fn dropped_total(&self) -> u64 {
        self.inner.dropped_total.load(Ordering::Relaxed)
    }

    /// The current delivery state.
    pub fn delivery_state(&self) -> DeliveryState {
        self.inner.mode()
    }

    /// Number of metrics currently buffered.
    pub fn buffered(&self) -> usize {
        self.inner.lock_state().queue.len()
    }

    /// Number of upstream peers currently piped into this node.
    pub fn upstream_count(&self) -> usize {
        self.inner.lock_state().upstreams
    }

    /// Current listener capacity; grows past the default threshold under
    /// wide fan-in so attachment never trips a resource warning.
    pub fn listener_capacity(&self) -> usize {
        self.inner.lock_state().listener_capacity
    }
}

impl Default for MetricsNode {
    fn default() -> Self {
        Self::new(NodeOptions::default())
    }
}

impl MetricSink for MetricsNode {
    fn accept(&self, metric: Metric) {
        self.inner.route_local(metric);
    }
}

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

//! End-to-end tests of the pipe graph: chaining, fan-in, cycles, overflow
//! under backpressure, and producers emitting through a topology.

use std::time::Duration;
use tributary_node::{
    LabelSet, MetricOptions, MetricsNode, NodeOptions, OverflowPolicy, ProducerOptions,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn options(name: &str) -> MetricOptions {
    MetricOptions::new()
        .with_name(name)
        .with_description("Valid description")
}

#[test]
fn chained_nodes_deliver_in_order() {
    init_logger();
    let app = MetricsNode::default();
    let hub = MetricsNode::default();
    app.pipe(&hub);
    let collector = hub.collector().unwrap();

    for name in ["alpha", "beta", "gamma"] {
        app.metric(options(name)).unwrap();
    }

    let names: Vec<String> = collector
        .drain()
        .iter()
        .map(|metric| metric.name().to_owned())
        .collect();
    assert_eq!(names, ["alpha", "beta", "gamma"]);
    assert_eq!(app.dropped_total(), 0);
    assert_eq!(hub.dropped_total(), 0);
}

#[test]
fn fan_in_merges_two_sources() {
    init_logger();
    let left = MetricsNode::new(NodeOptions::new().with_identity("left"));
    let right = MetricsNode::new(NodeOptions::new().with_identity("right"));
    let hub = MetricsNode::default();
    left.pipe(&hub);
    right.pipe(&hub);
    let collector = hub.collector().unwrap();

    left.metric(options("from_left")).unwrap();
    right.metric(options("from_right")).unwrap();

    let merged = collector.drain();
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].name(), "from_left");
    assert_eq!(merged[0].source(), Some("left"));
    assert_eq!(merged[1].name(), "from_right");
    assert_eq!(merged[1].source(), Some("right"));
    assert_eq!(hub.upstream_count(), 2);
}

#[test]
fn cycle_drains_at_the_origin() {
    init_logger();
    let a = MetricsNode::new(NodeOptions::new().with_identity("a"));
    let b = MetricsNode::new(NodeOptions::new().with_identity("b"));
    let c = MetricsNode::new(NodeOptions::new().with_identity("c"));
    a.pipe(&b);
    b.pipe(&c);
    c.pipe(&a);
    let drops = a.drops();

    a.metric(options("round_trip")).unwrap();

    // One full lap: suppressed exactly once, at the node that emitted it.
    assert_eq!(a.dropped_total(), 1);
    assert_eq!(b.dropped_total(), 0);
    assert_eq!(c.dropped_total(), 0);
    let dropped = drops.try_recv().unwrap();
    assert_eq!(dropped.name(), "round_trip");
    assert_eq!(dropped.source(), Some("a"));
    assert!(drops.try_recv().is_err());
}

#[test]
fn tap_on_a_cycle_observes_each_metric_once() {
    init_logger();
    let a = MetricsNode::new(NodeOptions::new().with_identity("a"));
    let b = MetricsNode::new(NodeOptions::new().with_identity("b"));
    let tap = MetricsNode::default();
    a.pipe(&b);
    b.pipe(&a);
    b.pipe(&tap);
    let collector = tap.collector().unwrap();

    a.metric(options("ping")).unwrap();
    b.metric(options("pong")).unwrap();

    let seen = collector.drain();
    let names: Vec<&str> = seen.iter().map(|metric| metric.name()).collect();
    assert_eq!(names, ["ping", "pong"]);
    // "ping" was suppressed when it came back around to a, "pong" at b.
    assert_eq!(a.dropped_total(), 1);
    assert_eq!(b.dropped_total(), 1);
    assert_eq!(tap.dropped_total(), 0);
}

#[test]
fn latest_wins_keeps_the_newest_at_capacity_one() {
    init_logger();
    let node = MetricsNode::new(
        NodeOptions::new()
            .with_buffer_capacity(1)
            .with_overflow_policy(OverflowPolicy::EvictOldest),
    );
    let collector = node.collector().unwrap();
    collector.pause();
    let drops = node.drops();

    node.metric(options("first")).unwrap();
    node.metric(options("second")).unwrap();

    collector.resume();
    assert_eq!(collector.try_next().unwrap().name(), "second");
    assert!(collector.try_next().is_none());
    assert_eq!(node.dropped_total(), 1);
    assert_eq!(drops.try_recv().unwrap().name(), "first");
}

#[test]
fn drop_incoming_keeps_the_oldest_at_capacity_one() {
    init_logger();
    let node = MetricsNode::new(
        NodeOptions::new()
            .with_buffer_capacity(1)
            .with_overflow_policy(OverflowPolicy::DropIncoming),
    );
    let collector = node.collector().unwrap();
    collector.pause();
    let drops = node.drops();

    node.metric(options("first")).unwrap();
    node.metric(options("second")).unwrap();

    collector.resume();
    assert_eq!(collector.try_next().unwrap().name(), "first");
    assert!(collector.try_next().is_none());
    assert_eq!(node.dropped_total(), 1);
    assert_eq!(drops.try_recv().unwrap().name(), "second");
}

#[test]
fn paused_overflow_drops_the_incoming_tail() {
    init_logger();
    let node =
        MetricsNode::new(NodeOptions::new().with_overflow_policy(OverflowPolicy::DropIncoming));
    let collector = node.collector().unwrap();
    collector.pause();

    for i in 1..=105 {
        node.metric(options(&format!("metric_{i}"))).unwrap();
    }

    collector.resume();
    let delivered = collector.drain();
    assert_eq!(delivered.len(), 100);
    assert_eq!(delivered[0].name(), "metric_1");
    assert_eq!(delivered[99].name(), "metric_100");
    assert_eq!(node.dropped_total(), 5);
}

#[test]
fn paused_overflow_evicts_the_oldest_head() {
    init_logger();
    let node =
        MetricsNode::new(NodeOptions::new().with_overflow_policy(OverflowPolicy::EvictOldest));
    let collector = node.collector().unwrap();
    collector.pause();
    let drops = node.drops();

    for i in 1..=105 {
        node.metric(options(&format!("metric_{i}"))).unwrap();
    }

    collector.resume();
    let delivered = collector.drain();
    assert_eq!(delivered.len(), 100);
    assert_eq!(delivered[0].name(), "metric_6");
    assert_eq!(delivered[99].name(), "metric_105");
    assert_eq!(node.dropped_total(), 5);
    for i in 1..=5 {
        assert_eq!(drops.try_recv().unwrap().name(), format!("metric_{i}"));
    }
    assert!(drops.try_recv().is_err());
}

#[test]
fn unpipe_detaches_and_settles() {
    init_logger();
    let source = MetricsNode::default();
    let hub = MetricsNode::default();
    source.pipe(&hub);
    let collector = hub.collector().unwrap();

    source.metric(options("before")).unwrap();
    assert!(source.unpipe(&hub));
    source.metric(options("after")).unwrap();

    let names: Vec<String> = collector
        .drain()
        .iter()
        .map(|metric| metric.name().to_owned())
        .collect();
    assert_eq!(names, ["before"]);
    assert_eq!(source.dropped_total(), 1);
}

#[test]
fn histogram_timer_emits_through_the_graph() {
    init_logger();
    let app = MetricsNode::default();
    let hub = MetricsNode::default();
    app.pipe(&hub);
    let collector = hub.collector().unwrap();

    let durations = app
        .histogram(ProducerOptions::new("work_seconds", "Unit of work duration"))
        .unwrap();
    let timer = durations.timer_with(LabelSet::named([("phase", "start")]));
    std::thread::sleep(Duration::from_millis(20));
    timer
        .stop_with(LabelSet::named([("phase", "end"), ("outcome", "ok")]))
        .unwrap();

    let metric = collector.try_next().unwrap();
    assert_eq!(metric.name(), "work_seconds");
    assert!(metric.value().unwrap() >= 0.02);
    let labels = metric.labels();
    assert_eq!(labels.len(), 2);
    assert_eq!(labels[0].name(), "phase");
    assert_eq!(labels[1].name(), "outcome");
}

#[test]
fn rejected_values_never_reach_the_graph() {
    init_logger();
    let app = MetricsNode::default();
    let hub = MetricsNode::default();
    app.pipe(&hub);
    let collector = hub.collector().unwrap();

    let heap = app
        .gauge(ProducerOptions::new("heap_bytes", "Heap usage"))
        .unwrap();
    assert!(heap.set(f64::NAN).is_err());
    assert!(collector.try_next().is_none());
    assert_eq!(app.dropped_total(), 0);

    heap.set(42.0).unwrap();
    assert_eq!(collector.try_next().unwrap().value(), Some(42.0));
}

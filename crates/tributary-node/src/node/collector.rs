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

//! The pull side of a node.

use super::{DeliveryState, NodeInner};
use std::sync::Arc;
use tributary_core::Metric;

/// A terminal consumer pulling buffered metrics out of a node at its own
/// pace.
///
/// While the collector is attached the node is `Flowing` (or `Paused` after
/// [`Collector::pause`]); dropping the collector detaches it, and a node
/// left without consumers discards its backlog through the drop channel.
#[derive(Debug)]
pub struct Collector {
    node: Arc<NodeInner>,
}

impl Collector {
    pub(crate) fn new(node: Arc<NodeInner>) -> Self {
        Self { node }
    }

    /// Pulls the oldest buffered metric, `None` when the buffer is empty or
    /// the collector is paused.
    pub fn try_next(&self) -> Option<Metric> {
        self.node.pop_buffered()
    }

    /// Pulls everything currently buffered, oldest first.
    pub fn drain(&self) -> Vec<Metric> {
        self.node.drain_buffered()
    }

    /// Applies backpressure: the node buffers (up to capacity) instead of
    /// delivering until [`Collector::resume`] is called.
    pub fn pause(&self) {
        let mut state = self.node.lock_state();
        if state.mode == DeliveryState::Flowing {
            state.mode = DeliveryState::Paused;
        }
    }

    /// Lifts backpressure and pushes any backlog out to attached pipes.
    pub fn resume(&self) {
        {
            let mut state = self.node.lock_state();
            if state.mode == DeliveryState::Paused {
                state.mode = DeliveryState::Flowing;
            }
        }
        self.node.drain_to_pipes();
    }

    /// Whether the node is currently paused.
    pub fn is_paused(&self) -> bool {
        self.node.mode() == DeliveryState::Paused
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        self.node.detach_collector();
    }
}

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

//! The bounded FIFO buffer behind a node's output side.

use std::collections::VecDeque;

/// What to do with an incoming item when the buffer is at capacity.
///
/// Both policies are valid configurations; neither supersedes the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Evict the oldest buffered item to make room (latest wins).
    #[default]
    EvictOldest,
    /// Reject the incoming item and keep the buffer as-is.
    DropIncoming,
}

/// Outcome of a [`BoundedQueue::push`].
///
/// Displaced and rejected items are returned to the caller so the loss can
/// be reported instead of silently vanishing.
#[derive(Debug, PartialEq)]
pub enum Enqueue<T> {
    /// The item was buffered.
    Accepted,
    /// The item was buffered; the returned oldest item was evicted for it.
    Displaced(T),
    /// The buffer was full and the incoming item was rejected.
    Rejected(T),
}

/// A FIFO queue that never grows beyond its capacity.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
    policy: OverflowPolicy,
}

impl<T> BoundedQueue<T> {
    /// Creates a queue holding at most `capacity` items (minimum 1).
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.max(1).min(1024)),
            capacity: capacity.max(1),
            policy,
        }
    }

    /// Offers an item, applying the overflow policy when full.
    pub fn push(&mut self, item: T) -> Enqueue<T> {
        if self.items.len() < self.capacity {
            self.items.push_back(item);
            return Enqueue::Accepted;
        }
        match self.policy {
            OverflowPolicy::EvictOldest => {
                let evicted = self.items.pop_front();
                self.items.push_back(item);
                match evicted {
                    Some(old) => Enqueue::Displaced(old),
                    // capacity >= 1, so a full queue always has a front
                    None => Enqueue::Accepted,
                }
            }
            OverflowPolicy::DropIncoming => Enqueue::Rejected(item),
        }
    }

    /// Removes and returns the oldest item.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Removes and returns everything, oldest first.
    pub fn drain_all(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }

    /// Number of buffered items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue holds nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The configured overflow policy.
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order() {
        let mut queue = BoundedQueue::new(3, OverflowPolicy::default());
        assert_eq!(queue.push(1), Enqueue::Accepted);
        assert_eq!(queue.push(2), Enqueue::Accepted);
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn evict_oldest_keeps_latest() {
        let mut queue = BoundedQueue::new(1, OverflowPolicy::EvictOldest);
        assert_eq!(queue.push("first"), Enqueue::Accepted);
        assert_eq!(queue.push("second"), Enqueue::Displaced("first"));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop(), Some("second"));
    }

    #[test]
    fn drop_incoming_keeps_first() {
        let mut queue = BoundedQueue::new(1, OverflowPolicy::DropIncoming);
        assert_eq!(queue.push("first"), Enqueue::Accepted);
        assert_eq!(queue.push("second"), Enqueue::Rejected("second"));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop(), Some("first"));
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut queue = BoundedQueue::new(0, OverflowPolicy::DropIncoming);
        assert_eq!(queue.capacity(), 1);
        assert_eq!(queue.push(1), Enqueue::Accepted);
        assert_eq!(queue.push(2), Enqueue::Rejected(2));
    }

    #[test]
    fn drain_all_empties_oldest_first() {
        let mut queue = BoundedQueue::new(4, OverflowPolicy::default());
        for i in 0..4 {
            queue.push(i);
        }
        assert_eq!(queue.drain_all(), vec![0, 1, 2, 3]);
        assert!(queue.is_empty());
    }
}

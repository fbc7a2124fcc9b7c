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

use std::sync::PoisonError;
use std::sync::RwLock;

/// A lazily-created, thread-safe event channel.
///
/// The bus is generic over the event type `T` so the core crate stays
/// decoupled from what flows through it. No channel exists until the first
/// [`EventBus::subscribe`] call, and [`EventBus::publish`] is a no-op while
/// no live external receiver is attached: an unobserved bus never
/// accumulates events, which keeps nodes bounded when nobody listens for
/// their drops.
#[derive(Debug)]
pub struct EventBus<T> {
    channel: RwLock<Option<Channel<T>>>,
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct Channel<T> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T> EventBus<T> {
    /// Creates a bus with no channel attached yet.
    pub fn new() -> Self {
        Self {
            channel: RwLock::new(None),
        }
    }

    /// Returns a receiver for events published after this call.
    ///
    /// Receivers share one channel: concurrent subscribers compete for
    /// events rather than each seeing every event.
    pub fn subscribe(&self) -> flume::Receiver<T> {
        let mut guard = self
            .channel
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let channel = guard.get_or_insert_with(|| {
            log::trace!("Event bus channel initialized on first subscription.");
            let (sender, receiver) = flume::unbounded();
            Channel { sender, receiver }
        });
        channel.receiver.clone()
    }

    /// Publishes an event to the subscribers, if any.
    ///
    /// Returns `true` when the event was handed to the channel, `false` when
    /// it was discarded because no external receiver is alive.
    pub fn publish(&self, event: T) -> bool {
        let guard = match self.channel.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match guard.as_ref() {
            // The bus holds one receiver clone itself; external subscribers
            // exist only beyond that.
            Some(channel) if channel.sender.receiver_count() > 1 => {
                channel.sender.send(event).is_ok()
            }
            _ => false,
        }
    }

    /// Whether at least one external receiver is currently attached.
    pub fn has_subscribers(&self) -> bool {
        match self.channel.read() {
            Ok(guard) => guard
                .as_ref()
                .is_some_and(|channel| channel.sender.receiver_count() > 1),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flume::TryRecvError;

    #[test]
    fn publish_without_subscribers_discards() {
        let bus = EventBus::new();
        assert!(!bus.publish(1u32));
        assert!(!bus.has_subscribers());

        // Nothing was buffered before subscription.
        let rx = bus.subscribe();
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn subscribe_then_receive() {
        let bus = EventBus::new();
        let rx = bus.subscribe();

        assert!(bus.publish("hello"));
        assert!(bus.publish("world"));
        assert_eq!(rx.try_recv(), Ok("hello"));
        assert_eq!(rx.try_recv(), Ok("world"));
    }

    #[test]
    fn dropping_all_receivers_stops_publishing() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        assert!(bus.has_subscribers());

        drop(rx);
        assert!(!bus.has_subscribers());
        assert!(!bus.publish(7u8));
    }
}

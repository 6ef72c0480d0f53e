// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Lifecycle event broadcasting
//!
//! Lightweight pub/sub for delivering synchronization lifecycle events to
//! observers (UI, logging, host systems). Events are pushed synchronously
//! from within the tick that raised them; subscribers drain their channel
//! whenever they like. Fire-and-forget: no return values, no backpressure
//! into the state machine.

use crossbeam_channel::{unbounded, Receiver, Sender};

/// Lifecycle notifications raised by the synchronization state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// A synchronization attempt entered pre-roll.
    Started,
    /// The attempt reached `Synchronized`.
    Succeeded,
    /// The attempt ended in `Error`.
    Failed,
}

/// Broadcaster maintaining a list of subscriber channels.
///
/// Channels are unbounded: lifecycle events are rare and must never be
/// dropped, unlike per-tick data where dropping under load is acceptable.
/// Subscribers whose receiving end has been dropped are pruned on the next
/// broadcast.
pub struct EventBroadcaster {
    senders: Vec<Sender<SyncEvent>>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self {
            senders: Vec::new(),
        }
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&mut self) -> Receiver<SyncEvent> {
        let (tx, rx) = unbounded();
        self.senders.push(tx);
        rx
    }

    /// Deliver `event` to all live subscribers, synchronously.
    pub fn broadcast(&mut self, event: SyncEvent) {
        self.senders.retain(|sender| sender.send(event).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.senders.len()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_and_broadcast() {
        let mut broadcaster = EventBroadcaster::new();
        let rx1 = broadcaster.subscribe();
        let rx2 = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 2);

        broadcaster.broadcast(SyncEvent::Started);

        assert_eq!(rx1.try_recv().unwrap(), SyncEvent::Started);
        assert_eq!(rx2.try_recv().unwrap(), SyncEvent::Started);
    }

    #[test]
    fn test_events_are_never_dropped() {
        let mut broadcaster = EventBroadcaster::new();
        let rx = broadcaster.subscribe();

        broadcaster.broadcast(SyncEvent::Started);
        broadcaster.broadcast(SyncEvent::Failed);
        broadcaster.broadcast(SyncEvent::Started);
        broadcaster.broadcast(SyncEvent::Succeeded);

        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                SyncEvent::Started,
                SyncEvent::Failed,
                SyncEvent::Started,
                SyncEvent::Succeeded,
            ]
        );
    }

    #[test]
    fn test_dead_subscribers_are_pruned() {
        let mut broadcaster = EventBroadcaster::new();
        let rx = broadcaster.subscribe();
        drop(rx);

        broadcaster.broadcast(SyncEvent::Started);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }
}

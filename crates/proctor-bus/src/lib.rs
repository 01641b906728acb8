// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process event bus for live interview events.
//!
//! Publishing never blocks and never fails: with no subscribers the event is
//! dropped, and slow subscribers observe `RecvError::Lagged` instead of
//! holding back the publisher.

use std::sync::atomic::{AtomicU64, Ordering};

use proctor_core::{InterviewEvent, InterviewId, LiveChannel};
use tokio::sync::broadcast;
use tracing::trace;

/// Default broadcast buffer per subscriber.
pub const DEFAULT_CAPACITY: usize = 256;

/// Broadcast fan-out of [`InterviewEvent`]s.
pub struct EventBus {
    tx: broadcast::Sender<InterviewEvent>,
    published: AtomicU64,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            published: AtomicU64::new(0),
        }
    }

    /// Receives every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<InterviewEvent> {
        self.tx.subscribe()
    }

    /// Receives only events for one interview.
    pub fn subscribe_interview(&self, interview_id: InterviewId) -> InterviewSubscription {
        InterviewSubscription {
            interview_id,
            rx: self.tx.subscribe(),
        }
    }

    /// Number of events published so far, delivered or not.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LiveChannel for EventBus {
    fn publish(&self, event: InterviewEvent) {
        self.published.fetch_add(1, Ordering::Relaxed);
        trace!(interview_id = %event.interview_id(), "publishing event");
        // No receivers is not an error.
        let _ = self.tx.send(event);
    }
}

/// A receiver filtered to a single interview.
pub struct InterviewSubscription {
    interview_id: InterviewId,
    rx: broadcast::Receiver<InterviewEvent>,
}

impl InterviewSubscription {
    /// Next event for this interview. `None` once the bus is dropped.
    ///
    /// Lagged gaps are skipped; observers that need the full history
    /// re-read the transcript snapshot.
    pub async fn recv(&mut self) -> Option<InterviewEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if *event.interview_id() == self.interview_id => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(interview_id = %self.interview_id, skipped, "subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

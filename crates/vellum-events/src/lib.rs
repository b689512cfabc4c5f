#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Generic broadcast channel used by every component that publishes
//! observable lifecycle events (progress, completion, error, health).
//!
//! Each component owns its own typed event enum (`RetryEvent`,
//! `RecoveryEvent`, `DownloadEvent`, `TranscriptionEvent`, `MediaEvent`,
//! `ModelEvent`, ...) and a dedicated [`Channel`] instance per observable
//! surface, rather than routing everything through one global bus: these
//! engines are designed to be embedded independently, so a shared
//! singleton bus across components would be an unwanted coupling point.
//! This crate supplies the one piece that repeats across all of them: a
//! thin wrapper over [`tokio::sync::broadcast`] with a sane default
//! capacity and a receive helper that transparently resynchronizes after
//! a lagged receiver.

use tokio::sync::broadcast;

/// Default channel capacity used when a component does not override it.
///
/// Once the buffer is full, the oldest unread event is dropped for slow
/// subscribers rather than blocking the publisher.
pub const DEFAULT_CAPACITY: usize = 256;

/// A typed broadcast channel for one component's observable surface.
///
/// Cloning a `Channel` is cheap and yields another handle to the same
/// underlying broadcast queue (the standard `tokio::broadcast` sender
/// clone semantics).
#[derive(Clone)]
pub struct Channel<T: Clone + Send + 'static> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone + Send + 'static> Channel<T> {
    /// Construct a channel with the given buffer capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero (the same precondition
    /// `tokio::sync::broadcast::channel` enforces).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Construct a channel with [`DEFAULT_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Publish an event. Returns the number of active subscribers that
    /// received it; `0` when nobody is currently listening (not an error –
    /// publishing is fire-and-forget from the component's perspective).
    pub fn publish(&self, event: T) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to future events. The returned [`Subscription`] only
    /// observes events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<T> {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of active subscribers, useful for tests and diagnostics.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone + Send + 'static> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A receive handle into a [`Channel`].
pub struct Subscription<T> {
    receiver: broadcast::Receiver<T>,
}

impl<T: Clone + Send + 'static> Subscription<T> {
    /// Receive the next event, silently resynchronizing past a lag gap
    /// (the oldest events were already dropped; we resume from whatever
    /// is next) and returning `None` once the channel is closed.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event subscriber lagged; resynchronizing");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_before_subscribe_is_not_observed() {
        let channel: Channel<u32> = Channel::new();
        channel.publish(1);
        let mut sub = channel.subscribe();
        channel.publish(2);
        assert_eq!(sub.recv().await, Some(2));
    }

    #[tokio::test]
    async fn multiple_subscribers_all_receive() {
        let channel: Channel<&'static str> = Channel::with_capacity(4);
        let mut a = channel.subscribe();
        let mut b = channel.subscribe();
        assert_eq!(channel.subscriber_count(), 2);
        channel.publish("hello");
        assert_eq!(a.recv().await, Some("hello"));
        assert_eq!(b.recv().await, Some("hello"));
    }

    #[tokio::test]
    async fn closed_channel_yields_none() {
        let mut sub = {
            let channel: Channel<u8> = Channel::with_capacity(1);
            channel.subscribe()
        };
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn lagged_subscriber_resynchronizes_instead_of_stalling() {
        let channel: Channel<u32> = Channel::with_capacity(2);
        let mut sub = channel.subscribe();
        for i in 0..10 {
            channel.publish(i);
        }
        let next = sub.recv().await;
        assert!(next.is_some());
        assert!(next.unwrap() >= 8, "expected resynchronized to recent tail");
    }
}

//! Multi-subscriber replay channel for "entity created" events.
//!
//! Every subscriber first receives the retained history in publish order and
//! then follows live publishes. History is kept in a ring whose capacity is
//! optional: `None` replays everything ever published, `Some(1)` replays only
//! the latest event. Live fan-out goes through a bounded
//! [`tokio::sync::broadcast`] buffer; a subscriber that falls more than one
//! buffer behind is terminated with [`SubscriptionError::Overflow`] and the
//! publisher never waits.

use futures::stream::{self, BoxStream};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::broadcast;

pub const DEFAULT_LIVE_BUFFER: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastConfig {
    /// Number of past events replayed to a new subscriber; `None` keeps all.
    pub replay_capacity: Option<usize>,
    /// Events a live subscriber may lag behind before it is dropped.
    pub live_buffer: usize,
}

impl BroadcastConfig {
    pub fn replay_all() -> Self {
        Self {
            replay_capacity: None,
            live_buffer: DEFAULT_LIVE_BUFFER,
        }
    }

    pub fn replay_latest() -> Self {
        Self {
            replay_capacity: Some(1),
            live_buffer: DEFAULT_LIVE_BUFFER,
        }
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self::replay_all()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("subscriber fell behind by {skipped} events and was dropped")]
    Overflow { skipped: u64 },
}

struct State<T> {
    history: VecDeque<T>,
    /// Sequence number of `history[0]`.
    first_seq: u64,
    /// Sequence number the next publish receives.
    next_seq: u64,
    live: broadcast::Sender<T>,
}

struct Shared<T> {
    config: BroadcastConfig,
    state: Mutex<State<T>>,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Process-wide sink fed by a write path and drained by stream consumers.
pub struct ReplayChannel<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for ReplayChannel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> ReplayChannel<T> {
    pub fn new(config: BroadcastConfig) -> Self {
        let (live, _) = broadcast::channel(config.live_buffer.max(1));
        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(State {
                    history: VecDeque::new(),
                    first_seq: 0,
                    next_seq: 0,
                    live,
                }),
            }),
        }
    }

    /// Record `event` and fan it out. Never blocks on subscribers.
    pub fn publish(&self, event: T) {
        let mut state = self.shared.lock();

        if self.shared.config.replay_capacity != Some(0) {
            state.history.push_back(event.clone());
        }
        if let Some(capacity) = self.shared.config.replay_capacity {
            while state.history.len() > capacity {
                state.history.pop_front();
                state.first_seq += 1;
            }
        }
        if self.shared.config.replay_capacity == Some(0) {
            state.first_seq += 1;
        }
        state.next_seq += 1;

        // No receivers is fine: the event is still retained for replay.
        let receivers = state.live.send(event).unwrap_or(0);
        tracing::debug!(seq = state.next_seq - 1, receivers, "Event published");
    }

    /// Attach a new subscriber positioned at the oldest retained event.
    pub fn subscribe(&self) -> Subscription<T> {
        let state = self.shared.lock();
        let subscription = Subscription {
            shared: Arc::clone(&self.shared),
            cursor: state.first_seq,
            live_start: state.next_seq,
            live: state.live.subscribe(),
            finished: false,
        };
        tracing::debug!(
            replay = state.next_seq - state.first_seq,
            subscribers = state.live.receiver_count(),
            "Subscriber attached"
        );
        subscription
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().live.receiver_count()
    }

    pub fn retained(&self) -> usize {
        self.shared.lock().history.len()
    }

    pub fn published(&self) -> u64 {
        self.shared.lock().next_seq
    }
}

/// One consumer's view of a [`ReplayChannel`].
///
/// Holds a position into the shared history rather than a copy of it.
/// Dropping the subscription releases its live receiver.
pub struct Subscription<T> {
    shared: Arc<Shared<T>>,
    cursor: u64,
    live_start: u64,
    live: broadcast::Receiver<T>,
    finished: bool,
}

impl<T: Clone + Send + Sync + 'static> Subscription<T> {
    /// Next event, `None` once the channel is gone or after an overflow.
    pub async fn next(&mut self) -> Option<Result<T, SubscriptionError>> {
        if self.finished {
            return None;
        }

        if self.cursor < self.live_start {
            let replayed = {
                let state = self.shared.lock();
                if self.cursor < state.first_seq {
                    Err(state.first_seq - self.cursor)
                } else {
                    // cursor < live_start <= next_seq, so the index is retained
                    let index = (self.cursor - state.first_seq) as usize;
                    Ok(state.history.get(index).cloned())
                }
            };
            match replayed {
                Ok(Some(event)) => {
                    self.cursor += 1;
                    return Some(Ok(event));
                }
                Ok(None) => {
                    self.cursor = self.live_start;
                }
                Err(skipped) => {
                    // Evicted from the ring before this subscriber read it.
                    self.finished = true;
                    return Some(Err(SubscriptionError::Overflow { skipped }));
                }
            }
        }

        match self.live.recv().await {
            Ok(event) => Some(Ok(event)),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Slow subscriber dropped");
                self.finished = true;
                Some(Err(SubscriptionError::Overflow { skipped }))
            }
            Err(broadcast::error::RecvError::Closed) => {
                self.finished = true;
                None
            }
        }
    }

    pub fn into_stream(self) -> BoxStream<'static, Result<T, SubscriptionError>> {
        Box::pin(stream::unfold(self, |mut subscription| async move {
            subscription
                .next()
                .await
                .map(|event| (event, subscription))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Duration;
    use tokio::time::timeout;

    async fn take<T: Clone + Send + Sync + 'static>(sub: &mut Subscription<T>, n: usize) -> Vec<T> {
        let mut out = Vec::new();
        for _ in 0..n {
            let event = timeout(Duration::from_secs(1), sub.next())
                .await
                .expect("timed out waiting for event")
                .expect("subscription ended")
                .expect("overflow");
            out.push(event);
        }
        out
    }

    async fn assert_idle<T: Clone + Send + Sync + 'static>(sub: &mut Subscription<T>) {
        assert!(timeout(Duration::from_millis(50), sub.next()).await.is_err());
    }

    #[tokio::test]
    async fn test_replay_then_live() {
        let channel = ReplayChannel::new(BroadcastConfig::replay_all());
        channel.publish(1);
        channel.publish(2);

        let mut sub = channel.subscribe();
        assert_eq!(take(&mut sub, 2).await, vec![1, 2]);

        channel.publish(3);
        assert_eq!(take(&mut sub, 1).await, vec![3]);
        assert_idle(&mut sub).await;
    }

    #[tokio::test]
    async fn test_subscribers_are_independent() {
        let channel = ReplayChannel::new(BroadcastConfig::replay_all());
        channel.publish("e1");

        let mut a = channel.subscribe();
        channel.publish("e2");
        let mut b = channel.subscribe();
        channel.publish("e3");

        assert_eq!(take(&mut b, 3).await, vec!["e1", "e2", "e3"]);
        drop(a);
        channel.publish("e4");
        assert_eq!(take(&mut b, 1).await, vec!["e4"]);

        a = channel.subscribe();
        assert_eq!(take(&mut a, 4).await, vec!["e1", "e2", "e3", "e4"]);
    }

    #[tokio::test]
    async fn test_cancel_releases_receiver() {
        let channel: ReplayChannel<u32> = ReplayChannel::new(BroadcastConfig::replay_all());
        let a = channel.subscribe();
        let b = channel.subscribe();
        assert_eq!(channel.subscriber_count(), 2);
        drop(a);
        assert_eq!(channel.subscriber_count(), 1);
        drop(b);
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_replay_latest_keeps_one() {
        let channel = ReplayChannel::new(BroadcastConfig::replay_latest());
        channel.publish(1);
        channel.publish(2);
        channel.publish(3);
        assert_eq!(channel.retained(), 1);

        let mut sub = channel.subscribe();
        assert_eq!(take(&mut sub, 1).await, vec![3]);
        assert_idle(&mut sub).await;
    }

    #[tokio::test]
    async fn test_zero_capacity_is_live_only() {
        let channel = ReplayChannel::new(BroadcastConfig {
            replay_capacity: Some(0),
            live_buffer: 8,
        });
        channel.publish(1);
        let mut sub = channel.subscribe();
        assert_idle(&mut sub).await;
        channel.publish(2);
        assert_eq!(take(&mut sub, 1).await, vec![2]);
    }

    #[tokio::test]
    async fn test_slow_subscriber_is_dropped_not_the_publisher() {
        let channel = ReplayChannel::new(BroadcastConfig {
            replay_capacity: Some(0),
            live_buffer: 2,
        });
        let mut slow = channel.subscribe();
        for i in 0..10 {
            channel.publish(i);
        }
        let mut fast = channel.subscribe();
        channel.publish(10);

        match slow.next().await {
            Some(Err(SubscriptionError::Overflow { skipped })) => assert!(skipped > 0),
            other => panic!("expected overflow, got {:?}", other),
        }
        assert!(slow.next().await.is_none());
        assert_eq!(take(&mut fast, 1).await, vec![10]);
    }

    #[tokio::test]
    async fn test_into_stream_follows_live_publishes() {
        let channel = ReplayChannel::new(BroadcastConfig::replay_all());
        channel.publish(1);
        let mut stream = channel.subscribe().into_stream();

        let publisher = channel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            publisher.publish(2);
        });

        let first = stream.next().await.unwrap().unwrap();
        let second = timeout(Duration::from_secs(1), stream.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!((first, second), (1, 2));
    }

    #[tokio::test]
    async fn test_concurrent_publishers_share_one_order() {
        let channel = ReplayChannel::new(BroadcastConfig::replay_all());
        let mut sub = channel.subscribe();

        let handles: Vec<_> = (0..4)
            .map(|w| {
                let channel = channel.clone();
                tokio::spawn(async move {
                    for i in 0..25 {
                        channel.publish(w * 100 + i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let live = take(&mut sub, 100).await;
        let mut late = channel.subscribe();
        let replayed = take(&mut late, 100).await;
        assert_eq!(live, replayed);
    }
}

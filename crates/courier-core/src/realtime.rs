use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::broadcast;

use courier_types::NotificationEvent;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("No live subscribers for {0}")]
    NoSubscribers(String),

    #[error("Channel closed for {0}")]
    Closed(String),
}

/// Pushes events to a user's live channel
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_user(&self, address: &str, event: &NotificationEvent) -> Result<(), NotifyError>;
}

/// In-process live channels, one broadcast channel per address
///
/// Addresses are matched case-insensitively. A channel is created on first
/// subscribe and pruned once its last subscriber is gone, either when a
/// [`Subscription`] drops or when a send finds no receivers.
pub struct ChannelHub {
    channels: DashMap<String, broadcast::Sender<NotificationEvent>>,
    capacity: usize,
}

impl ChannelHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn subscribe(&self, address: &str) -> broadcast::Receiver<NotificationEvent> {
        self.channels
            .entry(address.to_lowercase())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Subscribe with a handle that prunes the channel when it is dropped
    pub fn subscribe_owned(self: &Arc<Self>, address: &str) -> Subscription {
        let key = address.to_lowercase();
        Subscription {
            receiver: self.subscribe(&key),
            _release: Release {
                hub: Arc::clone(self),
                key,
            },
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn subscriber_count(&self, address: &str) -> usize {
        self.channels
            .get(&address.to_lowercase())
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

/// A live subscription to one address
pub struct Subscription {
    // Declared before `_release` so the receiver is gone when the release runs
    receiver: broadcast::Receiver<NotificationEvent>,
    _release: Release,
}

impl Subscription {
    pub async fn recv(&mut self) -> Result<NotificationEvent, broadcast::error::RecvError> {
        self.receiver.recv().await
    }
}

struct Release {
    hub: Arc<ChannelHub>,
    key: String,
}

impl Drop for Release {
    fn drop(&mut self) {
        self.hub
            .channels
            .remove_if(&self.key, |_, sender| sender.receiver_count() == 0);
    }
}

impl Default for ChannelHub {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl Notifier for ChannelHub {
    async fn notify_user(&self, address: &str, event: &NotificationEvent) -> Result<(), NotifyError> {
        let key = address.to_lowercase();

        let sent = match self.channels.get(&key) {
            Some(sender) if sender.receiver_count() > 0 => sender.send(event.clone()).is_ok(),
            Some(_) => false,
            None => return Err(NotifyError::NoSubscribers(address.to_string())),
        };

        if sent {
            Ok(())
        } else {
            self.channels.remove_if(&key, |_, sender| sender.receiver_count() == 0);
            Err(NotifyError::Closed(address.to_string()))
        }
    }
}

//! Change notifications between server instances.
//!
//! Delivery is best-effort: a message that nobody receives is dropped.
//! Every message carries the publishing server's id so an instance can
//! ignore its own echoes.

use crate::error::{SyncError, SyncResult};
use crate::session::SyncCounts;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lingua_types::ServerId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Topic every lingua message is published on.
pub const SYNC_TOPIC: &str = "lingua:sync";

/// What happened on the publishing server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerEventKind {
    SyncCompleted,
    NamespaceReloaded,
    TranslationChanged,
}

/// A change notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerMessage {
    #[serde(rename = "type")]
    pub kind: PeerEventKind,
    pub source_server_id: ServerId,
    pub namespace: String,
    /// Set for `translation_changed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Set for `translation_changed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Set for `sync_completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<SyncCounts>,
    pub timestamp: DateTime<Utc>,
}

impl PeerMessage {
    #[must_use]
    pub fn new(kind: PeerEventKind, source: ServerId, namespace: &str) -> Self {
        Self {
            kind,
            source_server_id: source,
            namespace: namespace.to_string(),
            key: None,
            language: None,
            counts: None,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn sync_completed(source: ServerId, namespace: &str, counts: SyncCounts) -> Self {
        Self {
            counts: Some(counts),
            ..Self::new(PeerEventKind::SyncCompleted, source, namespace)
        }
    }

    #[must_use]
    pub fn translation_changed(source: ServerId, namespace: &str, language: &str, key: &str) -> Self {
        Self {
            key: Some(key.to_string()),
            language: Some(language.to_string()),
            ..Self::new(PeerEventKind::TranslationChanged, source, namespace)
        }
    }

    pub fn to_json(&self) -> SyncResult<String> {
        serde_json::to_string(self).map_err(|e| SyncError::Validation(e.to_string()))
    }

    pub fn from_json(json: &str) -> SyncResult<Self> {
        serde_json::from_str(json).map_err(|e| SyncError::Validation(e.to_string()))
    }
}

/// Publishes change notifications to other instances.
#[async_trait]
pub trait PeerBroadcaster: Send + Sync {
    async fn publish(&self, topic: &str, message: &PeerMessage) -> SyncResult<()>;
}

/// A message as delivered by [`LocalBroadcastHub`].
#[derive(Debug, Clone)]
pub struct PeerEnvelope {
    pub topic: String,
    pub message: PeerMessage,
}

/// In-process broadcaster on a tokio broadcast channel.
///
/// Only engines sharing this hub in one process hear each other. Instances
/// on other hosts need a [`PeerBroadcaster`] backed by an external
/// transport that forwards received messages into a [`PeerListener`].
///
/// [`PeerListener`]: crate::PeerListener
#[derive(Debug, Clone)]
pub struct LocalBroadcastHub {
    sender: broadcast::Sender<PeerEnvelope>,
}

impl LocalBroadcastHub {
    /// Creates a hub buffering up to `capacity` messages per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PeerEnvelope> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for LocalBroadcastHub {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl PeerBroadcaster for LocalBroadcastHub {
    async fn publish(&self, topic: &str, message: &PeerMessage) -> SyncResult<()> {
        let envelope = PeerEnvelope {
            topic: topic.to_string(),
            message: message.clone(),
        };
        match self.sender.send(envelope) {
            Ok(receivers) => debug!(
                "Published {:?} for {} to {} subscribers",
                message.kind, message.namespace, receivers
            ),
            Err(_) => debug!("Dropped {:?} for {}: no subscribers", message.kind, message.namespace),
        }
        Ok(())
    }
}

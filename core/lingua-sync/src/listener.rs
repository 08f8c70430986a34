//! Applying peer messages to the local engine.

use crate::broadcast::{PeerEnvelope, PeerEventKind, PeerMessage, SYNC_TOPIC};
use crate::engine::SyncEngine;
use crate::error::SyncResult;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What a handled message did locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerAction {
    /// Published by this server.
    IgnoredOwn,
    /// Another topic.
    IgnoredTopic,
    /// A translation_changed message without key or language.
    IgnoredIncomplete,
    /// The namespace was reloaded from the store.
    Reloaded { entries: usize },
    /// One entry was re-read from the store.
    Refreshed { present: bool },
}

/// Reloads or invalidates local state when another server reports a change.
pub struct PeerListener {
    engine: Arc<SyncEngine>,
}

impl PeerListener {
    #[must_use]
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self { engine }
    }

    /// Applies one message.
    pub async fn handle(&self, topic: &str, message: &PeerMessage) -> SyncResult<PeerAction> {
        if topic != SYNC_TOPIC {
            return Ok(PeerAction::IgnoredTopic);
        }
        if message.source_server_id == self.engine.server_id() {
            debug!("Ignoring own {:?} for {}", message.kind, message.namespace);
            return Ok(PeerAction::IgnoredOwn);
        }

        match message.kind {
            PeerEventKind::SyncCompleted | PeerEventKind::NamespaceReloaded => {
                let entries = self.engine.refresh_namespace(&message.namespace).await?;
                info!(
                    "Peer {} reported {:?} for {}, reloaded locally",
                    message.source_server_id, message.kind, message.namespace
                );
                Ok(PeerAction::Reloaded { entries })
            }
            PeerEventKind::TranslationChanged => {
                let (Some(language), Some(key)) = (&message.language, &message.key) else {
                    warn!(
                        "Ignoring translation_changed for {} without key or language",
                        message.namespace
                    );
                    return Ok(PeerAction::IgnoredIncomplete);
                };
                let present = self
                    .engine
                    .refresh_entry(language, &message.namespace, key)
                    .await?;
                debug!("Refreshed {}:{} [{}] from peer update", message.namespace, key, language);
                Ok(PeerAction::Refreshed { present })
            }
        }
    }

    /// Handles messages until the channel closes.
    pub fn spawn(self, mut receiver: broadcast::Receiver<PeerEnvelope>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(envelope) => {
                        if let Err(err) = self.handle(&envelope.topic, &envelope.message).await {
                            warn!(
                                "Failed to apply peer message for {}: {}",
                                envelope.message.namespace, err
                            );
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("Peer listener lagged, {} messages dropped", missed);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Peer channel closed, listener stopping");
                        break;
                    }
                }
            }
        })
    }
}

//! Sync layer for lingua.
//!
//! Keeps the content store, the in-memory registry and the remote
//! translation-management service consistent:
//! - [`SyncEngine`]: per-namespace upload/download with single-flight
//!   sessions, plus write-through runtime edits
//! - [`SharedBuildCache`]: one export build shared by concurrent syncs
//! - [`ConflictResolver`]: remote-wins, local-wins or manual review
//! - [`PeerBroadcaster`] / [`PeerListener`]: change notifications between
//!   server instances

pub mod broadcast;
pub mod build;
pub mod config;
pub mod conflict;
pub mod download;
pub mod engine;
pub mod error;
pub mod listener;
pub mod materialize;
pub mod merge;
pub mod session;
mod upload;

pub use broadcast::{
    LocalBroadcastHub, PeerBroadcaster, PeerEnvelope, PeerEventKind, PeerMessage, SYNC_TOPIC,
};
pub use build::{BuildOptions, ExportArchive, SharedBuildCache};
pub use config::{ConflictPolicy, NamespaceConfig, SyncConfig, SyncDirection, UploadStrategy};
pub use conflict::{CONFLICT_TARGET, ConflictResolver};
pub use download::{RemoteEntries, extract_namespace_entries};
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use listener::{PeerAction, PeerListener};
pub use materialize::{Materialized, materialize};
pub use merge::{MergeOutcome, merge};
pub use session::{SyncCounts, SyncSession, SyncStatus};

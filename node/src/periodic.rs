//! Background full sync of every configured namespace.

use lingua_sync::{SyncDirection, SyncEngine, SyncStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

/// Runs `sync_all` over the configured namespaces every `period`.
///
/// The first run happens one period after the call. A tick that fires while
/// the previous run is still going is skipped.
pub fn spawn_periodic_sync(engine: Arc<SyncEngine>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let namespaces = engine.config().namespace_names();
        if namespaces.is_empty() {
            warn!("Periodic sync enabled but no namespaces are configured");
            return;
        }
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            info!("Periodic sync of {} namespaces", namespaces.len());
            for session in engine.sync_all(&namespaces, SyncDirection::Full).await {
                if session.status != SyncStatus::Success {
                    warn!(
                        "Periodic sync of {} ended {:?}: {:?}",
                        session.namespace, session.status, session.errors
                    );
                }
            }
        }
    })
}

//! Conflict resolution between local and remote values.

use crate::config::ConflictPolicy;
use lingua_types::Translation;
use tracing::{debug, warn};

/// Log target of the manual-review audit lines.
pub const CONFLICT_TARGET: &str = "lingua::conflict";

/// Settles a local/remote difference according to one policy, fixed for
/// the lifetime of the resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictResolver {
    policy: ConflictPolicy,
}

impl ConflictResolver {
    #[must_use]
    pub fn new(policy: ConflictPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Returns the remote entry if it should replace the local one, or
    /// `None` to keep the local entry.
    pub fn resolve<'a>(&self, local: &Translation, remote: &'a Translation) -> Option<&'a Translation> {
        match self.policy {
            ConflictPolicy::RemoteWins => {
                debug!(
                    "Conflict on {} [{}]: accepting remote value",
                    remote.full_key(),
                    remote.language
                );
                Some(remote)
            }
            ConflictPolicy::LocalWins => {
                debug!(
                    "Conflict on {} [{}]: keeping local value",
                    local.full_key(),
                    local.language
                );
                None
            }
            ConflictPolicy::Manual => {
                warn!(
                    target: CONFLICT_TARGET,
                    "Conflict on {} [{}] needs review: local={:?} remote={:?}",
                    local.full_key(),
                    local.language,
                    local.text,
                    remote.text
                );
                None
            }
        }
    }
}

//! Merging remote entries into local state.

use crate::conflict::ConflictResolver;
use lingua_types::{EntryOrigin, Translation};
use std::sync::Arc;

/// Result of a merge pass.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    /// Remote entries to write locally: inserts plus accepted conflicts.
    pub accepted: Vec<Translation>,
    /// Remote entries with no local counterpart.
    pub inserted: usize,
    /// Remote entries identical to the local one.
    pub unchanged: usize,
    /// Remote entries that differed from the local one.
    pub conflicts: usize,
    /// Differing entries kept local: lost conflicts plus runtime
    /// (database-origin) entries, which remote text never replaces.
    pub kept_local: usize,
}

/// Compares every remote entry against `local` and decides what to apply.
///
/// `local` looks up `(language, key)` within the namespace being merged.
/// Source-language entries are never accepted, and neither is remote text
/// for a key whose local entry was set at runtime.
pub fn merge<F>(
    remote: Vec<Translation>,
    source_language: &str,
    resolver: &ConflictResolver,
    local: F,
) -> MergeOutcome
where
    F: Fn(&str, &str) -> Option<Arc<Translation>>,
{
    let mut outcome = MergeOutcome::default();
    for entry in remote {
        if entry.language.eq_ignore_ascii_case(source_language) {
            continue;
        }
        match local(&entry.language, &entry.key) {
            None => {
                outcome.inserted += 1;
                outcome.accepted.push(entry);
            }
            Some(existing) if existing.same_content(&entry) => {
                outcome.unchanged += 1;
            }
            Some(existing) if existing.origin == EntryOrigin::Database => {
                outcome.kept_local += 1;
            }
            Some(existing) => {
                outcome.conflicts += 1;
                if resolver.resolve(&existing, &entry).is_some() {
                    outcome.accepted.push(entry);
                } else {
                    outcome.kept_local += 1;
                }
            }
        }
    }
    outcome
}

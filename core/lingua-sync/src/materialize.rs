//! Writing accepted remote entries back into the file tree.
//!
//! Each entry goes to the file with the longest matching key prefix among
//! the files the language already has and the files of the source layout,
//! so a language appearing for the first time gets the source language's
//! file structure. The source language itself is never written.

use lingua_store::{ContentStore, KeyPrefix, layout};
use lingua_types::Translation;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Result of writing merged entries.
#[derive(Debug, Default)]
pub struct Materialized {
    pub files_written: usize,
    pub entries_written: usize,
    pub errors: Vec<String>,
}

/// Writes `accepted` for `namespace`, grouped per language and file.
pub async fn materialize(
    store: &dyn ContentStore,
    namespace: &str,
    source_language: &str,
    accepted: Vec<Translation>,
) -> Materialized {
    let mut out = Materialized::default();
    let mut by_language: BTreeMap<String, Vec<Translation>> = BTreeMap::new();
    for entry in accepted {
        if entry.namespace != namespace || entry.language.eq_ignore_ascii_case(source_language) {
            continue;
        }
        by_language.entry(entry.language.clone()).or_default().push(entry);
    }
    if by_language.is_empty() {
        return out;
    }

    let source_layout = match store.key_prefixes(source_language, namespace).await {
        Ok(prefixes) => prefixes,
        Err(err) => {
            out.errors.push(format!("{namespace}: reading source layout: {err}"));
            return out;
        }
    };

    for (language, entries) in by_language {
        let mut prefixes = match store.key_prefixes(&language, namespace).await {
            Ok(prefixes) => prefixes,
            Err(err) => {
                warn!("Could not read layout of {}/{}: {}", language, namespace, err);
                out.errors.push(format!("{language}/{namespace}: {err}"));
                continue;
            }
        };
        merge_layouts(&mut prefixes, &source_layout);

        let mut by_file: BTreeMap<String, Vec<Translation>> = BTreeMap::new();
        for entry in entries {
            let file = layout::file_for_key(&prefixes, &entry.key).file;
            by_file.entry(file).or_default().push(entry);
        }

        for (file, entries) in by_file {
            match store.write_file(&language, namespace, &file, &entries).await {
                Ok(()) => {
                    out.files_written += 1;
                    out.entries_written += entries.len();
                }
                Err(err) => {
                    warn!("Failed to write {}/{}/{}: {}", language, namespace, file, err);
                    out.errors.push(format!("{language}/{namespace}/{file}: {err}"));
                }
            }
        }
    }

    if out.files_written > 0 {
        info!(
            "Wrote {} remote entries to {} files of namespace {}",
            out.entries_written, out.files_written, namespace
        );
    }
    out
}

fn merge_layouts(target: &mut Vec<KeyPrefix>, source: &[KeyPrefix]) {
    for prefix in source {
        if !target.iter().any(|p| p.prefix == prefix.prefix) {
            target.push(prefix.clone());
        }
    }
}
